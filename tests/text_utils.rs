use post_cockpit::tags::{char_len, clamp, extract_hashtags, hashtag_string, normalize_tags};
use post_cockpit::variation::{choose_variant, PhraseCatalog, VariationOrder};
use post_cockpit::Tone;

#[test]
fn clamp_never_exceeds_ceiling() {
    let samples = [
        "",
        "short",
        "exactly ten",
        "Rally Friday at city hall, bring signs and water",
        "émoji ✊✊✊ and accents déjà vu",
    ];
    for text in samples {
        for max in 1..60 {
            let clamped = clamp(text, max);
            assert!(char_len(&clamped) <= max, "{:?} clamped to {}", text, max);
        }
    }
}

#[test]
fn clamp_marks_truncation_with_ellipsis() {
    assert_eq!(clamp("hello world", 6), "hello…");
    assert_eq!(clamp("hello", 5), "hello");
    assert_eq!(clamp("hello", 0), "");
    assert_eq!(clamp("✊✊✊✊", 3), "✊✊…");
}

#[test]
fn normalize_tags_strips_hashes_and_blanks() {
    let tags = normalize_tags(&["#Vote", "  ##rally ", "", "#", "mutualaid"]);
    assert_eq!(tags, vec!["Vote", "rally", "mutualaid"]);
}

#[test]
fn hashtag_string_deduplicates_in_order() {
    assert_eq!(hashtag_string(&["vote", "#rally", "vote"]), "#vote #rally");
    assert_eq!(hashtag_string::<&str>(&[]), "");
}

#[test]
fn extract_hashtags_lowercases_and_dedupes() {
    let tags = extract_hashtags("Show up! #Vote #vote #Rally_2 and #MutualAid.");
    assert_eq!(tags, vec!["vote", "rally_2", "mutualaid"]);
    assert!(extract_hashtags("no tags here").is_empty());
}

#[test]
fn choose_variant_is_periodic() {
    let catalog: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
    for i in 0..20 {
        assert_eq!(choose_variant(&catalog, i), choose_variant(&catalog, i + 3));
        assert_eq!(choose_variant(&catalog, i), choose_variant(&catalog, i + 30));
    }
    assert_eq!(choose_variant(&catalog, 4), "b");
    assert_eq!(choose_variant(&[], 7), "");
}

#[test]
fn plain_tone_has_no_lead() {
    let catalog = PhraseCatalog::default();
    assert_eq!(catalog.lead(Tone::Plain, 3), "");
    assert_eq!(catalog.lead(Tone::Urgent, 0), "Urgent:");
    assert_eq!(PhraseCatalog::empty().cta(2), "");
}

#[test]
fn sequential_order_counts_up() {
    assert_eq!(VariationOrder::Sequential.indices(4), vec![0, 1, 2, 3]);
}

#[test]
fn shuffled_order_is_a_seeded_permutation() {
    let first = VariationOrder::Shuffled { seed: 42 }.indices(12);
    let second = VariationOrder::Shuffled { seed: 42 }.indices(12);
    assert_eq!(first, second);

    let mut sorted = first.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, (0..12).collect::<Vec<_>>());
}
