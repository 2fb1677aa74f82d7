use chrono::{TimeZone, Utc};

use post_cockpit::metrics::{
    parse_count, rank_by_tag, rank_by_template, record_metric, EngagementWeights, MetricEntry,
    MetricInput, MetricLog,
};
use post_cockpit::{CockpitError, Platform};

fn entry(template: &str, tags: &[&str], score: u64) -> MetricEntry {
    MetricEntry {
        id: format!("metric_{}_{}", template, score),
        timestamp: Utc.with_ymd_and_hms(2025, 3, 8, 12, 0, 0).unwrap(),
        platform: Platform::Bluesky,
        template_id: template.to_string(),
        text: String::new(),
        likes: score,
        reposts: 0,
        replies: 0,
        tags: tags.iter().map(|tag| tag.to_string()).collect(),
        score,
    }
}

fn input(text: &str, likes: u64, reposts: u64, replies: u64) -> MetricInput {
    MetricInput {
        platform: Platform::Bluesky,
        template_id: "cta_now".to_string(),
        text: text.to_string(),
        likes,
        reposts,
        replies,
    }
}

#[test]
fn rank_by_tag_averages_scores() {
    let groups = rank_by_tag(&[entry("basic", &["x"], 10), entry("basic", &["x"], 30)]);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].key, "x");
    assert_eq!(groups[0].total, 40);
    assert_eq!(groups[0].count, 2);
    assert!((groups[0].avg - 20.0).abs() < 1e-9);
}

#[test]
fn every_tag_receives_the_full_score() {
    let groups = rank_by_tag(&[entry("basic", &["a", "b"], 10)]);
    assert_eq!(groups.len(), 2);
    assert!(groups.iter().all(|group| group.total == 10 && group.count == 1));
}

#[test]
fn rankings_sort_by_average_then_first_seen() {
    let entries = [
        entry("basic", &["low"], 5),
        entry("cta_now", &["tie_a"], 10),
        entry("rally_cry", &["tie_b", "high"], 10),
        entry("cta_now", &["high"], 50),
    ];

    let tags: Vec<String> = rank_by_tag(&entries)
        .into_iter()
        .map(|group| group.key)
        .collect();
    assert_eq!(tags, vec!["high", "tie_a", "tie_b", "low"]);

    let templates = rank_by_template(&entries);
    assert_eq!(templates[0].key, "cta_now");
    assert_eq!(templates[0].total, 60);
    assert_eq!(templates[1].key, "rally_cry");
    assert_eq!(templates[2].key, "basic");
}

#[test]
fn entries_without_tags_only_count_for_templates() {
    let entries = [entry("basic", &[], 8)];
    assert!(rank_by_tag(&entries).is_empty());
    assert_eq!(rank_by_template(&entries)[0].count, 1);
}

#[test]
fn recording_scores_and_extracts_tags() {
    let now = Utc.with_ymd_and_hms(2025, 3, 8, 12, 0, 0).unwrap();
    let entry = record_metric(
        input("Show up Friday #Rally #vote #rally", 3, 2, 1),
        &EngagementWeights::default(),
        now,
    )
    .unwrap();
    assert_eq!(entry.score, 3 + 2 * 2 + 2);
    assert_eq!(entry.tags, vec!["rally", "vote"]);
    assert_eq!(entry.timestamp, now);
    assert!(entry.id.starts_with("metric_"));
}

#[test]
fn weights_are_configurable() {
    let weights = EngagementWeights {
        likes: 2,
        reposts: 5,
        replies: 0,
    };
    assert_eq!(weights.score(1, 1, 9), Some(7));
}

#[test]
fn counts_parse_blank_as_zero_and_reject_garbage() {
    assert_eq!(parse_count("likes", "").unwrap(), 0);
    assert_eq!(parse_count("likes", "  12 ").unwrap(), 12);
    assert!(matches!(
        parse_count("reposts", "-1"),
        Err(CockpitError::InvalidCount { field: "reposts", .. })
    ));
    assert!(matches!(
        parse_count("replies", "lots"),
        Err(CockpitError::InvalidCount { field: "replies", .. })
    ));
}

#[test]
fn metric_log_records_and_deletes() {
    let now = Utc.with_ymd_and_hms(2025, 3, 8, 12, 0, 0).unwrap();
    let mut log = MetricLog::default();
    let recorded = log
        .record(input("#x", 10, 0, 0), &EngagementWeights::default(), now)
        .unwrap();
    log.record(input("#x", 30, 0, 0), &EngagementWeights::default(), now)
        .unwrap();
    assert_eq!(log.entries().len(), 2);
    assert!((log.rank_by_tag()[0].avg - 20.0).abs() < 1e-9);

    assert_ne!(log.entries()[0].id, log.entries()[1].id);

    log.delete(&recorded.id).unwrap();
    assert_eq!(log.entries().len(), 1);
    assert_eq!(log.entries()[0].score, 30);
    assert!(matches!(
        log.delete("metric_missing"),
        Err(CockpitError::MetricNotFound(_))
    ));
}

#[test]
fn huge_counts_are_rejected_instead_of_wrapping() {
    let now = Utc.with_ymd_and_hms(2025, 3, 8, 12, 0, 0).unwrap();
    let reposts = parse_count("reposts", "10000000000000000000").unwrap();

    let mut log = MetricLog::default();
    assert!(matches!(
        log.record(input("#x", 0, reposts, 0), &EngagementWeights::default(), now),
        Err(CockpitError::ScoreOverflow { .. })
    ));
    assert!(log.entries().is_empty());

    assert_eq!(EngagementWeights::default().score(u64::MAX, 0, 0), Some(u64::MAX));
    assert_eq!(EngagementWeights::default().score(u64::MAX, 0, 1), None);
}

#[test]
fn ranking_totals_saturate() {
    let groups = rank_by_tag(&[entry("basic", &["x"], u64::MAX), entry("cta_now", &["x"], 5)]);
    assert_eq!(groups[0].total, u64::MAX);
    assert_eq!(groups[0].count, 2);
}

#[test]
fn identical_logs_in_one_millisecond_get_distinct_ids() {
    let now = Utc.with_ymd_and_hms(2025, 3, 8, 12, 0, 0).unwrap();
    let mut log = MetricLog::default();
    let first = log
        .record(input("#x", 4, 0, 0), &EngagementWeights::default(), now)
        .unwrap();
    let second = log
        .record(input("#x", 4, 0, 0), &EngagementWeights::default(), now)
        .unwrap();
    assert_ne!(first.id, second.id);

    log.delete(&second.id).unwrap();
    assert_eq!(log.entries().len(), 1);
    assert_eq!(log.entries()[0].id, first.id);
}
