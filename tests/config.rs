use chrono::FixedOffset;
use std::fs;

use post_cockpit::calendar::DayZone;
use post_cockpit::compose::TemplateKind;
use post_cockpit::config::{CalendarConfig, CockpitConfig};

#[test]
fn defaults_cover_every_template_and_pack() {
    let config = CockpitConfig::default();
    assert_eq!(config.platforms.bluesky_max_chars, 300);
    for kind in TemplateKind::ALL {
        assert_eq!(config.template_name(kind.id()), kind.display_name());
    }
    assert_eq!(config.template_name("ai"), "ai");
    assert!(config.pack_tags("democracy").is_some());
    assert!(config.pack_tags("nope").is_none());
    assert_eq!(config.scoring.score(1, 1, 1), Some(5));
}

#[test]
fn partial_files_keep_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cockpit.toml");
    fs::write(
        &path,
        r#"
[platforms]
instagram_cta = "Tap the link in bio."

[hashtag_packs]
transit = ["busrider", "transitjustice"]

[scoring]
replies = 3
"#,
    )
    .unwrap();

    let (config, loaded_from) = CockpitConfig::load(Some(path.clone())).unwrap();
    assert_eq!(loaded_from, Some(path));
    assert_eq!(config.platforms.instagram_cta, "Tap the link in bio.");
    assert_eq!(
        config.pack_tags("transit").unwrap(),
        &["busrider".to_string(), "transitjustice".to_string()]
    );
    assert_eq!(config.scoring.likes, 1);
    assert_eq!(config.scoring.replies, 3);
    assert!(!config.catalog.ctas.is_empty());
}

#[test]
fn written_defaults_load_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config").join("cockpit.toml");
    CockpitConfig::default().write(&path).unwrap();

    let (config, _) = CockpitConfig::load(Some(path)).unwrap();
    let defaults = CockpitConfig::default();
    assert_eq!(config.catalog, defaults.catalog);
    assert_eq!(config.templates, defaults.templates);
    assert_eq!(config.hashtag_packs, defaults.hashtag_packs);
    assert_eq!(config.scoring, defaults.scoring);
}

#[test]
fn broken_files_are_config_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cockpit.toml");
    fs::write(&path, "[platforms\nbluesky_max_chars = ").unwrap();
    assert!(CockpitConfig::load(Some(path)).is_err());
}

#[test]
fn calendar_zone_comes_from_minutes() {
    let calendar = CalendarConfig {
        utc_offset_minutes: Some(-300),
    };
    assert_eq!(
        calendar.zone(),
        DayZone::Fixed(FixedOffset::west_opt(5 * 3600).unwrap())
    );
}

#[test]
fn unset_calendar_offset_follows_the_local_zone() {
    assert_eq!(CalendarConfig::default().zone(), DayZone::Local);
}

#[test]
fn zero_bluesky_ceiling_is_raised_to_one() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cockpit.toml");
    fs::write(&path, "[platforms]\nbluesky_max_chars = 0\n").unwrap();

    let (config, _) = CockpitConfig::load(Some(path)).unwrap();
    assert_eq!(config.platforms.bluesky_max_chars, 1);
}
