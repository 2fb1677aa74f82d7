//! Runs in its own test binary because it pins `TZ` for the process.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use post_cockpit::calendar::{parse_target, Calendar, DayZone};
use post_cockpit::{Draft, Platform, Tone};

/// US Eastern rules as a POSIX string so no tzdata files are needed.
const EASTERN: &str = "EST5EDT,M3.2.0,M11.1.0";

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn draft(id: &str) -> Draft {
    Draft {
        id: id.to_string(),
        platform: Platform::Bluesky,
        template_id: "basic".to_string(),
        tone: Tone::Plain,
        text: "Show up".to_string(),
        hashtags: Vec::new(),
        link: String::new(),
        source_title: String::new(),
        source_link: String::new(),
        created_at: at(2026, 7, 1, 12, 0),
        first_comment: None,
    }
}

#[test]
fn local_zone_keys_days_on_both_sides_of_dst() {
    std::env::set_var("TZ", EASTERN);

    let mut calendar = Calendar::new(Vec::new(), DayZone::Local);
    let now = at(2026, 7, 1, 12, 0);
    // 23:30 EDT on June 30 and 23:30 EST on November 30.
    let summer = calendar.schedule_at(&draft("d1"), at(2026, 7, 1, 3, 30), now);
    let winter = calendar.schedule_at(&draft("d2"), at(2026, 12, 1, 4, 30), now);

    assert_eq!(calendar.day_key(summer.scheduled_for), date(2026, 6, 30));
    assert_eq!(calendar.day_key(winter.scheduled_for), date(2026, 11, 30));
    assert_eq!(calendar.agenda_for_day(date(2026, 11, 30)).len(), 1);
    assert!(calendar.agenda_for_day(date(2026, 12, 1)).is_empty());
    assert_eq!(
        calendar.month_occupancy(date(2026, 11, 1)).get(&date(2026, 11, 30)),
        Some(&1)
    );
    assert!(calendar.month_occupancy(date(2026, 12, 1)).is_empty());

    assert_eq!(
        parse_target("2026-12-01 23:30", DayZone::Local).unwrap(),
        at(2026, 12, 2, 4, 30)
    );
    assert_eq!(
        parse_target("2026-07-01 23:30", DayZone::Local).unwrap(),
        at(2026, 7, 2, 3, 30)
    );
    // 02:30 on the spring-forward day never happens on the wall clock.
    assert!(parse_target("2026-03-08 02:30", DayZone::Local).is_err());
    assert_eq!(
        DayZone::Local.format(at(2026, 12, 1, 4, 30), "%Y-%m-%d %H:%M"),
        "2026-11-30 23:30"
    );
}
