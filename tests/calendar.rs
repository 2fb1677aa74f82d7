use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};

use post_cockpit::calendar::{parse_month, parse_target, Calendar, PostOutcome, ScheduleStatus};
use post_cockpit::{CockpitError, Draft, Platform, Tone};

fn utc() -> FixedOffset {
    FixedOffset::east_opt(0).unwrap()
}

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn draft(id: &str, text: &str) -> Draft {
    Draft {
        id: id.to_string(),
        platform: Platform::Bluesky,
        template_id: "basic".to_string(),
        tone: Tone::Plain,
        text: text.to_string(),
        hashtags: Vec::new(),
        link: String::new(),
        source_title: "Rally Friday".to_string(),
        source_link: String::new(),
        created_at: at(2025, 3, 1, 9, 0),
        first_comment: None,
    }
}

#[test]
fn scheduling_freezes_text() {
    let mut calendar = Calendar::new(Vec::new(), utc());
    let mut d = draft("draft_a", "A");
    let entry = calendar
        .schedule(&d, "2025-03-07T18:00:00Z", at(2025, 3, 1, 10, 0))
        .unwrap();
    d.text = "B".to_string();

    assert_eq!(entry.text, "A");
    assert_eq!(calendar.get(&entry.id).unwrap().text, "A");
    assert_eq!(entry.status, ScheduleStatus::Scheduled);
    assert_eq!(entry.draft_id, "draft_a");
}

#[test]
fn posted_entries_leave_month_occupancy() {
    let mut calendar = Calendar::new(Vec::new(), utc());
    let now = at(2025, 3, 1, 10, 0);
    let first = calendar.schedule(&draft("d1", "one"), "2025-03-07T18:00:00Z", now).unwrap();
    calendar.schedule(&draft("d2", "two"), "2025-03-07T20:00:00Z", now).unwrap();

    let march = date(2025, 3, 1);
    assert_eq!(calendar.month_occupancy(march).get(&date(2025, 3, 7)), Some(&2));

    assert_eq!(calendar.mark_posted(&first.id).unwrap(), PostOutcome::Posted);
    assert_eq!(calendar.month_occupancy(march).get(&date(2025, 3, 7)), Some(&1));
}

#[test]
fn marking_posted_twice_is_harmless() {
    let mut calendar = Calendar::new(Vec::new(), utc());
    let entry = calendar
        .schedule(&draft("d1", "one"), "2025-03-07 18:00", at(2025, 3, 1, 10, 0))
        .unwrap();

    assert_eq!(calendar.mark_posted(&entry.id).unwrap(), PostOutcome::Posted);
    assert_eq!(calendar.mark_posted(&entry.id).unwrap(), PostOutcome::AlreadyPosted);
    assert_eq!(calendar.get(&entry.id).unwrap().status, ScheduleStatus::Posted);
}

#[test]
fn missing_entries_are_reported() {
    let mut calendar = Calendar::new(Vec::new(), utc());
    assert!(matches!(
        calendar.mark_posted("sched_missing"),
        Err(CockpitError::EntryNotFound(_))
    ));
    assert!(matches!(
        calendar.delete_entry("sched_missing"),
        Err(CockpitError::EntryNotFound(_))
    ));
}

#[test]
fn invalid_timestamps_leave_calendar_untouched() {
    let mut calendar = Calendar::new(Vec::new(), utc());
    let now = at(2025, 3, 1, 10, 0);
    for raw in ["", "   ", "next friday", "2025-13-40T99:00"] {
        assert!(matches!(
            calendar.schedule(&draft("d1", "one"), raw, now),
            Err(CockpitError::InvalidTimestamp(_))
        ));
    }
    assert!(calendar.entries().is_empty());
}

#[test]
fn wall_clock_times_use_the_calendar_offset() {
    let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
    assert_eq!(parse_target("2025-03-07 18:30", plus_two).unwrap(), at(2025, 3, 7, 16, 30));
    assert_eq!(parse_target("2025-03-07T18:30:00", plus_two).unwrap(), at(2025, 3, 7, 16, 30));
    assert_eq!(
        parse_target("2025-03-07T18:30:00+00:00", plus_two).unwrap(),
        at(2025, 3, 7, 18, 30)
    );
}

#[test]
fn day_keys_follow_the_offset() {
    let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
    let mut calendar = Calendar::new(Vec::new(), plus_two);
    calendar.schedule_at(&draft("d1", "late"), at(2025, 3, 31, 23, 30), at(2025, 3, 1, 10, 0));

    assert!(calendar.month_occupancy(date(2025, 3, 1)).is_empty());
    assert_eq!(calendar.month_occupancy(date(2025, 4, 1)).get(&date(2025, 4, 1)), Some(&1));
}

#[test]
fn agenda_is_sorted_and_skips_posted() {
    let mut calendar = Calendar::new(Vec::new(), utc());
    let now = at(2025, 3, 1, 10, 0);
    let evening = calendar.schedule_at(&draft("d1", "evening"), at(2025, 3, 7, 18, 0), now);
    let morning = calendar.schedule_at(&draft("d2", "morning"), at(2025, 3, 7, 9, 0), now);
    let noon = calendar.schedule_at(&draft("d3", "noon"), at(2025, 3, 7, 12, 0), now);
    calendar.schedule_at(&draft("d4", "other day"), at(2025, 3, 8, 9, 0), now);
    calendar.mark_posted(&noon.id).unwrap();

    let agenda: Vec<&str> = calendar
        .agenda_for_day(date(2025, 3, 7))
        .into_iter()
        .map(|entry| entry.id.as_str())
        .collect();
    assert_eq!(agenda, vec![morning.id.as_str(), evening.id.as_str()]);
}

#[test]
fn moving_entries() {
    let mut calendar = Calendar::new(Vec::new(), utc());
    let now = at(2025, 3, 1, 10, 0);
    let entry = calendar.schedule_at(&draft("d1", "one"), at(2025, 3, 7, 18, 0), now);

    let moved = calendar.move_entry(&entry.id, "2025-03-09 10:00").unwrap();
    assert_eq!(moved.scheduled_for, at(2025, 3, 9, 10, 0));
    assert!(calendar.agenda_for_day(date(2025, 3, 7)).is_empty());

    calendar.mark_posted(&entry.id).unwrap();
    assert!(matches!(
        calendar.move_entry(&entry.id, "2025-03-10 10:00"),
        Err(CockpitError::AlreadyPosted(_))
    ));
}

#[test]
fn deleting_an_entry_removes_it() {
    let mut calendar = Calendar::new(Vec::new(), utc());
    let entry = calendar.schedule_at(&draft("d1", "one"), at(2025, 3, 7, 18, 0), at(2025, 3, 1, 10, 0));
    let removed = calendar.delete_entry(&entry.id).unwrap();
    assert_eq!(removed.id, entry.id);
    assert!(calendar.entries().is_empty());
}

#[test]
fn month_parsing_accepts_month_or_day() {
    assert_eq!(parse_month("2025-03").unwrap(), date(2025, 3, 1));
    assert_eq!(parse_month("2025-03-17").unwrap(), date(2025, 3, 1));
    assert!(parse_month("March").is_err());
}
