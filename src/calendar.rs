use chrono::{DateTime, Datelike, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use crate::error::{CockpitError, Result};
use crate::{stable_id, Draft, Platform};

const LOCAL_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleStatus {
    Scheduled,
    Posted,
}

/// A draft bound to a publish time. `text` is copied when the entry is created
/// and does not follow later edits to the draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledEntry {
    pub id: String,
    pub draft_id: String,
    pub text: String,
    pub platform: Platform,
    pub scheduled_for: DateTime<Utc>,
    pub status: ScheduleStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PostOutcome {
    Posted,
    AlreadyPosted,
}

/// Zone that decides which calendar day a timestamp belongs to and how
/// wall-clock input is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayZone {
    Fixed(FixedOffset),
    /// The machine's zone, resolved per timestamp so DST changes are honored.
    Local,
}

impl DayZone {
    pub fn day_of(self, at: DateTime<Utc>) -> NaiveDate {
        match self {
            DayZone::Fixed(offset) => at.with_timezone(&offset).date_naive(),
            DayZone::Local => at.with_timezone(&Local).date_naive(),
        }
    }

    /// Ambiguous wall-clock times (DST fall-back) take the earlier instant;
    /// skipped ones (spring-forward) resolve to nothing.
    pub fn resolve(self, naive: &NaiveDateTime) -> Option<DateTime<Utc>> {
        match self {
            DayZone::Fixed(offset) => offset
                .from_local_datetime(naive)
                .earliest()
                .map(|local| local.with_timezone(&Utc)),
            DayZone::Local => Local
                .from_local_datetime(naive)
                .earliest()
                .map(|local| local.with_timezone(&Utc)),
        }
    }

    pub fn format(self, at: DateTime<Utc>, pattern: &str) -> String {
        match self {
            DayZone::Fixed(offset) => at.with_timezone(&offset).format(pattern).to_string(),
            DayZone::Local => at.with_timezone(&Local).format(pattern).to_string(),
        }
    }
}

impl From<FixedOffset> for DayZone {
    fn from(offset: FixedOffset) -> Self {
        DayZone::Fixed(offset)
    }
}

/// Accepts RFC 3339, or a wall-clock time (`2025-03-07T18:30`, `2025-03-07 18:30:00`)
/// read in `zone`.
pub fn parse_target(raw: &str, zone: impl Into<DayZone>) -> Result<DateTime<Utc>> {
    let zone = zone.into();
    let value = raw.trim();
    if value.is_empty() {
        return Err(CockpitError::InvalidTimestamp("empty".to_string()));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    for format in LOCAL_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return zone
                .resolve(&naive)
                .ok_or_else(|| CockpitError::InvalidTimestamp(value.to_string()));
        }
    }
    Err(CockpitError::InvalidTimestamp(value.to_string()))
}

/// `2025-03` or any `2025-03-dd` day; returns the first of that month.
pub fn parse_month(raw: &str) -> Result<NaiveDate> {
    let value = raw.trim();
    NaiveDate::parse_from_str(&format!("{}-01", value), "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y-%m-%d").map(first_of_month))
        .map_err(|_| CockpitError::InvalidTimestamp(value.to_string()))
}

pub fn parse_day(raw: &str) -> Result<NaiveDate> {
    let value = raw.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| CockpitError::InvalidTimestamp(value.to_string()))
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub struct Calendar {
    entries: Vec<ScheduledEntry>,
    zone: DayZone,
}

impl Calendar {
    pub fn new(entries: Vec<ScheduledEntry>, zone: impl Into<DayZone>) -> Self {
        Self {
            entries,
            zone: zone.into(),
        }
    }

    pub fn entries(&self) -> &[ScheduledEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<ScheduledEntry> {
        self.entries
    }

    pub fn zone(&self) -> DayZone {
        self.zone
    }

    pub fn get(&self, entry_id: &str) -> Option<&ScheduledEntry> {
        self.entries.iter().find(|entry| entry.id == entry_id)
    }

    pub fn schedule(&mut self, draft: &Draft, target: &str, now: DateTime<Utc>) -> Result<ScheduledEntry> {
        let scheduled_for = parse_target(target, self.zone)?;
        Ok(self.schedule_at(draft, scheduled_for, now))
    }

    pub fn schedule_at(&mut self, draft: &Draft, scheduled_for: DateTime<Utc>, now: DateTime<Utc>) -> ScheduledEntry {
        let id = stable_id(
            "sched",
            &format!(
                "{}:{}:{}:{}",
                draft.id,
                scheduled_for.timestamp(),
                now.timestamp_millis(),
                self.entries.len()
            ),
        );
        let entry = ScheduledEntry {
            id,
            draft_id: draft.id.clone(),
            text: draft.text.clone(),
            platform: draft.platform,
            scheduled_for,
            status: ScheduleStatus::Scheduled,
            created_at: now,
        };
        info!(entry = %entry.id, draft = %draft.id, at = %scheduled_for, "scheduled draft");
        self.entries.push(entry.clone());
        entry
    }

    /// Safe to call twice: the second call reports `AlreadyPosted`.
    pub fn mark_posted(&mut self, entry_id: &str) -> Result<PostOutcome> {
        let entry = self
            .entries
            .iter_mut()
            .find(|entry| entry.id == entry_id)
            .ok_or_else(|| CockpitError::EntryNotFound(entry_id.to_string()))?;
        if entry.status == ScheduleStatus::Posted {
            return Ok(PostOutcome::AlreadyPosted);
        }
        entry.status = ScheduleStatus::Posted;
        info!(entry = %entry_id, "marked posted");
        Ok(PostOutcome::Posted)
    }

    pub fn delete_entry(&mut self, entry_id: &str) -> Result<ScheduledEntry> {
        let index = self
            .entries
            .iter()
            .position(|entry| entry.id == entry_id)
            .ok_or_else(|| CockpitError::EntryNotFound(entry_id.to_string()))?;
        info!(entry = %entry_id, "deleted scheduled entry");
        Ok(self.entries.remove(index))
    }

    /// Moves a pending entry to a new time. Posted entries stay where they were.
    pub fn move_entry(&mut self, entry_id: &str, target: &str) -> Result<ScheduledEntry> {
        let scheduled_for = parse_target(target, self.zone)?;
        let entry = self
            .entries
            .iter_mut()
            .find(|entry| entry.id == entry_id)
            .ok_or_else(|| CockpitError::EntryNotFound(entry_id.to_string()))?;
        if entry.status == ScheduleStatus::Posted {
            return Err(CockpitError::AlreadyPosted(entry_id.to_string()));
        }
        entry.scheduled_for = scheduled_for;
        info!(entry = %entry_id, at = %scheduled_for, "moved scheduled entry");
        Ok(entry.clone())
    }

    pub fn day_key(&self, at: DateTime<Utc>) -> NaiveDate {
        self.zone.day_of(at)
    }

    /// Pending entries per day for the month containing `anchor`.
    pub fn month_occupancy(&self, anchor: NaiveDate) -> BTreeMap<NaiveDate, usize> {
        let mut counts = BTreeMap::new();
        for entry in self.pending() {
            let day = self.day_key(entry.scheduled_for);
            if day.year() == anchor.year() && day.month() == anchor.month() {
                *counts.entry(day).or_insert(0) += 1;
            }
        }
        counts
    }

    pub fn agenda_for_day(&self, date: NaiveDate) -> Vec<&ScheduledEntry> {
        let mut agenda: Vec<&ScheduledEntry> = self
            .pending()
            .filter(|entry| self.day_key(entry.scheduled_for) == date)
            .collect();
        agenda.sort_by_key(|entry| entry.scheduled_for);
        agenda
    }

    fn pending(&self) -> impl Iterator<Item = &ScheduledEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.status == ScheduleStatus::Scheduled)
    }
}
