pub mod ranking;

pub use ranking::{rank_by, rank_by_tag, rank_by_template, RankedGroup};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{CockpitError, Result};
use crate::tags::extract_hashtags;
use crate::{stable_id, Platform};

/// Per-action multipliers for `MetricEntry::score`. The defaults give
/// `likes + 2*reposts + 2*replies`; a `[scoring]` table in the config file
/// overrides them for every entry recorded afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementWeights {
    pub likes: u64,
    pub reposts: u64,
    pub replies: u64,
}

impl Default for EngagementWeights {
    fn default() -> Self {
        Self {
            likes: 1,
            reposts: 2,
            replies: 2,
        }
    }
}

impl EngagementWeights {
    /// `None` when the weighted sum does not fit in a `u64`.
    pub fn score(&self, likes: u64, reposts: u64, replies: u64) -> Option<u64> {
        likes
            .checked_mul(self.likes)?
            .checked_add(reposts.checked_mul(self.reposts)?)?
            .checked_add(replies.checked_mul(self.replies)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricInput {
    pub platform: Platform,
    pub template_id: String,
    pub text: String,
    pub likes: u64,
    pub reposts: u64,
    pub replies: u64,
}

/// One logged engagement outcome. `score` and `tags` are fixed when the entry is
/// recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub platform: Platform,
    pub template_id: String,
    pub text: String,
    pub likes: u64,
    pub reposts: u64,
    pub replies: u64,
    pub tags: Vec<String>,
    /// Weighted with the `EngagementWeights` in force when recorded; later
    /// weight changes do not rescore old entries.
    pub score: u64,
}

pub fn record_metric(input: MetricInput, weights: &EngagementWeights, now: DateTime<Utc>) -> Result<MetricEntry> {
    build_entry(input, weights, now, 0)
}

/// `sequence` keeps ids distinct when identical inputs land in the same millisecond.
fn build_entry(
    input: MetricInput,
    weights: &EngagementWeights,
    now: DateTime<Utc>,
    sequence: usize,
) -> Result<MetricEntry> {
    let score = weights
        .score(input.likes, input.reposts, input.replies)
        .ok_or(CockpitError::ScoreOverflow {
            likes: input.likes,
            reposts: input.reposts,
            replies: input.replies,
        })?;
    let tags = extract_hashtags(&input.text);
    let id = stable_id(
        "metric",
        &format!(
            "{}:{}:{}:{}:{}:{}:{}",
            now.timestamp_millis(),
            sequence,
            input.template_id,
            input.likes,
            input.reposts,
            input.replies,
            input.text
        ),
    );
    Ok(MetricEntry {
        id,
        timestamp: now,
        platform: input.platform,
        template_id: input.template_id,
        text: input.text,
        likes: input.likes,
        reposts: input.reposts,
        replies: input.replies,
        tags,
        score,
    })
}

/// Blank counts read as zero; anything else must be a non-negative integer.
pub fn parse_count(field: &'static str, raw: &str) -> Result<u64> {
    let value = raw.trim();
    if value.is_empty() {
        return Ok(0);
    }
    value.parse::<u64>().map_err(|_| CockpitError::InvalidCount {
        field,
        value: value.to_string(),
    })
}

#[derive(Debug, Clone, Default)]
pub struct MetricLog {
    entries: Vec<MetricEntry>,
}

impl MetricLog {
    pub fn new(entries: Vec<MetricEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[MetricEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<MetricEntry> {
        self.entries
    }

    pub fn record(&mut self, input: MetricInput, weights: &EngagementWeights, now: DateTime<Utc>) -> Result<MetricEntry> {
        let entry = build_entry(input, weights, now, self.entries.len())?;
        info!(entry = %entry.id, score = entry.score, tags = entry.tags.len(), "recorded metric");
        self.entries.push(entry.clone());
        Ok(entry)
    }

    pub fn delete(&mut self, entry_id: &str) -> Result<MetricEntry> {
        let index = self
            .entries
            .iter()
            .position(|entry| entry.id == entry_id)
            .ok_or_else(|| CockpitError::MetricNotFound(entry_id.to_string()))?;
        Ok(self.entries.remove(index))
    }

    pub fn rank_by_tag(&self) -> Vec<RankedGroup> {
        rank_by_tag(&self.entries)
    }

    pub fn rank_by_template(&self) -> Vec<RankedGroup> {
        rank_by_template(&self.entries)
    }
}
