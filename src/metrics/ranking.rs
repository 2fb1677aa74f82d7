use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::metrics::MetricEntry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedGroup {
    pub key: String,
    pub total: u64,
    pub count: usize,
    pub avg: f64,
}

/// Each entry adds its full score to every tag it carries; scores are not split
/// between tags.
pub fn rank_by_tag(entries: &[MetricEntry]) -> Vec<RankedGroup> {
    rank_by(entries, |entry| entry.tags.clone())
}

pub fn rank_by_template(entries: &[MetricEntry]) -> Vec<RankedGroup> {
    rank_by(entries, |entry| vec![entry.template_id.clone()])
}

/// Groups by the keys `keys_of` yields and sorts by average score, highest first.
/// Groups with equal averages keep first-seen order. Totals saturate at `u64::MAX`.
pub fn rank_by(entries: &[MetricEntry], keys_of: impl Fn(&MetricEntry) -> Vec<String>) -> Vec<RankedGroup> {
    let mut groups: Vec<RankedGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for entry in entries {
        for key in keys_of(entry) {
            let slot = *index.entry(key.clone()).or_insert_with(|| {
                groups.push(RankedGroup {
                    key,
                    total: 0,
                    count: 0,
                    avg: 0.0,
                });
                groups.len() - 1
            });
            let group = &mut groups[slot];
            group.total = group.total.saturating_add(entry.score);
            group.count += 1;
        }
    }

    for group in groups.iter_mut() {
        group.avg = group.total as f64 / group.count as f64;
    }

    groups.sort_by(|a, b| b.avg.partial_cmp(&a.avg).unwrap_or(Ordering::Equal));
    groups
}
