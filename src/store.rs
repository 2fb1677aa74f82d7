//! Read-all / write-all JSON documents, one file per collection.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::calendar::ScheduledEntry;
use crate::error::Result;
use crate::metrics::MetricEntry;
use crate::newsletter::NewsletterIssue;
use crate::Draft;

pub const DRAFTS_FILE: &str = "drafts.json";
pub const SCHEDULE_FILE: &str = "schedule.json";
pub const METRICS_FILE: &str = "metrics.json";
pub const NEWSLETTER_FILE: &str = "newsletter.json";

pub struct JsonStore<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T> JsonStore<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing or blank file reads as the empty document.
    pub fn load(&self) -> Result<T> {
        if !self.path.exists() {
            return Ok(T::default());
        }
        let data = fs::read_to_string(&self.path)?;
        if data.trim().is_empty() {
            return Ok(T::default());
        }
        Ok(serde_json::from_str(&data)?)
    }

    /// Writes to a sibling temp file first, then renames over the original.
    pub fn save(&self, value: &T) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let payload = serde_json::to_string_pretty(value)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, payload)?;
        fs::rename(&tmp_path, &self.path)?;
        debug!(path = %self.path.display(), "saved store");
        Ok(())
    }

    /// Load, apply `f`, save. Nothing is written when `f` fails.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> Result<R>) -> Result<R> {
        let mut value = self.load()?;
        let result = f(&mut value)?;
        self.save(&value)?;
        Ok(result)
    }
}

/// The four persisted collections under one data directory.
pub struct Stores {
    pub drafts: JsonStore<Vec<Draft>>,
    pub schedule: JsonStore<Vec<ScheduledEntry>>,
    pub metrics: JsonStore<Vec<MetricEntry>>,
    pub newsletter: JsonStore<NewsletterIssue>,
}

impl Stores {
    pub fn open(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir)?;
        Ok(Self {
            drafts: JsonStore::new(data_dir.join(DRAFTS_FILE)),
            schedule: JsonStore::new(data_dir.join(SCHEDULE_FILE)),
            metrics: JsonStore::new(data_dir.join(METRICS_FILE)),
            newsletter: JsonStore::new(data_dir.join(NEWSLETTER_FILE)),
        })
    }
}
