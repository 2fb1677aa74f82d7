pub mod assist;
pub mod batch;
pub mod calendar;
pub mod compose;
pub mod config;
pub mod error;
pub mod library;
pub mod metrics;
pub mod newsletter;
pub mod store;
pub mod tags;
pub mod variation;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use error::{CockpitError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Bluesky,
    Instagram,
}

impl Platform {
    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "bluesky" | "bsky" => Some(Platform::Bluesky),
            "instagram" | "insta" | "ig" => Some(Platform::Instagram),
            _ => None,
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            Platform::Bluesky => "bluesky",
            Platform::Instagram => "instagram",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Platform::Bluesky => "Bluesky",
            Platform::Instagram => "Instagram",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Plain,
    Urgent,
    Angry,
    Hopeful,
}

impl Tone {
    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "plain" | "" => Some(Tone::Plain),
            "urgent" => Some(Tone::Urgent),
            "angry" | "angry_safe" => Some(Tone::Angry),
            "hopeful" => Some(Tone::Hopeful),
            _ => None,
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            Tone::Plain => "plain",
            Tone::Urgent => "urgent",
            Tone::Angry => "angry",
            Tone::Hopeful => "hopeful",
        }
    }
}

/// Which drafts in a batch carry the source link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkPolicy {
    #[serde(rename = "none")]
    Never,
    #[serde(rename = "some")]
    FirstAndLast,
    #[serde(rename = "every")]
    Every,
}

impl LinkPolicy {
    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "none" | "never" => Some(LinkPolicy::Never),
            "some" => Some(LinkPolicy::FirstAndLast),
            "every" | "all" => Some(LinkPolicy::Every),
            _ => None,
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            LinkPolicy::Never => "none",
            LinkPolicy::FirstAndLast => "some",
            LinkPolicy::Every => "every",
        }
    }

    pub fn includes(self, batch_index: usize, batch_total: usize) -> bool {
        match self {
            LinkPolicy::Never => false,
            LinkPolicy::Every => true,
            LinkPolicy::FirstAndLast => {
                batch_index == 0 || batch_index + 1 == batch_total.max(1)
            }
        }
    }
}

/// Where the Instagram hashtag block goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagStyle {
    Inline,
    FirstComment,
}

impl TagStyle {
    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "inline" => Some(TagStyle::Inline),
            "first_comment" | "first-comment" | "comment" => Some(TagStyle::FirstComment),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceContext {
    pub title: String,
    pub source: String,
    pub link: String,
    pub base_text: String,
    pub notes: String,
}

/// A saved external item (headline, event, link) that drafts are generated from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub notes: String,
    pub saved_at: DateTime<Utc>,
}

impl From<&Signal> for SourceContext {
    fn from(signal: &Signal) -> Self {
        Self {
            title: signal.title.clone(),
            source: signal.source.clone(),
            link: signal.link.clone(),
            base_text: String::new(),
            notes: signal.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub id: String,
    pub platform: Platform,
    pub template_id: String,
    pub tone: Tone,
    pub text: String,
    pub hashtags: Vec<String>,
    pub link: String,
    pub source_title: String,
    pub source_link: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_comment: Option<String>,
}

/// An input value that was not understood and was replaced by a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degradation {
    UnknownPlatform { value: String },
    UnknownTone { value: String },
    UnknownTemplate { value: String },
    UnknownLinkPolicy { value: String },
    UnknownTagStyle { value: String },
    CountClamped { requested: i64, used: usize },
    HashtagsDropped { batch_index: usize },
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Degradation::UnknownPlatform { value } => {
                write!(f, "unknown platform {:?}, using bluesky", value)
            }
            Degradation::UnknownTone { value } => write!(f, "unknown tone {:?}, using plain", value),
            Degradation::UnknownTemplate { value } => {
                write!(f, "unknown template {:?}, using basic", value)
            }
            Degradation::UnknownLinkPolicy { value } => {
                write!(f, "unknown link policy {:?}, using some", value)
            }
            Degradation::UnknownTagStyle { value } => {
                write!(f, "unknown tag style {:?}, using inline", value)
            }
            Degradation::CountClamped { requested, used } => {
                write!(f, "count {} out of range, using {}", requested, used)
            }
            Degradation::HashtagsDropped { batch_index } => {
                write!(f, "hashtags did not fit draft {} and were dropped", batch_index)
            }
        }
    }
}

pub(crate) fn stable_id(prefix: &str, payload: &str) -> String {
    format!("{}_{:x}", prefix, stable_hash64(payload))
}

fn stable_hash64(value: &str) -> u64 {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}
