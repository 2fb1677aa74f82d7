use std::io;

#[derive(Debug, thiserror::Error)]
pub enum CockpitError {
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("invalid {field} count: {value}")]
    InvalidCount { field: &'static str, value: String },

    #[error("engagement counts too large to score: {likes} likes, {reposts} reposts, {replies} replies")]
    ScoreOverflow { likes: u64, reposts: u64, replies: u64 },

    #[error("text is {len} chars, over the {max} char limit")]
    TextTooLong { len: usize, max: usize },

    #[error("scheduled entry not found: {0}")]
    EntryNotFound(String),

    #[error("draft not found: {0}")]
    DraftNotFound(String),

    #[error("metric entry not found: {0}")]
    MetricNotFound(String),

    #[error("newsletter block not found: {0}")]
    BlockNotFound(String),

    #[error("entry {0} was already posted")]
    AlreadyPosted(String),

    #[error("{0}")]
    Newsletter(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = core::result::Result<T, CockpitError>;
