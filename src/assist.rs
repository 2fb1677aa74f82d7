//! Helpers for the optional model-backed drafting path: prompt text going out,
//! and coercion of whatever comes back into draft text.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::warn;

use crate::config::CockpitConfig;
use crate::tags::clamp;
use crate::{stable_id, Draft, Platform, SourceContext, Tone};

pub const AI_TEMPLATE_ID: &str = "ai";

const TEXT_FIELDS: [&str; 5] = ["text", "draft", "content", "post", "body"];

/// Model output after coercion. `NeedsRepair` holds the raw value and must be
/// resolved by the caller; it is never stringified implicitly.
#[derive(Debug, Clone, PartialEq)]
pub enum AiDraftText {
    Ready(String),
    NeedsRepair(Value),
}

impl AiDraftText {
    pub fn is_ready(&self) -> bool {
        matches!(self, AiDraftText::Ready(_))
    }

    pub fn ready(self) -> Option<String> {
        match self {
            AiDraftText::Ready(text) => Some(text),
            AiDraftText::NeedsRepair(_) => None,
        }
    }

    /// Runs `repair` on the raw value when needed. A blank repair result still
    /// counts as unresolved.
    pub fn resolve(self, repair: impl FnOnce(&Value) -> Option<String>) -> Option<String> {
        match self {
            AiDraftText::Ready(text) => Some(text),
            AiDraftText::NeedsRepair(raw) => repair(&raw)
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty()),
        }
    }
}

/// Removes a surrounding ```lang ... ``` fence if the model added one.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    let without_open = match trimmed.find('\n') {
        Some(newline) => &trimmed[newline + 1..],
        None => trimmed.trim_start_matches('`'),
    };
    let without_close = without_open.trim_end();
    let without_close = without_close.strip_suffix("```").unwrap_or(without_close);
    without_close.trim().to_string()
}

pub fn coerce_ai_value(value: Value) -> AiDraftText {
    match value {
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                AiDraftText::NeedsRepair(Value::String(text))
            } else {
                AiDraftText::Ready(trimmed.to_string())
            }
        }
        Value::Object(fields) => {
            let found = TEXT_FIELDS.iter().find_map(|field| {
                fields
                    .get(*field)
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|text| !text.is_empty())
                    .map(str::to_string)
            });
            match found {
                Some(text) => AiDraftText::Ready(text),
                None => AiDraftText::NeedsRepair(Value::Object(fields)),
            }
        }
        other => AiDraftText::NeedsRepair(other),
    }
}

/// Plain prose is taken as-is. JSON is unpacked through `coerce_ai_value`;
/// text that looks like JSON but does not parse needs repair.
pub fn coerce_ai_text(raw: &str) -> AiDraftText {
    let text = strip_code_fences(raw);
    if text.is_empty() {
        return AiDraftText::NeedsRepair(Value::String(raw.to_string()));
    }
    match serde_json::from_str::<Value>(&text) {
        Ok(value @ (Value::Object(_) | Value::String(_))) => coerce_ai_value(value),
        Ok(Value::Array(_)) | Err(_) if looks_like_json(&text) => {
            AiDraftText::NeedsRepair(Value::String(text))
        }
        _ => AiDraftText::Ready(text),
    }
}

/// Splits a response that may hold several drafts: a JSON array, an object with a
/// `drafts` array, or a single draft.
pub fn coerce_ai_batch(raw: &str) -> Vec<AiDraftText> {
    let text = strip_code_fences(raw);
    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Array(items)) => items.into_iter().map(coerce_ai_value).collect(),
        Ok(Value::Object(mut fields)) => match fields.remove("drafts") {
            Some(Value::Array(items)) => items.into_iter().map(coerce_ai_value).collect(),
            Some(other) => {
                fields.insert("drafts".to_string(), other);
                vec![coerce_ai_value(Value::Object(fields))]
            }
            None => vec![coerce_ai_value(Value::Object(fields))],
        },
        _ => vec![coerce_ai_text(raw)],
    }
}

fn looks_like_json(text: &str) -> bool {
    text.starts_with('{') || text.starts_with('[')
}

/// Wraps resolved model text as a draft so scheduling and metrics treat it like
/// any other draft.
pub fn ai_draft(
    text: &str,
    platform: Platform,
    context: &SourceContext,
    config: &CockpitConfig,
    index: usize,
    now: DateTime<Utc>,
) -> Draft {
    let text = match platform {
        Platform::Bluesky => {
            let max = config.platforms.bluesky_max_chars;
            let clamped = clamp(text.trim(), max);
            if clamped.chars().count() < text.trim().chars().count() {
                warn!(index, max, "model draft exceeded bluesky limit and was clamped");
            }
            clamped
        }
        Platform::Instagram => text.trim().to_string(),
    };
    Draft {
        id: stable_id(
            "draft",
            &format!("{}:ai:{}:{}", now.timestamp_millis(), index, text),
        ),
        platform,
        template_id: AI_TEMPLATE_ID.to_string(),
        tone: Tone::Plain,
        text,
        hashtags: Vec::new(),
        link: context.link.clone(),
        source_title: context.title.clone(),
        source_link: context.link.clone(),
        created_at: now,
        first_comment: None,
    }
}

pub fn draft_system_prompt() -> String {
    [
        "You write short social media drafts for a small advocacy organization.",
        "Be factual. Do not invent names, dates, places or claims that are not in the input.",
        "No hate. No calls for violence.",
        "Return a JSON array of strings, one string per draft, and nothing else.",
    ]
    .join(" ")
}

pub fn draft_user_prompt(
    context: &SourceContext,
    platform: Platform,
    tone: Tone,
    count: usize,
    max_chars: usize,
) -> String {
    let mut lines = vec![
        format!("Platform: {}", platform.label()),
        format!("Tone: {}", tone.id()),
        format!("Write {} distinct drafts.", count),
    ];
    if platform == Platform::Bluesky {
        lines.push(format!("Each draft must be at most {} characters.", max_chars));
    }
    lines.push(String::new());
    lines.push(format!("Title: {}", or_none(&context.title)));
    lines.push(format!("Source: {}", or_none(&context.source)));
    lines.push(format!("Link: {}", or_none(&context.link)));
    if !context.base_text.trim().is_empty() {
        lines.push(format!("Text:\n{}", context.base_text.trim()));
    }
    lines.push(format!("Notes:\n{}", or_none(&context.notes)));
    lines.join("\n")
}

fn or_none(value: &str) -> &str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        "(none)"
    } else {
        trimmed
    }
}
