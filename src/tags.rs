use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

lazy_static! {
    static ref HASHTAG: Regex = Regex::new(r"#([A-Za-z0-9_]+)").unwrap();
}

const ELLIPSIS: char = '…';

/// Trims each tag, strips leading `#` characters and drops empties.
/// Case is preserved; callers that need case-insensitive matching lowercase themselves.
pub fn normalize_tags<S: AsRef<str>>(tags: &[S]) -> Vec<String> {
    tags.iter()
        .map(|tag| tag.as_ref().trim().trim_start_matches('#').trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}

pub fn hashtag_string<S: AsRef<str>>(tags: &[S]) -> String {
    let mut seen = HashSet::new();
    normalize_tags(tags)
        .into_iter()
        .filter(|tag| seen.insert(tag.clone()))
        .map(|tag| format!("#{}", tag))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lowercased, deduplicated hashtags in first-seen order.
pub fn extract_hashtags(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut tags = Vec::new();
    for capture in HASHTAG.captures_iter(text) {
        let tag = capture[1].to_lowercase();
        if seen.insert(tag.clone()) {
            tags.push(tag);
        }
    }
    tags
}

pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Never returns more than `max_chars` characters.
pub fn clamp(text: &str, max_chars: usize) -> String {
    if char_len(text) <= max_chars {
        return text.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }
    let mut clamped: String = text.chars().take(max_chars - 1).collect();
    clamped.push(ELLIPSIS);
    clamped
}
