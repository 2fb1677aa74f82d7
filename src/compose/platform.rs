use crate::tags::{char_len, clamp};
use crate::TagStyle;

#[derive(Debug, Clone, PartialEq)]
pub struct Assembled {
    pub text: String,
    pub first_comment: Option<String>,
    pub hashtags_dropped: bool,
}

/// Appends link and hashtags, then fits the result into `max_chars`.
///
/// The body is shortened first so the suffix survives. When link and hashtags
/// together leave no room for the body, the hashtags go before the link does.
pub fn assemble_bluesky(body: &str, link: Option<&str>, hashtags: &str, max_chars: usize) -> Assembled {
    let link_part = link
        .map(|link| format!("\n\n{}", link))
        .unwrap_or_default();
    let mut tag_part = if hashtags.is_empty() {
        String::new()
    } else {
        format!("\n\n{}", hashtags)
    };

    let mut hashtags_dropped = false;
    if !tag_part.is_empty() && char_len(&link_part) + char_len(&tag_part) >= max_chars {
        tag_part.clear();
        hashtags_dropped = true;
    }

    let reserved = char_len(&link_part) + char_len(&tag_part);
    let body = clamp(body, max_chars.saturating_sub(reserved));
    let text = clamp(&format!("{}{}{}", body, link_part, tag_part), max_chars);

    Assembled {
        text,
        first_comment: None,
        hashtags_dropped,
    }
}

pub fn assemble_instagram(
    body: &str,
    cta_line: &str,
    link: Option<&str>,
    hashtags: &str,
    tag_style: TagStyle,
) -> Assembled {
    let mut text = body.to_string();
    let cta_line = cta_line.trim();
    if !cta_line.is_empty() {
        text.push_str("\n\n");
        text.push_str(cta_line);
    }
    if let Some(link) = link {
        text.push_str("\nLink: ");
        text.push_str(link);
    }

    let mut first_comment = None;
    if !hashtags.is_empty() {
        match tag_style {
            TagStyle::Inline => {
                text.push_str("\n\n");
                text.push_str(hashtags);
            }
            TagStyle::FirstComment => first_comment = Some(hashtags.to_string()),
        }
    }

    Assembled {
        text,
        first_comment,
        hashtags_dropped: false,
    }
}
