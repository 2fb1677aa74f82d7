use serde::{Deserialize, Serialize};

use crate::variation::PhraseCatalog;
use crate::SourceContext;

pub const FALLBACK_TITLE: &str = "Community update";
pub const FALLBACK_CTA: &str = "Share this and stay involved.";

const NOTES_EVERY: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    HeadlineWhy,
    CtaNow,
    MythFact,
    EventPush,
    RallyCry,
    WinRecap,
    /// Title plus a call to action; used for unknown template ids.
    Basic,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 7] = [
        TemplateKind::HeadlineWhy,
        TemplateKind::CtaNow,
        TemplateKind::MythFact,
        TemplateKind::EventPush,
        TemplateKind::RallyCry,
        TemplateKind::WinRecap,
        TemplateKind::Basic,
    ];

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "headline_why" | "headline" => Some(TemplateKind::HeadlineWhy),
            "cta_now" | "cta" => Some(TemplateKind::CtaNow),
            "myth_fact" | "myth" => Some(TemplateKind::MythFact),
            "event_push" | "event" => Some(TemplateKind::EventPush),
            "rally_cry" | "rally" => Some(TemplateKind::RallyCry),
            "win_recap" | "win" => Some(TemplateKind::WinRecap),
            "basic" => Some(TemplateKind::Basic),
            _ => None,
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            TemplateKind::HeadlineWhy => "headline_why",
            TemplateKind::CtaNow => "cta_now",
            TemplateKind::MythFact => "myth_fact",
            TemplateKind::EventPush => "event_push",
            TemplateKind::RallyCry => "rally_cry",
            TemplateKind::WinRecap => "win_recap",
            TemplateKind::Basic => "basic",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            TemplateKind::HeadlineWhy => "Headline + why it matters",
            TemplateKind::CtaNow => "Call to action (now)",
            TemplateKind::MythFact => "Myth vs. fact",
            TemplateKind::EventPush => "Local event push",
            TemplateKind::RallyCry => "Rally cry",
            TemplateKind::WinRecap => "Community win recap",
            TemplateKind::Basic => "Basic",
        }
    }

    fn carries_notes(self) -> bool {
        matches!(
            self,
            TemplateKind::HeadlineWhy | TemplateKind::MythFact | TemplateKind::EventPush
        )
    }
}

/// Builds the template body. The result is never empty.
pub fn render_body(
    kind: TemplateKind,
    context: &SourceContext,
    catalog: &PhraseCatalog,
    batch_index: usize,
    variation_index: usize,
) -> String {
    let title = non_empty(&context.title).unwrap_or(FALLBACK_TITLE);
    let headline = match non_empty(&context.source) {
        Some(source) => format!("{} ({})", title, source),
        None => title.to_string(),
    };
    let cta = non_empty(catalog.cta(variation_index)).unwrap_or(FALLBACK_CTA);
    let why = non_empty(catalog.why(variation_index));
    let closer = non_empty(catalog.closer(variation_index));
    let base_text = non_empty(&context.base_text);
    let notes = if kind.carries_notes() && batch_index % NOTES_EVERY == 0 {
        non_empty(&context.notes)
    } else {
        None
    };

    let mut lines: Vec<String> = Vec::new();
    match kind {
        TemplateKind::HeadlineWhy => {
            lines.push(headline);
            if let Some(why) = why {
                lines.push(format!("Why it matters: {}", why));
            }
            push_opt(&mut lines, notes);
            lines.push(cta.to_string());
        }
        TemplateKind::CtaNow => {
            lines.push(format!("{}: act now.", title.trim_end_matches(['.', ':'])));
            push_opt(&mut lines, base_text);
            lines.push(cta.to_string());
            push_opt(&mut lines, closer);
        }
        TemplateKind::MythFact => {
            lines.push("Myth: nothing we do changes anything.".to_string());
            lines.push(format!("Fact: {}", headline));
            push_opt(&mut lines, notes);
            if let Some(why) = why {
                lines.push(why.to_string());
            }
            lines.push(cta.to_string());
        }
        TemplateKind::EventPush => {
            lines.push(format!("Join us: {}", headline));
            push_opt(&mut lines, notes);
            lines.push(cta.to_string());
            push_opt(&mut lines, closer);
        }
        TemplateKind::RallyCry => {
            lines.push(format!("{}!", title.trim_end_matches(['.', '!'])));
            push_opt(&mut lines, closer);
            lines.push(cta.to_string());
        }
        TemplateKind::WinRecap => {
            lines.push(format!("We did it: {}", headline));
            push_opt(&mut lines, base_text);
            if let Some(why) = why {
                lines.push(why.to_string());
            }
            push_opt(&mut lines, closer);
        }
        TemplateKind::Basic => {
            lines.push(title.to_string());
            lines.push(cta.to_string());
        }
    }

    lines.join("\n")
}

fn push_opt(lines: &mut Vec<String>, value: Option<&str>) {
    if let Some(value) = value {
        lines.push(value.to_string());
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
