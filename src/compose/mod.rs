pub mod platform;
pub mod template;

pub use platform::{assemble_bluesky, assemble_instagram, Assembled};
pub use template::{render_body, TemplateKind, FALLBACK_CTA, FALLBACK_TITLE};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::CockpitConfig;
use crate::tags::{clamp, hashtag_string, normalize_tags};
use crate::{Degradation, LinkPolicy, Platform, SourceContext, TagStyle, Tone};

/// Generation choices as they arrive from a form, CLI flag or API request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftOptions {
    pub platform: String,
    pub template_id: String,
    pub tone: String,
    pub link_policy: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedOptions {
    pub platform: Platform,
    pub template: TemplateKind,
    pub tone: Tone,
    pub link_policy: LinkPolicy,
}

impl Default for ResolvedOptions {
    fn default() -> Self {
        Self {
            platform: Platform::Bluesky,
            template: TemplateKind::Basic,
            tone: Tone::Plain,
            link_policy: LinkPolicy::FirstAndLast,
        }
    }
}

/// Maps raw option strings onto known values. Blank values take the default
/// silently; unrecognised values take the default and are reported.
pub fn resolve_options(options: &DraftOptions) -> (ResolvedOptions, Vec<Degradation>) {
    let defaults = ResolvedOptions::default();
    let mut warnings = Vec::new();

    let platform = resolve(
        &options.platform,
        defaults.platform,
        Platform::from_str,
        |value| Degradation::UnknownPlatform { value },
        &mut warnings,
    );
    let template = resolve(
        &options.template_id,
        defaults.template,
        TemplateKind::from_str,
        |value| Degradation::UnknownTemplate { value },
        &mut warnings,
    );
    let tone = resolve(
        &options.tone,
        defaults.tone,
        Tone::from_str,
        |value| Degradation::UnknownTone { value },
        &mut warnings,
    );
    let link_policy = resolve(
        &options.link_policy,
        defaults.link_policy,
        LinkPolicy::from_str,
        |value| Degradation::UnknownLinkPolicy { value },
        &mut warnings,
    );

    for warning in &warnings {
        warn!(%warning, "degraded draft option");
    }

    (
        ResolvedOptions {
            platform,
            template,
            tone,
            link_policy,
        },
        warnings,
    )
}

/// Platform for callers outside batch generation. Blank is Bluesky; anything
/// unrecognised is Bluesky plus a reported, logged degradation.
pub fn resolve_platform(raw: &str, warnings: &mut Vec<Degradation>) -> Platform {
    resolve_logged(
        raw,
        Platform::Bluesky,
        Platform::from_str,
        |value| Degradation::UnknownPlatform { value },
        warnings,
    )
}

/// Tone counterpart of `resolve_platform`; the default is plain.
pub fn resolve_tone(raw: &str, warnings: &mut Vec<Degradation>) -> Tone {
    resolve_logged(
        raw,
        Tone::Plain,
        Tone::from_str,
        |value| Degradation::UnknownTone { value },
        warnings,
    )
}

fn resolve_logged<T: Copy>(
    raw: &str,
    default: T,
    parse: impl Fn(&str) -> Option<T>,
    degraded: impl Fn(String) -> Degradation,
    warnings: &mut Vec<Degradation>,
) -> T {
    let before = warnings.len();
    let value = resolve(raw, default, parse, degraded, warnings);
    for warning in &warnings[before..] {
        warn!(%warning, "degraded option");
    }
    value
}

fn resolve<T: Copy>(
    raw: &str,
    default: T,
    parse: impl Fn(&str) -> Option<T>,
    degraded: impl Fn(String) -> Degradation,
    warnings: &mut Vec<Degradation>,
) -> T {
    if raw.trim().is_empty() {
        return default;
    }
    match parse(raw) {
        Some(value) => value,
        None => {
            warnings.push(degraded(raw.to_string()));
            default
        }
    }
}

#[derive(Debug, Clone)]
pub struct ComposeParams<'a> {
    pub options: ResolvedOptions,
    pub context: &'a SourceContext,
    pub tags: &'a [String],
    pub link_override: Option<&'a str>,
    pub batch_index: usize,
    pub batch_total: usize,
    pub variation_index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComposedDraft {
    pub text: String,
    pub first_comment: Option<String>,
    pub link: Option<String>,
    pub link_included: bool,
    pub hashtags: Vec<String>,
    pub warnings: Vec<Degradation>,
}

pub fn compose_draft(params: &ComposeParams<'_>, config: &CockpitConfig) -> ComposedDraft {
    let options = params.options;
    let catalog = &config.catalog;

    let lead = catalog.lead(options.tone, params.variation_index).trim();
    let body = render_body(
        options.template,
        params.context,
        catalog,
        params.batch_index,
        params.variation_index,
    );
    let body = if lead.is_empty() {
        body
    } else {
        format!("{} {}", lead, body)
    };

    let link = resolve_link(params.context, params.link_override);
    let hashtags = normalize_tags(params.tags);
    let tag_line = hashtag_string(&hashtags);

    let mut warnings = Vec::new();
    let (assembled, link_included) = match options.platform {
        Platform::Bluesky => {
            let include = link.is_some()
                && options
                    .link_policy
                    .includes(params.batch_index, params.batch_total);
            let assembled = assemble_bluesky(
                &body,
                link.as_deref().filter(|_| include),
                &tag_line,
                config.platforms.bluesky_max_chars,
            );
            (assembled, include)
        }
        Platform::Instagram => {
            let style = &config.platforms.instagram_tag_style;
            let tag_style = TagStyle::from_str(style).unwrap_or_else(|| {
                let warning = Degradation::UnknownTagStyle {
                    value: style.clone(),
                };
                warn!(%warning, "degraded instagram tag style");
                warnings.push(warning);
                TagStyle::Inline
            });
            let assembled = assemble_instagram(
                &body,
                &config.platforms.instagram_cta,
                link.as_deref(),
                &tag_line,
                tag_style,
            );
            (assembled, link.is_some())
        }
    };

    if assembled.hashtags_dropped {
        let warning = Degradation::HashtagsDropped {
            batch_index: params.batch_index,
        };
        warn!(%warning, "hashtags trimmed from draft");
        warnings.push(warning);
    }

    let text = if assembled.text.trim().is_empty() {
        let fallback = format!("{}\n{}", FALLBACK_TITLE, FALLBACK_CTA);
        match options.platform {
            Platform::Bluesky => clamp(&fallback, config.platforms.bluesky_max_chars.max(1)),
            Platform::Instagram => fallback,
        }
    } else {
        assembled.text
    };

    ComposedDraft {
        text,
        first_comment: assembled.first_comment,
        link,
        link_included,
        hashtags,
        warnings,
    }
}

/// The override wins when it is non-blank.
pub fn resolve_link(context: &SourceContext, link_override: Option<&str>) -> Option<String> {
    link_override
        .map(str::trim)
        .filter(|link| !link.is_empty())
        .or_else(|| Some(context.link.trim()).filter(|link| !link.is_empty()))
        .map(str::to_string)
}
