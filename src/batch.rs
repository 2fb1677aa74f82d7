use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::compose::{compose_draft, resolve_options, ComposeParams, DraftOptions};
use crate::config::CockpitConfig;
use crate::variation::VariationOrder;
use crate::{stable_id, Degradation, Draft, SourceContext};

pub const MIN_BATCH: usize = 1;
pub const MAX_BATCH: usize = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchRequest {
    pub count: i64,
    #[serde(flatten)]
    pub options: DraftOptions,
    pub context: SourceContext,
    pub tags: Vec<String>,
    pub link_override: Option<String>,
    pub order: VariationOrder,
}

impl Default for BatchRequest {
    fn default() -> Self {
        Self {
            count: 3,
            options: DraftOptions::default(),
            context: SourceContext::default(),
            tags: Vec::new(),
            link_override: None,
            order: VariationOrder::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Batch {
    pub drafts: Vec<Draft>,
    pub warnings: Vec<Degradation>,
}

pub fn clamp_count(requested: i64) -> usize {
    requested.clamp(MIN_BATCH as i64, MAX_BATCH as i64) as usize
}

/// Composes `count` drafts from one context. Pure: nothing is persisted, and
/// every draft in the batch shares `now` as its creation time.
pub fn generate_batch(request: &BatchRequest, config: &CockpitConfig, now: DateTime<Utc>) -> Batch {
    let (options, mut warnings) = resolve_options(&request.options);

    let count = clamp_count(request.count);
    if count as i64 != request.count {
        warnings.push(Degradation::CountClamped {
            requested: request.count,
            used: count,
        });
    }

    let variation_indices = request.order.indices(count);
    let mut drafts = Vec::with_capacity(count);

    for (batch_index, variation_index) in variation_indices.into_iter().enumerate() {
        let composed = compose_draft(
            &ComposeParams {
                options,
                context: &request.context,
                tags: &request.tags,
                link_override: request.link_override.as_deref(),
                batch_index,
                batch_total: count,
                variation_index,
            },
            config,
        );
        warnings.extend(composed.warnings);

        let id = stable_id(
            "draft",
            &format!("{}:{}:{}", now.timestamp_millis(), batch_index, composed.text),
        );
        drafts.push(Draft {
            id,
            platform: options.platform,
            template_id: options.template.id().to_string(),
            tone: options.tone,
            text: composed.text,
            hashtags: composed.hashtags,
            link: composed.link.unwrap_or_default(),
            source_title: request.context.title.clone(),
            source_link: request.context.link.clone(),
            created_at: now,
            first_comment: composed.first_comment,
        });
    }

    debug!(
        count,
        platform = options.platform.id(),
        template = options.template.id(),
        tone = options.tone.id(),
        "generated draft batch"
    );

    Batch { drafts, warnings }
}
