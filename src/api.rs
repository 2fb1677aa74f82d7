use axum::http::StatusCode;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use post_cockpit::batch::BatchRequest;
use post_cockpit::compose::{resolve_platform, DraftOptions};
use post_cockpit::config::CockpitConfig;
use post_cockpit::metrics::{parse_count, MetricEntry, MetricInput, RankedGroup};
use post_cockpit::newsletter::MoveDirection;
use post_cockpit::variation::VariationOrder;
use post_cockpit::{CockpitError, Degradation, Draft, SourceContext};

pub type ApiError = (StatusCode, String);

pub fn error_response(err: CockpitError) -> ApiError {
    let status = match &err {
        CockpitError::InvalidTimestamp(_)
        | CockpitError::InvalidCount { .. }
        | CockpitError::ScoreOverflow { .. }
        | CockpitError::TextTooLong { .. }
        | CockpitError::Newsletter(_) => StatusCode::BAD_REQUEST,
        CockpitError::AlreadyPosted(_) => StatusCode::CONFLICT,
        CockpitError::EntryNotFound(_)
        | CockpitError::DraftNotFound(_)
        | CockpitError::MetricNotFound(_)
        | CockpitError::BlockNotFound(_) => StatusCode::NOT_FOUND,
        CockpitError::Io(_) | CockpitError::Json(_) | CockpitError::Config(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, err.to_string())
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiSourceFields {
    pub title: Option<String>,
    pub source: Option<String>,
    pub link: Option<String>,
    pub base_text: Option<String>,
    pub notes: Option<String>,
}

impl ApiSourceFields {
    pub fn into_context(self) -> SourceContext {
        SourceContext {
            title: self.title.unwrap_or_default(),
            source: self.source.unwrap_or_default(),
            link: self.link.unwrap_or_default(),
            base_text: self.base_text.unwrap_or_default(),
            notes: self.notes.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ApiGenerateRequest {
    pub count: Option<i64>,
    pub platform: Option<String>,
    pub template_id: Option<String>,
    pub tone: Option<String>,
    pub link_policy: Option<String>,
    #[serde(flatten)]
    pub source: ApiSourceFields,
    pub tags: Option<Vec<String>>,
    pub pack: Option<String>,
    pub link_override: Option<String>,
    pub seed: Option<u64>,
    pub save: Option<bool>,
}

impl ApiGenerateRequest {
    pub fn into_request(self, config: &CockpitConfig) -> Result<BatchRequest, String> {
        let mut tags = Vec::new();
        if let Some(pack) = self.pack.as_deref().filter(|pack| !pack.trim().is_empty()) {
            let pack_tags = config
                .pack_tags(pack.trim())
                .ok_or_else(|| format!("unknown hashtag pack: {}", pack))?;
            tags.extend(pack_tags.iter().cloned());
        }
        tags.extend(self.tags.unwrap_or_default());

        let mut request = BatchRequest {
            options: DraftOptions {
                platform: self.platform.unwrap_or_default(),
                template_id: self.template_id.unwrap_or_default(),
                tone: self.tone.unwrap_or_default(),
                link_policy: self.link_policy.unwrap_or_default(),
            },
            context: self.source.into_context(),
            tags,
            link_override: self.link_override,
            ..BatchRequest::default()
        };
        if let Some(count) = self.count {
            request.count = count;
        }
        if let Some(seed) = self.seed {
            request.order = VariationOrder::Shuffled { seed };
        }
        Ok(request)
    }
}

#[derive(Debug, Deserialize)]
pub struct ApiAiDraftRequest {
    pub count: Option<i64>,
    pub platform: Option<String>,
    pub tone: Option<String>,
    #[serde(flatten)]
    pub source: ApiSourceFields,
    pub save: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ApiDraftsResponse {
    pub drafts: Vec<Draft>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiEditDraftRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiScheduleRequest {
    pub draft_id: Option<String>,
    pub draft: Option<Draft>,
    pub when: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiMoveRequest {
    pub when: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiMonthQuery {
    pub month: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiAgendaQuery {
    pub day: String,
}

#[derive(Debug, Serialize)]
pub struct ApiDayCount {
    pub date: NaiveDate,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct ApiMonthResponse {
    pub month: NaiveDate,
    pub days: Vec<ApiDayCount>,
}

/// Counts arrive from form fields as either numbers or strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ApiCount {
    Number(u64),
    Text(String),
}

impl ApiCount {
    fn parse(field: &'static str, value: Option<ApiCount>) -> Result<u64, CockpitError> {
        match value {
            None => Ok(0),
            Some(ApiCount::Number(value)) => Ok(value),
            Some(ApiCount::Text(raw)) => parse_count(field, &raw),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ApiMetricRequest {
    pub platform: Option<String>,
    pub template_id: Option<String>,
    pub text: Option<String>,
    pub likes: Option<ApiCount>,
    pub reposts: Option<ApiCount>,
    pub replies: Option<ApiCount>,
}

impl ApiMetricRequest {
    /// Unknown platforms fall back to Bluesky and come back as degradations.
    pub fn into_input(self) -> Result<(MetricInput, Vec<Degradation>), CockpitError> {
        let mut degradations = Vec::new();
        let platform = resolve_platform(self.platform.as_deref().unwrap_or(""), &mut degradations);
        let input = MetricInput {
            platform,
            template_id: self
                .template_id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| "unknown".to_string()),
            text: self.text.unwrap_or_default(),
            likes: ApiCount::parse("likes", self.likes)?,
            reposts: ApiCount::parse("reposts", self.reposts)?,
            replies: ApiCount::parse("replies", self.replies)?,
        };
        Ok((input, degradations))
    }
}

#[derive(Debug, Serialize)]
pub struct ApiMetricResponse {
    #[serde(flatten)]
    pub entry: MetricEntry,
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ApiRankingsResponse {
    pub by_tag: Vec<RankedGroup>,
    pub by_template: Vec<RankedGroup>,
}

#[derive(Debug, Deserialize)]
pub struct ApiNewsletterUpdate {
    pub issue: Option<String>,
    pub tone: Option<String>,
    pub length: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiMoveBlockRequest {
    pub direction: MoveDirection,
}

#[derive(Debug, Serialize)]
pub struct ApiComposeResponse {
    pub text: String,
}
