use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use std::{collections::BTreeMap, net::SocketAddr, sync::Arc};
use tokio::sync::Mutex;
use tower_http::services::{ServeDir, ServeFile};
use tracing::{info, warn};

use crate::api::{
    error_response, ApiAgendaQuery, ApiAiDraftRequest, ApiComposeResponse, ApiDayCount,
    ApiDraftsResponse, ApiEditDraftRequest, ApiError, ApiGenerateRequest, ApiMetricRequest,
    ApiMetricResponse, ApiMonthQuery, ApiMonthResponse, ApiMoveBlockRequest, ApiMoveRequest, ApiNewsletterUpdate,
    ApiRankingsResponse, ApiScheduleRequest,
};
use crate::llm::{repair_ai_value, LlmClient};
use post_cockpit::assist::ai_draft;
use post_cockpit::batch::{clamp_count, generate_batch, Batch};
use post_cockpit::compose::{resolve_platform, resolve_tone};
use post_cockpit::calendar::{parse_day, parse_month, Calendar, PostOutcome, ScheduledEntry};
use post_cockpit::config::CockpitConfig;
use post_cockpit::library::DraftLibrary;
use post_cockpit::metrics::{MetricEntry, MetricLog};
use post_cockpit::newsletter::{BlockPatch, NewsletterBlock, NewsletterIssue, SECTIONS};
use post_cockpit::store::{JsonStore, Stores};
use post_cockpit::{CockpitError, Draft};

/// Each store has its own lock so one writer per collection at a time; every
/// mutation is load, modify, save under that lock.
#[derive(Clone)]
struct AppState {
    config: Arc<CockpitConfig>,
    llm_client: Option<LlmClient>,
    drafts: Arc<Mutex<JsonStore<Vec<Draft>>>>,
    schedule: Arc<Mutex<JsonStore<Vec<ScheduledEntry>>>>,
    metrics: Arc<Mutex<JsonStore<Vec<MetricEntry>>>>,
    newsletter: Arc<Mutex<JsonStore<NewsletterIssue>>>,
}

pub async fn serve(args: crate::ServeArgs, config: CockpitConfig) -> Result<(), String> {
    let Stores {
        drafts,
        schedule,
        metrics,
        newsletter,
    } = Stores::open(&config.storage.data_dir)
        .map_err(|err| format!("failed to open data dir: {}", err))?;

    let llm_client = match LlmClient::from_config(&config.llm) {
        Ok(client) => {
            info!(model = client.model(), "AI drafting enabled");
            Some(client)
        }
        Err(err) => {
            warn!(error = %err, "AI drafting disabled");
            None
        }
    };

    let state = AppState {
        config: Arc::new(config),
        llm_client,
        drafts: Arc::new(Mutex::new(drafts)),
        schedule: Arc::new(Mutex::new(schedule)),
        metrics: Arc::new(Mutex::new(metrics)),
        newsletter: Arc::new(Mutex::new(newsletter)),
    };

    let mut app = Router::new()
        .route("/api/health", get(health))
        .route("/api/catalog", get(catalog_handler))
        .route("/api/drafts/generate", post(generate_handler))
        .route("/api/drafts/ai", post(ai_drafts_handler))
        .route("/api/library", get(list_drafts).post(save_draft))
        .route(
            "/api/library/:id",
            get(get_draft).put(edit_draft).delete(delete_draft),
        )
        .route("/api/schedule", get(list_schedule).post(schedule_handler))
        .route(
            "/api/schedule/:id",
            put(move_entry).delete(unschedule_handler),
        )
        .route("/api/schedule/:id/posted", post(mark_posted))
        .route("/api/calendar/month", get(month_handler))
        .route("/api/calendar/agenda", get(agenda_handler))
        .route("/api/metrics", get(list_metrics).post(record_metric))
        .route("/api/metrics/:id", delete(delete_metric))
        .route("/api/rankings", get(rankings_handler))
        .route("/api/newsletter", get(get_newsletter).put(update_newsletter))
        .route("/api/newsletter/blocks", post(add_block))
        .route(
            "/api/newsletter/blocks/:id",
            put(update_block).delete(delete_block),
        )
        .route("/api/newsletter/blocks/:id/move", post(move_block))
        .route("/api/newsletter/generate", post(generate_newsletter))
        .route("/api/newsletter/titles", post(generate_titles))
        .route("/api/newsletter/compose", get(compose_newsletter));

    if let Some(web_root) = args.web_root {
        let index_path = format!("{}/index.html", web_root.trim_end_matches('/'));
        let static_service = ServeDir::new(web_root).not_found_service(ServeFile::new(index_path));
        app = app.nest_service("/", static_service);
    }
    let app = app.with_state(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .map_err(|err| format!("invalid bind address: {}", err))?;

    info!(%addr, "serving post cockpit");
    axum::serve(
        tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|err| format!("failed to bind server: {}", err))?,
        app,
    )
    .await
    .map_err(|err| format!("server error: {}", err))?;

    Ok(())
}

async fn health() -> impl IntoResponse {
    StatusCode::OK
}

#[derive(Serialize)]
struct CatalogResponse {
    templates: BTreeMap<String, String>,
    hashtag_packs: BTreeMap<String, Vec<String>>,
    newsletter_sections: Vec<SectionInfo>,
    bluesky_max_chars: usize,
}

#[derive(Serialize)]
struct SectionInfo {
    id: &'static str,
    name: &'static str,
}

async fn catalog_handler(State(state): State<AppState>) -> Json<CatalogResponse> {
    Json(CatalogResponse {
        templates: state.config.templates.clone(),
        hashtag_packs: state.config.hashtag_packs.clone(),
        newsletter_sections: SECTIONS
            .iter()
            .map(|section| SectionInfo {
                id: section.id,
                name: section.name,
            })
            .collect(),
        bluesky_max_chars: state.config.platforms.bluesky_max_chars,
    })
}

async fn generate_handler(
    State(state): State<AppState>,
    Json(request): Json<ApiGenerateRequest>,
) -> Result<Json<Batch>, ApiError> {
    let save = request.save.unwrap_or(false);
    let batch_request = request
        .into_request(&state.config)
        .map_err(|err| (StatusCode::BAD_REQUEST, err))?;
    let batch = generate_batch(&batch_request, &state.config, Utc::now());
    if save {
        save_all(&state, &batch.drafts).await?;
    }
    Ok(Json(batch))
}

async fn ai_drafts_handler(
    State(state): State<AppState>,
    Json(request): Json<ApiAiDraftRequest>,
) -> Result<Json<ApiDraftsResponse>, ApiError> {
    let client = state.llm_client.as_ref().ok_or_else(|| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            "AI drafting is not configured".to_string(),
        )
    })?;

    let mut degradations = Vec::new();
    let platform = resolve_platform(request.platform.as_deref().unwrap_or(""), &mut degradations);
    let tone = resolve_tone(request.tone.as_deref().unwrap_or(""), &mut degradations);
    let mut warnings: Vec<String> = degradations.iter().map(ToString::to_string).collect();
    let count = clamp_count(request.count.unwrap_or(3));
    let context = request.source.into_context();
    let max_chars = state.config.platforms.bluesky_max_chars;

    let texts = client
        .draft_texts(&context, platform, tone, count, max_chars)
        .await
        .map_err(|err| (StatusCode::BAD_GATEWAY, err))?;

    let now = Utc::now();
    let mut drafts = Vec::new();
    for (index, text) in texts.into_iter().enumerate() {
        match text.resolve(repair_ai_value) {
            Some(text) => drafts.push(ai_draft(&text, platform, &context, &state.config, index, now)),
            None => warnings.push(format!("model draft {} could not be read", index + 1)),
        }
    }

    if request.save.unwrap_or(false) {
        save_all(&state, &drafts).await?;
    }
    Ok(Json(ApiDraftsResponse { drafts, warnings }))
}

async fn save_all(state: &AppState, drafts: &[Draft]) -> Result<(), ApiError> {
    let store = state.drafts.lock().await;
    store
        .update(|stored| {
            let mut library = DraftLibrary::new(std::mem::take(stored));
            for draft in drafts {
                library.save(draft.clone());
            }
            *stored = library.into_drafts();
            Ok(())
        })
        .map_err(error_response)
}

async fn list_drafts(State(state): State<AppState>) -> Result<Json<Vec<Draft>>, ApiError> {
    let store = state.drafts.lock().await;
    let library = DraftLibrary::new(store.load().map_err(error_response)?);
    Ok(Json(library.list().into_iter().cloned().collect()))
}

async fn get_draft(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Draft>, ApiError> {
    let store = state.drafts.lock().await;
    let library = DraftLibrary::new(store.load().map_err(error_response)?);
    library
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| error_response(CockpitError::DraftNotFound(id)))
}

async fn save_draft(
    State(state): State<AppState>,
    Json(draft): Json<Draft>,
) -> Result<Json<Draft>, ApiError> {
    save_all(&state, std::slice::from_ref(&draft)).await?;
    Ok(Json(draft))
}

async fn edit_draft(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ApiEditDraftRequest>,
) -> Result<Json<Draft>, ApiError> {
    let max = state.config.platforms.bluesky_max_chars;
    let store = state.drafts.lock().await;
    let draft = store
        .update(|stored| {
            let mut library = DraftLibrary::new(std::mem::take(stored));
            let result = library.update_text(&id, &request.text, max).cloned();
            *stored = library.into_drafts();
            result
        })
        .map_err(error_response)?;
    Ok(Json(draft))
}

async fn delete_draft(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Draft>, ApiError> {
    let store = state.drafts.lock().await;
    let draft = store
        .update(|stored| {
            let mut library = DraftLibrary::new(std::mem::take(stored));
            let result = library.delete(&id);
            *stored = library.into_drafts();
            result
        })
        .map_err(error_response)?;
    Ok(Json(draft))
}

async fn list_schedule(
    State(state): State<AppState>,
) -> Result<Json<Vec<ScheduledEntry>>, ApiError> {
    let store = state.schedule.lock().await;
    let mut entries = store.load().map_err(error_response)?;
    entries.sort_by_key(|entry| entry.scheduled_for);
    Ok(Json(entries))
}

async fn schedule_handler(
    State(state): State<AppState>,
    Json(request): Json<ApiScheduleRequest>,
) -> Result<Json<ScheduledEntry>, ApiError> {
    let draft = match (request.draft, request.draft_id) {
        (Some(draft), _) => draft,
        (None, Some(draft_id)) => {
            let store = state.drafts.lock().await;
            let library = DraftLibrary::new(store.load().map_err(error_response)?);
            library
                .get(&draft_id)
                .cloned()
                .ok_or_else(|| error_response(CockpitError::DraftNotFound(draft_id)))?
        }
        (None, None) => {
            return Err((
                StatusCode::BAD_REQUEST,
                "draft or draft_id is required".to_string(),
            ))
        }
    };

    let zone = state.config.calendar.zone();
    let store = state.schedule.lock().await;
    let entry = store
        .update(|entries| {
            let mut calendar = Calendar::new(std::mem::take(entries), zone);
            let result = calendar.schedule(&draft, &request.when, Utc::now());
            *entries = calendar.into_entries();
            result
        })
        .map_err(error_response)?;
    Ok(Json(entry))
}

#[derive(Serialize)]
struct PostedResponse {
    outcome: PostOutcome,
}

async fn mark_posted(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PostedResponse>, ApiError> {
    let zone = state.config.calendar.zone();
    let store = state.schedule.lock().await;
    let outcome = store
        .update(|entries| {
            let mut calendar = Calendar::new(std::mem::take(entries), zone);
            let result = calendar.mark_posted(&id);
            *entries = calendar.into_entries();
            result
        })
        .map_err(error_response)?;
    Ok(Json(PostedResponse { outcome }))
}

async fn move_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ApiMoveRequest>,
) -> Result<Json<ScheduledEntry>, ApiError> {
    let zone = state.config.calendar.zone();
    let store = state.schedule.lock().await;
    let entry = store
        .update(|entries| {
            let mut calendar = Calendar::new(std::mem::take(entries), zone);
            let result = calendar.move_entry(&id, &request.when);
            *entries = calendar.into_entries();
            result
        })
        .map_err(error_response)?;
    Ok(Json(entry))
}

async fn unschedule_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ScheduledEntry>, ApiError> {
    let zone = state.config.calendar.zone();
    let store = state.schedule.lock().await;
    let entry = store
        .update(|entries| {
            let mut calendar = Calendar::new(std::mem::take(entries), zone);
            let result = calendar.delete_entry(&id);
            *entries = calendar.into_entries();
            result
        })
        .map_err(error_response)?;
    Ok(Json(entry))
}

async fn month_handler(
    State(state): State<AppState>,
    Query(query): Query<ApiMonthQuery>,
) -> Result<Json<ApiMonthResponse>, ApiError> {
    let month = parse_month(&query.month).map_err(error_response)?;
    let calendar = load_calendar(&state).await?;
    let days = calendar
        .month_occupancy(month)
        .into_iter()
        .map(|(date, count)| ApiDayCount { date, count })
        .collect();
    Ok(Json(ApiMonthResponse { month, days }))
}

async fn agenda_handler(
    State(state): State<AppState>,
    Query(query): Query<ApiAgendaQuery>,
) -> Result<Json<Vec<ScheduledEntry>>, ApiError> {
    let day = parse_day(&query.day).map_err(error_response)?;
    let calendar = load_calendar(&state).await?;
    let agenda = calendar.agenda_for_day(day).into_iter().cloned().collect();
    Ok(Json(agenda))
}

async fn load_calendar(state: &AppState) -> Result<Calendar, ApiError> {
    let store = state.schedule.lock().await;
    let entries = store.load().map_err(error_response)?;
    Ok(Calendar::new(entries, state.config.calendar.zone()))
}

async fn list_metrics(State(state): State<AppState>) -> Result<Json<Vec<MetricEntry>>, ApiError> {
    let store = state.metrics.lock().await;
    Ok(Json(store.load().map_err(error_response)?))
}

async fn record_metric(
    State(state): State<AppState>,
    Json(request): Json<ApiMetricRequest>,
) -> Result<Json<ApiMetricResponse>, ApiError> {
    let (input, degradations) = request.into_input().map_err(error_response)?;
    let weights = state.config.scoring.clone();
    let store = state.metrics.lock().await;
    let entry = store
        .update(|entries| {
            let mut log = MetricLog::new(std::mem::take(entries));
            let result = log.record(input, &weights, Utc::now());
            *entries = log.into_entries();
            result
        })
        .map_err(error_response)?;
    Ok(Json(ApiMetricResponse {
        entry,
        warnings: degradations.iter().map(ToString::to_string).collect(),
    }))
}

async fn delete_metric(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MetricEntry>, ApiError> {
    let store = state.metrics.lock().await;
    let entry = store
        .update(|entries| {
            let mut log = MetricLog::new(std::mem::take(entries));
            let result = log.delete(&id);
            *entries = log.into_entries();
            result
        })
        .map_err(error_response)?;
    Ok(Json(entry))
}

async fn rankings_handler(
    State(state): State<AppState>,
) -> Result<Json<ApiRankingsResponse>, ApiError> {
    let store = state.metrics.lock().await;
    let log = MetricLog::new(store.load().map_err(error_response)?);
    Ok(Json(ApiRankingsResponse {
        by_tag: log.rank_by_tag(),
        by_template: log.rank_by_template(),
    }))
}

async fn get_newsletter(
    State(state): State<AppState>,
) -> Result<Json<NewsletterIssue>, ApiError> {
    let store = state.newsletter.lock().await;
    Ok(Json(store.load().map_err(error_response)?))
}

async fn update_newsletter(
    State(state): State<AppState>,
    Json(request): Json<ApiNewsletterUpdate>,
) -> Result<Json<NewsletterIssue>, ApiError> {
    let store = state.newsletter.lock().await;
    let issue = store
        .update(|issue| {
            if let Some(topic) = request.issue {
                issue.issue = topic;
            }
            if let Some(tone) = request.tone {
                issue.tone = tone;
            }
            if let Some(length) = request.length {
                issue.length = length;
            }
            Ok(issue.clone())
        })
        .map_err(error_response)?;
    Ok(Json(issue))
}

async fn add_block(
    State(state): State<AppState>,
    Json(patch): Json<BlockPatch>,
) -> Result<Json<NewsletterBlock>, ApiError> {
    let store = state.newsletter.lock().await;
    let block = store
        .update(|issue| {
            let id = issue.add_block(patch.section_id.as_deref(), Utc::now()).id.clone();
            issue.update_block(&id, patch).cloned()
        })
        .map_err(error_response)?;
    Ok(Json(block))
}

async fn update_block(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<BlockPatch>,
) -> Result<Json<NewsletterBlock>, ApiError> {
    let store = state.newsletter.lock().await;
    let block = store
        .update(|issue| issue.update_block(&id, patch).cloned())
        .map_err(error_response)?;
    Ok(Json(block))
}

async fn delete_block(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<NewsletterBlock>, ApiError> {
    let store = state.newsletter.lock().await;
    let block = store
        .update(|issue| issue.delete_block(&id))
        .map_err(error_response)?;
    Ok(Json(block))
}

async fn move_block(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ApiMoveBlockRequest>,
) -> Result<Json<NewsletterIssue>, ApiError> {
    let store = state.newsletter.lock().await;
    let issue = store
        .update(|issue| {
            issue.move_block(&id, request.direction)?;
            Ok(issue.clone())
        })
        .map_err(error_response)?;
    Ok(Json(issue))
}

/// Runs one model call per section with blocks, in catalog order, saving each
/// output as it arrives.
async fn generate_newsletter(
    State(state): State<AppState>,
) -> Result<Json<NewsletterIssue>, ApiError> {
    let client = newsletter_client(&state)?;
    let jobs = {
        let store = state.newsletter.lock().await;
        store
            .load()
            .and_then(|issue| issue.section_jobs())
            .map_err(error_response)?
    };

    for job in jobs {
        info!(section = job.section_id, "generating newsletter section");
        let text = client
            .chat(&job.system, &job.user)
            .await
            .map_err(|err| (StatusCode::BAD_GATEWAY, err))?;
        let store = state.newsletter.lock().await;
        store
            .update(|issue| {
                issue.set_output(job.section_id, &text);
                Ok(())
            })
            .map_err(error_response)?;
    }

    let store = state.newsletter.lock().await;
    Ok(Json(store.load().map_err(error_response)?))
}

async fn generate_titles(
    State(state): State<AppState>,
) -> Result<Json<NewsletterIssue>, ApiError> {
    let client = newsletter_client(&state)?;
    let (system, user) = {
        let store = state.newsletter.lock().await;
        store
            .load()
            .and_then(|issue| issue.title_prompt())
            .map_err(error_response)?
    };
    let text = client
        .chat(&system, &user)
        .await
        .map_err(|err| (StatusCode::BAD_GATEWAY, err))?;
    let store = state.newsletter.lock().await;
    let issue = store
        .update(|issue| {
            issue.set_title_output(&text);
            Ok(issue.clone())
        })
        .map_err(error_response)?;
    Ok(Json(issue))
}

async fn compose_newsletter(
    State(state): State<AppState>,
) -> Result<Json<ApiComposeResponse>, ApiError> {
    let store = state.newsletter.lock().await;
    let issue = store.load().map_err(error_response)?;
    Ok(Json(ApiComposeResponse {
        text: issue.compose_all(),
    }))
}

fn newsletter_client(state: &AppState) -> Result<LlmClient, ApiError> {
    state.llm_client.clone().ok_or_else(|| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            "AI drafting is not configured".to_string(),
        )
    })
}
