use crate::api::AppState;
use crate::concierge::{ChatReply, ChatRequest, MoreInfoReply};
use crate::error::{AppError, Result};
use crate::models::{ContentType, Document, DocumentId, TourStep};
use crate::retrieval::{RelevanceScores, RetrievalOutcome, SearchPhase};
use crate::tour::{ProgressReport, QuizFeedback, StepOutcome, TourAnalytics, TourStart};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use validator::Validate;

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        documents: state.index.len(),
    }))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub documents: usize,
}

/// Body carrying only the visitor id
#[derive(Debug, Deserialize, Validate)]
pub struct UserRequest {
    #[validate(length(min = 1, max = 128))]
    pub user_id: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UserQuery {
    #[validate(length(min = 1, max = 128))]
    pub user_id: String,
}

/// Start the tour
pub async fn start_tour(
    State(state): State<AppState>,
    Json(request): Json<UserRequest>,
) -> Result<Json<TourStart>> {
    request.validate()?;
    Ok(Json(state.tours.start_tour(&request.user_id).await?))
}

/// Advance one step
pub async fn next_step(
    State(state): State<AppState>,
    Json(request): Json<UserRequest>,
) -> Result<Json<StepOutcome>> {
    request.validate()?;
    Ok(Json(state.tours.next_step(&request.user_id).await?))
}

/// Go back one step
pub async fn previous_step(
    State(state): State<AppState>,
    Json(request): Json<UserRequest>,
) -> Result<Json<StepOutcome>> {
    request.validate()?;
    Ok(Json(state.tours.previous_step(&request.user_id).await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct GoToStepRequest {
    #[validate(length(min = 1, max = 128))]
    pub user_id: String,
    pub step_order: i32,
}

/// Jump to the step with a given order
pub async fn go_to_step(
    State(state): State<AppState>,
    Json(request): Json<GoToStepRequest>,
) -> Result<Json<StepOutcome>> {
    request.validate()?;
    Ok(Json(
        state
            .tours
            .go_to_step(&request.user_id, request.step_order)
            .await?,
    ))
}

#[derive(Debug, Deserialize, Validate)]
pub struct NavigateRequest {
    #[validate(length(min = 1, max = 128))]
    pub user_id: String,
    #[validate(length(min = 1, max = 200))]
    pub page_name: String,
}

/// Move to the first step on a page
pub async fn navigate_to_page(
    State(state): State<AppState>,
    Json(request): Json<NavigateRequest>,
) -> Result<Json<StepOutcome>> {
    request.validate()?;
    Ok(Json(
        state
            .tours
            .navigate_to_page(&request.user_id, &request.page_name)
            .await?,
    ))
}

/// Current tour position
pub async fn tour_progress(
    State(state): State<AppState>,
    Query(params): Query<UserQuery>,
) -> Result<Json<ProgressReport>> {
    params.validate()?;
    Ok(Json(state.tours.progress(&params.user_id).await?))
}

/// All tour steps in order
pub async fn tour_steps(State(state): State<AppState>) -> Result<Json<Vec<TourStep>>> {
    Ok(Json(state.tours.steps().await?))
}

pub async fn tour_analytics(State(state): State<AppState>) -> Result<Json<TourAnalytics>> {
    Ok(Json(state.tours.analytics().await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct QuizAnswerRequest {
    #[validate(length(min = 1, max = 128))]
    pub user_id: String,
    pub quiz_id: u64,
    #[validate(length(min = 1, max = 500))]
    pub answer: String,
}

/// Answer a quiz question
pub async fn answer_quiz(
    State(state): State<AppState>,
    Json(request): Json<QuizAnswerRequest>,
) -> Result<Json<QuizFeedback>> {
    request.validate()?;
    Ok(Json(
        state
            .tours
            .answer_quiz(&request.user_id, request.quiz_id, &request.answer)
            .await?,
    ))
}

#[derive(Debug, Serialize)]
pub struct PointsResponse {
    pub user_id: String,
    pub points: u32,
}

pub async fn user_points(
    State(state): State<AppState>,
    Query(params): Query<UserQuery>,
) -> Result<Json<PointsResponse>> {
    params.validate()?;
    let points = state.tours.points(&params.user_id).await?;
    Ok(Json(PointsResponse {
        user_id: params.user_id,
        points,
    }))
}

/// Fetch one content document of the given type
pub async fn get_content(
    State(state): State<AppState>,
    Path((content_type, id)): Path<(String, DocumentId)>,
) -> Result<Json<Document>> {
    let content_type = ContentType::from_str(&content_type)
        .map_err(|_| AppError::Validation(format!("Unknown content type: {}", content_type)))?;

    state
        .index
        .get(id)
        .filter(|doc| doc.content_type == content_type)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("{} content {} not found", content_type, id)))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub phase: SearchPhase,
    pub total: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Debug, Serialize)]
pub struct SearchHit {
    pub id: DocumentId,
    pub title: String,
    pub content_type: ContentType,
    pub combined_rank: f32,
    pub scores: RelevanceScores,
}

/// Retrieval results with their score breakdown
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<SearchResponse>> {
    let RetrievalOutcome { documents, phase } = state.retriever.search(&params.q).await?;

    let results: Vec<SearchHit> = documents
        .into_iter()
        .map(|scored| SearchHit {
            id: scored.document.id,
            title: scored.document.title.clone(),
            content_type: scored.document.content_type,
            combined_rank: scored.combined_rank(),
            scores: scored.scores,
        })
        .collect();

    Ok(Json(SearchResponse {
        query: params.q,
        phase,
        total: results.len(),
        results,
    }))
}

/// Ask the concierge
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatReply>> {
    Ok(Json(state.assistant.respond(request).await?))
}

/// Detailed follow-up to the last answer
pub async fn more_info(
    State(state): State<AppState>,
    Json(request): Json<UserRequest>,
) -> Result<Json<MoreInfoReply>> {
    request.validate()?;
    Ok(Json(state.assistant.more_info(&request.user_id).await?))
}

/// Prometheus metrics endpoint
///
/// Returns metrics in Prometheus text exposition format
pub async fn metrics() -> (StatusCode, String) {
    let metrics = crate::metrics::gather_metrics();
    (StatusCode::OK, metrics)
}
