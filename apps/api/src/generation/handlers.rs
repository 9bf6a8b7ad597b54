//! Axum route handlers for the content API.
//!
//! Authentication happens upstream; the caller's user id arrives in the body or
//! the query string and is passed through to every ownership check.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::persistence::DraftBatchOutcome;
use crate::generation::prompt_library::PromptChanges;
use crate::models::draft::{Draft, DraftStatus, PublishMetadata};
use crate::models::idea::Idea;
use crate::models::prompt::{Prompt, PromptKind};
use crate::models::topic::Topic;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct UserIdBody {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct CreatePromptRequest {
    pub user_id: Uuid,
    pub name: String,
    pub kind: PromptKind,
    pub template: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePromptRequest {
    pub user_id: Uuid,
    #[serde(flatten)]
    pub changes: PromptChanges,
}

#[derive(Debug, Deserialize)]
pub struct CreateTopicRequest {
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub related_topics: Vec<String>,
    pub priority: Option<i32>,
    pub ideas_count: Option<i32>,
    pub prompt_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RefineRequest {
    pub user_id: Uuid,
    pub instruction: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub user_id: Uuid,
    pub status: DraftStatus,
    pub external_post_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IdeaListResponse {
    pub ideas: Vec<Idea>,
}

#[derive(Debug, Serialize)]
pub struct ClearIdeasResponse {
    pub deleted: u64,
}

#[derive(Debug, Serialize)]
pub struct SeedPromptsResponse {
    pub seeded: Vec<Prompt>,
}

// ────────────────────────────────────────────────────────────────────────────
// Prompts
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/prompts
pub async fn handle_create_prompt(
    State(state): State<AppState>,
    Json(req): Json<CreatePromptRequest>,
) -> Result<(StatusCode, Json<Prompt>), AppError> {
    let prompt = state
        .prompts
        .create_prompt(req.user_id, &req.name, req.kind, &req.template)
        .await?;
    Ok((StatusCode::CREATED, Json(prompt)))
}

/// PUT /api/v1/prompts/:id
pub async fn handle_update_prompt(
    State(state): State<AppState>,
    Path(prompt_id): Path<Uuid>,
    Json(req): Json<UpdatePromptRequest>,
) -> Result<Json<Prompt>, AppError> {
    let prompt = state
        .prompts
        .update_prompt(req.user_id, prompt_id, req.changes)
        .await?;
    Ok(Json(prompt))
}

/// POST /api/v1/prompts/:id/deactivate
pub async fn handle_deactivate_prompt(
    State(state): State<AppState>,
    Path(prompt_id): Path<Uuid>,
    Json(req): Json<UserIdBody>,
) -> Result<Json<Prompt>, AppError> {
    let prompt = state.prompts.deactivate_prompt(req.user_id, prompt_id).await?;
    Ok(Json(prompt))
}

/// POST /api/v1/prompts/seed
///
/// Idempotent: only kinds the user has no active prompt for are seeded.
pub async fn handle_seed_prompts(
    State(state): State<AppState>,
    Json(req): Json<UserIdBody>,
) -> Result<Json<SeedPromptsResponse>, AppError> {
    let seeded = state.prompts.seed_default_prompts(req.user_id).await?;
    Ok(Json(SeedPromptsResponse { seeded }))
}

// ────────────────────────────────────────────────────────────────────────────
// Topics and ideas
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/topics
pub async fn handle_create_topic(
    State(state): State<AppState>,
    Json(req): Json<CreateTopicRequest>,
) -> Result<(StatusCode, Json<Topic>), AppError> {
    let mut topic = Topic::new(req.user_id, req.name.trim());
    topic.description = req.description;
    topic.category = req.category;
    topic.keywords = req.keywords;
    topic.related_topics = req.related_topics;
    if let Some(priority) = req.priority {
        topic.priority = priority;
    }
    if let Some(ideas_count) = req.ideas_count {
        topic.ideas_count = ideas_count;
    }
    topic.prompt_name = req.prompt_name.filter(|name| !name.trim().is_empty());

    let topic = state
        .generation
        .create_topic(&state.request_context(), topic)
        .await?;
    Ok((StatusCode::CREATED, Json(topic)))
}

/// POST /api/v1/topics/:id/ideas
pub async fn handle_generate_ideas(
    State(state): State<AppState>,
    Path(topic_id): Path<Uuid>,
    Json(req): Json<UserIdBody>,
) -> Result<(StatusCode, Json<IdeaListResponse>), AppError> {
    let ideas = state
        .generation
        .generate_ideas(&state.request_context(), req.user_id, topic_id)
        .await?;
    Ok((StatusCode::CREATED, Json(IdeaListResponse { ideas })))
}

/// GET /api/v1/ideas?user_id=
pub async fn handle_list_ideas(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<IdeaListResponse>, AppError> {
    let ideas = state
        .generation
        .list_ideas(&state.request_context(), params.user_id)
        .await?;
    Ok(Json(IdeaListResponse { ideas }))
}

/// DELETE /api/v1/ideas?user_id=
pub async fn handle_clear_ideas(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ClearIdeasResponse>, AppError> {
    let deleted = state
        .generation
        .clear_ideas(&state.request_context(), params.user_id)
        .await?;
    Ok(Json(ClearIdeasResponse { deleted }))
}

// ────────────────────────────────────────────────────────────────────────────
// Drafts
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/ideas/:id/drafts
///
/// 201 with `outcome: "complete"`, or 207 with `outcome: "partial_success"` when
/// the drafts were saved but the idea could not be marked used. In that case the
/// caller retries `POST /api/v1/ideas/:id/mark-used`, not the generation.
pub async fn handle_generate_drafts(
    State(state): State<AppState>,
    Path(idea_id): Path<Uuid>,
    Json(req): Json<UserIdBody>,
) -> Result<(StatusCode, Json<DraftBatchOutcome>), AppError> {
    let outcome = state
        .generation
        .generate_drafts(&state.request_context(), req.user_id, idea_id)
        .await?;
    let status = if outcome.is_complete() {
        StatusCode::CREATED
    } else {
        StatusCode::MULTI_STATUS
    };
    Ok((status, Json(outcome)))
}

/// POST /api/v1/ideas/:id/mark-used
pub async fn handle_mark_idea_used(
    State(state): State<AppState>,
    Path(idea_id): Path<Uuid>,
    Json(req): Json<UserIdBody>,
) -> Result<Json<Idea>, AppError> {
    let idea = state
        .generation
        .retry_mark_idea_used(&state.request_context(), req.user_id, idea_id)
        .await?;
    Ok(Json(idea))
}

/// POST /api/v1/drafts/:id/refine
pub async fn handle_refine_draft(
    State(state): State<AppState>,
    Path(draft_id): Path<Uuid>,
    Json(req): Json<RefineRequest>,
) -> Result<Json<Draft>, AppError> {
    let draft = state
        .generation
        .refine_draft(&state.request_context(), req.user_id, draft_id, &req.instruction)
        .await?;
    Ok(Json(draft))
}

/// POST /api/v1/drafts/:id/status
pub async fn handle_transition_status(
    State(state): State<AppState>,
    Path(draft_id): Path<Uuid>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<Draft>, AppError> {
    if req.external_post_id.is_some() && req.status != DraftStatus::Published {
        return Err(AppError::Validation(
            "external_post_id is only accepted when publishing".to_string(),
        ));
    }
    let publish = (req.status == DraftStatus::Published).then(|| PublishMetadata {
        external_post_id: req.external_post_id,
        published_at: Some(Utc::now()),
    });
    let draft = state
        .generation
        .transition_draft_status(&state.request_context(), req.user_id, draft_id, req.status, publish)
        .await?;
    Ok(Json(draft))
}
