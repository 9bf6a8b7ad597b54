use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::generation::template::TemplateError;
use crate::generation::validator::ValidationError;
use crate::llm_client::LlmError;
use crate::models::draft::DraftStatus;
use crate::models::prompt::PromptKind;
use crate::repository::RepositoryError;

/// Every way a generation workflow can end without producing its artifacts.
///
/// Partial success is not here: a draft batch that was saved but whose idea
/// could not be marked is reported through `DraftBatchOutcome`.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("No usable {kind} prompt found (requested name: {name:?})")]
    PromptNotFound {
        name: Option<String>,
        kind: PromptKind,
    },

    #[error("Template references unknown variable '{name}' for {kind} prompts")]
    UnknownVariable { name: String, kind: PromptKind },

    #[error("LLM response could not be used: {0}")]
    LlmResponseInvalid(String),

    #[error("LLM returned no ideas that passed validation")]
    NoValidIdeas,

    #[error("Expected 5 posts and 1 article, got {posts} posts and {articles} articles")]
    InsufficientDrafts { posts: usize, articles: usize },

    #[error("Generated {draft_type} #{index} failed validation: {source}")]
    DraftValidationFailed {
        draft_type: &'static str,
        index: usize,
        #[source]
        source: ValidationError,
    },

    #[error("Refined content failed validation: {0}")]
    RefinedContentInvalid(#[source] ValidationError),

    #[error("Idea {0} has already been used")]
    IdeaAlreadyUsed(uuid::Uuid),

    #[error("Idea {0} has expired")]
    IdeaExpired(uuid::Uuid),

    #[error("Resource belongs to a different user")]
    OwnershipMismatch,

    #[error("Draft in status '{status}' cannot be refined")]
    CannotRefine { status: DraftStatus },

    #[error("Draft already has the maximum of {limit} refinements")]
    RefinementLimitExceeded { limit: usize },

    #[error("Invalid status transition from '{from}' to '{to}'")]
    InvalidTransition { from: DraftStatus, to: DraftStatus },

    #[error("Concurrent modification detected: {0}")]
    ConcurrentModification(String),

    #[error("Persistence failed: {0}")]
    PersistenceFailed(String),

    #[error("LLM call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Request was cancelled")]
    Cancelled,

    #[error("Request deadline exceeded")]
    DeadlineExceeded,
}

impl GenerationError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        GenerationError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Unusable model output and lost optimistic races are worth one more attempt.
    /// Business-rule violations, cancellation and storage failures are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GenerationError::LlmResponseInvalid(_)
                | GenerationError::NoValidIdeas
                | GenerationError::InsufficientDrafts { .. }
                | GenerationError::DraftValidationFailed { .. }
                | GenerationError::RefinedContentInvalid(_)
                | GenerationError::ConcurrentModification(_)
        )
    }
}

impl From<RepositoryError> for GenerationError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(msg) => GenerationError::ConcurrentModification(msg),
            other => GenerationError::PersistenceFailed(other.to_string()),
        }
    }
}

impl From<TemplateError> for GenerationError {
    fn from(err: TemplateError) -> Self {
        match err {
            TemplateError::UnknownVariable { name, kind } => {
                GenerationError::UnknownVariable { name, kind }
            }
        }
    }
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        AppError::Generation(err.into())
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Generation(err.into())
    }
}

fn generation_status(err: &GenerationError) -> (StatusCode, &'static str) {
    use GenerationError::*;
    match err {
        Validation(_) | UnknownVariable { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        PromptNotFound { .. } => (StatusCode::NOT_FOUND, "PROMPT_NOT_FOUND"),
        LlmResponseInvalid(_) => (StatusCode::UNPROCESSABLE_ENTITY, "LLM_RESPONSE_INVALID"),
        NoValidIdeas => (StatusCode::UNPROCESSABLE_ENTITY, "NO_VALID_IDEAS"),
        InsufficientDrafts { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "INSUFFICIENT_DRAFTS"),
        DraftValidationFailed { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, "DRAFT_VALIDATION_FAILED")
        }
        RefinedContentInvalid(_) => (StatusCode::UNPROCESSABLE_ENTITY, "REFINED_CONTENT_INVALID"),
        IdeaAlreadyUsed(_) => (StatusCode::CONFLICT, "IDEA_ALREADY_USED"),
        IdeaExpired(_) => (StatusCode::CONFLICT, "IDEA_EXPIRED"),
        OwnershipMismatch => (StatusCode::FORBIDDEN, "OWNERSHIP_MISMATCH"),
        CannotRefine { .. } => (StatusCode::CONFLICT, "CANNOT_REFINE"),
        RefinementLimitExceeded { .. } => (StatusCode::CONFLICT, "REFINEMENT_LIMIT_EXCEEDED"),
        InvalidTransition { .. } => (StatusCode::CONFLICT, "INVALID_TRANSITION"),
        ConcurrentModification(_) => (StatusCode::CONFLICT, "CONCURRENT_MODIFICATION"),
        PersistenceFailed(_) => (StatusCode::INTERNAL_SERVER_ERROR, "PERSISTENCE_FAILED"),
        Llm(_) => (StatusCode::BAD_GATEWAY, "LLM_ERROR"),
        Cancelled => (StatusCode::REQUEST_TIMEOUT, "CANCELLED"),
        DeadlineExceeded => (StatusCode::GATEWAY_TIMEOUT, "DEADLINE_EXCEEDED"),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Generation(err) => {
                let (status, code) = generation_status(err);
                let message = match err {
                    GenerationError::PersistenceFailed(msg) => {
                        tracing::error!("Persistence error: {msg}");
                        "A storage error occurred".to_string()
                    }
                    GenerationError::Llm(e) => {
                        tracing::error!("LLM error: {e}");
                        "An AI processing error occurred".to_string()
                    }
                    other => other.to_string(),
                };
                (status, code, message)
            }
        };

        let retryable = matches!(&self, AppError::Generation(e) if e.is_retryable());

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
                "retryable": retryable
            }
        }));

        (status, body).into_response()
    }
}
