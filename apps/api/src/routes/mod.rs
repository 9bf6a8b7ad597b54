pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::generation::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Prompt library
        .route("/api/v1/prompts", post(handlers::handle_create_prompt))
        .route("/api/v1/prompts/seed", post(handlers::handle_seed_prompts))
        .route("/api/v1/prompts/:id", put(handlers::handle_update_prompt))
        .route(
            "/api/v1/prompts/:id/deactivate",
            post(handlers::handle_deactivate_prompt),
        )
        // Topics and ideas
        .route("/api/v1/topics", post(handlers::handle_create_topic))
        .route(
            "/api/v1/topics/:id/ideas",
            post(handlers::handle_generate_ideas),
        )
        .route(
            "/api/v1/ideas",
            get(handlers::handle_list_ideas).delete(handlers::handle_clear_ideas),
        )
        // Drafts
        .route(
            "/api/v1/ideas/:id/drafts",
            post(handlers::handle_generate_drafts),
        )
        .route(
            "/api/v1/ideas/:id/mark-used",
            post(handlers::handle_mark_idea_used),
        )
        .route(
            "/api/v1/drafts/:id/refine",
            post(handlers::handle_refine_draft),
        )
        .route(
            "/api/v1/drafts/:id/status",
            post(handlers::handle_transition_status),
        )
        .with_state(state)
}
