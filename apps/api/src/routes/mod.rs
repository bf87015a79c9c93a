pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::matching::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/health/live", get(health::health_handler))
        .route("/health/ready", get(health::ready_handler))
        // Résumé analysis
        .route("/api/v1/analyze-resume", post(handlers::handle_analyze))
        .route("/api/v1/extract", post(handlers::handle_extract))
        .route(
            "/api/v1/infer-occupation",
            post(handlers::handle_infer_occupation),
        )
        .route(
            "/api/v1/infer-primary-occupation",
            post(handlers::handle_infer_primary),
        )
        .route("/api/v1/match-profile", post(handlers::handle_match_profile))
        // Skill terms
        .route("/api/v1/skills/match", post(handlers::handle_match_skills))
        .route(
            "/api/v1/skills/similarity",
            post(handlers::handle_similarity),
        )
        .route("/api/v1/skills/model-info", get(handlers::handle_model_info))
        // Corpus lookups
        .route(
            "/api/v1/occupations",
            get(handlers::handle_search_occupations),
        )
        .route(
            "/api/v1/occupations/:code",
            get(handlers::handle_get_occupation),
        )
        .with_state(state)
}
