use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health, GET /health/live
/// Process is up. Says nothing about the model.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "matcher-api"
    }))
}

/// GET /health/ready
/// 503 until the encoder has warmed up.
pub async fn ready_handler(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let info = state.analyzer.model_info();
    let status = if info.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(json!({
            "status": if info.ready { "ready" } else { "warming_up" },
            "model": state.config.embedding_model,
            "dimension": info.dimension,
            "occupations": info.occupations,
            "skills": info.skills
        })),
    )
}
