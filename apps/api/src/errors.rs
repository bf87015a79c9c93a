use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errors raised by the matching engine and its collaborators (corpus, encoder).
/// Never retried internally; callers decide what to do with them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Request-level input problem: empty/short text, bad threshold or top_k.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Caller broke a matcher contract (top_k == 0, threshold outside [-1, 1]).
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Malformed reference data. Fatal at startup.
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// The embedding model failed on a given string.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// The encoder has not finished warming up. Retryable by the caller.
    #[error("Embedding model is not ready")]
    ModelNotReady,
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Engine(EngineError::InvalidInput(msg))
            | AppError::Engine(EngineError::InvalidParameter(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Engine(EngineError::ModelNotReady) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "MODEL_NOT_READY",
                "The embedding model is still warming up, retry shortly".to_string(),
            ),
            AppError::Engine(EngineError::Encoding(msg)) => {
                tracing::error!("Encoding error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "ENCODING_ERROR",
                    "The embedding model failed to encode the text".to_string(),
                )
            }
            AppError::Engine(EngineError::Dataset(msg)) => {
                tracing::error!("Dataset error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATASET_ERROR",
                    "The reference dataset is unavailable".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_maps_to_bad_request() {
        let response = AppError::from(EngineError::InvalidInput("too short".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_model_not_ready_maps_to_service_unavailable() {
        let response = AppError::from(EngineError::ModelNotReady).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_encoding_maps_to_bad_gateway() {
        let response = AppError::from(EngineError::Encoding("boom".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let response = AppError::NotFound("occupation 999999".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
