//! Encoder: the single seam between the matching engine and the embedding model.
//!
//! Every text the engine compares goes through an `Encoder`. The real backend is
//! `HttpEncoder` (an embedding server); tests use the deterministic `KeywordEncoder`.
//!
//! One encoder is built per process at startup and shared as `Arc<dyn Encoder>`.

use async_trait::async_trait;
use serde::Serialize;

use crate::errors::EngineError;

pub mod http;

#[cfg(test)]
pub mod fake;

pub use http::HttpEncoder;

/// Fixed-length vector produced by the encoder.
pub type Embedding = Vec<f32>;

/// Static description of the loaded model, for health and model-info surfaces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EncoderInfo {
    pub name: String,
    pub dimension: usize,
}

/// Maps text to embeddings.
///
/// Implementations normalize the input with [`normalize_text`] and fail with
/// `EngineError::Encoding` when nothing is left, or `EngineError::ModelNotReady`
/// before warm-up has finished.
#[async_trait]
pub trait Encoder: Send + Sync {
    async fn encode(&self, text: &str) -> Result<Embedding, EngineError>;

    /// Batch form, used when building the corpus and for skill phrases.
    /// Output order matches input order.
    async fn encode_many(&self, texts: &[String]) -> Result<Vec<Embedding>, EngineError>;

    fn is_ready(&self) -> bool;

    fn info(&self) -> EncoderInfo;
}

/// Trims, lower-cases and collapses internal whitespace.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Normalizes and rejects text that is empty after normalization.
pub(crate) fn normalized_or_err(text: &str) -> Result<String, EngineError> {
    let normalized = normalize_text(text);
    if normalized.is_empty() {
        return Err(EngineError::Encoding(
            "cannot encode empty or whitespace-only text".to_string(),
        ));
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_whitespace_and_case() {
        assert_eq!(normalize_text("  Desenvolvedor   PYTHON \n"), "desenvolvedor python");
    }

    #[test]
    fn test_normalize_keeps_accents() {
        assert_eq!(normalize_text("Médico Cardiologista"), "médico cardiologista");
    }

    #[test]
    fn test_whitespace_only_is_encoding_error() {
        assert!(matches!(
            normalized_or_err(" \t\n "),
            Err(EngineError::Encoding(_))
        ));
    }
}
