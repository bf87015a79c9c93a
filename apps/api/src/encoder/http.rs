//! HTTP encoder: embeddings from an Ollama-compatible embedding server.
//!
//! Wire format: `POST {base_url}/api/embed` with `{"model", "input": [..]}`,
//! answered by `{"embeddings": [[f32, ..], ..]}` in input order.
//!
//! The encoder starts NOT ready. `warm_up()` sends a probe, records the model's
//! dimension and flips readiness; until then every call returns `ModelNotReady`.
//! No retries here: failures surface as `EngineError::Encoding` to the caller.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::{normalized_or_err, Embedding, Encoder, EncoderInfo};
use crate::errors::EngineError;

/// Maximum texts per request to the embedding server.
const BATCH_SIZE: usize = 32;
const WARM_UP_PROBE: &str = "warm-up probe";

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("expected {expected} embeddings, server returned {got}")]
    CountMismatch { expected: usize, got: usize },

    #[error("expected dimension {expected}, server returned {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("server returned an empty embedding")]
    EmptyEmbedding,
}

impl From<EmbeddingError> for EngineError {
    fn from(e: EmbeddingError) -> Self {
        EngineError::Encoding(e.to_string())
    }
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

pub struct HttpEncoder {
    client: Client,
    endpoint: String,
    model: String,
    ready: AtomicBool,
    dimension: OnceLock<usize>,
}

impl HttpEncoder {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self, EmbeddingError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/api/embed", base_url.trim_end_matches('/')),
            model: model.to_string(),
            ready: AtomicBool::new(false),
            dimension: OnceLock::new(),
        })
    }

    /// Sends one probe through the model. On success the encoder becomes ready
    /// and its dimension is fixed for the rest of the process.
    pub async fn warm_up(&self) -> Result<usize, EngineError> {
        let probe = [WARM_UP_PROBE.to_string()];
        let embeddings = self.request(&probe).await?;
        let dimension = embeddings
            .first()
            .map(Vec::len)
            .filter(|d| *d > 0)
            .ok_or(EmbeddingError::EmptyEmbedding)?;

        let dimension = *self.dimension.get_or_init(|| dimension);
        self.ready.store(true, Ordering::Release);
        info!("Embedding model '{}' ready (dimension {dimension})", self.model);
        Ok(dimension)
    }

    async fn request(&self, input: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&EmbedRequest {
                model: &self.model,
                input,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!("Embedding server returned {status}: {message}");
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: EmbedResponse = response.json().await?;
        if body.embeddings.len() != input.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: input.len(),
                got: body.embeddings.len(),
            });
        }

        if let Some(&expected) = self.dimension.get() {
            if let Some(bad) = body.embeddings.iter().find(|e| e.len() != expected) {
                return Err(EmbeddingError::DimensionMismatch {
                    expected,
                    got: bad.len(),
                });
            }
        }

        debug!("Encoded {} texts", input.len());
        Ok(body.embeddings)
    }
}

#[async_trait]
impl Encoder for HttpEncoder {
    async fn encode(&self, text: &str) -> Result<Embedding, EngineError> {
        if !self.is_ready() {
            return Err(EngineError::ModelNotReady);
        }
        let input = [normalized_or_err(text)?];
        let mut embeddings = self.request(&input).await?;
        embeddings
            .pop()
            .ok_or_else(|| EmbeddingError::EmptyEmbedding.into())
    }

    async fn encode_many(&self, texts: &[String]) -> Result<Vec<Embedding>, EngineError> {
        if !self.is_ready() {
            return Err(EngineError::ModelNotReady);
        }
        let normalized = texts
            .iter()
            .map(|t| normalized_or_err(t))
            .collect::<Result<Vec<_>, _>>()?;

        let mut embeddings = Vec::with_capacity(normalized.len());
        for batch in normalized.chunks(BATCH_SIZE) {
            embeddings.extend(self.request(batch).await?);
        }
        Ok(embeddings)
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    fn info(&self) -> EncoderInfo {
        EncoderInfo {
            name: self.model.clone(),
            dimension: self.dimension.get().copied().unwrap_or(0),
        }
    }
}
