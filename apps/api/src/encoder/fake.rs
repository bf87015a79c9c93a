//! Deterministic keyword-axis encoder for tests.
//!
//! Each axis owns a set of trigger words; a text's vector holds, per axis, the
//! number of its tokens that are triggers. A final residual axis is 1.0 when no
//! trigger fires, so unrelated text still has a non-zero vector with cosine 0
//! against every keyword-bearing vector.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{normalized_or_err, Embedding, Encoder, EncoderInfo};
use crate::errors::EngineError;

pub struct KeywordEncoder {
    axes: Vec<Vec<String>>,
    failing: HashSet<String>,
    ready: AtomicBool,
    calls: AtomicUsize,
}

impl KeywordEncoder {
    pub fn new(axes: &[&[&str]]) -> Self {
        Self {
            axes: axes
                .iter()
                .map(|words| words.iter().map(|w| w.to_string()).collect())
                .collect(),
            failing: HashSet::new(),
            ready: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
        }
    }

    /// Encoding any of these (normalized) texts fails with `EngineError::Encoding`.
    pub fn failing_on(mut self, texts: &[&str]) -> Self {
        self.failing = texts.iter().map(|t| super::normalize_text(t)).collect();
        self
    }

    pub fn not_ready(self) -> Self {
        self.ready.store(false, Ordering::SeqCst);
        self
    }

    /// Number of texts passed through the model so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn embed(&self, text: &str) -> Result<Embedding, EngineError> {
        if !self.is_ready() {
            return Err(EngineError::ModelNotReady);
        }
        let text = normalized_or_err(text)?;
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(&text) {
            return Err(EngineError::Encoding(format!("model rejected '{text}'")));
        }

        let tokens: Vec<&str> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();

        let mut vector: Embedding = self
            .axes
            .iter()
            .map(|words| {
                tokens
                    .iter()
                    .filter(|t| words.iter().any(|w| w.as_str() == **t))
                    .count() as f32
            })
            .collect();
        let residual = if vector.iter().all(|v| *v == 0.0) { 1.0 } else { 0.0 };
        vector.push(residual);
        Ok(vector)
    }
}

#[async_trait]
impl Encoder for KeywordEncoder {
    async fn encode(&self, text: &str) -> Result<Embedding, EngineError> {
        self.embed(text)
    }

    async fn encode_many(&self, texts: &[String]) -> Result<Vec<Embedding>, EngineError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn info(&self) -> EncoderInfo {
        EncoderInfo {
            name: "keyword-axes".to_string(),
            dimension: self.axes.len() + 1,
        }
    }
}
