//! Similarity search: cosine top-k over (label, vector) pairs, plus confidence banding.
//!
//! Scores are "higher is better" everywhere. Anything below the caller's threshold
//! is dropped, so an excluded candidate never carries a confidence label.

use serde::{Deserialize, Serialize};

use crate::errors::EngineError;

/// Coarse label derived from a score. Below-threshold scores have no band at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Cut points for [`Confidence`]. Configuration, not constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBands {
    pub high: f32,
    pub medium: f32,
}

impl Default for ConfidenceBands {
    fn default() -> Self {
        Self {
            high: 0.85,
            medium: 0.70,
        }
    }
}

impl ConfidenceBands {
    pub fn is_monotonic(&self) -> bool {
        self.high.is_finite()
            && self.medium.is_finite()
            && self.high >= self.medium
            && (-1.0..=1.0).contains(&self.high)
            && (-1.0..=1.0).contains(&self.medium)
    }

    /// `None` means the score is below threshold and the candidate is excluded.
    pub fn band(&self, score: f32, threshold: f32) -> Option<Confidence> {
        if score < threshold {
            None
        } else if score >= self.high {
            Some(Confidence::High)
        } else if score >= self.medium {
            Some(Confidence::Medium)
        } else {
            Some(Confidence::Low)
        }
    }
}

/// Cosine similarity in [-1, 1]. Zero vectors score 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0_f32;
    let mut norm_a = 0.0_f32;
    let mut norm_b = 0.0_f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        0.0
    } else {
        (dot / denom).clamp(-1.0, 1.0)
    }
}

pub fn validate_top_k(top_k: usize) -> Result<(), EngineError> {
    if top_k == 0 {
        return Err(EngineError::InvalidParameter(
            "top_k must be at least 1".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_threshold(threshold: f32) -> Result<(), EngineError> {
    if !threshold.is_finite() || !(-1.0..=1.0).contains(&threshold) {
        return Err(EngineError::InvalidParameter(format!(
            "threshold must be within [-1, 1], got {threshold}"
        )));
    }
    Ok(())
}

/// Returns at most `top_k` `(label, score)` pairs with `score >= threshold`,
/// sorted by score descending. Equal scores keep candidate input order.
pub fn search<'a, L>(
    query: &[f32],
    candidates: impl IntoIterator<Item = (L, &'a [f32])>,
    threshold: f32,
    top_k: usize,
) -> Result<Vec<(L, f32)>, EngineError> {
    validate_top_k(top_k)?;
    validate_threshold(threshold)?;

    let mut hits = Vec::new();
    for (label, vector) in candidates {
        if vector.len() != query.len() {
            return Err(EngineError::InvalidParameter(format!(
                "query has dimension {}, candidate has {}",
                query.len(),
                vector.len()
            )));
        }
        let score = cosine_similarity(query, vector);
        if score >= threshold {
            hits.push((label, score));
        }
    }

    // `sort_by` is stable: ties stay in input order.
    hits.sort_by(|a, b| b.1.total_cmp(&a.1));
    hits.truncate(top_k);
    Ok(hits)
}
