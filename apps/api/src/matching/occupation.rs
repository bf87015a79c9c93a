use serde::Serialize;

use crate::encoder::Encoder;
use crate::errors::EngineError;
use crate::matching::corpus::ReferenceCorpus;
use crate::matching::models::MatchCandidate;
use crate::matching::similarity::{validate_threshold, validate_top_k, ConfidenceBands};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OccupationInference {
    pub primary: Option<MatchCandidate>,
    pub ranked: Vec<MatchCandidate>,
}

/// Ranks CBO occupations against a whole text. One encoder call per inference.
pub struct OccupationInferer<'a> {
    corpus: &'a ReferenceCorpus,
    encoder: &'a dyn Encoder,
    bands: ConfidenceBands,
}

impl<'a> OccupationInferer<'a> {
    pub fn new(corpus: &'a ReferenceCorpus, encoder: &'a dyn Encoder, bands: ConfidenceBands) -> Self {
        Self {
            corpus,
            encoder,
            bands,
        }
    }

    pub async fn infer(
        &self,
        text: &str,
        threshold: f32,
        top_k: usize,
    ) -> Result<OccupationInference, EngineError> {
        validate_threshold(threshold)?;
        validate_top_k(top_k)?;

        let query = self.encoder.encode(text).await?;
        self.rank(&query, threshold, top_k)
    }

    /// Ranking over an already-encoded query.
    pub fn rank(
        &self,
        query: &[f32],
        threshold: f32,
        top_k: usize,
    ) -> Result<OccupationInference, EngineError> {
        let ranked: Vec<MatchCandidate> = self
            .corpus
            .occupation_index()
            .search_collapsed(query, threshold, top_k)?
            .into_iter()
            .filter_map(|(variant, score)| {
                let confidence = self.bands.band(score, threshold)?;
                Some(MatchCandidate {
                    label: self.corpus.occupation_at(variant.entry).label(),
                    raw_text_matched: variant.text.clone(),
                    source: None,
                    score,
                    confidence,
                })
            })
            .collect();

        Ok(OccupationInference {
            primary: ranked.first().cloned(),
            ranked,
        })
    }
}
