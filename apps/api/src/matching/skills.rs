//! Skill extraction: lexical candidates filtered semantically against the skill index.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::encoder::{Embedding, Encoder};
use crate::errors::EngineError;
use crate::matching::candidates::generate_candidates;
use crate::matching::corpus::ReferenceCorpus;
use crate::matching::models::MatchCandidate;
use crate::matching::similarity::{validate_threshold, validate_top_k, ConfidenceBands};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillExtraction {
    pub skills: Vec<MatchCandidate>,
    /// Candidate phrases produced by the lexical pass.
    pub total_skills_found: usize,
    /// Candidate phrases with at least one skill at or above threshold.
    pub successful_matches: usize,
    pub match_rate: f32,
}

impl SkillExtraction {
    pub fn empty() -> Self {
        Self {
            skills: Vec::new(),
            total_skills_found: 0,
            successful_matches: 0,
            match_rate: 0.0,
        }
    }
}

pub struct SkillExtractor<'a> {
    corpus: &'a ReferenceCorpus,
    encoder: &'a dyn Encoder,
    bands: ConfidenceBands,
}

impl<'a> SkillExtractor<'a> {
    pub fn new(corpus: &'a ReferenceCorpus, encoder: &'a dyn Encoder, bands: ConfidenceBands) -> Self {
        Self {
            corpus,
            encoder,
            bands,
        }
    }

    pub async fn extract(
        &self,
        text: &str,
        threshold: f32,
        top_k_per_candidate: usize,
    ) -> Result<SkillExtraction, EngineError> {
        validate_threshold(threshold)?;
        validate_top_k(top_k_per_candidate)?;

        let phrases = generate_candidates(text);
        debug!("Skill candidates: {phrases:?}");
        self.match_phrases(&phrases, threshold, top_k_per_candidate)
            .await
    }

    /// Matches already-generated phrases. A phrase the encoder rejects counts
    /// towards `total_skills_found` but never towards `successful_matches`.
    pub async fn match_phrases(
        &self,
        phrases: &[String],
        threshold: f32,
        top_k_per_candidate: usize,
    ) -> Result<SkillExtraction, EngineError> {
        if phrases.is_empty() {
            return Ok(SkillExtraction::empty());
        }

        let embeddings = self.encode_phrases(phrases).await?;

        let mut merged: Vec<MatchCandidate> = Vec::new();
        let mut position: HashMap<String, usize> = HashMap::new();
        let mut successful_matches = 0;

        for (phrase, embedding) in phrases.iter().zip(&embeddings) {
            let Some(embedding) = embedding else {
                continue;
            };
            let hits = self.rank_phrase(phrase, embedding, threshold, top_k_per_candidate)?;
            if !hits.is_empty() {
                successful_matches += 1;
            }

            for hit in hits {
                let key = hit.canonical_name().unwrap_or_default().to_string();
                match position.get(&key) {
                    Some(&i) if merged[i].score < hit.score => merged[i] = hit,
                    Some(_) => {}
                    None => {
                        position.insert(key, merged.len());
                        merged.push(hit);
                    }
                }
            }
        }

        // Stable: equal scores keep first-seen order.
        merged.sort_by(|a, b| b.score.total_cmp(&a.score));

        Ok(SkillExtraction {
            skills: merged,
            total_skills_found: phrases.len(),
            successful_matches,
            match_rate: successful_matches as f32 / phrases.len() as f32,
        })
    }

    /// One slot per phrase, in input order. `None` marks a phrase the encoder
    /// rejected; the batch is retried phrase by phrase to find it.
    pub async fn encode_phrases(
        &self,
        phrases: &[String],
    ) -> Result<Vec<Option<Embedding>>, EngineError> {
        match self.encoder.encode_many(phrases).await {
            Ok(embeddings) if embeddings.len() == phrases.len() => {
                return Ok(embeddings.into_iter().map(Some).collect())
            }
            Ok(embeddings) => warn!(
                "Encoder returned {} vectors for {} phrases, retrying one by one",
                embeddings.len(),
                phrases.len()
            ),
            Err(EngineError::Encoding(e)) => {
                warn!("Batch phrase encoding failed ({e}), retrying one by one")
            }
            Err(e) => return Err(e),
        }

        let mut out = Vec::with_capacity(phrases.len());
        for phrase in phrases {
            match self.encoder.encode(phrase).await {
                Ok(embedding) => out.push(Some(embedding)),
                Err(EngineError::Encoding(e)) => {
                    warn!("Dropping skill candidate '{phrase}': {e}");
                    out.push(None);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(out)
    }

    /// Best `top_k` skills for one encoded phrase, one per canonical skill.
    pub fn rank_phrase(
        &self,
        phrase: &str,
        embedding: &[f32],
        threshold: f32,
        top_k: usize,
    ) -> Result<Vec<MatchCandidate>, EngineError> {
        let hits = self
            .corpus
            .skill_index()
            .search_collapsed(embedding, threshold, top_k)?;

        Ok(hits
            .into_iter()
            .filter_map(|(variant, score)| {
                let confidence = self.bands.band(score, threshold)?;
                Some(MatchCandidate {
                    label: self.corpus.skill_at(variant.entry).label(),
                    raw_text_matched: variant.text.clone(),
                    source: Some(phrase.to_string()),
                    score,
                    confidence,
                })
            })
            .collect())
    }
}
