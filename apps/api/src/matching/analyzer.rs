//! Résumé analysis orchestration.
//!
//! `analyze` runs occupation inference, then gates skill extraction on the primary
//! occupation being technical. The other entry points expose each stage alone.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::encoder::{normalize_text, Encoder, EncoderInfo};
use crate::errors::EngineError;
use crate::matching::corpus::ReferenceCorpus;
use crate::matching::models::MatchCandidate;
use crate::matching::occupation::OccupationInferer;
use crate::matching::profile::{self, ProfileReport};
use crate::matching::similarity::{
    cosine_similarity, validate_threshold, validate_top_k, ConfidenceBands,
};
use crate::matching::skills::{SkillExtraction, SkillExtractor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResumeType {
    Technical,
    NonTechnical,
    /// No occupation scored above threshold.
    Unknown,
}

/// Decision taken after occupation inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillGate {
    Extract,
    SkipNonTechnical,
    SkipNoOccupation,
}

impl SkillGate {
    pub fn for_primary(primary: Option<&MatchCandidate>) -> Self {
        match primary {
            Some(candidate) if candidate.is_technical() => SkillGate::Extract,
            Some(_) => SkillGate::SkipNonTechnical,
            None => SkillGate::SkipNoOccupation,
        }
    }

    pub fn resume_type(self) -> ResumeType {
        match self {
            SkillGate::Extract => ResumeType::Technical,
            SkillGate::SkipNonTechnical => ResumeType::NonTechnical,
            SkillGate::SkipNoOccupation => ResumeType::Unknown,
        }
    }

    pub fn note(self) -> Option<&'static str> {
        match self {
            SkillGate::Extract => None,
            SkillGate::SkipNonTechnical => {
                Some("Primary occupation is not technical; skill extraction was skipped.")
            }
            SkillGate::SkipNoOccupation => Some(
                "No occupation matched above the threshold; skill extraction was skipped.",
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalyzeOptions {
    pub occupation_threshold: f32,
    pub skill_threshold: f32,
    pub top_k_occupations: usize,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            occupation_threshold: 0.65,
            skill_threshold: 0.75,
            top_k_occupations: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub resume_type: ResumeType,
    pub primary_occupation: Option<MatchCandidate>,
    pub occupation_candidates: Vec<MatchCandidate>,
    pub skills: Vec<MatchCandidate>,
    pub total_skills_found: usize,
    pub successful_matches: usize,
    pub match_rate: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Wall-clock seconds.
    pub processing_time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalyzerSettings {
    pub bands: ConfidenceBands,
    pub min_resume_chars: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OccupationRef {
    pub code: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillTermMatch {
    #[serde(flatten)]
    pub candidate: MatchCandidate,
    pub synonyms: Vec<String>,
    pub related_occupations: Vec<OccupationRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermMatch {
    pub term: String,
    pub matched: bool,
    pub matches: Vec<SkillTermMatch>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInfo {
    pub encoder: EncoderInfo,
    pub ready: bool,
    pub occupations: usize,
    pub occupation_variants: usize,
    pub skills: usize,
    pub skill_variants: usize,
    pub dimension: usize,
    pub corpus_built_at: DateTime<Utc>,
}

const TERM_SYNONYMS: usize = 3;
const TERM_RELATED_OCCUPATIONS: usize = 2;

pub struct ResumeAnalyzer {
    corpus: Arc<ReferenceCorpus>,
    encoder: Arc<dyn Encoder>,
    settings: AnalyzerSettings,
}

impl ResumeAnalyzer {
    pub fn new(
        corpus: Arc<ReferenceCorpus>,
        encoder: Arc<dyn Encoder>,
        settings: AnalyzerSettings,
    ) -> Self {
        Self {
            corpus,
            encoder,
            settings,
        }
    }

    pub fn corpus(&self) -> &ReferenceCorpus {
        &self.corpus
    }

    fn inferer(&self) -> OccupationInferer<'_> {
        OccupationInferer::new(&self.corpus, self.encoder.as_ref(), self.settings.bands)
    }

    fn extractor(&self) -> SkillExtractor<'_> {
        SkillExtractor::new(&self.corpus, self.encoder.as_ref(), self.settings.bands)
    }

    pub async fn analyze(
        &self,
        text: &str,
        options: AnalyzeOptions,
    ) -> Result<AnalysisResult, EngineError> {
        let start = Instant::now();

        self.validate_text(text)?;
        check_threshold(options.occupation_threshold)?;
        check_threshold(options.skill_threshold)?;
        check_top_k(options.top_k_occupations)?;
        self.ensure_ready()?;

        let inference = self
            .inferer()
            .infer(
                text,
                options.occupation_threshold,
                options.top_k_occupations,
            )
            .await?;

        let gate = SkillGate::for_primary(inference.primary.as_ref());
        let extraction = match gate {
            SkillGate::Extract => {
                self.extractor()
                    .extract(text, options.skill_threshold, 1)
                    .await?
            }
            SkillGate::SkipNonTechnical | SkillGate::SkipNoOccupation => SkillExtraction::empty(),
        };

        info!(
            "Analyzed résumé: type={:?}, primary={:?}, {} occupation(s), {} skill(s)",
            gate.resume_type(),
            inference.primary.as_ref().and_then(|p| p.code()),
            inference.ranked.len(),
            extraction.skills.len()
        );

        Ok(AnalysisResult {
            resume_type: gate.resume_type(),
            primary_occupation: inference.primary,
            occupation_candidates: inference.ranked,
            skills: extraction.skills,
            total_skills_found: extraction.total_skills_found,
            successful_matches: extraction.successful_matches,
            match_rate: extraction.match_rate,
            note: gate.note().map(str::to_string),
            processing_time: start.elapsed().as_secs_f64(),
        })
    }

    /// Skill extraction without the technical gate.
    pub async fn extract_skills(
        &self,
        text: &str,
        threshold: f32,
        top_k_per_candidate: usize,
    ) -> Result<SkillExtraction, EngineError> {
        self.validate_text(text)?;
        check_threshold(threshold)?;
        check_top_k(top_k_per_candidate)?;
        self.ensure_ready()?;

        self.extractor()
            .extract(text, threshold, top_k_per_candidate)
            .await
    }

    pub async fn infer_occupations(
        &self,
        text: &str,
        threshold: f32,
        top_k: usize,
    ) -> Result<Vec<MatchCandidate>, EngineError> {
        self.validate_text(text)?;
        check_threshold(threshold)?;
        check_top_k(top_k)?;
        self.ensure_ready()?;

        Ok(self.inferer().infer(text, threshold, top_k).await?.ranked)
    }

    pub async fn infer_primary_occupation(
        &self,
        text: &str,
        threshold: f32,
    ) -> Result<Option<MatchCandidate>, EngineError> {
        self.validate_text(text)?;
        check_threshold(threshold)?;
        self.ensure_ready()?;

        Ok(self.inferer().infer(text, threshold, 1).await?.primary)
    }

    /// Cosine similarity between two free texts.
    pub async fn similarity(&self, text1: &str, text2: &str) -> Result<f32, EngineError> {
        if text1.trim().is_empty() || text2.trim().is_empty() {
            return Err(EngineError::InvalidInput(
                "text1 and text2 are required".to_string(),
            ));
        }
        self.ensure_ready()?;

        let a = self.encoder.encode(text1).await?;
        let b = self.encoder.encode(text2).await?;
        Ok(cosine_similarity(&a, &b))
    }

    /// Matches free skill terms against the skill index. Blank and repeated terms
    /// are skipped; a term the encoder rejects comes back unmatched.
    pub async fn match_skill_terms(
        &self,
        terms: &[String],
        threshold: f32,
        top_k: usize,
    ) -> Result<Vec<TermMatch>, EngineError> {
        check_threshold(threshold)?;
        check_top_k(top_k)?;

        let mut seen = HashSet::new();
        let terms: Vec<String> = terms
            .iter()
            .map(|t| normalize_text(t))
            .filter(|t| !t.is_empty() && seen.insert(t.clone()))
            .collect();
        if terms.is_empty() {
            return Err(EngineError::InvalidInput(
                "at least one non-empty skill term is required".to_string(),
            ));
        }
        self.ensure_ready()?;

        let extractor = self.extractor();
        let embeddings = extractor.encode_phrases(&terms).await?;

        let mut results = Vec::with_capacity(terms.len());
        for (term, embedding) in terms.into_iter().zip(embeddings) {
            let matches = match embedding {
                Some(embedding) => extractor
                    .rank_phrase(&term, &embedding, threshold, top_k)?
                    .into_iter()
                    .map(|candidate| self.enrich_term_match(candidate))
                    .collect(),
                None => Vec::new(),
            };
            results.push(TermMatch {
                term,
                matched: !matches.is_empty(),
                matches,
            });
        }
        Ok(results)
    }

    fn enrich_term_match(&self, candidate: MatchCandidate) -> SkillTermMatch {
        let name = candidate.canonical_name().unwrap_or_default();
        let synonyms = self
            .corpus
            .skill(name)
            .map(|s| s.synonyms.iter().take(TERM_SYNONYMS).cloned().collect())
            .unwrap_or_default();
        let related_occupations = self
            .corpus
            .search_titles(name, TERM_RELATED_OCCUPATIONS)
            .into_iter()
            .map(|(entry, _)| OccupationRef {
                code: entry.code.clone(),
                title: entry.title.clone(),
            })
            .collect();

        SkillTermMatch {
            candidate,
            synonyms,
            related_occupations,
        }
    }

    pub async fn match_profile(
        &self,
        candidate_skills: &[String],
        job_requirements: &[String],
        semantic_threshold: f32,
    ) -> Result<ProfileReport, EngineError> {
        check_threshold(semantic_threshold)?;
        self.ensure_ready()?;

        profile::match_profile(
            self.encoder.as_ref(),
            candidate_skills,
            job_requirements,
            semantic_threshold,
        )
        .await
    }

    pub fn model_info(&self) -> ModelInfo {
        ModelInfo {
            encoder: self.encoder.info(),
            ready: self.encoder.is_ready(),
            occupations: self.corpus.occupations().len(),
            occupation_variants: self.corpus.occupation_variant_count(),
            skills: self.corpus.skills().len(),
            skill_variants: self.corpus.skill_variant_count(),
            dimension: self.corpus.dimension(),
            corpus_built_at: self.corpus.built_at(),
        }
    }

    fn validate_text(&self, text: &str) -> Result<(), EngineError> {
        let chars = text.trim().chars().count();
        if chars == 0 {
            return Err(EngineError::InvalidInput(
                "resume text must not be empty".to_string(),
            ));
        }
        if chars < self.settings.min_resume_chars {
            return Err(EngineError::InvalidInput(format!(
                "resume text must have at least {} characters, got {chars}",
                self.settings.min_resume_chars
            )));
        }
        Ok(())
    }

    fn ensure_ready(&self) -> Result<(), EngineError> {
        if self.encoder.is_ready() {
            Ok(())
        } else {
            Err(EngineError::ModelNotReady)
        }
    }
}

/// Request parameters are caller input, so they fail as `InvalidInput`.
fn check_threshold(threshold: f32) -> Result<(), EngineError> {
    validate_threshold(threshold).map_err(as_invalid_input)
}

fn check_top_k(top_k: usize) -> Result<(), EngineError> {
    validate_top_k(top_k).map_err(as_invalid_input)
}

fn as_invalid_input(err: EngineError) -> EngineError {
    match err {
        EngineError::InvalidParameter(msg) => EngineError::InvalidInput(msg),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::similarity::Confidence;
    use crate::matching::test_support::{
        analyzer_with, fixture_corpus, keyword_encoder, CARDIOLOGIST_RESUME, DEVELOPER_RESUME,
        GENERIC_RESUME,
    };

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_technical_resume_gets_occupations_and_skills() {
        let analyzer = analyzer_with(Arc::new(keyword_encoder())).await;

        let result = analyzer
            .analyze(DEVELOPER_RESUME, AnalyzeOptions::default())
            .await
            .unwrap();

        assert_eq!(result.resume_type, ResumeType::Technical);
        let primary = result.primary_occupation.as_ref().unwrap();
        assert_eq!(primary.code(), Some("317110"));
        assert_eq!(primary.confidence, Confidence::Medium);
        assert_eq!(result.occupation_candidates.len(), 2);
        assert_eq!(result.occupation_candidates[0], *primary);

        let skills: Vec<&str> = result
            .skills
            .iter()
            .filter_map(|s| s.canonical_name())
            .collect();
        assert_eq!(skills, vec!["python", "django", "docker", "postgresql"]);
        assert_eq!(result.total_skills_found, 4);
        assert_eq!(result.successful_matches, 4);
        assert!(result.note.is_none());
        assert!(result.processing_time >= 0.0);
    }

    #[tokio::test]
    async fn test_non_technical_resume_skips_skills() {
        let encoder = Arc::new(keyword_encoder());
        let analyzer = analyzer_with(encoder.clone()).await;

        let result = analyzer
            .analyze(CARDIOLOGIST_RESUME, AnalyzeOptions::default())
            .await
            .unwrap();

        assert_eq!(result.resume_type, ResumeType::NonTechnical);
        let primary = result.primary_occupation.unwrap();
        assert_eq!(primary.code(), Some("225120"));
        assert_eq!(primary.confidence, Confidence::High);
        assert!(result.skills.is_empty());
        assert_eq!(result.total_skills_found, 0);
        assert_eq!(result.match_rate, 0.0);
        assert!(result.note.is_some());
        // Only the résumé itself went through the model.
        assert_eq!(encoder.calls(), 1);
    }

    #[tokio::test]
    async fn test_unmatched_resume_is_unknown() {
        let analyzer = analyzer_with(Arc::new(keyword_encoder())).await;

        let result = analyzer
            .analyze(GENERIC_RESUME, AnalyzeOptions::default())
            .await
            .unwrap();

        assert_eq!(result.resume_type, ResumeType::Unknown);
        assert!(result.primary_occupation.is_none());
        assert!(result.occupation_candidates.is_empty());
        assert!(result.skills.is_empty());
        assert!(result.note.is_some());
    }

    #[tokio::test]
    async fn test_threshold_above_best_score_is_unknown() {
        let encoder = Arc::new(keyword_encoder());
        let analyzer = analyzer_with(encoder.clone()).await;

        // The developer résumé peaks at 0.75 against the fixture corpus.
        let options = AnalyzeOptions {
            occupation_threshold: 0.99,
            ..AnalyzeOptions::default()
        };
        let result = analyzer.analyze(DEVELOPER_RESUME, options).await.unwrap();

        assert_eq!(result.resume_type, ResumeType::Unknown);
        assert!(result.primary_occupation.is_none());
        assert!(result.occupation_candidates.is_empty());
        assert!(result.skills.is_empty());
        assert_eq!(result.total_skills_found, 0);
        assert!(result.note.is_some());
        assert_eq!(encoder.calls(), 1);
    }

    #[tokio::test]
    async fn test_blank_text_is_rejected_without_length_floor() {
        let encoder = Arc::new(keyword_encoder());
        let analyzer = ResumeAnalyzer::new(
            Arc::new(fixture_corpus().await),
            encoder.clone(),
            AnalyzerSettings {
                bands: ConfidenceBands::default(),
                min_resume_chars: 0,
            },
        );

        for text in ["", "   ", "\n\t"] {
            let result = analyzer.analyze(text, AnalyzeOptions::default()).await;
            assert!(matches!(result, Err(EngineError::InvalidInput(_))), "{text:?}");
        }
        assert_eq!(encoder.calls(), 0);
    }

    #[tokio::test]
    async fn test_short_text_is_rejected_before_encoding() {
        let encoder = Arc::new(keyword_encoder());
        let analyzer = analyzer_with(encoder.clone()).await;

        for text in ["CV", "", "        ", "   abc   "] {
            let result = analyzer.analyze(text, AnalyzeOptions::default()).await;
            assert!(matches!(result, Err(EngineError::InvalidInput(_))), "{text:?}");
        }
        assert_eq!(encoder.calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_options_are_invalid_input() {
        let analyzer = analyzer_with(Arc::new(keyword_encoder())).await;

        let options = [
            AnalyzeOptions {
                top_k_occupations: 0,
                ..AnalyzeOptions::default()
            },
            AnalyzeOptions {
                occupation_threshold: 1.5,
                ..AnalyzeOptions::default()
            },
            AnalyzeOptions {
                skill_threshold: f32::NAN,
                ..AnalyzeOptions::default()
            },
        ];
        for options in options {
            let result = analyzer.analyze(DEVELOPER_RESUME, options).await;
            assert!(matches!(result, Err(EngineError::InvalidInput(_))));
        }
    }

    #[tokio::test]
    async fn test_not_ready_encoder_fails_without_inference() {
        let analyzer = analyzer_with(Arc::new(keyword_encoder().not_ready())).await;

        let result = analyzer
            .analyze(DEVELOPER_RESUME, AnalyzeOptions::default())
            .await;
        assert!(matches!(result, Err(EngineError::ModelNotReady)));
    }

    #[tokio::test]
    async fn test_input_errors_win_over_not_ready() {
        let analyzer = analyzer_with(Arc::new(keyword_encoder().not_ready())).await;
        let result = analyzer.analyze("CV", AnalyzeOptions::default()).await;
        assert!(matches!(result, Err(EngineError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_resume_encoding_failure_fails_request() {
        let encoder = keyword_encoder().failing_on(&[DEVELOPER_RESUME]);
        let analyzer = analyzer_with(Arc::new(encoder)).await;

        let result = analyzer
            .analyze(DEVELOPER_RESUME, AnalyzeOptions::default())
            .await;
        assert!(matches!(result, Err(EngineError::Encoding(_))));
    }

    #[tokio::test]
    async fn test_analysis_is_idempotent() {
        let analyzer = analyzer_with(Arc::new(keyword_encoder())).await;

        let mut first = analyzer
            .analyze(DEVELOPER_RESUME, AnalyzeOptions::default())
            .await
            .unwrap();
        let mut second = analyzer
            .analyze(DEVELOPER_RESUME, AnalyzeOptions::default())
            .await
            .unwrap();
        first.processing_time = 0.0;
        second.processing_time = 0.0;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_extract_skills_ignores_gate() {
        let analyzer = analyzer_with(Arc::new(keyword_encoder())).await;

        let result = analyzer
            .extract_skills("Advogado com 3 anos de experiência com Python.", 0.75, 1)
            .await
            .unwrap();
        assert_eq!(result.skills.len(), 1);
        assert_eq!(result.skills[0].canonical_name(), Some("python"));
    }

    #[tokio::test]
    async fn test_infer_primary_occupation() {
        let analyzer = analyzer_with(Arc::new(keyword_encoder())).await;

        let primary = analyzer
            .infer_primary_occupation(CARDIOLOGIST_RESUME, 0.65)
            .await
            .unwrap();
        assert_eq!(primary.unwrap().code(), Some("225120"));

        let none = analyzer
            .infer_primary_occupation(GENERIC_RESUME, 0.65)
            .await
            .unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn test_similarity_between_texts() {
        let analyzer = analyzer_with(Arc::new(keyword_encoder())).await;

        let score = analyzer
            .similarity("Desenvolvedor Python", "python developer")
            .await
            .unwrap();
        assert!((score - 1.0).abs() < 1e-5);

        assert!(matches!(
            analyzer.similarity("  ", "python").await,
            Err(EngineError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_match_skill_terms_enriches_matches() {
        let analyzer = analyzer_with(Arc::new(keyword_encoder())).await;

        let terms = strings(&["Python3", "oratória", "  ", "python3"]);
        let results = analyzer.match_skill_terms(&terms, 0.75, 3).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].term, "python3");
        assert!(results[0].matched);
        assert_eq!(results[0].matches.len(), 1);
        let python = &results[0].matches[0];
        assert_eq!(python.candidate.canonical_name(), Some("python"));
        assert_eq!(python.synonyms, strings(&["python3", "programação python"]));

        assert_eq!(results[1].term, "oratória");
        assert!(!results[1].matched);
    }

    #[tokio::test]
    async fn test_match_skill_terms_requires_a_term() {
        let analyzer = analyzer_with(Arc::new(keyword_encoder())).await;
        let result = analyzer.match_skill_terms(&strings(&[" "]), 0.75, 3).await;
        assert!(matches!(result, Err(EngineError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_model_info_reports_corpus_sizes() {
        let analyzer = analyzer_with(Arc::new(keyword_encoder())).await;

        let info = analyzer.model_info();
        assert!(info.ready);
        assert_eq!(info.occupations, 4);
        assert_eq!(info.skills, 4);
        assert_eq!(info.dimension, info.encoder.dimension);
        assert!(info.occupation_variants > info.occupations);
    }
}
