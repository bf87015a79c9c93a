use std::time::Instant;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::matching::analyzer::{AnalysisResult, AnalyzeOptions, ModelInfo, TermMatch};
use crate::matching::corpus::OccupationEntry;
use crate::matching::models::MatchCandidate;
use crate::matching::profile::{ProfileReport, DEFAULT_SEMANTIC_THRESHOLD};
use crate::matching::skills::SkillExtraction;
use crate::state::AppState;

pub const MAX_TOP_K: usize = 20;
pub const MAX_LIST_LEN: usize = 100;
const DEFAULT_SEARCH_LIMIT: usize = 10;
const MAX_SEARCH_LIMIT: usize = 50;

fn default_occupation_threshold() -> f32 {
    0.65
}

fn default_skill_threshold() -> f32 {
    0.75
}

fn default_analyze_top_k() -> usize {
    3
}

fn default_extract_top_k() -> usize {
    1
}

fn default_infer_top_k() -> usize {
    5
}

fn default_term_top_k() -> usize {
    3
}

fn default_semantic_threshold() -> f32 {
    DEFAULT_SEMANTIC_THRESHOLD
}

fn check_top_k(top_k: usize) -> Result<(), AppError> {
    if top_k > MAX_TOP_K {
        return Err(AppError::Validation(format!(
            "top_k must be at most {MAX_TOP_K}, got {top_k}"
        )));
    }
    Ok(())
}

fn check_list_len(field: &str, len: usize) -> Result<(), AppError> {
    if len == 0 {
        return Err(AppError::Validation(format!("{field} must not be empty")));
    }
    if len > MAX_LIST_LEN {
        return Err(AppError::Validation(format!(
            "{field} accepts at most {MAX_LIST_LEN} entries, got {len}"
        )));
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Résumé analysis
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub resume_text: String,
    #[serde(default = "default_occupation_threshold")]
    pub threshold_occupation: f32,
    #[serde(default = "default_skill_threshold")]
    pub threshold_skills: f32,
    #[serde(default = "default_analyze_top_k")]
    pub top_k_occupations: usize,
}

/// POST /api/v1/analyze-resume
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalysisResult>, AppError> {
    check_top_k(req.top_k_occupations)?;
    let options = AnalyzeOptions {
        occupation_threshold: req.threshold_occupation,
        skill_threshold: req.threshold_skills,
        top_k_occupations: req.top_k_occupations,
    };
    let result = state.analyzer.analyze(&req.resume_text, options).await?;
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub resume_text: String,
    #[serde(default = "default_skill_threshold")]
    pub threshold: f32,
    #[serde(default = "default_extract_top_k")]
    pub top_k: usize,
}

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    #[serde(flatten)]
    pub extraction: SkillExtraction,
    pub processing_time: f64,
}

/// POST /api/v1/extract
pub async fn handle_extract(
    State(state): State<AppState>,
    Json(req): Json<ExtractRequest>,
) -> Result<Json<ExtractResponse>, AppError> {
    let start = Instant::now();
    check_top_k(req.top_k)?;
    let extraction = state
        .analyzer
        .extract_skills(&req.resume_text, req.threshold, req.top_k)
        .await?;
    info!(
        "Extracted {} skill(s) from {} candidate(s)",
        extraction.skills.len(),
        extraction.total_skills_found
    );
    Ok(Json(ExtractResponse {
        extraction,
        processing_time: start.elapsed().as_secs_f64(),
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Occupation inference
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct InferRequest {
    pub resume_text: String,
    #[serde(default = "default_occupation_threshold")]
    pub threshold: f32,
    #[serde(default = "default_infer_top_k")]
    pub top_k: usize,
}

#[derive(Debug, Serialize)]
pub struct InferResponse {
    pub occupations: Vec<MatchCandidate>,
    pub total: usize,
}

/// POST /api/v1/infer-occupation
pub async fn handle_infer_occupation(
    State(state): State<AppState>,
    Json(req): Json<InferRequest>,
) -> Result<Json<InferResponse>, AppError> {
    check_top_k(req.top_k)?;
    let occupations = state
        .analyzer
        .infer_occupations(&req.resume_text, req.threshold, req.top_k)
        .await?;
    Ok(Json(InferResponse {
        total: occupations.len(),
        occupations,
    }))
}

#[derive(Debug, Deserialize)]
pub struct PrimaryRequest {
    pub resume_text: String,
    #[serde(default = "default_occupation_threshold")]
    pub threshold: f32,
}

#[derive(Debug, Serialize)]
pub struct PrimaryResponse {
    pub occupation: Option<MatchCandidate>,
}

/// POST /api/v1/infer-primary-occupation
pub async fn handle_infer_primary(
    State(state): State<AppState>,
    Json(req): Json<PrimaryRequest>,
) -> Result<Json<PrimaryResponse>, AppError> {
    let occupation = state
        .analyzer
        .infer_primary_occupation(&req.resume_text, req.threshold)
        .await?;
    Ok(Json(PrimaryResponse { occupation }))
}

// ────────────────────────────────────────────────────────────────────────────
// Profile and skill terms
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    pub candidate_skills: Vec<String>,
    pub job_requirements: Vec<String>,
    #[serde(default = "default_semantic_threshold")]
    pub semantic_threshold: f32,
}

/// POST /api/v1/match-profile
pub async fn handle_match_profile(
    State(state): State<AppState>,
    Json(req): Json<ProfileRequest>,
) -> Result<Json<ProfileReport>, AppError> {
    check_list_len("candidate_skills", req.candidate_skills.len())?;
    check_list_len("job_requirements", req.job_requirements.len())?;
    let report = state
        .analyzer
        .match_profile(
            &req.candidate_skills,
            &req.job_requirements,
            req.semantic_threshold,
        )
        .await?;
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct SkillTermsRequest {
    pub unrecognized_skills: Vec<String>,
    #[serde(default = "default_skill_threshold")]
    pub threshold: f32,
    #[serde(default = "default_term_top_k")]
    pub top_k: usize,
}

#[derive(Debug, Serialize)]
pub struct SkillTermsResponse {
    pub results: Vec<TermMatch>,
    pub threshold_used: f32,
}

/// POST /api/v1/skills/match
pub async fn handle_match_skills(
    State(state): State<AppState>,
    Json(req): Json<SkillTermsRequest>,
) -> Result<Json<SkillTermsResponse>, AppError> {
    check_list_len("unrecognized_skills", req.unrecognized_skills.len())?;
    check_top_k(req.top_k)?;
    let results = state
        .analyzer
        .match_skill_terms(&req.unrecognized_skills, req.threshold, req.top_k)
        .await?;
    Ok(Json(SkillTermsResponse {
        results,
        threshold_used: req.threshold,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SimilarityRequest {
    pub text1: String,
    pub text2: String,
}

#[derive(Debug, Serialize)]
pub struct SimilarityResponse {
    pub text1: String,
    pub text2: String,
    pub similarity_score: f32,
}

/// POST /api/v1/skills/similarity
pub async fn handle_similarity(
    State(state): State<AppState>,
    Json(req): Json<SimilarityRequest>,
) -> Result<Json<SimilarityResponse>, AppError> {
    let similarity_score = state.analyzer.similarity(&req.text1, &req.text2).await?;
    Ok(Json(SimilarityResponse {
        text1: req.text1,
        text2: req.text2,
        similarity_score,
    }))
}

/// GET /api/v1/skills/model-info
pub async fn handle_model_info(State(state): State<AppState>) -> Json<ModelInfo> {
    Json(state.analyzer.model_info())
}

// ────────────────────────────────────────────────────────────────────────────
// Corpus lookups
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/occupations/:code
pub async fn handle_get_occupation(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<OccupationEntry>, AppError> {
    state
        .analyzer
        .corpus()
        .occupation(&code)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Occupation {code} not found")))
}

#[derive(Debug, Deserialize)]
pub struct OccupationSearchQuery {
    pub q: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct OccupationSearchHit {
    #[serde(flatten)]
    pub occupation: OccupationEntry,
    pub relevance: f32,
}

/// GET /api/v1/occupations?q=&limit=
pub async fn handle_search_occupations(
    State(state): State<AppState>,
    Query(params): Query<OccupationSearchQuery>,
) -> Result<Json<Vec<OccupationSearchHit>>, AppError> {
    if params.q.trim().is_empty() {
        return Err(AppError::Validation("q must not be empty".to_string()));
    }
    let limit = params
        .limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .clamp(1, MAX_SEARCH_LIMIT);

    let hits = state
        .analyzer
        .corpus()
        .search_titles(&params.q, limit)
        .into_iter()
        .map(|(occupation, relevance)| OccupationSearchHit {
            occupation: occupation.clone(),
            relevance,
        })
        .collect();
    Ok(Json(hits))
}
