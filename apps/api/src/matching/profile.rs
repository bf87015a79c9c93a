//! Profile matching: how well a candidate's skill list covers a job's requirements.
//!
//! Per requirement:
//! 1. case-insensitive containment (either direction) with a candidate skill → strength 1.0
//! 2. otherwise best cosine against the candidate skills, counted when ≥ threshold
//! 3. otherwise missing
//!
//! match_score = Σ strength / requirements; percentage = ⌊score × 100⌋ capped at 100.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::encoder::{normalize_text, Encoder};
use crate::errors::EngineError;
use crate::matching::similarity::cosine_similarity;

pub const DEFAULT_SEMANTIC_THRESHOLD: f32 = 0.70;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Semantic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementMatch {
    pub requirement: String,
    pub matched_by: String,
    pub kind: MatchKind,
    pub strength: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitLevel {
    Excellent,
    Good,
    Moderate,
    Low,
    Insufficient,
}

impl FitLevel {
    pub fn from_percentage(percentage: u32) -> Self {
        if percentage >= 90 {
            FitLevel::Excellent
        } else if percentage >= 75 {
            FitLevel::Good
        } else if percentage >= 60 {
            FitLevel::Moderate
        } else if percentage >= 40 {
            FitLevel::Low
        } else {
            FitLevel::Insufficient
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileReport {
    pub match_score: f32,
    pub match_percentage: u32,
    pub level: FitLevel,
    pub matched_skills: Vec<RequirementMatch>,
    pub matched_count: usize,
    pub missing_skills: Vec<String>,
    pub missing_count: usize,
    pub required_count: usize,
    pub recommendation: String,
}

pub async fn match_profile(
    encoder: &dyn Encoder,
    candidate_skills: &[String],
    job_requirements: &[String],
    semantic_threshold: f32,
) -> Result<ProfileReport, EngineError> {
    let requirements = non_blank(job_requirements);
    if requirements.is_empty() {
        return Err(EngineError::InvalidInput(
            "job_requirements must contain at least one entry".to_string(),
        ));
    }
    let skills = non_blank(candidate_skills);

    let mut strengths: Vec<Option<RequirementMatch>> = requirements
        .iter()
        .map(|req| exact_match(req, &skills))
        .collect();

    let pending: Vec<usize> = (0..requirements.len())
        .filter(|&i| strengths[i].is_none())
        .collect();

    // Skills are only encoded when some requirement needs the semantic pass.
    if !pending.is_empty() && !skills.is_empty() {
        let skill_vectors = encoder.encode_many(&skills).await?;
        let pending_texts: Vec<String> = pending.iter().map(|&i| requirements[i].clone()).collect();
        let requirement_vectors = encoder.encode_many(&pending_texts).await?;

        for (&i, req_vector) in pending.iter().zip(&requirement_vectors) {
            let best = skills
                .iter()
                .zip(&skill_vectors)
                .map(|(skill, v)| (skill, cosine_similarity(req_vector, v)))
                .fold(None::<(&String, f32)>, |best, (skill, score)| match best {
                    Some((_, s)) if s >= score => best,
                    _ => Some((skill, score)),
                });

            if let Some((skill, score)) = best.filter(|(_, s)| *s >= semantic_threshold) {
                debug!("Requirement '{}' matched '{skill}' semantically ({score:.3})", requirements[i]);
                strengths[i] = Some(RequirementMatch {
                    requirement: requirements[i].clone(),
                    matched_by: skill.clone(),
                    kind: MatchKind::Semantic,
                    strength: score,
                });
            }
        }
    }

    let mut matched_skills = Vec::new();
    let mut missing_skills = Vec::new();
    for (requirement, found) in requirements.iter().zip(strengths) {
        match found {
            Some(m) => matched_skills.push(m),
            None => missing_skills.push(requirement.clone()),
        }
    }

    let total: f32 = matched_skills.iter().map(|m| m.strength).sum();
    let match_score = total / requirements.len() as f32;
    let match_percentage = ((match_score * 100.0).floor().max(0.0) as u32).min(100);
    let recommendation = build_recommendation(match_percentage, &missing_skills);

    Ok(ProfileReport {
        match_score,
        match_percentage,
        level: FitLevel::from_percentage(match_percentage),
        matched_count: matched_skills.len(),
        matched_skills,
        missing_count: missing_skills.len(),
        missing_skills,
        required_count: requirements.len(),
        recommendation,
    })
}

fn non_blank(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn exact_match(requirement: &str, skills: &[String]) -> Option<RequirementMatch> {
    let req = normalize_text(requirement);
    skills
        .iter()
        .find(|skill| {
            let skill = normalize_text(skill);
            skill.contains(&req) || req.contains(&skill)
        })
        .map(|skill| RequirementMatch {
            requirement: requirement.to_string(),
            matched_by: skill.clone(),
            kind: MatchKind::Exact,
            strength: 1.0,
        })
}

/// Human-readable summary from the percentage and the first few gaps.
fn build_recommendation(percentage: u32, missing: &[String]) -> String {
    let top_gaps: Vec<&str> = missing.iter().take(3).map(String::as_str).collect();

    if percentage >= 75 {
        "Strong candidate. The profile covers the key job requirements.".to_string()
    } else if percentage >= 60 {
        format!(
            "Promising candidate ({percentage}%). Worth probing: {}.",
            top_gaps.join(", ")
        )
    } else if percentage >= 40 {
        format!(
            "Partial fit ({percentage}%). Notable gaps: {}.",
            top_gaps.join(", ")
        )
    } else {
        format!(
            "Weak fit ({percentage}%). Missing most requirements, starting with: {}.",
            top_gaps.join(", ")
        )
    }
}
