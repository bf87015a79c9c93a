use serde::{Deserialize, Serialize};

use crate::matching::similarity::Confidence;

/// What a match points at in the reference corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchLabel {
    Occupation {
        code: String,
        title: String,
        is_technical: bool,
    },
    Skill {
        canonical_name: String,
    },
}

/// One accepted match. Only built for scores at or above the request threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub label: MatchLabel,
    /// Corpus variant (title, canonical name or synonym) the query landed on.
    pub raw_text_matched: String,
    /// Input phrase that produced the match. Absent for whole-résumé queries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub score: f32,
    pub confidence: Confidence,
}

impl MatchCandidate {
    pub fn code(&self) -> Option<&str> {
        match &self.label {
            MatchLabel::Occupation { code, .. } => Some(code),
            MatchLabel::Skill { .. } => None,
        }
    }

    pub fn canonical_name(&self) -> Option<&str> {
        match &self.label {
            MatchLabel::Skill { canonical_name } => Some(canonical_name),
            MatchLabel::Occupation { .. } => None,
        }
    }

    pub fn is_technical(&self) -> bool {
        matches!(
            self.label,
            MatchLabel::Occupation {
                is_technical: true,
                ..
            }
        )
    }
}
