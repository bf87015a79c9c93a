use serde::{Deserialize, Serialize};

/// One row of `occupations.json`. `code`, `title` and `is_technical` are required;
/// a missing field fails deserialization and aborts startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupationRow {
    pub code: String,
    pub title: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
    pub is_technical: bool,
}

/// One row of `skills.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillRow {
    pub canonical_name: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
}
