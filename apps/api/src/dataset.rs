use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::info;

use crate::encoder::Encoder;
use crate::errors::EngineError;
use crate::matching::corpus::ReferenceCorpus;
use crate::models::corpus::{OccupationRow, SkillRow};

pub const OCCUPATIONS_FILE: &str = "occupations.json";
pub const SKILLS_FILE: &str = "skills.json";

/// Supplies raw reference rows. The engine only depends on the row shapes,
/// never on the storage format.
pub trait CorpusSource: Send + Sync {
    fn occupations(&self) -> Result<Vec<OccupationRow>, EngineError>;
    fn skills(&self) -> Result<Vec<SkillRow>, EngineError>;
}

/// Reads `occupations.json` and `skills.json` from a dataset directory.
pub struct JsonCorpusSource {
    dir: PathBuf,
}

impl JsonCorpusSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl CorpusSource for JsonCorpusSource {
    fn occupations(&self) -> Result<Vec<OccupationRow>, EngineError> {
        read_rows(&self.dir.join(OCCUPATIONS_FILE))
    }

    fn skills(&self) -> Result<Vec<SkillRow>, EngineError> {
        read_rows(&self.dir.join(SKILLS_FILE))
    }
}

fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, EngineError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| EngineError::Dataset(format!("cannot read {}: {e}", path.display())))?;
    serde_json::from_str(&raw)
        .map_err(|e| EngineError::Dataset(format!("malformed {}: {e}", path.display())))
}

/// In-memory rows, for tests.
#[cfg(test)]
pub struct StaticCorpusSource {
    pub occupations: Vec<OccupationRow>,
    pub skills: Vec<SkillRow>,
}

#[cfg(test)]
impl CorpusSource for StaticCorpusSource {
    fn occupations(&self) -> Result<Vec<OccupationRow>, EngineError> {
        Ok(self.occupations.clone())
    }

    fn skills(&self) -> Result<Vec<SkillRow>, EngineError> {
        Ok(self.skills.clone())
    }
}

/// Loads both tables and embeds every variant. Any failure here is fatal:
/// the process must not serve requests with a partially built corpus.
pub async fn load_corpus(
    source: &dyn CorpusSource,
    encoder: &dyn Encoder,
) -> Result<ReferenceCorpus, EngineError> {
    info!("Loading reference dataset...");

    let occupations = source.occupations()?;
    let skills = source.skills()?;
    info!(
        "Loaded {} occupation rows and {} skill rows",
        occupations.len(),
        skills.len()
    );

    let corpus = ReferenceCorpus::build(occupations, skills, encoder).await?;
    info!(
        "Reference corpus ready: {} occupation variants, {} skill variants",
        corpus.occupation_variant_count(),
        corpus.skill_variant_count()
    );
    Ok(corpus)
}
