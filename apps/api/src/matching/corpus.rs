//! Reference corpus: occupations and skills, each expanded into embedded variants.
//!
//! Every entry contributes one variant per distinct normalized title/synonym, so one
//! logical occupation maps to many (text, vector) pairs. Searches collapse those
//! back to the best variant per entry before `top_k` is applied.
//!
//! Built once at startup, read-only afterwards, shared behind an `Arc`.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::encoder::{normalize_text, Embedding, Encoder};
use crate::errors::EngineError;
use crate::matching::models::MatchLabel;
use crate::matching::similarity::{search, validate_top_k};
use crate::models::corpus::{OccupationRow, SkillRow};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OccupationEntry {
    pub code: String,
    pub title: String,
    pub synonyms: Vec<String>,
    pub is_technical: bool,
}

impl OccupationEntry {
    pub fn label(&self) -> MatchLabel {
        MatchLabel::Occupation {
            code: self.code.clone(),
            title: self.title.clone(),
            is_technical: self.is_technical,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillEntry {
    pub canonical_name: String,
    pub synonyms: Vec<String>,
}

impl SkillEntry {
    pub fn label(&self) -> MatchLabel {
        MatchLabel::Skill {
            canonical_name: self.canonical_name.clone(),
        }
    }
}

/// One embedded text variant, pointing back at its entry by load position.
#[derive(Debug, Clone)]
pub struct Variant {
    pub entry: usize,
    pub text: String,
    pub embedding: Embedding,
}

/// Variants in load order: all of entry 0's, then entry 1's, and so on.
#[derive(Debug, Default)]
pub struct VariantIndex {
    variants: Vec<Variant>,
}

impl VariantIndex {
    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// Best-scoring variant per entry, at most `top_k` entries, score descending.
    /// Ties resolve to load order because variants are stored in load order and the
    /// underlying sort is stable.
    pub fn search_collapsed(
        &self,
        query: &[f32],
        threshold: f32,
        top_k: usize,
    ) -> Result<Vec<(&Variant, f32)>, EngineError> {
        validate_top_k(top_k)?;
        let hits = search(
            query,
            self.variants.iter().map(|v| (v, v.embedding.as_slice())),
            threshold,
            usize::MAX,
        )?;

        let mut seen = HashSet::new();
        let mut collapsed: Vec<(&Variant, f32)> = hits
            .into_iter()
            .filter(|(variant, _)| seen.insert(variant.entry))
            .collect();
        collapsed.truncate(top_k);
        Ok(collapsed)
    }
}

pub struct ReferenceCorpus {
    occupations: Vec<OccupationEntry>,
    skills: Vec<SkillEntry>,
    occupation_by_code: HashMap<String, usize>,
    skill_by_name: HashMap<String, usize>,
    occupation_index: VariantIndex,
    skill_index: VariantIndex,
    dimension: usize,
    built_at: DateTime<Utc>,
}

impl ReferenceCorpus {
    /// Validates the rows and embeds every variant.
    ///
    /// Fails with `Dataset` on empty or duplicate keys, rows without a usable
    /// variant, or an empty occupation table.
    pub async fn build(
        occupation_rows: Vec<OccupationRow>,
        skill_rows: Vec<SkillRow>,
        encoder: &dyn Encoder,
    ) -> Result<Self, EngineError> {
        if occupation_rows.is_empty() {
            return Err(EngineError::Dataset(
                "occupation table is empty".to_string(),
            ));
        }
        let mut occupations = Vec::with_capacity(occupation_rows.len());
        let mut occupation_by_code = HashMap::new();
        let mut occupation_texts = Vec::new();
        for (i, row) in occupation_rows.into_iter().enumerate() {
            let code = row.code.trim().to_string();
            if code.is_empty() {
                return Err(EngineError::Dataset(format!(
                    "occupation row {i} has an empty code"
                )));
            }
            if occupation_by_code.insert(code.clone(), i).is_some() {
                return Err(EngineError::Dataset(format!(
                    "duplicate occupation code '{code}'"
                )));
            }
            let variants = variant_texts(&row.title, &row.synonyms);
            if variants.is_empty() {
                return Err(EngineError::Dataset(format!(
                    "occupation '{code}' has no usable title or synonym"
                )));
            }
            occupation_texts.extend(variants.into_iter().map(|text| (i, text)));
            occupations.push(OccupationEntry {
                code,
                title: row.title.trim().to_string(),
                synonyms: row.synonyms,
                is_technical: row.is_technical,
            });
        }

        let mut skills = Vec::with_capacity(skill_rows.len());
        let mut skill_by_name = HashMap::new();
        let mut skill_texts = Vec::new();
        for (i, row) in skill_rows.into_iter().enumerate() {
            let name = row.canonical_name.trim().to_string();
            if name.is_empty() {
                return Err(EngineError::Dataset(format!(
                    "skill row {i} has an empty canonical_name"
                )));
            }
            if skill_by_name.insert(normalize_text(&name), i).is_some() {
                return Err(EngineError::Dataset(format!(
                    "duplicate skill '{name}'"
                )));
            }
            skill_texts.extend(
                variant_texts(&name, &row.synonyms)
                    .into_iter()
                    .map(|text| (i, text)),
            );
            skills.push(SkillEntry {
                canonical_name: name,
                synonyms: row.synonyms,
            });
        }

        let occupation_index = embed_variants(occupation_texts, encoder).await?;
        let skill_index = embed_variants(skill_texts, encoder).await?;
        if skill_index.is_empty() {
            warn!("Skill table is empty; skill extraction will never match");
        }

        let dimension = check_dimension(&occupation_index, None)?;
        check_dimension(&skill_index, Some(dimension))?;

        debug!(
            "Corpus built: {} occupations, {} skills, dimension {dimension}",
            occupations.len(),
            skills.len()
        );

        Ok(Self {
            occupations,
            skills,
            occupation_by_code,
            skill_by_name,
            occupation_index,
            skill_index,
            dimension,
            built_at: Utc::now(),
        })
    }

    pub fn occupations(&self) -> &[OccupationEntry] {
        &self.occupations
    }

    pub fn skills(&self) -> &[SkillEntry] {
        &self.skills
    }

    pub fn occupation(&self, code: &str) -> Option<&OccupationEntry> {
        self.occupation_by_code
            .get(code.trim())
            .map(|&i| &self.occupations[i])
    }

    pub fn skill(&self, name: &str) -> Option<&SkillEntry> {
        self.skill_by_name
            .get(&normalize_text(name))
            .map(|&i| &self.skills[i])
    }

    pub(crate) fn occupation_at(&self, index: usize) -> &OccupationEntry {
        &self.occupations[index]
    }

    pub(crate) fn skill_at(&self, index: usize) -> &SkillEntry {
        &self.skills[index]
    }

    pub fn occupation_index(&self) -> &VariantIndex {
        &self.occupation_index
    }

    pub fn skill_index(&self) -> &VariantIndex {
        &self.skill_index
    }

    pub fn occupation_variant_count(&self) -> usize {
        self.occupation_index.len()
    }

    pub fn skill_variant_count(&self) -> usize {
        self.skill_index.len()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// Plain-text title search (no embeddings). Relevance is the share of the
    /// title covered by the query; ties keep load order.
    pub fn search_titles(&self, query: &str, limit: usize) -> Vec<(&OccupationEntry, f32)> {
        let query = normalize_text(query);
        if query.is_empty() || limit == 0 {
            return Vec::new();
        }
        let query_len = query.chars().count() as f32;

        let mut found: Vec<(&OccupationEntry, f32)> = self
            .occupations
            .iter()
            .filter_map(|entry| {
                let title = normalize_text(&entry.title);
                title
                    .contains(&query)
                    .then(|| (entry, query_len / title.chars().count() as f32))
            })
            .collect();
        found.sort_by(|a, b| b.1.total_cmp(&a.1));
        found.truncate(limit);
        found
    }
}

/// Title first, then synonyms; normalized, non-empty, de-duplicated within the entry.
fn variant_texts(primary: &str, synonyms: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    std::iter::once(primary)
        .chain(synonyms.iter().map(String::as_str))
        .map(normalize_text)
        .filter(|text| !text.is_empty() && seen.insert(text.clone()))
        .collect()
}

async fn embed_variants(
    texts: Vec<(usize, String)>,
    encoder: &dyn Encoder,
) -> Result<VariantIndex, EngineError> {
    let (entries, texts): (Vec<usize>, Vec<String>) = texts.into_iter().unzip();
    let embeddings = encoder.encode_many(&texts).await?;
    if embeddings.len() != texts.len() {
        return Err(EngineError::Encoding(format!(
            "encoder returned {} vectors for {} variants",
            embeddings.len(),
            texts.len()
        )));
    }

    let variants = entries
        .into_iter()
        .zip(texts)
        .zip(embeddings)
        .map(|((entry, text), embedding)| Variant {
            entry,
            text,
            embedding,
        })
        .collect();
    Ok(VariantIndex { variants })
}

fn check_dimension(index: &VariantIndex, expected: Option<usize>) -> Result<usize, EngineError> {
    let mut dimension = expected;
    for variant in &index.variants {
        let len = variant.embedding.len();
        match dimension {
            None if len > 0 => dimension = Some(len),
            Some(d) if d == len => {}
            _ => {
                return Err(EngineError::Encoding(format!(
                    "variant '{}' has dimension {len}, expected {}",
                    variant.text,
                    dimension.unwrap_or(0)
                )))
            }
        }
    }
    Ok(dimension.unwrap_or(0))
}
