//! Shared fixtures: a tiny CBO slice, a skill table and a keyword-axis encoder whose
//! scores can be worked out by hand.

use std::sync::Arc;

use crate::encoder::fake::KeywordEncoder;
use crate::encoder::Encoder;
use crate::matching::analyzer::{AnalyzerSettings, ResumeAnalyzer};
use crate::matching::corpus::ReferenceCorpus;
use crate::matching::similarity::ConfidenceBands;
use crate::models::corpus::{OccupationRow, SkillRow};

pub const AXES: &[&[&str]] = &[
    &[
        "software",
        "desenvolvedor",
        "developer",
        "programador",
        "programação",
        "sistemas",
        "desenvolvimento",
    ],
    &["python", "python3"],
    &["django", "flask", "framework"],
    &["docker", "kubernetes", "containers"],
    &["dados", "data", "sql", "postgresql", "postgres"],
    &[
        "médico",
        "medicina",
        "cardiologista",
        "cardiologia",
        "paciente",
        "pacientes",
        "clínica",
    ],
    &["cardiologista", "cardiologia", "coração", "cardíaco"],
    &["advogado", "direito", "jurídico", "trabalhista"],
];

/// Scores 0.75 against "desenvolvedor python" and ~0.707 against the other
/// developer/analyst variants.
pub const DEVELOPER_RESUME: &str =
    "Desenvolvedor de software com 5 anos de experiência com Python, Django, Docker e PostgreSQL.";

/// Scores ~0.996 against "médico cardiologista".
pub const CARDIOLOGIST_RESUME: &str =
    "Médico cardiologista com 10 anos de atuação em cardiologia clínica e atendimento a pacientes.";

/// Hits no axis at all: cosine 0 against every corpus variant.
pub const GENERIC_RESUME: &str = "Profissional dedicado com boa comunicação e trabalho em equipe.";

pub fn keyword_encoder() -> KeywordEncoder {
    KeywordEncoder::new(AXES)
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn fixture_occupations() -> Vec<OccupationRow> {
    vec![
        OccupationRow {
            code: "317110".to_string(),
            title: "Programador de sistemas de informação".to_string(),
            synonyms: strings(&["Desenvolvedor de software", "Desenvolvedor Python"]),
            is_technical: true,
        },
        OccupationRow {
            code: "212405".to_string(),
            title: "Analista de desenvolvimento de sistemas".to_string(),
            synonyms: strings(&["Analista de dados"]),
            is_technical: true,
        },
        OccupationRow {
            code: "225120".to_string(),
            title: "Médico cardiologista".to_string(),
            synonyms: strings(&["Cardiologista"]),
            is_technical: false,
        },
        OccupationRow {
            code: "241005".to_string(),
            title: "Advogado".to_string(),
            synonyms: strings(&["Advogado trabalhista"]),
            is_technical: false,
        },
    ]
}

pub fn fixture_skills() -> Vec<SkillRow> {
    vec![
        SkillRow {
            canonical_name: "python".to_string(),
            synonyms: strings(&["python3", "programação python"]),
        },
        SkillRow {
            canonical_name: "django".to_string(),
            synonyms: strings(&["django framework"]),
        },
        SkillRow {
            canonical_name: "docker".to_string(),
            synonyms: strings(&["containers docker"]),
        },
        SkillRow {
            canonical_name: "postgresql".to_string(),
            synonyms: strings(&["postgres"]),
        },
    ]
}

pub async fn fixture_corpus() -> ReferenceCorpus {
    ReferenceCorpus::build(fixture_occupations(), fixture_skills(), &keyword_encoder())
        .await
        .unwrap()
}

/// Analyzer over the fixture corpus, querying through `encoder`.
pub async fn analyzer_with(encoder: Arc<dyn Encoder>) -> ResumeAnalyzer {
    ResumeAnalyzer::new(
        Arc::new(fixture_corpus().await),
        encoder,
        AnalyzerSettings {
            bands: ConfidenceBands::default(),
            min_resume_chars: 10,
        },
    )
}
