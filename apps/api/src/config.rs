use anyhow::{ensure, Context, Result};

use crate::matching::similarity::ConfidenceBands;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub dataset_path: String,
    pub embedding_url: String,
    pub embedding_model: String,
    pub embedding_timeout_secs: u64,
    pub embedding_warmup_attempts: u32,
    pub min_resume_chars: usize,
    pub confidence_bands: ConfidenceBands,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let confidence_bands = ConfidenceBands {
            high: parse_env("CONFIDENCE_HIGH", 0.85_f32)?,
            medium: parse_env("CONFIDENCE_MEDIUM", 0.70_f32)?,
        };
        ensure!(
            confidence_bands.is_monotonic(),
            "CONFIDENCE_HIGH ({}) must be >= CONFIDENCE_MEDIUM ({}) and both within [-1, 1]",
            confidence_bands.high,
            confidence_bands.medium
        );

        let min_resume_chars = parse_min_resume_chars()?;

        Ok(Config {
            dataset_path: std::env::var("DATASET_PATH").unwrap_or_else(|_| "dataset".to_string()),
            embedding_url: require_env("EMBEDDING_URL")?,
            embedding_model: std::env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| "paraphrase-multilingual".to_string()),
            embedding_timeout_secs: parse_env("EMBEDDING_TIMEOUT_SECS", 60)?,
            embedding_warmup_attempts: parse_env("EMBEDDING_WARMUP_ATTEMPTS", 5)?,
            min_resume_chars,
            confidence_bands,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Blank text must never reach the encoder, so the floor is one character.
fn parse_min_resume_chars() -> Result<usize> {
    let value = parse_env("MIN_RESUME_CHARS", 10)?;
    ensure!(value >= 1, "MIN_RESUME_CHARS must be at least 1, got {value}");
    Ok(value)
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_falls_back_to_default() {
        let value: u32 = parse_env("MATCHER_TEST_UNSET_VARIABLE", 7).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn test_parse_env_rejects_garbage() {
        std::env::set_var("MATCHER_TEST_GARBAGE_PORT", "not-a-port");
        let result: Result<u16> = parse_env("MATCHER_TEST_GARBAGE_PORT", 8080);
        assert!(result.is_err());
    }

    #[test]
    fn test_min_resume_chars_must_be_positive() {
        std::env::set_var("MIN_RESUME_CHARS", "0");
        assert!(parse_min_resume_chars().is_err());

        std::env::set_var("MIN_RESUME_CHARS", "25");
        assert_eq!(parse_min_resume_chars().unwrap(), 25);
        std::env::remove_var("MIN_RESUME_CHARS");
    }
}
