mod config;
mod dataset;
mod encoder;
mod errors;
mod matching;
mod models;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::dataset::{load_corpus, JsonCorpusSource};
use crate::encoder::HttpEncoder;
use crate::matching::analyzer::{AnalyzerSettings, ResumeAnalyzer};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting matcher API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the embedding client and wait for the model
    let encoder = HttpEncoder::new(
        &config.embedding_url,
        &config.embedding_model,
        Duration::from_secs(config.embedding_timeout_secs),
    )
    .context("Failed to build embedding client")?;
    warm_up(&encoder, config.embedding_warmup_attempts).await?;

    // Load and embed the reference corpus before accepting traffic
    let source = JsonCorpusSource::new(&config.dataset_path);
    let corpus = load_corpus(&source, &encoder)
        .await
        .with_context(|| format!("Failed to load reference dataset from {}", config.dataset_path))?;

    let analyzer = ResumeAnalyzer::new(
        Arc::new(corpus),
        Arc::new(encoder),
        AnalyzerSettings {
            bands: config.confidence_bands,
            min_resume_chars: config.min_resume_chars,
        },
    );

    // Build app state
    let state = AppState {
        analyzer: Arc::new(analyzer),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Probes the embedding server until it answers, with exponential backoff: 1s, 2s, 4s, ...
async fn warm_up(encoder: &HttpEncoder, attempts: u32) -> Result<usize> {
    let attempts = attempts.max(1);
    let mut last_error = None;

    for attempt in 0..attempts {
        if attempt > 0 {
            let delay = Duration::from_millis(1000 * (1 << (attempt - 1).min(5)));
            warn!(
                "Embedding warm-up attempt {} failed, retrying after {}ms...",
                attempt,
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
        }

        match encoder.warm_up().await {
            Ok(dimension) => return Ok(dimension),
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "Embedding model did not become ready after {attempts} attempts: {}",
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}
