mod analysis;
mod config;
mod embedding_client;
mod errors;
mod pdf;
mod routes;
mod skills;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, EmbeddingConfig};
use crate::embedding_client::{EmbeddingProvider, HashingEmbedder, HttpEmbeddingClient};
use crate::routes::build_router;
use crate::skills::recognizer::RuleBasedRecognizer;
use crate::skills::vocabulary::load_sources;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first; invalid values abort startup
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Skillgap API v{}", env!("CARGO_PKG_VERSION"));

    // Vocabulary and roles: a load failure is fatal, never serve a partial vocabulary
    let (vocabulary, roles) = load_sources(&config.skills_path, &config.roles_path)
        .context("Failed to load skill vocabulary")?;

    let embedder = build_embedder(&config.embedding)?;
    info!("Embedding provider initialized (backend: {})", embedder.name());

    info!(
        "Normalizer: {:?} fuzzy matching, cutoff {}",
        config.fuzzy_strategy, config.fuzzy_cutoff
    );

    let state = AppState::build(
        config.clone(),
        vocabulary,
        roles,
        Arc::new(RuleBasedRecognizer),
        embedder,
    )?;

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

fn build_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let embedder: Arc<dyn EmbeddingProvider> = match config {
        EmbeddingConfig::Hashing { dimensions } => Arc::new(HashingEmbedder::new(*dimensions)),
        EmbeddingConfig::Http {
            api_url,
            api_key,
            model,
        } => Arc::new(
            HttpEmbeddingClient::new(api_url, api_key.clone(), model.clone())
                .context("Failed to build embedding HTTP client")?,
        ),
    };
    Ok(embedder)
}
