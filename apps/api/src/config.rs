use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::embedding_client::hashing::DEFAULT_DIMENSIONS;
use crate::skills::normalizer::DEFAULT_FUZZY_CUTOFF;
use crate::skills::similarity::StrategyKind;

const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Which embedding provider backs the match scorer.
#[derive(Debug, Clone, PartialEq)]
pub enum EmbeddingConfig {
    Hashing {
        dimensions: usize,
    },
    Http {
        api_url: String,
        api_key: Option<String>,
        model: String,
    },
}

/// Application configuration loaded from environment variables.
/// Startup fails if any value is present but invalid.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub skills_path: PathBuf,
    pub roles_path: PathBuf,
    pub fuzzy_cutoff: f64,
    pub fuzzy_strategy: StrategyKind,
    pub embedding: EmbeddingConfig,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, so parsing can be tested without touching
    /// the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let fuzzy_cutoff = get("FUZZY_CUTOFF", &DEFAULT_FUZZY_CUTOFF.to_string())
            .parse::<f64>()
            .context("FUZZY_CUTOFF must be a number")?;
        if !(0.0..=1.0).contains(&fuzzy_cutoff) {
            bail!("FUZZY_CUTOFF must be between 0 and 1, got {fuzzy_cutoff}");
        }

        let fuzzy_strategy = get("FUZZY_STRATEGY", "levenshtein")
            .parse::<StrategyKind>()
            .map_err(anyhow::Error::msg)?;

        let embedding = match get("EMBEDDING_BACKEND", "hashing").trim() {
            "hashing" => EmbeddingConfig::Hashing {
                dimensions: get("EMBEDDING_DIMENSIONS", &DEFAULT_DIMENSIONS.to_string())
                    .parse::<usize>()
                    .ok()
                    .filter(|&d| d > 0)
                    .context("EMBEDDING_DIMENSIONS must be a positive integer")?,
            },
            "http" => EmbeddingConfig::Http {
                api_url: lookup("EMBEDDING_API_URL")
                    .context("EMBEDDING_API_URL is required when EMBEDDING_BACKEND=http")?,
                api_key: lookup("EMBEDDING_API_KEY").filter(|k| !k.is_empty()),
                model: get("EMBEDDING_MODEL", DEFAULT_EMBEDDING_MODEL),
            },
            other => bail!("EMBEDDING_BACKEND must be 'hashing' or 'http', got '{other}'"),
        };

        Ok(Config {
            port: get("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: get("RUST_LOG", "info"),
            skills_path: PathBuf::from(get("SKILLS_PATH", "data/known_skills.json")),
            roles_path: PathBuf::from(get("ROLES_PATH", "data/roles.json")),
            fuzzy_cutoff,
            fuzzy_strategy,
            embedding,
            max_upload_bytes: get("MAX_UPLOAD_BYTES", &DEFAULT_MAX_UPLOAD_BYTES.to_string())
                .parse::<usize>()
                .context("MAX_UPLOAD_BYTES must be a positive integer")?,
        })
    }
}
