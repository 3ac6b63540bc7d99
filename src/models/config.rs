//! Configuration model loaded from external sources.

use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Prefix of environment variables overriding configuration keys.
pub const ENV_PREFIX: &str = "RECOMMENDER";

#[derive(Clone, Debug, Deserialize)]
/// Settings shared by the server and the command line tools.
pub struct ServerConfig {
    pub database_url: String,
    pub bind_address: String,
    pub candidate_count: usize,
    pub embedding_model: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub fetch_timeout_secs: u64,
    pub generation_timeout_secs: u64,
}

impl ServerConfig {
    /// Merge defaults, the YAML file at `path` (or an optional `config.yaml`)
    /// and `RECOMMENDER_*` environment variables.
    ///
    /// `GEMINI_API_KEY` is used when no API key is configured otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .set_default("database_url", "catalog.db")?
            .set_default("bind_address", "0.0.0.0:8000")?
            .set_default("candidate_count", 15_i64)?
            .set_default("embedding_model", "all-minilm-l6-v2")?
            .set_default("gemini_model", "gemini-1.5-flash")?
            .set_default(
                "gemini_base_url",
                "https://generativelanguage.googleapis.com/v1beta",
            )?
            .set_default("fetch_timeout_secs", 10_i64)?
            .set_default("generation_timeout_secs", 30_i64)?;

        let builder = match path {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name("config").required(false)),
        };

        let mut config: ServerConfig = builder
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()?;

        if config.gemini_api_key.as_deref().is_none_or(str::is_empty) {
            config.gemini_api_key = std::env::var("GEMINI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty());
        }

        Ok(config)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs.max(1))
    }
}
