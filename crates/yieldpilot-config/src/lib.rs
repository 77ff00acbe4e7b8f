//! Configuration loading for YieldPilot.
//! Reads yieldpilot.toml from the current directory or the path in YIELDPILOT_CONFIG,
//! then applies environment overrides (DATABASE_URL, YIELDPILOT_BIND).

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub const CONFIG_ENV: &str = "YIELDPILOT_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "yieldpilot.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub ranker: RankerConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres connection string. Unset means the in-memory backend.
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 { 10 }

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { url: None, max_connections: default_max_connections() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankerConfig {
    /// Records fetched per page by the batch recompute.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Concurrent record updates within a page. 1 = sequential.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Flag-store key holding the weight vector JSON.
    #[serde(default = "default_weights_flag_key")]
    pub weights_flag_key: String,
}

fn default_page_size()        -> usize  { 500 }
fn default_max_concurrency()  -> usize  { 1 }
fn default_weights_flag_key() -> String { "ranking_weights".to_string() }

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            max_concurrency: default_max_concurrency(),
            weights_flag_key: default_weights_flag_key(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String { "127.0.0.1:3001".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}


impl Config {
    /// Load configuration from yieldpilot.toml.
    /// Checks YIELDPILOT_CONFIG first, then the current directory. A missing
    /// file is not an error: defaults apply and env overrides still run.
    pub fn load() -> Result<Self> {
        // .env is optional
        let _ = dotenvy::dotenv();

        let path = std::env::var(CONFIG_ENV)
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&path)
    }

    /// Same as [`Config::load`] with an explicit file path.
    pub fn load_from(path: &str) -> Result<Self> {
        let _ = dotenvy::dotenv();

        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::info!(path = %path, "Config file not found, using defaults");
            Config::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL").filter(|v| !v.is_empty()) {
            self.database.url = Some(url);
        }
        if let Some(bind) = lookup("YIELDPILOT_BIND").filter(|v| !v.is_empty()) {
            self.server.bind = bind;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.ranker.page_size == 0 {
            return Err(ConfigError::Invalid("ranker.page_size must be at least 1".into()));
        }
        if self.ranker.max_concurrency == 0 {
            return Err(ConfigError::Invalid("ranker.max_concurrency must be at least 1".into()));
        }
        if self.ranker.weights_flag_key.trim().is_empty() {
            return Err(ConfigError::Invalid("ranker.weights_flag_key must not be empty".into()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid("database.max_connections must be at least 1".into()));
        }
        Ok(())
    }
}
