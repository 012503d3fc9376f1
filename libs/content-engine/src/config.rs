use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::generator::DEFAULT_RETRY_BUDGET;
use crate::sources::{default_source_configs, load_source_configs, SourceConfig};
use crate::template::ContactFooter;

pub const DEFAULT_HISTORY_PATH: &str = "/tmp/content_engine_history.json";
pub const DEFAULT_CATALOG_CACHE_PATH: &str = "/tmp/content_engine_catalog.json";
pub const DEFAULT_OUTPUT_DIR: &str = "content";
pub const DEFAULT_CATALOG_MAX_AGE_HOURS: u64 = 24;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_FETCH_RETRY_ELAPSED_SECS: u64 = 60;

/// Runtime settings, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub history_path: PathBuf,
    pub catalog_cache_path: PathBuf,
    pub sources_path: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub catalog_max_age_hours: u64,
    pub retry_budget: usize,
    pub http_timeout_secs: u64,
    pub fetch_retry_elapsed_secs: u64,
    pub footer: ContactFooter,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_path: PathBuf::from(DEFAULT_HISTORY_PATH),
            catalog_cache_path: PathBuf::from(DEFAULT_CATALOG_CACHE_PATH),
            sources_path: None,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            catalog_max_age_hours: DEFAULT_CATALOG_MAX_AGE_HOURS,
            retry_budget: DEFAULT_RETRY_BUDGET,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            fetch_retry_elapsed_secs: DEFAULT_FETCH_RETRY_ELAPSED_SECS,
            footer: ContactFooter::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or empty keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Ok(Self {
            history_path: get("CONTENT_HISTORY_PATH").map(PathBuf::from).unwrap_or(defaults.history_path),
            catalog_cache_path: get("CONTENT_CATALOG_CACHE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.catalog_cache_path),
            sources_path: get("CONTENT_SOURCES_PATH").map(PathBuf::from),
            output_dir: get("CONTENT_OUTPUT_DIR").map(PathBuf::from).unwrap_or(defaults.output_dir),
            catalog_max_age_hours: parse_or("CATALOG_MAX_AGE_HOURS", get("CATALOG_MAX_AGE_HOURS"), defaults.catalog_max_age_hours)?,
            retry_budget: parse_or("GENERATION_RETRY_BUDGET", get("GENERATION_RETRY_BUDGET"), defaults.retry_budget)?,
            http_timeout_secs: parse_or("HTTP_TIMEOUT_SECS", get("HTTP_TIMEOUT_SECS"), defaults.http_timeout_secs)?,
            fetch_retry_elapsed_secs: parse_or(
                "FETCH_RETRY_ELAPSED_SECS",
                get("FETCH_RETRY_ELAPSED_SECS"),
                defaults.fetch_retry_elapsed_secs,
            )?,
            footer: ContactFooter {
                email: get("CONTACT_EMAIL").unwrap_or(defaults.footer.email),
                instagram: get("CONTACT_INSTAGRAM").unwrap_or(defaults.footer.instagram),
            },
        })
    }

    /// Sources from the configured file, or the built-in defaults.
    pub fn source_configs(&self) -> Result<Vec<SourceConfig>, ConfigError> {
        match &self.sources_path {
            Some(path) => load_source_configs(path),
            None => Ok(default_source_configs()),
        }
    }
}

fn parse_or<T: FromStr>(key: &str, value: Option<String>, default: T) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw,
        }),
    }
}
