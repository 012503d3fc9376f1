use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single catalog source. Recovered inside the catalog.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned {status}")]
    Status { url: String, status: reqwest::StatusCode },

    #[error("Failed to parse source content: {0}")]
    Parse(String),
}

impl SourceError {
    /// Timeouts, connection failures, rate limits and 5xx responses are worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            SourceError::Http(e) => e.is_timeout() || e.is_connect() || is_transient_error(&e.to_string()),
            SourceError::Status { status, .. } => {
                status.as_u16() == 429 || status.is_server_error()
            }
            SourceError::Parse(_) => false,
        }
    }
}

pub(crate) fn is_transient_error(err: &str) -> bool {
    let transient_patterns = [
        "timeout",
        "timed out",
        "connection",
        "rate limit",
        "429",
        "500",
        "502",
        "503",
        "504",
        "temporarily",
        "overloaded",
    ];

    let err_lower = err.to_lowercase();
    transient_patterns.iter().any(|p| err_lower.contains(p))
}

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template '{template}' references unknown placeholder '{{{placeholder}}}'")]
    UnknownPlaceholder { template: String, placeholder: String },

    #[error("Template '{template}' would render blank value for '{{{placeholder}}}'")]
    BlankValue { template: String, placeholder: String },

    #[error("Template '{template}' has an unterminated placeholder")]
    Unterminated { template: String },

    #[error("Template '{template}' has no values to choose from for '{{{placeholder}}}'")]
    EmptyPool { template: String, placeholder: String },
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("History I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("History serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    #[error("Unknown source type: '{source_type}' for source '{name}'")]
    UnknownSourceType { name: String, source_type: String },

    #[error("Failed to read sources file {path}: {message}")]
    SourcesFile { path: PathBuf, message: String },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Invalid mention pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Errors surfaced to callers of the generation pipeline.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("No resources available after a forced catalog refresh")]
    NoResourcesAvailable,

    #[error("Generation exhausted after {attempts} duplicate attempts")]
    GenerationExhausted { attempts: usize },

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    History(#[from] HistoryError),
}
