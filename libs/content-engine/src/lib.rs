use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};
use url::Url;

pub mod catalog;
pub mod config;
pub mod error;
pub mod generator;
pub mod guard;
pub mod history;
pub mod picker;
pub mod resource;
pub mod sources;
pub mod template;

pub use catalog::{CatalogSnapshot, ResourceCatalog};
pub use config::EngineConfig;
pub use error::{ConfigError, EngineError, HistoryError, SourceError, TemplateError};
pub use generator::{render_post, ContentGenerator, GeneratedPost, DATE_FORMAT, DEFAULT_RETRY_BUDGET};
pub use guard::{fingerprint, UniquenessGuard};
pub use history::{GenerationHistory, MIN_FRESH_RESOURCES, SEEN_HASH_WINDOW};
pub use picker::{Picker, RandomPicker};
pub use resource::Resource;
pub use sources::{build_sources, create_http_client, PageFetcher, ResourceSource, SourceConfig};
pub use template::{ContactFooter, Template, TemplateKind, TemplateRegistry};

// --- Shared Utilities ---

/// Extract the domain/host from a URL string safely.
/// Returns "unknown" if the URL cannot be parsed.
pub fn extract_domain(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|s| s.to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Write `data` to a sibling `<path>.tmp` and rename it over `path`.
/// Readers see either the old file or the new one, never a partial write.
pub(crate) fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = PathBuf::from(tmp_name);

    std::fs::write(&tmp, data)?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}

// --- Shared Logging ---

/// Initialize structured logging with JSON format in production (when RUST_LOG is set),
/// or pretty format for local development.
pub fn init_logging() {
    let is_production = std::env::var("RUST_LOG").is_ok();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if is_production {
        let _ = fmt()
            .with_env_filter(filter)
            .json()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::io::stderr)
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_domain() {
        assert_eq!(extract_domain("https://free-for.dev/#/"), "free-for.dev");
        assert_eq!(extract_domain("https://blog.pareto.io/es/melhores-ias/"), "blog.pareto.io");
    }

    #[test]
    fn test_extract_domain_invalid() {
        assert_eq!(extract_domain("not a url"), "unknown");
        assert_eq!(extract_domain(""), "unknown");
    }

    #[test]
    fn test_write_atomic_replaces_file_and_leaves_no_tmp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"second");
        assert!(!dir.path().join("nested").join("state.json.tmp").exists());
    }

    #[test]
    fn test_write_atomic_failed_rename_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taken");
        std::fs::create_dir(&path).unwrap();

        assert!(write_atomic(&path, b"data").is_err());
        assert!(path.is_dir());
        assert!(!dir.path().join("taken.tmp").exists());
    }

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging();
        init_logging();
    }
}
