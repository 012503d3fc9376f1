use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

use crate::error::HistoryError;
use crate::resource::Resource;
use crate::write_atomic;

/// Number of fingerprints retained for duplicate detection
pub const SEEN_HASH_WINDOW: usize = 100;
/// Below this many unused resources the rotation starts over
pub const MIN_FRESH_RESOURCES: usize = 5;

/// What has been generated recently: body fingerprints and consumed resource names.
///
/// Loaded once at startup and written back by [`GenerationHistory::commit`]
/// after each accepted generation. The file is meant for one process at a
/// time; concurrent writers lose updates.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationHistory {
    #[serde(default)]
    seen_hashes: VecDeque<String>,
    #[serde(default)]
    used_resource_names: BTreeSet<String>,
    #[serde(default)]
    last_update: Option<DateTime<Utc>>,
    #[serde(skip)]
    path: Option<PathBuf>,
}

impl GenerationHistory {
    /// A history that is never written to disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Read the history file, starting empty if it is missing or unreadable.
    #[instrument(skip(path), fields(path = %path.display()))]
    pub fn load(path: &Path) -> Self {
        let mut history = match std::fs::read(path) {
            Ok(data) => match serde_json::from_slice::<GenerationHistory>(&data) {
                Ok(history) => history,
                Err(e) => {
                    warn!(error = %e, "Failed to parse history file, starting empty");
                    Self::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No history file found, starting empty");
                Self::default()
            }
            Err(e) => {
                warn!(error = %e, "Failed to read history file, starting empty");
                Self::default()
            }
        };

        debug!(
            seen = history.seen_hashes.len(),
            used = history.used_resource_names.len(),
            "History loaded"
        );
        history.path = Some(path.to_path_buf());
        history
    }

    pub fn seen_hashes(&self) -> impl Iterator<Item = &str> {
        self.seen_hashes.iter().map(String::as_str)
    }

    pub fn seen_count(&self) -> usize {
        self.seen_hashes.len()
    }

    pub fn contains_fingerprint(&self, fingerprint: &str) -> bool {
        self.seen_hashes.iter().any(|h| h == fingerprint)
    }

    /// Append a fingerprint, evicting the oldest beyond `window`.
    pub(crate) fn push_fingerprint(&mut self, fingerprint: String, window: usize) {
        self.seen_hashes.push_back(fingerprint);
        while self.seen_hashes.len() > window {
            self.seen_hashes.pop_front();
        }
    }

    pub fn used_resource_names(&self) -> &BTreeSet<String> {
        &self.used_resource_names
    }

    pub fn mark_used(&mut self, name: &str) {
        self.used_resource_names.insert(name.to_string());
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    /// Resources not used recently.
    ///
    /// When fewer than [`MIN_FRESH_RESOURCES`] remain, the used set is
    /// cleared and the whole catalog is fresh again.
    pub fn fresh_resources<'a>(&mut self, catalog: &'a [Resource]) -> Vec<&'a Resource> {
        let fresh: Vec<&Resource> = catalog
            .iter()
            .filter(|r| !self.used_resource_names.contains(&r.name))
            .collect();

        if fresh.len() < MIN_FRESH_RESOURCES {
            debug!(
                fresh = fresh.len(),
                catalog = catalog.len(),
                "Low resource variety, resetting rotation"
            );
            self.used_resource_names.clear();
            return catalog.iter().collect();
        }

        fresh
    }

    /// Persist the history. Writes a sibling temp file and renames it over the target.
    pub fn commit(&mut self) -> Result<(), HistoryError> {
        self.last_update = Some(Utc::now());

        let Some(path) = self.path.clone() else {
            return Ok(());
        };

        let data = serde_json::to_vec_pretty(&*self)?;
        write_atomic(&path, &data).map_err(|source| HistoryError::Io {
            path: path.clone(),
            source,
        })?;

        debug!(path = %path.display(), seen = self.seen_hashes.len(), "History committed");
        Ok(())
    }
}
