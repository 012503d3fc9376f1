use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

use crate::resource::{dedup_by_name, Resource};
use crate::sources::ResourceSource;
use crate::write_atomic;

/// The last fetched resource list and when it was fetched.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CatalogSnapshot {
    pub fetched_at: DateTime<Utc>,
    pub resources: Vec<Resource>,
}

impl CatalogSnapshot {
    pub fn is_fresh(&self, now: DateTime<Utc>, max_age_hours: u64) -> bool {
        let max_age_secs = i64::try_from(max_age_hours.saturating_mul(3600)).unwrap_or(i64::MAX);
        (now - self.fetched_at).num_seconds() < max_age_secs
    }
}

/// Resources available for generation, refreshed from sources on a time-based cache policy.
pub struct ResourceCatalog {
    sources: Vec<Box<dyn ResourceSource>>,
    cache_path: Option<PathBuf>,
    snapshot: Option<CatalogSnapshot>,
}

impl ResourceCatalog {
    pub fn new(sources: Vec<Box<dyn ResourceSource>>) -> Self {
        Self {
            sources,
            cache_path: None,
            snapshot: None,
        }
    }

    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    pub fn resources(&self) -> &[Resource] {
        self.snapshot
            .as_ref()
            .map(|s| s.resources.as_slice())
            .unwrap_or(&[])
    }

    pub fn snapshot(&self) -> Option<&CatalogSnapshot> {
        self.snapshot.as_ref()
    }

    /// Return the current resources, rebuilding them from sources if no
    /// snapshot younger than `max_age_hours` exists in memory or on disk.
    ///
    /// Never fails: an empty slice means nothing is available.
    pub async fn refresh(&mut self, max_age_hours: u64) -> &[Resource] {
        let now = Utc::now();
        let fresh_in_memory = self
            .snapshot
            .as_ref()
            .is_some_and(|s| s.is_fresh(now, max_age_hours));

        if fresh_in_memory {
            debug!(count = self.resources().len(), "Using in-memory catalog");
        } else {
            match self.load_cached() {
                Some(snapshot) if snapshot.is_fresh(now, max_age_hours) => {
                    info!(count = snapshot.resources.len(), "Loaded catalog from cache");
                    self.snapshot = Some(snapshot);
                }
                _ => self.rebuild().await,
            }
        }

        self.resources()
    }

    /// Rebuild from sources regardless of cache age.
    ///
    /// If every source comes back empty the in-memory snapshot is dropped,
    /// even one that was still fresh. The cache file is left as it was.
    pub async fn force_refresh(&mut self) -> &[Resource] {
        self.rebuild().await;
        self.resources()
    }

    #[instrument(skip(self), fields(sources = self.sources.len()))]
    async fn rebuild(&mut self) {
        info!("Refreshing resource catalog from sources");
        let mut all_resources = Vec::new();

        for source in &self.sources {
            debug!(source = %source.name(), "Fetching from source");
            match source.fetch().await {
                Ok(mut resources) => {
                    info!(source = %source.name(), count = resources.len(), "Found resources");
                    all_resources.append(&mut resources);
                }
                Err(e) => warn!(source = %source.name(), error = %e, "Source unavailable, skipping"),
            }
        }

        let resources = dedup_by_name(all_resources);
        if resources.is_empty() {
            warn!("Catalog refresh produced no resources");
            self.snapshot = None;
            return;
        }

        let snapshot = CatalogSnapshot {
            fetched_at: Utc::now(),
            resources,
        };
        info!(count = snapshot.resources.len(), "Catalog refreshed with unique resources");

        if let Some(path) = &self.cache_path {
            persist_snapshot(path, &snapshot);
        }
        self.snapshot = Some(snapshot);
    }

    fn load_cached(&self) -> Option<CatalogSnapshot> {
        let path = self.cache_path.as_ref()?;
        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read catalog cache");
                return None;
            }
        };

        match serde_json::from_slice(&data) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to parse catalog cache, ignoring");
                None
            }
        }
    }
}

fn persist_snapshot(path: &Path, snapshot: &CatalogSnapshot) {
    let result = serde_json::to_vec_pretty(snapshot)
        .map_err(|e| e.to_string())
        .and_then(|data| {
            write_atomic(path, &data).map_err(|e| e.to_string())
        });

    match result {
        Ok(()) => debug!(path = %path.display(), "Catalog cache written"),
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to write catalog cache"),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::SourceError;
    use async_trait::async_trait;
    use chrono::Duration;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Test source that counts calls and can be told to fail.
    pub(crate) struct CountingSource {
        pub name: String,
        pub resources: Vec<Resource>,
        pub fail: bool,
        pub calls: Arc<AtomicUsize>,
    }

    impl CountingSource {
        pub(crate) fn boxed(name: &str, names: &[&str], calls: &Arc<AtomicUsize>) -> Box<dyn ResourceSource> {
            Box::new(Self {
                name: name.to_string(),
                resources: names
                    .iter()
                    .map(|n| {
                        Resource::new(*n)
                            .with_description(format!("{} description", n))
                            .with_category("automation")
                            .with_pricing("$10/month")
                            .with_use_case(format!("Automate work with {}", n))
                            .with_income_estimate("$1K/month")
                    })
                    .collect(),
                fail: false,
                calls: Arc::clone(calls),
            })
        }

        pub(crate) fn failing(name: &str, calls: &Arc<AtomicUsize>) -> Box<dyn ResourceSource> {
            Box::new(Self {
                name: name.to_string(),
                resources: Vec::new(),
                fail: true,
                calls: Arc::clone(calls),
            })
        }
    }

    #[async_trait]
    impl ResourceSource for CountingSource {
        fn name(&self) -> &str {
            &self.name
        }

        async fn fetch(&self) -> Result<Vec<Resource>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SourceError::Parse("source offline".to_string()));
            }
            Ok(self.resources.clone())
        }
    }

    fn names(resources: &[Resource]) -> Vec<&str> {
        resources.iter().map(|r| r.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_second_refresh_within_max_age_makes_no_calls() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut catalog = ResourceCatalog::new(vec![CountingSource::boxed("a", &["Zapier", "Loom"], &calls)]);

        let first = catalog.refresh(24).await.to_vec();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let second = catalog.refresh(24).await.to_vec();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_refresh_dedups_across_sources_first_wins() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut catalog = ResourceCatalog::new(vec![
            CountingSource::boxed("a", &["Zapier", "Loom"], &calls),
            CountingSource::boxed("b", &["Loom", "Canva"], &calls),
        ]);

        let resources = catalog.refresh(24).await;
        assert_eq!(names(resources), vec!["Zapier", "Loom", "Canva"]);
        assert_eq!(resources[1].description, "Loom description");
    }

    #[tokio::test]
    async fn test_failing_source_contributes_nothing() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut catalog = ResourceCatalog::new(vec![
            CountingSource::failing("down", &calls),
            CountingSource::boxed("up", &["Notion AI"], &calls),
        ]);

        let resources = catalog.refresh(24).await;
        assert_eq!(names(resources), vec!["Notion AI"]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_all_sources_failing_yields_empty_and_no_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("catalog.json");
        let calls = Arc::new(AtomicUsize::new(0));
        let mut catalog = ResourceCatalog::new(vec![CountingSource::failing("down", &calls)]).with_cache_path(&cache);

        assert!(catalog.refresh(24).await.is_empty());
        assert!(!cache.exists());

        // An empty result is not cached, so the next refresh tries again
        catalog.refresh(24).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fresh_cache_file_skips_sources() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("catalog.json");
        let calls = Arc::new(AtomicUsize::new(0));

        let mut first = ResourceCatalog::new(vec![CountingSource::boxed("a", &["Zapier"], &calls)]).with_cache_path(&cache);
        first.refresh(24).await;
        assert!(cache.exists());

        let mut second = ResourceCatalog::new(vec![CountingSource::boxed("a", &["Other"], &calls)]).with_cache_path(&cache);
        let resources = second.refresh(24).await;
        assert_eq!(names(resources), vec!["Zapier"]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stale_cache_file_is_rebuilt() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("catalog.json");
        let stale = CatalogSnapshot {
            fetched_at: Utc::now() - Duration::hours(48),
            resources: vec![Resource::new("Old Tool")],
        };
        std::fs::write(&cache, serde_json::to_vec(&stale).unwrap()).unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let mut catalog = ResourceCatalog::new(vec![CountingSource::boxed("a", &["New Tool"], &calls)]).with_cache_path(&cache);

        let resources = catalog.refresh(24).await;
        assert_eq!(names(resources), vec!["New Tool"]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let written: CatalogSnapshot = serde_json::from_slice(&std::fs::read(&cache).unwrap()).unwrap();
        assert_eq!(written.resources[0].name, "New Tool");
    }

    #[tokio::test]
    async fn test_force_refresh_ignores_fresh_snapshot() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut catalog = ResourceCatalog::new(vec![CountingSource::boxed("a", &["Zapier"], &calls)]);

        catalog.refresh(24).await;
        catalog.force_refresh().await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    /// Succeeds while `up` is set, fails otherwise.
    struct SwitchSource {
        up: Arc<AtomicBool>,
    }

    #[async_trait]
    impl ResourceSource for SwitchSource {
        fn name(&self) -> &str {
            "switch"
        }

        async fn fetch(&self) -> Result<Vec<Resource>, SourceError> {
            if self.up.load(Ordering::SeqCst) {
                Ok(vec![Resource::new("Zapier")])
            } else {
                Err(SourceError::Parse("down".to_string()))
            }
        }
    }

    #[tokio::test]
    async fn test_force_refresh_with_sources_down_drops_snapshot_keeps_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("catalog.json");
        let up = Arc::new(AtomicBool::new(true));
        let mut catalog = ResourceCatalog::new(vec![Box::new(SwitchSource { up: Arc::clone(&up) })])
            .with_cache_path(&cache);

        assert_eq!(names(catalog.refresh(24).await), vec!["Zapier"]);
        assert!(!dir.path().join("catalog.json.tmp").exists());

        up.store(false, Ordering::SeqCst);
        assert!(catalog.force_refresh().await.is_empty());
        assert!(catalog.snapshot().is_none());

        let cached: CatalogSnapshot = serde_json::from_slice(&std::fs::read(&cache).unwrap()).unwrap();
        assert_eq!(cached.resources[0].name, "Zapier");
    }

    #[test]
    fn test_snapshot_freshness_boundary() {
        let now = Utc::now();
        let snapshot = CatalogSnapshot {
            fetched_at: now - Duration::hours(23),
            resources: Vec::new(),
        };
        assert!(snapshot.is_fresh(now, 24));
        assert!(!snapshot.is_fresh(now, 23));
        assert!(!snapshot.is_fresh(now, 0));
    }
}
