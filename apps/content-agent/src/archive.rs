use chrono::NaiveDate;
use content_engine::GeneratedPost;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing::{error, info};

const SUMMARY_SNIPPET_CHARS: usize = 100;
const MANIFEST_FILE: &str = "manifest.json";

// --- Manifest Struct ---
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ManifestEntry {
    pub date: String,
    pub title: String,
    pub template: String,
    pub resources: Vec<String>,
    pub fingerprint: String,
    pub path: String,
    pub summary_snippet: String,
}

/// Write the post as markdown and prepend it to the manifest. Returns the post path.
pub fn archive_post(
    output_dir: &Path,
    post: &GeneratedPost,
    date: NaiveDate,
) -> Result<PathBuf, Box<dyn Error + Send + Sync>> {
    let today = date.format("%Y-%m-%d").to_string();
    let short_fp: String = post.fingerprint.chars().take(8).collect();
    let relative = format!("posts/{}-{}.md", today, short_fp);
    let post_path = output_dir.join(&relative);

    if let Some(parent) = post_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&post_path, format!("# {}\n\n{}\n", post.title, post.body))?;
    info!(path = %post_path.display(), "Post written");

    let manifest_path = output_dir.join(MANIFEST_FILE);
    let mut manifest: Vec<ManifestEntry> = match std::fs::read(&manifest_path) {
        Ok(data) => serde_json::from_slice(&data).map_err(|e| {
            error!(error = %e, "Failed to parse existing manifest.json - file may be corrupted");
            e
        })?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("No existing manifest.json found, creating new one");
            Vec::new()
        }
        Err(e) => return Err(format!("Failed to read manifest.json: {}", e).into()),
    };

    // Replace an entry for the same body if one exists
    manifest.retain(|e| e.fingerprint != post.fingerprint);

    manifest.insert(
        0,
        ManifestEntry {
            date: today.clone(),
            title: post.title.clone(),
            template: post.template.to_string(),
            resources: post.resources.clone(),
            fingerprint: post.fingerprint.clone(),
            path: relative,
            summary_snippet: post.body.chars().take(SUMMARY_SNIPPET_CHARS).collect(),
        },
    );

    std::fs::write(&manifest_path, serde_json::to_vec_pretty(&manifest)?)?;
    info!(date = %today, entries = manifest.len(), "Manifest updated successfully");

    Ok(post_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use content_engine::TemplateKind;

    fn post(title: &str, fingerprint: &str) -> GeneratedPost {
        GeneratedPost {
            title: title.to_string(),
            body: format!("{} body", title),
            template: TemplateKind::ToolSpotlight,
            resources: vec!["Zapier".to_string()],
            fingerprint: fingerprint.to_string(),
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 4).unwrap()
    }

    #[test]
    fn test_archive_writes_post_and_manifest() {
        let dir = tempfile::tempdir().unwrap();

        let path = archive_post(dir.path(), &post("First", "aaaaaaaa1111"), date()).unwrap();
        assert_eq!(path, dir.path().join("posts/2025-03-04-aaaaaaaa.md"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# First\n\nFirst body\n");

        archive_post(dir.path(), &post("Second", "bbbbbbbb2222"), date()).unwrap();

        let manifest: Vec<ManifestEntry> =
            serde_json::from_slice(&std::fs::read(dir.path().join(MANIFEST_FILE)).unwrap()).unwrap();
        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest[0].title, "Second");
        assert_eq!(manifest[0].template, "tool_spotlight");
        assert_eq!(manifest[1].path, "posts/2025-03-04-aaaaaaaa.md");
    }

    #[test]
    fn test_archive_replaces_same_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        archive_post(dir.path(), &post("Same", "cccccccc"), date()).unwrap();
        archive_post(dir.path(), &post("Same", "cccccccc"), date()).unwrap();

        let manifest: Vec<ManifestEntry> =
            serde_json::from_slice(&std::fs::read(dir.path().join(MANIFEST_FILE)).unwrap()).unwrap();
        assert_eq!(manifest.len(), 1);
    }

    #[test]
    fn test_corrupted_manifest_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), b"not json").unwrap();

        assert!(archive_post(dir.path(), &post("Any", "dddddddd"), date()).is_err());
    }
}
