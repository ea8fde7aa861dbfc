//! # App catalog.
//!
//! A directory of JSON descriptors, one per installable app (`<id>.json`).
//! [`AppCatalog`] loads it once on first use and serves the cached result until
//! [`AppCatalog::invalidate`] is called.
//!
//! ## Validation
//! - `id`, `name`, `description` and `repoUrl` must be present and non-empty;
//! - the file stem is authoritative: a mismatching `id` is replaced by it;
//! - unreadable or invalid descriptors are logged and skipped, never fatal;
//! - a missing directory yields an empty catalog.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::CatalogError;

/// One installable app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppCatalogEntry {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub repo_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_run_command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup_instructions: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requirements: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_command: Option<String>,
}

impl AppCatalogEntry {
    /// Parses and validates the descriptor stored at `path`.
    pub fn parse(path: &Path, content: &str) -> Result<Self, CatalogError> {
        let mut entry: AppCatalogEntry =
            serde_json::from_str(content).map_err(|source| CatalogError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        for (field, value) in [
            ("id", &entry.id),
            ("name", &entry.name),
            ("description", &entry.description),
            ("repoUrl", &entry.repo_url),
        ] {
            if value.trim().is_empty() {
                return Err(CatalogError::MissingField {
                    path: path.to_path_buf(),
                    field,
                });
            }
        }

        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            if entry.id != stem {
                warn!(file = %path.display(), expected = stem, found = %entry.id, "app id mismatch; using file name");
                entry.id = stem.to_string();
            }
        }
        Ok(entry)
    }
}

/// Load-once cache over a descriptor directory.
#[derive(Debug)]
pub struct AppCatalog {
    dir: PathBuf,
    cache: Mutex<Option<Arc<[AppCatalogEntry]>>>,
}

impl AppCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: Mutex::new(None),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// All valid entries, ordered by file name.
    pub async fn entries(&self) -> Arc<[AppCatalogEntry]> {
        let mut cache = self.cache.lock().await;
        if let Some(entries) = cache.as_ref() {
            return Arc::clone(entries);
        }
        let loaded: Arc<[AppCatalogEntry]> = load_dir(&self.dir).await.into();
        *cache = Some(Arc::clone(&loaded));
        loaded
    }

    /// Looks an entry up by id.
    pub async fn get(&self, id: &str) -> Option<AppCatalogEntry> {
        self.entries().await.iter().find(|e| e.id == id).cloned()
    }

    /// Drops the cached result; the next read reloads the directory.
    pub async fn invalidate(&self) {
        *self.cache.lock().await = None;
    }
}

async fn load_dir(dir: &Path) -> Vec<AppCatalogEntry> {
    let mut rd = match tokio::fs::read_dir(dir).await {
        Ok(rd) => rd,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "app catalog directory unavailable");
            return Vec::new();
        }
    };

    let mut files = Vec::new();
    loop {
        match rd.next_entry().await {
            Ok(Some(entry)) => {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) == Some("json") {
                    files.push(path);
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "app catalog listing interrupted");
                break;
            }
        }
    }
    files.sort();

    let mut entries = Vec::with_capacity(files.len());
    for path in files {
        match read_entry(&path).await {
            Ok(entry) => entries.push(entry),
            Err(e) => warn!(error = %e, label = e.as_label(), "skipping app descriptor"),
        }
    }
    debug!(dir = %dir.display(), count = entries.len(), "app catalog loaded");
    entries
}

async fn read_entry(path: &Path) -> Result<AppCatalogEntry, CatalogError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    AppCatalogEntry::parse(path, &content)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, body: &str) {
        std::fs::write(dir.join(name), body).unwrap();
    }

    const VALID: &str = r#"{
        "id": "next-starter",
        "name": "Next starter",
        "description": "A Next.js app",
        "repoUrl": "https://github.com/vercel/next-starter",
        "defaultRunCommand": "npm run dev",
        "defaultPort": 3000
    }"#;

    #[tokio::test]
    async fn loads_valid_and_skips_invalid_descriptors() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "next-starter.json", VALID);
        write(dir.path(), "broken.json", "{ not json");
        write(dir.path(), "partial.json", r#"{"id":"partial","name":"P"}"#);
        write(dir.path(), "notes.txt", "ignored");

        let catalog = AppCatalog::new(dir.path());
        let entries = catalog.entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "next-starter");
        assert_eq!(entries[0].default_port, Some(3000));
        assert_eq!(entries[0].default_run_command.as_deref(), Some("npm run dev"));
    }

    #[tokio::test]
    async fn file_stem_overrides_mismatched_id() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "renamed.json", VALID);
        let catalog = AppCatalog::new(dir.path());
        assert!(catalog.get("renamed").await.is_some());
        assert!(catalog.get("next-starter").await.is_none());
    }

    #[tokio::test]
    async fn caches_until_invalidated() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = AppCatalog::new(dir.path());
        assert!(catalog.entries().await.is_empty());

        write(dir.path(), "next-starter.json", VALID);
        assert!(catalog.entries().await.is_empty(), "served from cache");

        catalog.invalidate().await;
        assert_eq!(catalog.entries().await.len(), 1);
    }

    #[tokio::test]
    async fn missing_directory_is_empty() {
        let catalog = AppCatalog::new("/definitely/not/a/catalog");
        assert!(catalog.entries().await.is_empty());
    }

    #[test]
    fn missing_field_is_reported_by_name() {
        let err = AppCatalogEntry::parse(
            Path::new("x.json"),
            r#"{"id":"x","name":"X","description":"  ","repoUrl":"u"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::MissingField { field: "description", .. }));
    }
}
