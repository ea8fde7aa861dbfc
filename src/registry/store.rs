//! # Durable keyed record store for playground metadata.
//!
//! [`PlaygroundStore`] is the persistence seam of the [`Registry`](super::Registry).
//! Two implementations are provided:
//! - [`JsonDirStore`]: one pretty-printed JSON file per record (`<dir>/<id>.json`),
//!   written through a temporary file and renamed into place;
//! - [`MemoryStore`]: in-process map, for tests and ephemeral setups.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::warn;

use super::playground::{Playground, PlaygroundId};
use crate::error::PlaygroundError;

/// Keyed persistence for [`Playground`] records.
#[async_trait]
pub trait PlaygroundStore: Send + Sync + 'static {
    /// Loads every readable record. Unreadable records are skipped.
    async fn load_all(&self) -> Result<Vec<Playground>, PlaygroundError>;

    /// Inserts or replaces the record with the same id.
    async fn save(&self, playground: &Playground) -> Result<(), PlaygroundError>;

    /// Removes the record; removing an absent record is not an error.
    async fn remove(&self, id: &PlaygroundId) -> Result<(), PlaygroundError>;
}

/// Stores each record as `<dir>/<id>.json`.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    /// Creates a store rooted at `dir` (created lazily on first save).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the records.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, id: &PlaygroundId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }
}

#[async_trait]
impl PlaygroundStore for JsonDirStore {
    async fn load_all(&self) -> Result<Vec<Playground>, PlaygroundError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut out = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let raw = match tokio::fs::read(&path).await {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable playground record");
                    continue;
                }
            };
            match serde_json::from_slice::<Playground>(&raw) {
                Ok(pg) => out.push(pg),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping malformed playground record");
                }
            }
        }
        Ok(out)
    }

    async fn save(&self, playground: &Playground) -> Result<(), PlaygroundError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let body = serde_json::to_vec_pretty(playground)?;
        let path = self.record_path(&playground.id);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove(&self, id: &PlaygroundId) -> Result<(), PlaygroundError> {
        match tokio::fs::remove_file(self.record_path(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Non-durable store backed by a map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<PlaygroundId, Playground>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> std::sync::MutexGuard<'_, HashMap<PlaygroundId, Playground>> {
        self.records.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[async_trait]
impl PlaygroundStore for MemoryStore {
    async fn load_all(&self) -> Result<Vec<Playground>, PlaygroundError> {
        Ok(self.records().values().cloned().collect())
    }

    async fn save(&self, playground: &Playground) -> Result<(), PlaygroundError> {
        self.records()
            .insert(playground.id.clone(), playground.clone());
        Ok(())
    }

    async fn remove(&self, id: &PlaygroundId) -> Result<(), PlaygroundError> {
        self.records().remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::playground::{DockerSource, PlaygroundSource};

    fn docker(id: &str) -> Playground {
        Playground::new(
            PlaygroundId::from(id),
            PlaygroundSource::Docker(DockerSource {
                image: "redis:latest".into(),
                container_id: format!("c-{id}"),
                port: None,
            }),
        )
    }

    #[tokio::test]
    async fn json_dir_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirStore::new(dir.path().join("meta"));
        store.save(&docker("a")).await.unwrap();
        store.save(&docker("b")).await.unwrap();
        store.remove(&PlaygroundId::from("a")).await.unwrap();

        let reopened = JsonDirStore::new(dir.path().join("meta"));
        let all = reopened.load_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id.as_str(), "b");
    }

    #[tokio::test]
    async fn json_dir_store_skips_garbage_and_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirStore::new(dir.path().join("absent"));
        assert!(store.load_all().await.unwrap().is_empty());

        let store = JsonDirStore::new(dir.path());
        std::fs::write(dir.path().join("broken.json"), b"{not json").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();
        store.save(&docker("ok")).await.unwrap();
        let all = store.load_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id.as_str(), "ok");
    }

    #[tokio::test]
    async fn removing_absent_record_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirStore::new(dir.path());
        store.remove(&PlaygroundId::from("nope")).await.unwrap();
        MemoryStore::new()
            .remove(&PlaygroundId::from("nope"))
            .await
            .unwrap();
    }
}
