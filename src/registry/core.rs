//! # Playground registry: identifier-keyed catalog of playground records.
//!
//! ## Architecture
//! ```text
//! Playgrounds (façade)
//!     ├─► create(source)  ──► fresh id ──► store.save ──► table.insert
//!     ├─► update(id, f)   ──► f(&mut record) ──► store.save ──► table.replace
//!     ├─► delete(id)      ──► store.remove ──► table.remove
//!     └─► get / list      ──► table (read lock)
//! ```
//!
//! ## Rules
//! - The write lock is held across id allocation and insert: two concurrent
//!   creates can never observe the same free id.
//! - Persistence happens **before** the in-memory table changes, so the table
//!   never holds a record the store failed to accept.
//! - `update` may not change the id or the variant tag.
//! - The registry knows nothing about supervision; delete ordering
//!   (stop process first) is enforced by the façade.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use super::playground::{Playground, PlaygroundId, PlaygroundSource};
use super::store::PlaygroundStore;
use crate::error::PlaygroundError;

/// Durable registry of playgrounds.
pub struct Registry {
    records: RwLock<HashMap<PlaygroundId, Playground>>,
    store: Arc<dyn PlaygroundStore>,
}

impl Registry {
    /// Creates an empty registry over `store`. Call [`Registry::load`] to restore records.
    pub fn new(store: Arc<dyn PlaygroundStore>) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            store,
        }
    }

    /// Restores all records from the store, replacing the in-memory table.
    ///
    /// Returns the number of records loaded.
    pub async fn load(&self) -> Result<usize, PlaygroundError> {
        let loaded = self.store.load_all().await?;
        let mut records = self.records.write().await;
        records.clear();
        for pg in loaded {
            records.insert(pg.id.clone(), pg);
        }
        info!(count = records.len(), "playground registry loaded");
        Ok(records.len())
    }

    /// Registers a new playground under a freshly generated identifier.
    pub async fn create(&self, source: PlaygroundSource) -> Result<Playground, PlaygroundError> {
        self.create_with(PlaygroundId::generate(), source).await
    }

    /// Registers a new playground under `id`, used when the id had to be
    /// reserved before creation (e.g. for the clone directory name).
    ///
    /// If `id` collides with an existing record a fresh one is generated instead.
    pub async fn create_with(
        &self,
        mut id: PlaygroundId,
        source: PlaygroundSource,
    ) -> Result<Playground, PlaygroundError> {
        let mut records = self.records.write().await;
        while records.contains_key(&id) {
            id = PlaygroundId::generate();
        }
        let pg = Playground::new(id, source);
        self.store.save(&pg).await?;
        records.insert(pg.id.clone(), pg.clone());
        debug!(playground = %pg.id, kind = pg.kind().as_str(), "playground registered");
        Ok(pg)
    }

    /// Returns the record for `id`.
    pub async fn get(&self, id: &PlaygroundId) -> Result<Playground, PlaygroundError> {
        self.records
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| PlaygroundError::not_found(id))
    }

    /// Returns true if `id` is registered.
    pub async fn contains(&self, id: &PlaygroundId) -> bool {
        self.records.read().await.contains_key(id)
    }

    /// Returns all records, oldest first.
    pub async fn list(&self) -> Vec<Playground> {
        let records = self.records.read().await;
        let mut out: Vec<Playground> = records.values().cloned().collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        out
    }

    /// Applies `f` to the record and persists the result.
    ///
    /// Used to attach runtime-discovered fields (container id, port).
    /// Changes to the id or the variant tag are rejected.
    pub async fn update<F>(&self, id: &PlaygroundId, f: F) -> Result<Playground, PlaygroundError>
    where
        F: FnOnce(&mut PlaygroundSource),
    {
        let mut records = self.records.write().await;
        let current = records
            .get(id)
            .ok_or_else(|| PlaygroundError::not_found(id))?;

        let mut next = current.clone();
        f(&mut next.source);
        if next.kind() != current.kind() {
            return Err(PlaygroundError::Unsupported {
                operation: "changing the playground type",
                kind: current.kind().as_str(),
            });
        }

        self.store.save(&next).await?;
        records.insert(id.clone(), next.clone());
        Ok(next)
    }

    /// Removes the record and returns it.
    pub async fn delete(&self, id: &PlaygroundId) -> Result<Playground, PlaygroundError> {
        let mut records = self.records.write().await;
        if !records.contains_key(id) {
            return Err(PlaygroundError::not_found(id));
        }
        self.store.remove(id).await?;
        let removed = records
            .remove(id)
            .ok_or_else(|| PlaygroundError::not_found(id))?;
        debug!(playground = %id, "playground unregistered");
        Ok(removed)
    }

    /// Returns true if the registry is empty.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::registry::playground::{DockerSource, GithubSource, PlaygroundKind};
    use crate::registry::store::{JsonDirStore, MemoryStore};

    fn github(url: &str) -> PlaygroundSource {
        PlaygroundSource::Github(GithubSource {
            repo_url: url.into(),
            path: PathBuf::from("/tmp/x"),
            run_command: None,
            port: None,
            app_id: None,
        })
    }

    fn docker(container: &str) -> PlaygroundSource {
        PlaygroundSource::Docker(DockerSource {
            image: "redis".into(),
            container_id: container.into(),
            port: None,
        })
    }

    #[tokio::test]
    async fn create_assigns_unique_ids() {
        let reg = Arc::new(Registry::new(Arc::new(MemoryStore::new())));
        let mut joins = Vec::new();
        for i in 0..32 {
            let reg = Arc::clone(&reg);
            joins.push(tokio::spawn(async move {
                reg.create(github(&format!("https://github.com/u/{i}"))).await
            }));
        }
        let mut ids = std::collections::HashSet::new();
        for j in joins {
            ids.insert(j.await.unwrap().unwrap().id);
        }
        assert_eq!(ids.len(), 32);
        assert_eq!(reg.list().await.len(), 32);
    }

    #[tokio::test]
    async fn create_with_taken_id_picks_another() {
        let reg = Registry::new(Arc::new(MemoryStore::new()));
        let a = reg.create_with(PlaygroundId::from("same"), docker("c1")).await.unwrap();
        let b = reg.create_with(PlaygroundId::from("same"), docker("c2")).await.unwrap();
        assert_eq!(a.id.as_str(), "same");
        assert_ne!(b.id, a.id);
    }

    #[tokio::test]
    async fn update_attaches_container_id_but_not_kind() {
        let reg = Registry::new(Arc::new(MemoryStore::new()));
        let pg = reg.create(docker("old")).await.unwrap();

        let updated = reg
            .update(&pg.id, |src| {
                if let PlaygroundSource::Docker(d) = src {
                    d.container_id = "new".into();
                    d.port = Some(8080);
                }
            })
            .await
            .unwrap();
        assert_eq!(updated.container_id(), Some("new"));
        assert_eq!(updated.port(), Some(8080));
        assert_eq!(updated.created_at, pg.created_at);

        let err = reg
            .update(&pg.id, |src| *src = github("https://github.com/u/r"))
            .await
            .unwrap_err();
        assert_eq!(err.as_label(), "playground_unsupported");
        assert_eq!(reg.get(&pg.id).await.unwrap().kind(), PlaygroundKind::Docker);
    }

    #[tokio::test]
    async fn delete_unknown_is_not_found() {
        let reg = Registry::new(Arc::new(MemoryStore::new()));
        let err = reg.delete(&PlaygroundId::from("ghost")).await.unwrap_err();
        assert_eq!(err.as_label(), "playground_not_found");
    }

    #[tokio::test]
    async fn records_persist_across_registries() {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn PlaygroundStore> = Arc::new(JsonDirStore::new(dir.path()));

        let first = Registry::new(Arc::clone(&store));
        let kept = first.create(docker("keep")).await.unwrap();
        let gone = first.create(docker("gone")).await.unwrap();
        first.delete(&gone.id).await.unwrap();

        let second = Registry::new(store);
        assert_eq!(second.load().await.unwrap(), 1);
        assert_eq!(second.get(&kept.id).await.unwrap(), kept);
        assert!(!second.contains(&gone.id).await);
    }
}
