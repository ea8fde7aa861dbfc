use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::config::Config;
use super::lifecycle::Playgrounds;
use super::supervisor::ProcessSupervisor;
use crate::catalog::AppCatalog;
use crate::error::PlaygroundError;
use crate::events::Bus;
use crate::git::{GitCli, GitClient};
use crate::registry::{JsonDirStore, PlaygroundStore, Registry};
use crate::runtime::{ContainerRuntime, DockerCli};
use crate::subscribers::{Subscribe, SubscriberSet};

/// Builder for constructing [`Playgrounds`] with pluggable collaborators.
///
/// Defaults: records in `<base_dir>/.meta` ([`JsonDirStore`]), [`GitCli`],
/// [`DockerCli`], catalog in `<base_dir>/.apps`, no subscribers.
pub struct PlaygroundsBuilder {
    cfg: Config,
    store: Option<Arc<dyn PlaygroundStore>>,
    git: Option<Arc<dyn GitClient>>,
    runtime: Option<Arc<dyn ContainerRuntime>>,
    catalog: Option<AppCatalog>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl PlaygroundsBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            store: None,
            git: None,
            runtime: None,
            catalog: None,
            subscribers: Vec::new(),
        }
    }

    /// Persists records through `store` instead of the metadata directory.
    pub fn with_store(mut self, store: Arc<dyn PlaygroundStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_git(mut self, git: Arc<dyn GitClient>) -> Self {
        self.git = Some(git);
        self
    }

    pub fn with_runtime(mut self, runtime: Arc<dyn ContainerRuntime>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Reads app descriptors from `dir`.
    pub fn with_catalog_dir(mut self, dir: impl Into<std::path::PathBuf>) -> Self {
        self.catalog = Some(AppCatalog::new(dir));
        self
    }

    /// Sets push-style event subscribers.
    ///
    /// Subscribers receive every event through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the façade and restores persisted playgrounds.
    ///
    /// Must be called inside a tokio runtime. Fails only if the record store
    /// cannot be read at all.
    pub async fn build(self) -> Result<Arc<Playgrounds>, PlaygroundError> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let token = CancellationToken::new();

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(JsonDirStore::new(self.cfg.meta_dir())) as Arc<dyn PlaygroundStore>);
        let registry = Registry::new(store);
        registry.load().await?;

        let supervisor = ProcessSupervisor::new(
            bus.clone(),
            self.cfg.log_capacity_clamped(),
            self.cfg.termination,
            self.cfg.drain_timeout,
        );
        let git = self
            .git
            .unwrap_or_else(|| Arc::new(GitCli) as Arc<dyn GitClient>);
        let runtime = self
            .runtime
            .unwrap_or_else(|| Arc::new(DockerCli::new()) as Arc<dyn ContainerRuntime>);
        let catalog = self
            .catalog
            .unwrap_or_else(|| AppCatalog::new(self.cfg.base_dir.join(".apps")));

        if !self.subscribers.is_empty() {
            subscriber_listener(&bus, SubscriberSet::new(self.subscribers), token.clone());
        }

        Ok(Arc::new(Playgrounds::new_internal(
            self.cfg, bus, registry, supervisor, git, runtime, catalog, token,
        )))
    }
}

/// Forwards bus events to the subscriber set until `token` is cancelled.
fn subscriber_listener(bus: &Bus, set: SubscriberSet, token: CancellationToken) {
    use tokio::sync::broadcast::error::RecvError;

    let mut rx = bus.receiver();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                msg = rx.recv() => match msg {
                    Ok(ev) => set.emit(&ev),
                    Err(RecvError::Lagged(n)) => {
                        warn!(skipped = n, "subscriber listener lagged; events dropped for all subscribers");
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }
        debug!(subscribers = set.len(), "subscriber listener stopping");
        set.shutdown().await;
    });
}
