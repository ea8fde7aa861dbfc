//! # Playgrounds: the lifecycle façade.
//!
//! [`Playgrounds`] is the single entry point of the crate. It composes the
//! [`Registry`], the [`ProcessSupervisor`], the container [`Reconciler`], the
//! collaborators behind [`GitClient`] / [`ContainerRuntime`], and the [`Bus`].
//!
//! ## Flows
//! ```text
//! create_github ──► git clone <base>/<id> ──► Registry.create ──► PlaygroundCreated
//!                      └─ failure: partial clone removed, no record
//! create_docker ──► runtime.run ──► Registry.create ──► PlaygroundCreated
//!
//! start_dev ──► Registry.get ──► resolve command ──► ProcessSupervisor.start
//!                 (explicit > declared > NoCommand)
//!
//! delete ──► Registry.get ──► ProcessSupervisor.discard ──► rm clone / container
//!        ──► Registry.delete ──► PlaygroundDeleted
//!
//! list ──► Registry.list ──► Reconciler.overlay
//!            ├─ docker: container state
//!            └─ github: supervision liveness
//! ```
//!
//! ## Rules
//! - Every operation taking an identifier fails with `NotFound` for unknown ids.
//! - `delete` and `start_dev` serialize on a per-identifier lock. A start can
//!   never slip in between discarding a run and removing its record, and a slow
//!   delete never holds up other playgrounds.
//! - Docker playgrounds have no dev process: `start_dev`, `open_editor` and
//!   `open_terminal` return `Unsupported`.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::builder::PlaygroundsBuilder;
use super::config::Config;
use super::shutdown::wait_for_shutdown_signal;
use super::supervisor::{DevStatus, ProcessSupervisor, StartOutcome};
use crate::catalog::{AppCatalog, AppCatalogEntry};
use crate::error::PlaygroundError;
use crate::events::{Bus, Event, EventKind, Subscription};
use crate::git::GitClient;
use crate::registry::{
    DockerSource, GithubSource, Playground, PlaygroundId, PlaygroundKind, PlaygroundSource,
    PlaygroundStatus, PlaygroundWithStatus, Registry,
};
use crate::runtime::{ContainerRuntime, Reconciler, RunRequest};
use crate::shell;

/// Request to clone a repository into a new playground.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGithub {
    pub repo_url: String,
    #[serde(default)]
    pub run_command: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
}

/// Request to start a container playground.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocker {
    pub image: String,
    #[serde(default)]
    pub port: Option<u16>,
    /// Extra `docker run` arguments, placed before the image. Split on
    /// whitespace; no shell quoting is applied.
    #[serde(default)]
    pub extra_args: Option<String>,
}

impl CreateDocker {
    fn extra_args(&self) -> Vec<String> {
        self.extra_args
            .as_deref()
            .map(|a| a.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

/// Request to start a playground's dev process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartDev {
    pub id: PlaygroundId,
    /// Overrides the declared run command when non-empty.
    #[serde(default)]
    pub command: Option<String>,
}

impl StartDev {
    /// Start with the playground's declared command.
    pub fn declared(id: impl Into<PlaygroundId>) -> Self {
        Self {
            id: id.into(),
            command: None,
        }
    }

    /// Start with an explicit command.
    pub fn with_command(id: impl Into<PlaygroundId>, command: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            command: Some(command.into()),
        }
    }
}

/// Lifecycle façade over all playgrounds of one base directory.
pub struct Playgrounds {
    cfg: Config,
    bus: Bus,
    registry: Registry,
    supervisor: Arc<ProcessSupervisor>,
    git: Arc<dyn GitClient>,
    runtime: Arc<dyn ContainerRuntime>,
    reconciler: Reconciler,
    catalog: AppCatalog,
    entry_locks: StdMutex<HashMap<PlaygroundId, Arc<Mutex<()>>>>,
    token: CancellationToken,
}

impl Playgrounds {
    /// Starts building a façade with `cfg`.
    pub fn builder(cfg: Config) -> PlaygroundsBuilder {
        PlaygroundsBuilder::new(cfg)
    }

    #[allow(clippy::too_many_arguments)]
    pub(super) fn new_internal(
        cfg: Config,
        bus: Bus,
        registry: Registry,
        supervisor: Arc<ProcessSupervisor>,
        git: Arc<dyn GitClient>,
        runtime: Arc<dyn ContainerRuntime>,
        catalog: AppCatalog,
        token: CancellationToken,
    ) -> Self {
        Self {
            cfg,
            bus,
            registry,
            supervisor,
            reconciler: Reconciler::new(Arc::clone(&runtime)),
            git,
            runtime,
            catalog,
            entry_locks: StdMutex::new(HashMap::new()),
            token,
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Every playground, oldest first, with its live status.
    pub async fn list_playgrounds(&self) -> Vec<PlaygroundWithStatus> {
        let records = self.registry.list().await;
        let running: HashSet<PlaygroundId> = self.supervisor.running().await.into_iter().collect();
        self.reconciler
            .overlay(records, |pg| {
                Some(if running.contains(&pg.id) {
                    PlaygroundStatus::Running
                } else {
                    PlaygroundStatus::Stopped
                })
            })
            .await
    }

    /// Returns one playground record.
    pub async fn get(&self, id: &PlaygroundId) -> Result<Playground, PlaygroundError> {
        self.registry.get(id).await
    }

    /// Clones `repo_url` into `<base_dir>/<id>` and registers it.
    pub async fn create_github(&self, req: CreateGithub) -> Result<Playground, PlaygroundError> {
        self.create_github_inner(req, None).await
    }

    /// Installs a catalog app as a github playground.
    pub async fn install_app(&self, app_id: &str) -> Result<Playground, PlaygroundError> {
        let entry = self
            .catalog
            .get(app_id)
            .await
            .ok_or_else(|| PlaygroundError::not_found(format!("app {app_id}")))?;
        let req = CreateGithub {
            repo_url: entry.repo_url,
            run_command: entry.default_run_command,
            port: entry.default_port,
        };
        self.create_github_inner(req, Some(entry.id)).await
    }

    async fn create_github_inner(
        &self,
        req: CreateGithub,
        app_id: Option<String>,
    ) -> Result<Playground, PlaygroundError> {
        let id = PlaygroundId::generate();
        let dest = self.cfg.base_dir.join(id.as_str());
        tokio::fs::create_dir_all(&self.cfg.base_dir).await?;

        let repo_url = req.repo_url.trim().to_string();
        if let Err(e) = self.git.clone_repo(&repo_url, &dest).await {
            remove_tree(&dest).await;
            return Err(e);
        }

        let source = PlaygroundSource::Github(GithubSource {
            repo_url,
            path: dest.clone(),
            run_command: non_empty(req.run_command),
            port: req.port,
            app_id,
        });
        let pg = match self.registry.create_with(id, source).await {
            Ok(pg) => pg,
            Err(e) => {
                remove_tree(&dest).await;
                return Err(e);
            }
        };
        self.announce_created(&pg);
        Ok(pg)
    }

    /// Runs `image` detached and registers the container.
    pub async fn create_docker(&self, req: CreateDocker) -> Result<Playground, PlaygroundError> {
        let run = RunRequest {
            image: req.image.trim().to_string(),
            port: req.port,
            extra_args: req.extra_args(),
        };
        let container_id = self.runtime.run(&run).await?;

        let source = PlaygroundSource::Docker(DockerSource {
            image: run.image,
            container_id: container_id.clone(),
            port: run.port,
        });
        let pg = match self.registry.create(source).await {
            Ok(pg) => pg,
            Err(e) => {
                if let Err(rm) = self.runtime.remove(&container_id).await {
                    warn!(container = %container_id, error = %rm, "orphaned container not removed");
                }
                return Err(e);
            }
        };
        self.announce_created(&pg);
        Ok(pg)
    }

    fn announce_created(&self, pg: &Playground) {
        info!(playground = %pg.id, kind = pg.kind().as_str(), "playground created");
        self.bus.publish(Event::new(
            pg.id.clone(),
            EventKind::PlaygroundCreated { kind: pg.kind() },
        ));
    }

    /// Stops supervision, removes the clone or container, then the record.
    pub async fn delete_playground(&self, id: &PlaygroundId) -> Result<(), PlaygroundError> {
        let lock = self.entry_lock(id);
        let _guard = lock.lock().await;
        let pg = self.registry.get(id).await?;

        self.supervisor.discard(id).await?;

        match &pg.source {
            PlaygroundSource::Github(g) => {
                if g.path.starts_with(&self.cfg.base_dir) {
                    remove_tree(&g.path).await;
                } else {
                    warn!(playground = %id, path = %g.path.display(), "clone outside base dir left in place");
                }
            }
            PlaygroundSource::Docker(d) => {
                if let Err(e) = self.runtime.remove(&d.container_id).await {
                    warn!(playground = %id, container = %d.container_id, error = %e, "container not removed");
                }
            }
        }

        self.registry.delete(id).await?;
        self.entry_locks
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(id);
        self.bus
            .publish(Event::new(id.clone(), EventKind::PlaygroundDeleted));
        info!(playground = %id, "playground deleted");
        Ok(())
    }

    /// Starts the dev process, or reports the one already running.
    pub async fn start_dev(&self, req: StartDev) -> Result<StartOutcome, PlaygroundError> {
        let lock = self.entry_lock(&req.id);
        let _guard = lock.lock().await;
        let pg = self.registry.get(&req.id).await?;
        let Some(path) = pg.path() else {
            return Err(unsupported("start_dev", &pg));
        };

        let command = non_empty(req.command)
            .or_else(|| non_empty(pg.run_command().map(str::to_string)))
            .ok_or_else(|| PlaygroundError::NoCommand { id: pg.id.clone() })?;

        self.supervisor.start(&pg.id, path, &command).await
    }

    /// Requests termination of the dev process; no-op when none runs.
    pub async fn stop_dev(&self, id: &PlaygroundId) -> Result<(), PlaygroundError> {
        self.ensure_known(id).await?;
        self.supervisor.stop(id).await
    }

    /// Liveness and retained output of the dev process.
    pub async fn get_dev_log(&self, id: &PlaygroundId) -> Result<DevStatus, PlaygroundError> {
        self.ensure_known(id).await?;
        Ok(self.supervisor.status(id).await)
    }

    pub async fn docker_installed(&self) -> bool {
        self.runtime.installed().await
    }

    pub async fn docker_stop(&self, container_id: &str) -> Result<(), PlaygroundError> {
        self.runtime.stop(container_id).await
    }

    pub async fn docker_remove(&self, container_id: &str) -> Result<(), PlaygroundError> {
        self.runtime.remove(container_id).await
    }

    /// Live feed of events published from now on.
    pub fn subscribe(&self) -> Subscription {
        self.bus.subscribe()
    }

    /// Installable apps.
    pub async fn app_catalog(&self) -> Vec<AppCatalogEntry> {
        self.catalog.entries().await.to_vec()
    }

    /// The catalog cache, e.g. to invalidate it after editing descriptors.
    pub fn catalog(&self) -> &AppCatalog {
        &self.catalog
    }

    /// Opens the playground directory in the configured editor.
    pub async fn open_editor(&self, id: &PlaygroundId) -> Result<(), PlaygroundError> {
        let dir = self.local_dir(id, "open_editor").await?;
        shell::open_editor(&self.cfg.editor, &dir)
    }

    /// Opens a terminal in the playground directory.
    pub async fn open_terminal(&self, id: &PlaygroundId) -> Result<(), PlaygroundError> {
        let dir = self.local_dir(id, "open_terminal").await?;
        shell::open_terminal(self.cfg.terminal.as_deref(), &dir)
    }

    /// Stops every dev process and detaches built-in listeners.
    ///
    /// Dev processes run in their own process groups and are not children of
    /// the host's group. Call this before exiting: dropping the façade only
    /// sends SIGTERM to live groups and does not wait or escalate.
    pub async fn shutdown(&self) {
        self.supervisor.shutdown().await;
        self.token.cancel();
    }

    /// Waits for SIGINT/SIGTERM/SIGQUIT (Ctrl-C on Windows), then [`shutdown`](Self::shutdown)s.
    pub async fn shutdown_on_signal(&self) -> std::io::Result<()> {
        wait_for_shutdown_signal().await?;
        info!("shutdown signal received");
        self.shutdown().await;
        Ok(())
    }

    /// Lock serializing start and delete of one playground.
    fn entry_lock(&self, id: &PlaygroundId) -> Arc<Mutex<()>> {
        let mut locks = self.entry_locks.lock().unwrap_or_else(|p| p.into_inner());
        Arc::clone(locks.entry(id.clone()).or_default())
    }

    async fn ensure_known(&self, id: &PlaygroundId) -> Result<(), PlaygroundError> {
        if self.registry.contains(id).await {
            Ok(())
        } else {
            Err(PlaygroundError::not_found(id))
        }
    }

    async fn local_dir(&self, id: &PlaygroundId, operation: &'static str) -> Result<PathBuf, PlaygroundError> {
        let pg = self.registry.get(id).await?;
        pg.path()
            .map(Path::to_path_buf)
            .ok_or_else(|| unsupported(operation, &pg))
    }
}

impl Drop for Playgrounds {
    fn drop(&mut self) {
        self.supervisor.terminate_all_now();
        self.token.cancel();
    }
}

fn unsupported(operation: &'static str, pg: &Playground) -> PlaygroundError {
    debug_assert_eq!(pg.kind(), PlaygroundKind::Docker);
    PlaygroundError::Unsupported {
        operation,
        kind: pg.kind().as_str(),
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

async fn remove_tree(path: &Path) {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "failed to remove directory"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_commands_do_not_count() {
        assert_eq!(non_empty(Some("  ".into())), None);
        assert_eq!(non_empty(None), None);
        assert_eq!(non_empty(Some(" npm run dev ".into())).as_deref(), Some("npm run dev"));
    }

    #[test]
    fn start_dev_request_shape() {
        let req: StartDev = serde_json::from_str(r#"{"id":"abc"}"#).unwrap();
        assert_eq!(req, StartDev::declared("abc"));
        let req: StartDev = serde_json::from_str(r#"{"id":"abc","command":"make"}"#).unwrap();
        assert_eq!(req, StartDev::with_command("abc", "make"));
    }

    #[test]
    fn docker_extra_args_arrive_as_one_string() {
        let req: CreateDocker = serde_json::from_str(
            r#"{"image":"postgres:16","port":5432,"extraArgs":" -e POSTGRES_PASSWORD=pw  --rm "}"#,
        )
        .unwrap();
        assert_eq!(req.extra_args(), vec!["-e", "POSTGRES_PASSWORD=pw", "--rm"]);

        let req: CreateDocker = serde_json::from_str(r#"{"image":"redis"}"#).unwrap();
        assert!(req.extra_args().is_empty());
    }
}
