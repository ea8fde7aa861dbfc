//! # playvisor
//!
//! **Playvisor** provisions disposable local playgrounds (a cloned repository
//! or a running container) and supervises one long-running dev process per
//! playground: spawn, live output, bounded log retention, stop, delete.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!                          ┌──────────────────────────┐
//!   create/list/delete ───►│  Playgrounds (façade)    │◄─── start_dev / stop_dev / get_dev_log
//!                          └──┬─────────┬─────────┬───┘
//!                             ▼         ▼         ▼
//!                   ┌──────────┐ ┌────────────┐ ┌──────────────────┐
//!                   │ Registry │ │ Reconciler │ │ ProcessSupervisor│
//!                   │ (+store) │ │ (runtime)  │ │  id ──► Slot     │
//!                   └──────────┘ └────────────┘ └───┬──────────────┘
//!                                                   │ one pump task per run
//!                                                   ▼
//!                              stdout/stderr ──► LogRingBuffer
//!                                            └─► Bus (DevStarted, DevLog…, DevExit)
//!                                                   │
//!                              ┌────────────────────┼────────────────────┐
//!                              ▼                    ▼                    ▼
//!                        Subscription        Subscription        SubscriberSet
//!                       (pull handle)        (pull handle)     (push workers: LogWriter…)
//! ```
//!
//! ### Run lifecycle
//! ```text
//! start_dev(id) ──► command = explicit > declared > NoCommand
//!   ├─ live already ─► StartOutcome { started: false, pid, command }
//!   └─ spawn `sh -c` in <path>, own process group
//!        ├─► DevStarted
//!        ├─► DevLog* (stdout/stderr, UTF-8 safe, in read order)
//!        └─► DevExit { code, signal }  (exactly once, after the last DevLog)
//!
//! stop_dev(id) ──► SIGTERM to the group ──(grace elapsed, still live)──► SIGKILL
//! ```
//!
//! ## Features
//! | Area              | Description                                              | Key types                                  |
//! |-------------------|----------------------------------------------------------|--------------------------------------------|
//! | **Lifecycle**     | Create, list, start, stop, delete playgrounds.           | [`Playgrounds`], [`PlaygroundsBuilder`]    |
//! | **Supervision**   | At most one dev process per playground.                  | [`ProcessSupervisor`], [`StartOutcome`]    |
//! | **Events**        | Live output and exit notifications.                      | [`Subscription`], [`Subscribe`], [`Event`] |
//! | **Registry**      | Durable playground records.                              | [`Registry`], [`PlaygroundStore`]          |
//! | **Collaborators** | git, docker and app catalog behind traits.               | [`GitClient`], [`ContainerRuntime`], [`AppCatalog`] |
//! | **Policies**      | How a dev process is brought down.                       | [`TerminationPolicy`]                      |
//! | **Errors**        | Typed errors with stable labels.                         | [`PlaygroundError`], [`CatalogError`]      |
//!
//! ## Optional features
//! - `logging` (default): exports the built-in [`LogWriter`] subscriber.
//!
//! ## Example
//! ```no_run
//! use playvisor::{Config, CreateGithub, Playgrounds, StartDev};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pg = Playgrounds::builder(Config::from_env()).build().await?;
//!
//!     let created = pg
//!         .create_github(CreateGithub {
//!             repo_url: "https://github.com/vercel/next-learn".into(),
//!             run_command: Some("npm install && npm run dev".into()),
//!             port: Some(3000),
//!         })
//!         .await?;
//!
//!     let mut feed = pg.subscribe();
//!     pg.start_dev(StartDev::declared(created.id.clone())).await?;
//!     while let Some(ev) = feed.recv_for(&created.id).await {
//!         if let Some(chunk) = ev.chunk() {
//!             print!("{chunk}");
//!         }
//!         if ev.is_dev_exit() {
//!             break;
//!         }
//!     }
//!     Ok(())
//! }
//! ```
mod catalog;
mod core;
mod error;
mod events;
mod git;
mod policies;
mod registry;
mod runtime;
mod subscribers;

pub mod shell;

// ---- Public re-exports ----

pub use catalog::{AppCatalog, AppCatalogEntry};
pub use core::{
    wait_for_shutdown_signal, Config, CreateDocker, CreateGithub, DevStatus, LogRingBuffer,
    Playgrounds, PlaygroundsBuilder, ProcessSupervisor, StartDev, StartOutcome,
};
pub use error::{CatalogError, PlaygroundError};
pub use events::{Bus, Event, EventKind, ExitInfo, Subscription};
pub use git::{GitCli, GitClient};
pub use policies::{StopSignal, TerminationPolicy};
pub use registry::{
    DockerSource, GithubSource, JsonDirStore, MemoryStore, Playground, PlaygroundId, PlaygroundKind,
    PlaygroundSource, PlaygroundStatus, PlaygroundStore, PlaygroundWithStatus, Registry,
};
pub use runtime::{ContainerRuntime, ContainerState, DockerCli, Reconciler, RunRequest};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: built-in subscriber reporting events through `tracing`.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::embedded::LogWriter;
