//! Container runtime integration.
//!
//! - [`ContainerRuntime`]: seam for run/inspect/stop/remove, implemented by [`DockerCli`]
//! - [`Reconciler`]: merges live container state into registry listings

mod docker;
mod reconciler;

pub use docker::{ContainerRuntime, ContainerState, DockerCli, RunRequest};
pub use reconciler::Reconciler;
