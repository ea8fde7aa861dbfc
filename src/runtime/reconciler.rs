//! # Reconciler: overlays live container state on registry records.
//!
//! ```text
//! list(records)
//!   ├─ github ──► status from supervision (caller-provided)
//!   └─ docker ──► runtime.inspect(container_id)   (all concurrently, join_all)
//!                   ├─ Running  ──► Running
//!                   ├─ Stopped  ──► Stopped
//!                   ├─ Missing  ──► Unknown
//!                   └─ error    ──► Unknown (logged)
//! ```
//!
//! ## Rules
//! - Never mutates the registry; a record whose container vanished stays listed.
//! - One unreachable runtime never fails the whole listing.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, warn};

use super::docker::{ContainerRuntime, ContainerState};
use crate::registry::{Playground, PlaygroundStatus, PlaygroundWithStatus};

/// Classifies docker-backed playgrounds through a [`ContainerRuntime`].
#[derive(Clone)]
pub struct Reconciler {
    runtime: Arc<dyn ContainerRuntime>,
}

impl Reconciler {
    pub fn new(runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self { runtime }
    }

    /// Live status of one container; never fails.
    pub async fn container_status(&self, container_id: &str) -> PlaygroundStatus {
        match self.runtime.inspect(container_id).await {
            Ok(ContainerState::Running) => PlaygroundStatus::Running,
            Ok(ContainerState::Stopped) => PlaygroundStatus::Stopped,
            Ok(ContainerState::Missing) => {
                debug!(container = container_id, "container no longer known to the runtime");
                PlaygroundStatus::Unknown
            }
            Err(e) => {
                warn!(container = container_id, error = %e, label = e.as_label(), "container status unavailable");
                PlaygroundStatus::Unknown
            }
        }
    }

    /// Attaches a status to every record, preserving order.
    ///
    /// Docker records are inspected concurrently; other records keep the
    /// status computed by `other`.
    pub async fn overlay<F>(&self, records: Vec<Playground>, other: F) -> Vec<PlaygroundWithStatus>
    where
        F: Fn(&Playground) -> Option<PlaygroundStatus>,
    {
        let futs = records.into_iter().map(|playground| {
            let local = other(&playground);
            async move {
                let status = match playground.container_id() {
                    Some(cid) => Some(self.container_status(cid).await),
                    None => local,
                };
                PlaygroundWithStatus { playground, status }
            }
        });
        join_all(futs).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlaygroundError;
    use crate::registry::{DockerSource, GithubSource, PlaygroundId, PlaygroundSource};
    use crate::runtime::RunRequest;
    use async_trait::async_trait;

    struct Fixed;

    #[async_trait]
    impl ContainerRuntime for Fixed {
        async fn installed(&self) -> bool {
            true
        }
        async fn run(&self, _req: &RunRequest) -> Result<String, PlaygroundError> {
            Ok("c".into())
        }
        async fn inspect(&self, id: &str) -> Result<ContainerState, PlaygroundError> {
            match id {
                "up" => Ok(ContainerState::Running),
                "down" => Ok(ContainerState::Stopped),
                "gone" => Ok(ContainerState::Missing),
                _ => Err(PlaygroundError::RuntimeUnavailable {
                    reason: "daemon down".into(),
                }),
            }
        }
        async fn stop(&self, _id: &str) -> Result<(), PlaygroundError> {
            Ok(())
        }
        async fn remove(&self, _id: &str) -> Result<(), PlaygroundError> {
            Ok(())
        }
    }

    fn docker(cid: &str) -> Playground {
        Playground::new(
            PlaygroundId::from(cid),
            PlaygroundSource::Docker(DockerSource {
                image: "img".into(),
                container_id: cid.into(),
                port: None,
            }),
        )
    }

    #[tokio::test]
    async fn classifies_every_container_state() {
        let rec = Reconciler::new(Arc::new(Fixed));
        let github = Playground::new(
            PlaygroundId::from("gh"),
            PlaygroundSource::Github(GithubSource {
                repo_url: "https://example.com/r.git".into(),
                path: "/tmp/gh".into(),
                run_command: None,
                port: None,
                app_id: None,
            }),
        );
        let records = vec![docker("up"), docker("down"), docker("gone"), docker("err"), github];

        let listed = rec
            .overlay(records, |_| Some(PlaygroundStatus::Stopped))
            .await;
        let statuses: Vec<_> = listed.iter().map(|p| p.status).collect();
        assert_eq!(
            statuses,
            [
                Some(PlaygroundStatus::Running),
                Some(PlaygroundStatus::Stopped),
                Some(PlaygroundStatus::Unknown),
                Some(PlaygroundStatus::Unknown),
                Some(PlaygroundStatus::Stopped),
            ]
        );
        assert_eq!(listed[0].playground.id.as_str(), "up");
    }
}
