//! Container runtime seam and its docker CLI implementation.
//!
//! Every call is a one-shot `docker` invocation. A missing binary or an
//! unreachable daemon surfaces as [`PlaygroundError::RuntimeUnavailable`]; an
//! unknown container as [`ContainerState::Missing`].

use async_trait::async_trait;
use tracing::debug;

use crate::error::PlaygroundError;
use crate::shell;

/// What the runtime reports about one container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    Running,
    Stopped,
    /// The runtime does not know the container (removed out of band).
    Missing,
}

/// Parameters of a detached `run`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunRequest {
    pub image: String,
    /// Published as `port:port`.
    pub port: Option<u16>,
    /// Extra arguments placed before the image.
    pub extra_args: Vec<String>,
}

/// Operations the lifecycle needs from a container runtime.
#[async_trait]
pub trait ContainerRuntime: Send + Sync + 'static {
    /// True when the runtime binary is available.
    async fn installed(&self) -> bool;

    /// Starts a detached container and returns its identifier.
    async fn run(&self, req: &RunRequest) -> Result<String, PlaygroundError>;

    /// Reports the state of `container_id`.
    async fn inspect(&self, container_id: &str) -> Result<ContainerState, PlaygroundError>;

    async fn stop(&self, container_id: &str) -> Result<(), PlaygroundError>;

    /// Force-removes `container_id`.
    async fn remove(&self, container_id: &str) -> Result<(), PlaygroundError>;
}

/// [`ContainerRuntime`] backed by the `docker` command line.
#[derive(Debug, Clone)]
pub struct DockerCli {
    binary: String,
}

impl DockerCli {
    pub fn new() -> Self {
        Self::with_binary("docker")
    }

    /// Uses another docker-compatible binary (e.g. `podman`).
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Builds the argument list of a detached run.
    pub fn run_args(req: &RunRequest) -> Vec<String> {
        let mut args = vec!["run".to_string(), "-d".to_string()];
        if let Some(port) = req.port {
            args.push("-p".to_string());
            args.push(format!("{port}:{port}"));
        }
        args.extend(req.extra_args.iter().cloned());
        args.push(req.image.clone());
        args
    }

    async fn exec(&self, args: &[&str]) -> Result<String, PlaygroundError> {
        if shell::which(&self.binary).is_none() {
            return Err(PlaygroundError::RuntimeUnavailable {
                reason: format!("`{}` not found on PATH", self.binary),
            });
        }
        match shell::run(&self.binary, args, None).await {
            Ok(out) => Ok(out.stdout),
            Err(PlaygroundError::CommandFailed { stderr, .. }) if daemon_down(&stderr) => {
                Err(PlaygroundError::RuntimeUnavailable { reason: stderr })
            }
            Err(PlaygroundError::Io(e)) => Err(PlaygroundError::RuntimeUnavailable {
                reason: e.to_string(),
            }),
            Err(e) => Err(e),
        }
    }
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContainerRuntime for DockerCli {
    async fn installed(&self) -> bool {
        shell::which(&self.binary).is_some()
    }

    async fn run(&self, req: &RunRequest) -> Result<String, PlaygroundError> {
        let args = Self::run_args(req);
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let stdout = self.exec(&refs).await?;
        let id = stdout.trim().lines().last().unwrap_or_default().trim().to_string();
        if id.is_empty() {
            return Err(PlaygroundError::CommandFailed {
                command: format!("{} {}", self.binary, args.join(" ")),
                stderr: "no container id on stdout".to_string(),
            });
        }
        debug!(image = %req.image, container = %id, "container started");
        Ok(id)
    }

    async fn inspect(&self, container_id: &str) -> Result<ContainerState, PlaygroundError> {
        match self
            .exec(&["inspect", "-f", "{{.State.Running}}", container_id])
            .await
        {
            Ok(out) => Ok(match out.trim() {
                "true" => ContainerState::Running,
                _ => ContainerState::Stopped,
            }),
            Err(PlaygroundError::CommandFailed { stderr, .. }) if no_such_container(&stderr) => {
                Ok(ContainerState::Missing)
            }
            Err(e) => Err(e),
        }
    }

    async fn stop(&self, container_id: &str) -> Result<(), PlaygroundError> {
        self.exec(&["stop", container_id]).await.map(drop)
    }

    async fn remove(&self, container_id: &str) -> Result<(), PlaygroundError> {
        match self.exec(&["rm", "-f", container_id]).await {
            Ok(_) => Ok(()),
            Err(PlaygroundError::CommandFailed { stderr, .. }) if no_such_container(&stderr) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

fn no_such_container(stderr: &str) -> bool {
    stderr.to_ascii_lowercase().contains("no such")
}

fn daemon_down(stderr: &str) -> bool {
    let s = stderr.to_ascii_lowercase();
    s.contains("cannot connect to the docker daemon") || s.contains("is the docker daemon running")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_args_publish_port_before_extra_args() {
        let req = RunRequest {
            image: "nginx:alpine".into(),
            port: Some(8080),
            extra_args: vec!["--name".into(), "web".into()],
        };
        assert_eq!(
            DockerCli::run_args(&req),
            ["run", "-d", "-p", "8080:8080", "--name", "web", "nginx:alpine"]
        );
    }

    #[test]
    fn run_args_without_port() {
        let req = RunRequest {
            image: "redis".into(),
            ..RunRequest::default()
        };
        assert_eq!(DockerCli::run_args(&req), ["run", "-d", "redis"]);
    }

    #[test]
    fn classifies_stderr() {
        assert!(no_such_container("Error: No such object: abc123"));
        assert!(no_such_container("Error response from daemon: No such container: abc"));
        assert!(daemon_down(
            "Cannot connect to the Docker daemon at unix:///var/run/docker.sock. Is the docker daemon running?"
        ));
        assert!(!daemon_down("Error: No such object: abc"));
    }

    #[tokio::test]
    async fn missing_binary_is_runtime_unavailable() {
        let cli = DockerCli::with_binary("definitely-not-docker-xyz");
        assert!(!cli.installed().await);
        let err = cli.inspect("abc").await.unwrap_err();
        assert!(err.is_runtime_unavailable());
    }
}
