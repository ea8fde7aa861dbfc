//! Repository cloning.

use std::ffi::OsStr;
use std::path::Path;

use async_trait::async_trait;
use tracing::info;

use crate::error::PlaygroundError;
use crate::shell;

/// Clones a repository into a fresh directory.
#[async_trait]
pub trait GitClient: Send + Sync + 'static {
    /// Clones `repo_url` into `dest`, which must not exist yet.
    async fn clone_repo(&self, repo_url: &str, dest: &Path) -> Result<(), PlaygroundError>;
}

/// [`GitClient`] running `git clone --depth 1`.
#[derive(Debug, Clone, Default)]
pub struct GitCli;

#[async_trait]
impl GitClient for GitCli {
    async fn clone_repo(&self, repo_url: &str, dest: &Path) -> Result<(), PlaygroundError> {
        let args: [&OsStr; 6] = [
            OsStr::new("clone"),
            OsStr::new("--depth"),
            OsStr::new("1"),
            OsStr::new("--"),
            OsStr::new(repo_url),
            dest.as_os_str(),
        ];
        shell::run("git", args, None).await?;
        info!(repo = repo_url, dest = %dest.display(), "repository cloned");
        Ok(())
    }
}
