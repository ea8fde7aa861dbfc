//! Error types used by the playground runtime.
//!
//! This module defines two error enums:
//!
//! - [`PlaygroundError`]: errors raised by lifecycle operations (create, start, stop, delete, ...).
//! - [`CatalogError`]: errors raised while parsing a single app catalog descriptor.
//!
//! Both provide [`as_label`](PlaygroundError::as_label) for logs; the `Display`
//! output is the message shown to the user.

use std::path::PathBuf;

use thiserror::Error;

use crate::registry::PlaygroundId;

/// # Errors produced by playground lifecycle operations.
///
/// Errors are always scoped to one playground: a failure here never affects
/// other playgrounds or the supervisor itself.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum PlaygroundError {
    /// No playground with this identifier is registered.
    #[error("playground {id} not found")]
    NotFound {
        /// The unknown identifier.
        id: String,
    },

    /// `start_dev` was called without a command and the playground declares none.
    #[error("no run command for playground {id}: pass one explicitly or declare a run command")]
    NoCommand {
        /// Playground that has nothing to run.
        id: PlaygroundId,
    },

    /// The OS refused to launch the dev process.
    #[error("failed to spawn `{command}` in {}: {source}", cwd.display())]
    Spawn {
        /// Command that was being launched.
        command: String,
        /// Working directory of the attempted launch.
        cwd: PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// The container runtime could not be reached (binary missing, daemon down).
    #[error("container runtime unavailable: {reason}")]
    RuntimeUnavailable {
        /// Human-readable cause.
        reason: String,
    },

    /// Operation is not meaningful for this playground variant.
    #[error("{operation} is not supported for {kind} playgrounds")]
    Unsupported {
        /// Operation name, e.g. `start_dev`.
        operation: &'static str,
        /// Variant tag, e.g. `docker`.
        kind: &'static str,
    },

    /// An external single-shot command (git, docker, editor) exited unsuccessfully.
    #[error("`{command}` failed: {stderr}")]
    CommandFailed {
        /// Command line that failed.
        command: String,
        /// Trimmed standard error of the command.
        stderr: String,
    },

    /// Persisting or loading a playground record failed.
    #[error("playground store: {0}")]
    Store(String),

    /// Filesystem or process I/O failure outside of spawning.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PlaygroundError {
    /// Shorthand for [`PlaygroundError::NotFound`].
    pub fn not_found(id: impl ToString) -> Self {
        PlaygroundError::NotFound { id: id.to_string() }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use playvisor::PlaygroundError;
    ///
    /// let err = PlaygroundError::not_found("abc");
    /// assert_eq!(err.as_label(), "playground_not_found");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            PlaygroundError::NotFound { .. } => "playground_not_found",
            PlaygroundError::NoCommand { .. } => "playground_no_command",
            PlaygroundError::Spawn { .. } => "playground_spawn_failed",
            PlaygroundError::RuntimeUnavailable { .. } => "runtime_unavailable",
            PlaygroundError::Unsupported { .. } => "playground_unsupported",
            PlaygroundError::CommandFailed { .. } => "command_failed",
            PlaygroundError::Store(_) => "store_failed",
            PlaygroundError::Io(_) => "io_failed",
        }
    }

    /// True for errors caused by the container runtime being unreachable.
    ///
    /// Status queries downgrade these to `Unknown` instead of propagating.
    pub fn is_runtime_unavailable(&self) -> bool {
        matches!(self, PlaygroundError::RuntimeUnavailable { .. })
    }
}

impl From<serde_json::Error> for PlaygroundError {
    fn from(e: serde_json::Error) -> Self {
        PlaygroundError::Store(e.to_string())
    }
}

/// # Errors produced while loading a single catalog descriptor.
///
/// Catalog loading never fails as a whole: each of these is logged and the
/// offending file skipped.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The descriptor could not be read.
    #[error("read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The descriptor is not valid JSON for an app entry.
    #[error("parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A required field is missing or empty.
    #[error("{}: missing required field `{field}`", path.display())]
    MissingField { path: PathBuf, field: &'static str },
}

impl CatalogError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            CatalogError::Read { .. } => "catalog_read_failed",
            CatalogError::Parse { .. } => "catalog_parse_failed",
            CatalogError::MissingField { .. } => "catalog_missing_field",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_stable() {
        let err = PlaygroundError::NoCommand {
            id: PlaygroundId::from("p1"),
        };
        assert_eq!(err.as_label(), "playground_no_command");
        assert!(err.to_string().contains("p1"));

        let err = PlaygroundError::RuntimeUnavailable {
            reason: "docker not found".into(),
        };
        assert!(err.is_runtime_unavailable());
        assert_eq!(err.as_label(), "runtime_unavailable");
    }

    #[test]
    fn spawn_error_mentions_command_and_cwd() {
        let err = PlaygroundError::Spawn {
            command: "npm run dev".into(),
            cwd: PathBuf::from("/tmp/nowhere"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        let msg = err.to_string();
        assert!(msg.contains("npm run dev"));
        assert!(msg.contains("/tmp/nowhere"));
    }
}
