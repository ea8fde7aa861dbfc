//! # Runtime events emitted by the process supervisor and the façade.
//!
//! The [`EventKind`] enum classifies events:
//! - **Dev process events**: started, output chunk, exit
//! - **Registry events**: playground created / deleted
//!
//! Every event belongs to exactly one playground and carries a globally
//! monotonic sequence number (`seq`). Per playground, events are published by a
//! single writer, so `seq` order equals emission order: chunks in the order the
//! bytes were produced, then exactly one exit.
//!
//! ## Example
//! ```rust
//! use playvisor::{Event, EventKind, PlaygroundId};
//!
//! let ev = Event::dev_log(PlaygroundId::from("p1"), "hello\n");
//! assert_eq!(ev.playground.as_str(), "p1");
//! assert_eq!(ev.chunk(), Some("hello\n"));
//! assert!(matches!(ev.kind, EventKind::DevLog { .. }));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::registry::{PlaygroundId, PlaygroundKind};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events, with per-kind payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EventKind {
    /// A dev process was spawned.
    #[serde(rename_all = "camelCase")]
    DevStarted {
        /// OS process id.
        pid: u32,
        /// Resolved command line.
        command: Arc<str>,
    },

    /// A chunk of merged stdout/stderr output. May end mid-line.
    DevLog {
        /// Output text (complete UTF-8 characters only).
        chunk: Arc<str>,
    },

    /// The dev process terminated. Published exactly once per run, after the
    /// last `DevLog` of that run.
    DevExit {
        /// Exit code, if the process exited normally.
        code: Option<i32>,
        /// Terminating signal name (e.g. `SIGTERM`), if killed by a signal.
        signal: Option<Arc<str>>,
        /// Set when the exit was synthesized after an output I/O failure.
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<Arc<str>>,
    },

    /// A playground was registered.
    PlaygroundCreated {
        /// Variant of the new playground.
        #[serde(rename = "type")]
        kind: PlaygroundKind,
    },

    /// A playground was removed (its process, if any, already stopped).
    PlaygroundDeleted,
}

/// Runtime event.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - `playground`: the playground this event belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: DateTime<Utc>,
    /// Owning playground.
    pub playground: PlaygroundId,
    /// Event classification and payload.
    #[serde(flatten)]
    pub kind: EventKind,
}

impl Event {
    /// Creates a new event with the current timestamp and next sequence number.
    pub fn new(playground: PlaygroundId, kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: Utc::now(),
            playground,
            kind,
        }
    }

    #[inline]
    pub fn dev_started(playground: PlaygroundId, pid: u32, command: impl Into<Arc<str>>) -> Self {
        Self::new(
            playground,
            EventKind::DevStarted {
                pid,
                command: command.into(),
            },
        )
    }

    #[inline]
    pub fn dev_log(playground: PlaygroundId, chunk: impl Into<Arc<str>>) -> Self {
        Self::new(
            playground,
            EventKind::DevLog {
                chunk: chunk.into(),
            },
        )
    }

    #[inline]
    pub fn dev_exit(playground: PlaygroundId, exit: &ExitInfo) -> Self {
        Self::new(
            playground,
            EventKind::DevExit {
                code: exit.code,
                signal: exit.signal.clone(),
                error: exit.error.clone(),
            },
        )
    }

    /// Returns the output chunk for `DevLog` events.
    pub fn chunk(&self) -> Option<&str> {
        match &self.kind {
            EventKind::DevLog { chunk } => Some(chunk),
            _ => None,
        }
    }

    #[inline]
    pub fn is_dev_exit(&self) -> bool {
        matches!(self.kind, EventKind::DevExit { .. })
    }

    /// Short stable label for logs.
    pub fn as_label(&self) -> &'static str {
        match self.kind {
            EventKind::DevStarted { .. } => "dev_started",
            EventKind::DevLog { .. } => "dev_log",
            EventKind::DevExit { .. } => "dev_exit",
            EventKind::PlaygroundCreated { .. } => "playground_created",
            EventKind::PlaygroundDeleted => "playground_deleted",
        }
    }
}

/// How a supervised run ended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExitInfo {
    /// Exit code for a normal exit.
    pub code: Option<i32>,
    /// Signal name when terminated by a signal.
    pub signal: Option<Arc<str>>,
    /// Output I/O failure that forced the exit.
    pub error: Option<Arc<str>>,
}

impl ExitInfo {
    /// Builds exit info from an OS exit status.
    pub fn from_status(status: std::process::ExitStatus) -> Self {
        Self {
            code: status.code(),
            signal: signal_name(&status).map(Arc::from),
            error: None,
        }
    }

    /// Exit synthesized for an abnormal end without an OS status.
    pub fn abnormal(error: impl Into<Arc<str>>) -> Self {
        Self {
            code: None,
            signal: None,
            error: Some(error.into()),
        }
    }

    /// True for exit code 0.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

#[cfg(unix)]
fn signal_name(status: &std::process::ExitStatus) -> Option<String> {
    use std::os::unix::process::ExitStatusExt;

    let raw = status.signal()?;
    Some(match nix::sys::signal::Signal::try_from(raw) {
        Ok(sig) => sig.as_str().to_string(),
        Err(_) => format!("SIG{raw}"),
    })
}

#[cfg(not(unix))]
fn signal_name(_status: &std::process::ExitStatus) -> Option<String> {
    None
}
