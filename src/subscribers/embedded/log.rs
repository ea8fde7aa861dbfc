//! # LogWriter: event reporter over `tracing`
//!
//! A minimal subscriber that reports incoming [`Event`]s through `tracing`.
//! Process starts and exits are `info`, log chunks are `trace` (they can be
//! very frequent), abnormal exits are `warn`.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! INFO  playground=3f2c… pid=4242 command="npm run dev" dev started
//! TRACE playground=3f2c… bytes=64 dev log
//! INFO  playground=3f2c… code=Some(0) signal=None dev exited
//! INFO  playground=3f2c… type=github playground created
//! ```

use async_trait::async_trait;
use tracing::{info, trace, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let id = &e.playground;
        match &e.kind {
            EventKind::DevStarted { pid, command } => {
                info!(playground = %id, pid, command = %command, "dev started");
            }
            EventKind::DevLog { chunk } => {
                trace!(playground = %id, bytes = chunk.len(), "dev log");
            }
            EventKind::DevExit {
                error: Some(error), ..
            } => {
                warn!(playground = %id, error = %error, "dev exited abnormally");
            }
            EventKind::DevExit { code, signal, .. } => {
                info!(playground = %id, ?code, ?signal, "dev exited");
            }
            EventKind::PlaygroundCreated { kind } => {
                info!(playground = %id, kind = kind.as_str(), "playground created");
            }
            EventKind::PlaygroundDeleted => {
                info!(playground = %id, "playground deleted");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }

    fn queue_capacity(&self) -> usize {
        4096
    }
}
