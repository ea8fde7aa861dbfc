//! Runtime core: supervision and lifecycle.
//!
//! The public API from this module is [`Playgrounds`] (built by
//! [`PlaygroundsBuilder`]), the [`ProcessSupervisor`] it drives, and [`Config`].
//!
//! Internal modules:
//! - [`log_buffer`]: bounded per-process output retention;
//! - [`runner`]: pumps one run's output and waits for its exit;
//! - [`supervisor`]: identifier-keyed ownership table of dev processes;
//! - [`lifecycle`]: the façade composing registry, supervisor and collaborators;
//! - [`shutdown`]: process-group signalling and host shutdown signals.

mod builder;
mod config;
mod lifecycle;
mod log_buffer;
mod runner;
mod shutdown;
mod supervisor;

pub use builder::PlaygroundsBuilder;
pub use config::Config;
pub use lifecycle::{CreateDocker, CreateGithub, Playgrounds, StartDev};
pub use log_buffer::LogRingBuffer;
pub use shutdown::wait_for_shutdown_signal;
pub use supervisor::{DevStatus, ProcessSupervisor, StartOutcome};
