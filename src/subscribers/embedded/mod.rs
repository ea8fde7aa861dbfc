//! # Built-in subscribers
//!
//! - [`LogWriter`]: reports events through `tracing` (requires the `logging` feature).

#[cfg(feature = "logging")]
mod log;

#[cfg(feature = "logging")]
pub use log::LogWriter;
