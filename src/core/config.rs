//! # Global runtime configuration.
//!
//! Provides [`Config`], centralized settings for the playground runtime.
//!
//! Config is used in two ways:
//! 1. **Façade creation**: `Playgrounds::builder(config)`
//! 2. **Process supervision**: log retention, stop policy and output draining
//!
//! ## Sentinel values
//! - `log_capacity = 0` → clamped to 1 byte
//! - `bus_capacity = 0` → clamped to 1 event
//! - `drain_timeout = 0s` → do not wait for output after the process exited
//!
//! ## Environment overrides ([`Config::from_env`])
//! | Variable                   | Field                      |
//! |----------------------------|----------------------------|
//! | `PLAYVISOR_HOME`           | `base_dir`                 |
//! | `PLAYVISOR_LOG_CAPACITY`   | `log_capacity` (bytes)     |
//! | `PLAYVISOR_STOP_GRACE_MS`  | `termination` grace (ms)   |
//! | `PLAYVISOR_EDITOR`         | `editor`                   |

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::policies::TerminationPolicy;

/// Global configuration for the playground runtime.
///
/// ## Field semantics
/// - `base_dir`: root under which repositories are cloned (`<base_dir>/<id>`) and records stored
/// - `log_capacity`: bytes of output retained per supervised process
/// - `bus_capacity`: event ring size; subscribers lagging further drop the oldest events
/// - `termination`: how `stop_dev` brings a process down
/// - `drain_timeout`: how long to keep reading output after the process exited
/// - `editor`: command used by `open_editor`
/// - `terminal`: command used by `open_terminal` (`None` = platform default)
#[derive(Clone, Debug)]
pub struct Config {
    /// Root directory for clones and metadata (default `~/.playgrounds`).
    pub base_dir: PathBuf,

    /// Per-process log retention in bytes.
    ///
    /// Output beyond this is discarded oldest-first; live subscribers still
    /// receive every chunk.
    pub log_capacity: usize,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,

    /// Stop behavior: terminate, optional escalation to kill.
    pub termination: TerminationPolicy,

    /// Output drain window after exit.
    ///
    /// Background children that inherited the pipes can keep them open after
    /// the supervised process exited; reading stops after this window so the
    /// exit event is never held back indefinitely.
    pub drain_timeout: Duration,

    /// Editor launched by `open_editor` with the playground path as argument.
    pub editor: String,

    /// Terminal launcher for `open_terminal`.
    pub terminal: Option<String>,
}

impl Config {
    /// Default config with overrides from `PLAYVISOR_*` environment variables.
    ///
    /// Malformed values are logged and ignored.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(home) = std::env::var_os("PLAYVISOR_HOME") {
            cfg.base_dir = PathBuf::from(home);
        }
        if let Some(n) = env_number("PLAYVISOR_LOG_CAPACITY") {
            cfg.log_capacity = n as usize;
        }
        if let Some(ms) = env_number("PLAYVISOR_STOP_GRACE_MS") {
            cfg.termination = TerminationPolicy::Graceful {
                grace: Duration::from_millis(ms),
            };
        }
        if let Ok(editor) = std::env::var("PLAYVISOR_EDITOR") {
            if !editor.trim().is_empty() {
                cfg.editor = editor;
            }
        }
        cfg
    }

    /// Sets the base directory.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    /// Directory holding one JSON record per playground.
    #[inline]
    pub fn meta_dir(&self) -> PathBuf {
        self.base_dir.join(".meta")
    }

    /// Returns the log capacity clamped to a minimum of 1.
    #[inline]
    pub fn log_capacity_clamped(&self) -> usize {
        self.log_capacity.max(1)
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `base_dir = ~/.playgrounds` (falls back to the temp dir without a home)
    /// - `log_capacity = 256 KiB`
    /// - `bus_capacity = 4096`
    /// - `termination = Graceful { grace: 5s }`
    /// - `drain_timeout = 2s`
    /// - `editor = "code"`
    fn default() -> Self {
        let base_dir = dirs::home_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(".playgrounds");
        Self {
            base_dir,
            log_capacity: 256 * 1024,
            bus_capacity: 4096,
            termination: TerminationPolicy::default(),
            drain_timeout: Duration::from_secs(2),
            editor: "code".to_string(),
            terminal: None,
        }
    }
}

fn env_number(key: &str) -> Option<u64> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<u64>() {
        Ok(n) => Some(n),
        Err(e) => {
            warn!(key, value = %raw, error = %e, "ignoring malformed config override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_zero_capacities() {
        let cfg = Config {
            log_capacity: 0,
            bus_capacity: 0,
            ..Config::default()
        };
        assert_eq!(cfg.log_capacity_clamped(), 1);
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }

    #[test]
    fn meta_dir_lives_under_base_dir() {
        let cfg = Config::default().with_base_dir("/tmp/pg");
        assert_eq!(cfg.meta_dir(), PathBuf::from("/tmp/pg/.meta"));
        assert!(Config::default().base_dir.ends_with(".playgrounds"));
    }
}
