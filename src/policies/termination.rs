//! # Termination policy for `stop_dev`.
//!
//! [`TerminationPolicy`] decides which signal `stop` sends and whether it
//! escalates to a forced kill when the process ignores it.
//!
//! - [`TerminationPolicy::Graceful`] SIGTERM now, SIGKILL after `grace` if the same run is still live (default).
//! - [`TerminationPolicy::SignalOnly`] SIGTERM only; a process that ignores it keeps running.
//! - [`TerminationPolicy::Immediate`] SIGKILL right away.
//!
//! ```text
//! stop(id)
//!   ├─► send initial_signal() to the process group        (stop returns here)
//!   └─► escalate_after() == Some(grace):
//!         sleep(grace) ──► run still live? ──► SIGKILL process group
//! ```
//!
//! Signals go to the whole process group so that shells (`sh -c "npm run dev"`)
//! do not leave their children behind holding the output pipes open.

use std::time::Duration;

/// Signal to deliver to a supervised process group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopSignal {
    /// Polite request (`SIGTERM`).
    Terminate,
    /// Forced kill (`SIGKILL`).
    Kill,
}

/// Policy controlling how a supervised process is stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerminationPolicy {
    /// Terminate, then kill after `grace` (default: 5s).
    Graceful { grace: Duration },
    /// Terminate and never escalate.
    SignalOnly,
    /// Kill immediately.
    Immediate,
}

impl TerminationPolicy {
    /// First signal sent by `stop`.
    pub fn initial_signal(&self) -> StopSignal {
        match self {
            TerminationPolicy::Immediate => StopSignal::Kill,
            TerminationPolicy::Graceful { .. } | TerminationPolicy::SignalOnly => {
                StopSignal::Terminate
            }
        }
    }

    /// Delay before escalating to [`StopSignal::Kill`], if escalation applies.
    ///
    /// A zero grace escalates on the next scheduler tick.
    pub fn escalate_after(&self) -> Option<Duration> {
        match self {
            TerminationPolicy::Graceful { grace } => Some(*grace),
            TerminationPolicy::SignalOnly | TerminationPolicy::Immediate => None,
        }
    }

    /// Upper bound on how long a caller waiting for exit after `stop` should wait.
    ///
    /// Covers the grace period, the output drain window (`drain`) and a fixed
    /// settle margin. Used by delete/shutdown, which must not return while the
    /// process lives.
    pub fn exit_wait(&self, drain: Duration) -> Duration {
        let grace = self.escalate_after().unwrap_or(Duration::ZERO);
        grace + drain + SETTLE
    }
}

/// Slack for signal delivery and reaping on top of the configured windows.
const SETTLE: Duration = Duration::from_secs(1);

impl Default for TerminationPolicy {
    /// Returns [`TerminationPolicy::Graceful`] with a 5 second grace period.
    fn default() -> Self {
        TerminationPolicy::Graceful {
            grace: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_graceful_five_seconds() {
        let p = TerminationPolicy::default();
        assert_eq!(p.initial_signal(), StopSignal::Terminate);
        assert_eq!(p.escalate_after(), Some(Duration::from_secs(5)));
        assert_eq!(p.exit_wait(Duration::from_secs(2)), Duration::from_secs(8));
    }

    #[test]
    fn immediate_kills_without_escalation() {
        let p = TerminationPolicy::Immediate;
        assert_eq!(p.initial_signal(), StopSignal::Kill);
        assert_eq!(p.escalate_after(), None);
    }

    #[test]
    fn signal_only_never_escalates() {
        let p = TerminationPolicy::SignalOnly;
        assert_eq!(p.initial_signal(), StopSignal::Terminate);
        assert_eq!(p.escalate_after(), None);
    }

    #[test]
    fn exit_wait_covers_the_drain_window() {
        let drain = Duration::from_secs(10);
        assert!(TerminationPolicy::Immediate.exit_wait(drain) > drain);
        let graceful = TerminationPolicy::Graceful {
            grace: Duration::from_secs(3),
        };
        assert_eq!(graceful.exit_wait(drain), Duration::from_secs(14));
    }
}
