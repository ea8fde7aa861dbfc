//! Process stop policies.
//!
//! Supervised processes are never restarted automatically; the only policy
//! knob is **how** a running process is brought down.
//!
//! ## Contents
//! - [`TerminationPolicy`] terminate / escalate / kill behavior of `stop_dev`
//! - [`StopSignal`] the signal actually delivered
//!
//! ## Quick wiring
//! ```text
//! Config { termination: TerminationPolicy, .. }
//!      └─► core::supervisor::ProcessSupervisor::stop uses:
//!           - initial_signal() for the first delivery
//!           - escalate_after() to schedule a forced kill
//!           - exit_wait(drain) to bound discard()/shutdown()
//! ```

mod termination;

pub use termination::{StopSignal, TerminationPolicy};
