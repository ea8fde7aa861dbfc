//! # Push-style observers of playground events.
//!
//! Besides pull-style [`Subscription`](crate::events::Subscription) handles,
//! events can be pushed to long-lived observers implementing [`Subscribe`].
//!
//! ## Architecture
//! ```text
//! ProcessSupervisor / Playgrounds ── publish(Event) ──► Bus
//!                                                        │
//!                                      subscriber listener (one task)
//!                                                        │
//!                                                  SubscriberSet::emit
//!                                              ┌─────────┼─────────┐
//!                                              ▼         ▼         ▼
//!                                          LogWriter   Custom     ...
//! ```
//!
//! - [`Subscribe`]: the observer trait
//! - [`SubscriberSet`]: per-subscriber queues and workers
//! - [`embedded`]: built-in observers

mod set;
mod subscriber;

pub mod embedded;

pub use set::SubscriberSet;
pub use subscriber::Subscribe;
