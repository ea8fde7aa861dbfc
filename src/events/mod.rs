//! Runtime events: types, broadcast bus and subscriptions.
//!
//! ## Contents
//! - [`EventKind`], [`Event`], [`ExitInfo`] event classification and payload
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//! - [`Subscription`] detachable per-observer feed
//!
//! ## Quick reference
//! - **Publishers**: the per-run output pump (`DevStarted`/`DevLog`/`DevExit`)
//!   and the `Playgrounds` façade (`PlaygroundCreated`/`PlaygroundDeleted`).
//! - **Consumers**: `Subscription`s handed to the presentation layer and the
//!   façade's subscriber listener feeding the `SubscriberSet`.

mod bus;
mod event;
mod subscription;

pub use bus::Bus;
pub use event::{Event, EventKind, ExitInfo};
pub use subscription::Subscription;
