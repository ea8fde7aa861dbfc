//! # Event bus for broadcasting runtime events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] that provides
//! non-blocking event publishing from the process supervisor and the façade.
//!
//! ## Architecture
//! ```text
//! Publishers:                          Receivers (many, independent):
//!   run pump (playground A) ──┐        ┌──► Subscription #1 (presentation layer)
//!   run pump (playground B) ──┼─► Bus ─┼──► Subscription #2
//!   Playgrounds façade      ──┘        └──► subscriber_listener ──► SubscriberSet
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never waits on receivers.
//! - **Per-receiver window**: each receiver reads the shared ring at its own
//!   cursor; a slow one lags and skips the oldest events without affecting
//!   publishers or other receivers (drop-oldest).
//! - **No persistence**: events are lost if there are no receivers at send time;
//!   history is pulled from the log buffer instead.
//!
//! ## Capacity behavior
//! When the channel reaches capacity the ring keeps only the most recent
//! `capacity` events; receivers that fell behind observe `RecvError::Lagged(n)`
//! on their next `recv()`. [`Subscription`] logs and skips past that.

use tokio::sync::broadcast;

use super::event::Event;
use super::subscription::Subscription;

/// Broadcast channel for runtime events.
///
/// ### Properties
/// - **Non-blocking**: `publish()` returns immediately.
/// - **Fire-and-forget**: no delivery or durability guarantees.
/// - **Cloneable**: cheap to clone (internally holds an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (clamped to at least 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<Event>(capacity);
        Self { tx }
    }

    /// Publishes an event to all attached receivers.
    ///
    /// If there are no receivers the event is dropped.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Attaches a new subscription that observes events published from now on.
    pub fn subscribe(&self) -> Subscription {
        Subscription::new(self.tx.subscribe())
    }

    /// Raw receiver, for internal listeners that handle lag themselves.
    pub(crate) fn receiver(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Number of currently attached receivers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::PlaygroundId;

    #[tokio::test]
    async fn subscription_sees_only_later_events() {
        let bus = Bus::new(16);
        bus.publish(Event::dev_log(PlaygroundId::from("p"), "before"));

        let mut sub = bus.subscribe();
        bus.publish(Event::dev_log(PlaygroundId::from("p"), "after"));

        let ev = sub.recv().await.unwrap();
        assert_eq!(ev.chunk(), Some("after"));
        assert!(sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn slow_subscriber_skips_oldest_without_blocking_publisher() {
        let bus = Bus::new(4);
        let mut slow = bus.subscribe();
        let mut fast = bus.subscribe();

        for i in 0..10 {
            bus.publish(Event::dev_log(PlaygroundId::from("p"), i.to_string()));
            assert_eq!(fast.recv().await.unwrap().chunk(), Some(i.to_string().as_str()));
        }

        // Only the newest 4 remain in the slow subscriber's window, in order.
        let mut seen = Vec::new();
        while let Some(ev) = slow.try_recv() {
            seen.push(ev.chunk().unwrap().to_string());
        }
        assert_eq!(seen, vec!["6", "7", "8", "9"]);
        assert_eq!(slow.lagged(), 6);
    }

    #[tokio::test]
    async fn cancel_detaches_receiver() {
        let bus = Bus::new(4);
        let sub = bus.subscribe();
        assert_eq!(bus.receiver_count(), 1);
        sub.cancel();
        assert_eq!(bus.receiver_count(), 0);
    }
}
