//! # Subscription: a detachable live feed of runtime events.
//!
//! A [`Subscription`] owns its own receiver on the [`Bus`](super::Bus), so
//! there is no shared callback list to mutate while events are being delivered.
//! Dropping it (or calling [`Subscription::cancel`]) detaches it.
//!
//! A subscription only observes events published after it was created. To
//! backfill history, pull the log snapshot (`Playgrounds::get_dev_log`) right
//! after subscribing; chunks that arrive in between may then be seen twice,
//! never missed.

use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::warn;

use super::event::Event;
use crate::registry::PlaygroundId;

/// Live event feed held by one observer.
#[derive(Debug)]
pub struct Subscription {
    rx: broadcast::Receiver<Event>,
    lagged: u64,
}

impl Subscription {
    pub(crate) fn new(rx: broadcast::Receiver<Event>) -> Self {
        Self { rx, lagged: 0 }
    }

    /// Waits for the next event.
    ///
    /// Returns `None` once the bus is gone. If this subscriber fell behind, the
    /// skipped events are counted in [`Subscription::lagged`] and delivery
    /// resumes at the oldest retained event.
    pub async fn recv(&mut self) -> Option<Event> {
        loop {
            match self.rx.recv().await {
                Ok(ev) => return Some(ev),
                Err(RecvError::Lagged(n)) => self.note_lag(n),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Returns the next already-published event without waiting.
    pub fn try_recv(&mut self) -> Option<Event> {
        loop {
            match self.rx.try_recv() {
                Ok(ev) => return Some(ev),
                Err(TryRecvError::Lagged(n)) => self.note_lag(n),
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    /// Waits for the next event belonging to `playground`, skipping others.
    pub async fn recv_for(&mut self, playground: &PlaygroundId) -> Option<Event> {
        loop {
            let ev = self.recv().await?;
            if &ev.playground == playground {
                return Some(ev);
            }
        }
    }

    /// Total number of events skipped because this subscriber lagged.
    pub fn lagged(&self) -> u64 {
        self.lagged
    }

    /// Detaches the subscription. Equivalent to dropping it.
    pub fn cancel(self) {}

    fn note_lag(&mut self, n: u64) {
        self.lagged += n;
        warn!(skipped = n, "subscription lagged; oldest events dropped");
    }
}
