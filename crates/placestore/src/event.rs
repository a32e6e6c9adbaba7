//! Change notifications emitted by the store.
//!
//! Every successful mutation produces exactly one [`PlaceEvent`], sent after
//! the change has been committed. Front ends subscribe with
//! [`PlaceStore::subscribe`](crate::store::PlaceStore::subscribe) and refresh
//! their snapshots when an event arrives.

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{trace, warn};

use crate::place::PlaceId;

/// Default number of undelivered events a subscriber may fall behind by.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// What changed in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum PlaceEvent {
    /// A place was created.
    Created(PlaceId),
    /// A place was edited or had its favorite flag toggled.
    Updated(PlaceId),
    /// A place was deleted.
    Deleted(PlaceId),
}

impl PlaceEvent {
    /// The place the event is about.
    #[must_use]
    pub const fn id(self) -> PlaceId {
        match self {
            Self::Created(id) | Self::Updated(id) | Self::Deleted(id) => id,
        }
    }
}

impl fmt::Display for PlaceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created(id) => write!(f, "created {id}"),
            Self::Updated(id) => write!(f, "updated {id}"),
            Self::Deleted(id) => write!(f, "deleted {id}"),
        }
    }
}

/// Sending half, owned by the store.
#[derive(Debug)]
pub(crate) struct EventBus {
    tx: broadcast::Sender<PlaceEvent>,
}

impl EventBus {
    pub(crate) fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub(crate) fn emit(&self, event: PlaceEvent) {
        // An error only means nobody is listening right now.
        match self.tx.send(event) {
            Ok(receivers) => trace!("Delivered '{}' to {} subscriber(s)", event, receivers),
            Err(_) => trace!("No subscribers for '{}'", event),
        }
    }

    pub(crate) fn subscribe(&self) -> PlaceEvents {
        PlaceEvents {
            rx: self.tx.subscribe(),
            missed: 0,
        }
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// A subscription to store changes.
///
/// Only events emitted after the subscription was taken are seen. If the
/// subscriber falls more than the channel capacity behind, the oldest events
/// are dropped and counted in [`missed`](Self::missed); a subscriber that
/// sees a non-zero count should reload its snapshot with a full listing.
#[derive(Debug)]
pub struct PlaceEvents {
    rx: broadcast::Receiver<PlaceEvent>,
    missed: u64,
}

impl PlaceEvents {
    /// Take the next pending event without blocking.
    ///
    /// Returns `None` when nothing is pending or the store has been closed.
    pub fn try_next(&mut self) -> Option<PlaceEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!("Subscriber lagged, {} event(s) dropped", skipped);
                    self.missed += skipped;
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    /// Take every pending event, oldest first.
    pub fn drain(&mut self) -> Vec<PlaceEvent> {
        std::iter::from_fn(|| self.try_next()).collect()
    }

    /// Total number of events dropped because this subscriber lagged.
    #[must_use]
    pub fn missed(&self) -> u64 {
        self.missed
    }

    /// The underlying receiver, for consumers that want to `.recv().await`.
    #[must_use]
    pub fn into_inner(self) -> broadcast::Receiver<PlaceEvent> {
        self.rx
    }
}
