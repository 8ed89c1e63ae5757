//! Fan-out of relay messages to connected viewers.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;
use tracing::trace;

use super::DecodedEvent;
use crate::ws::ServerMessage;

/// Default channel capacity. A viewer lagging further behind loses the oldest
/// messages rather than slowing down ingestion.
pub const DEFAULT_BROADCAST_CAPACITY: usize = 1024;

/// What a newly joining viewer needs to know.
#[derive(Debug, Default)]
struct Snapshot {
    cohort: Option<String>,
    missing: bool,
}

/// Broadcast group of all connected viewers.
///
/// Announcements update the snapshot and are sent while holding its lock, and
/// [`Broadcaster::join`] subscribes under the same lock. A joining viewer
/// therefore sees every announcement exactly once: in its greeting or on
/// its receiver.
pub struct Broadcaster {
    tx: broadcast::Sender<ServerMessage>,
    snapshot: Mutex<Snapshot>,
}

impl Broadcaster {
    /// Create a broadcaster with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            snapshot: Mutex::new(Snapshot::default()),
        }
    }

    fn snapshot(&self) -> MutexGuard<'_, Snapshot> {
        self.snapshot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Join the group. Returns the greeting to send first and the live receiver.
    pub fn join(&self) -> (Vec<ServerMessage>, broadcast::Receiver<ServerMessage>) {
        let snapshot = self.snapshot();
        let rx = self.tx.subscribe();

        let mut greeting = vec![ServerMessage::cohort(snapshot.cohort.as_deref())];
        if snapshot.missing
            && let Some(cohort) = &snapshot.cohort
        {
            greeting.push(ServerMessage::unknown_cohort(cohort));
        }

        (greeting, rx)
    }

    /// Announce the current cohort (`None` when no cohort is active).
    ///
    /// Returns the number of viewers reached.
    pub fn announce_cohort(&self, cohort: Option<&str>) -> usize {
        let mut snapshot = self.snapshot();
        snapshot.cohort = cohort.map(str::to_string);
        snapshot.missing = false;
        self.send(ServerMessage::cohort(cohort))
    }

    /// Tell viewers the cohort's topic does not exist.
    pub fn notify_unknown_cohort(&self, cohort: &str) -> usize {
        let mut snapshot = self.snapshot();
        if snapshot.cohort.as_deref() == Some(cohort) {
            snapshot.missing = true;
        }
        self.send(ServerMessage::unknown_cohort(cohort))
    }

    /// Push one decoded event to every viewer.
    pub fn push_event(&self, cohort: &str, event: DecodedEvent) -> usize {
        self.send(ServerMessage::Event {
            cohort: cohort.to_string(),
            event,
        })
    }

    /// The cohort viewers were last told about.
    pub fn current_cohort(&self) -> Option<String> {
        self.snapshot().cohort.clone()
    }

    /// Number of connected viewers.
    pub fn viewer_count(&self) -> usize {
        self.tx.receiver_count()
    }

    fn send(&self, msg: ServerMessage) -> usize {
        // No receivers is not an error: nobody is watching.
        let reached = self.tx.send(msg).unwrap_or(0);
        trace!(viewers = reached, "Broadcast message");
        reached
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_BROADCAST_CAPACITY)
    }
}
