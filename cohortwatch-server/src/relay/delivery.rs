//! Delivery from a subscription into the broadcast group.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use cohortwatch_bus::{CohortName, RawMessage};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{Broadcaster, decode};

/// Counters kept across all subscriptions.
#[derive(Debug, Default)]
pub struct RelayStats {
    decoded: AtomicU64,
    discarded: AtomicU64,
    stale: AtomicU64,
}

/// Point-in-time copy of [`RelayStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayStatsSnapshot {
    /// Events decoded and broadcast.
    pub decoded: u64,
    /// Messages skipped because they could not be decoded.
    pub discarded: u64,
    /// Deliveries dropped because their subscription was superseded.
    pub stale: u64,
}

impl RelayStats {
    pub fn snapshot(&self) -> RelayStatsSnapshot {
        RelayStatsSnapshot {
            decoded: self.decoded.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            stale: self.stale.load(Ordering::Relaxed),
        }
    }
}

/// Hands one subscription's messages to the broadcaster.
///
/// Every delivery is checked against the manager's current generation and
/// dropped once this sink's subscription is no longer the current one.
#[derive(Clone)]
pub struct DeliverySink {
    cohort: CohortName,
    generation: u64,
    current: Arc<AtomicU64>,
    broadcaster: Arc<Broadcaster>,
    stats: Arc<RelayStats>,
}

impl DeliverySink {
    pub fn new(
        cohort: CohortName,
        generation: u64,
        current: Arc<AtomicU64>,
        broadcaster: Arc<Broadcaster>,
        stats: Arc<RelayStats>,
    ) -> Self {
        Self {
            cohort,
            generation,
            current,
            broadcaster,
            stats,
        }
    }

    /// Whether this sink's subscription is still the current one.
    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.generation
    }

    /// Decode a message and broadcast it. Returns whether it was broadcast.
    pub fn deliver(&self, message: &RawMessage) -> bool {
        let event = match decode(&message.payload) {
            Ok(event) => event,
            Err(e) => {
                self.stats.discarded.fetch_add(1, Ordering::Relaxed);
                warn!(
                    cohort = %self.cohort,
                    offset = message.offset,
                    error = %e,
                    "Discarding undecodable message"
                );
                return false;
            }
        };

        if !self.is_current() {
            self.stats.stale.fetch_add(1, Ordering::Relaxed);
            debug!(
                cohort = %self.cohort,
                generation = self.generation,
                offset = message.offset,
                "Dropping delivery from superseded subscription"
            );
            return false;
        }

        self.stats.decoded.fetch_add(1, Ordering::Relaxed);
        let viewers = self.broadcaster.push_event(self.cohort.as_str(), event);
        debug!(cohort = %self.cohort, offset = message.offset, viewers, "Relayed event");
        true
    }

    /// Tell viewers the cohort's topic does not exist. Returns whether it was sent.
    pub fn report_unknown_cohort(&self) -> bool {
        if !self.is_current() {
            self.stats.stale.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        self.broadcaster.notify_unknown_cohort(self.cohort.as_str());
        true
    }
}
