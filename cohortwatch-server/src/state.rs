//! Shared application state for the relay server

use std::sync::Arc;

use chrono::{DateTime, Utc};
use cohortwatch_bus::{TopicNaming, TopicSource};

use crate::relay::{Broadcaster, SubscriptionManager};

/// Shared application state accessible by all handlers
#[derive(Clone)]
pub struct AppState {
    /// Owner of the single active cohort subscription
    pub relay: Arc<SubscriptionManager>,
    /// Broadcast group of connected viewers
    pub broadcaster: Arc<Broadcaster>,
    /// When the server started
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Create state reading cohort topics from `source`
    pub fn new(source: Arc<dyn TopicSource>, naming: TopicNaming, broadcast_capacity: usize) -> Self {
        let broadcaster = Arc::new(Broadcaster::new(broadcast_capacity));
        let relay = Arc::new(SubscriptionManager::new(
            source,
            naming,
            Arc::clone(&broadcaster),
        ));

        Self {
            relay,
            broadcaster,
            started_at: Utc::now(),
        }
    }

    /// Returns how long the server has been running
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}
