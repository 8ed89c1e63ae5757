//! Ownership of the single active subscription.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use cohortwatch_bus::{CohortName, TopicNaming, TopicSource};
use tokio::sync::Mutex;
use tracing::{error, info};

use super::{
    Broadcaster, DeliverySink, RelayError, RelayStats, RelayStatsSnapshot, TopicSubscription,
};

/// Owns at most one open [`TopicSubscription`] and switches between cohorts.
///
/// The manager is Idle until the first successful [`select_cohort`], then
/// Active(cohort). Switches are serialized by an async mutex; the generation
/// counter is bumped before the old subscription is closed so that anything it
/// still has in flight is discarded.
///
/// [`select_cohort`]: SubscriptionManager::select_cohort
pub struct SubscriptionManager {
    source: Arc<dyn TopicSource>,
    naming: TopicNaming,
    broadcaster: Arc<Broadcaster>,
    stats: Arc<RelayStats>,
    /// Generation of the subscription allowed to deliver. 0 means none.
    generation: Arc<AtomicU64>,
    active: Mutex<Option<TopicSubscription>>,
    /// Mirror of the active cohort, readable without waiting on a switch.
    cohort: RwLock<Option<CohortName>>,
}

impl SubscriptionManager {
    pub fn new(
        source: Arc<dyn TopicSource>,
        naming: TopicNaming,
        broadcaster: Arc<Broadcaster>,
    ) -> Self {
        Self {
            source,
            naming,
            broadcaster,
            stats: Arc::new(RelayStats::default()),
            generation: Arc::new(AtomicU64::new(0)),
            active: Mutex::new(None),
            cohort: RwLock::new(None),
        }
    }

    /// Close the current subscription, open one for `cohort` and announce it.
    ///
    /// If the broker cannot be reached the manager is left without an active
    /// subscription, viewers are told no cohort is selected, and the error is
    /// returned. There is no retry.
    pub async fn select_cohort(&self, cohort: CohortName) -> Result<(), RelayError> {
        let mut active = self.active.lock().await;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(mut previous) = active.take() {
            info!(from = %previous.cohort(), to = %cohort, "Switching cohort");
            previous.close().await;
        }

        let topic = self.naming.topic_for(&cohort);
        let mut subscription =
            match TopicSubscription::open(self.source.as_ref(), cohort.clone(), topic, generation)
                .await
            {
                Ok(subscription) => subscription,
                Err(source) => {
                    error!(
                        cohort = %cohort,
                        error = %source,
                        "Failed to open subscription, no cohort is being monitored"
                    );
                    self.set_cohort(None);
                    self.broadcaster.announce_cohort(None);
                    return Err(RelayError::Open { cohort, source });
                }
            };

        self.set_cohort(Some(cohort.clone()));
        let viewers = self.broadcaster.announce_cohort(Some(cohort.as_str()));
        subscription.start(DeliverySink::new(
            cohort.clone(),
            generation,
            Arc::clone(&self.generation),
            Arc::clone(&self.broadcaster),
            Arc::clone(&self.stats),
        ));
        info!(
            cohort = %cohort,
            topic = %subscription.topic(),
            generation,
            viewers,
            "Cohort selected"
        );

        *active = Some(subscription);
        Ok(())
    }

    /// Close the active subscription, if any. Used on process exit.
    pub async fn shutdown(&self) {
        let mut active = self.active.lock().await;
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(mut subscription) = active.take() {
            info!(cohort = %subscription.cohort(), "Closing subscription for shutdown");
            subscription.close().await;
        }
        self.set_cohort(None);
    }

    /// The cohort being monitored, if any.
    pub fn current_cohort(&self) -> Option<CohortName> {
        self.cohort
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether a subscription is open.
    pub fn is_active(&self) -> bool {
        self.current_cohort().is_some()
    }

    pub fn stats(&self) -> RelayStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn broadcaster(&self) -> &Arc<Broadcaster> {
        &self.broadcaster
    }

    fn set_cohort(&self, cohort: Option<CohortName>) {
        *self.cohort.write().unwrap_or_else(PoisonError::into_inner) = cohort;
    }
}
