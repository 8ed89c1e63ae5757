//! Lifecycle of one consumer bound to one cohort topic.

use std::time::Duration;

use cohortwatch_bus::{CohortName, Error as BusError, TopicConsumer, TopicSource};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::DeliverySink;

/// Wait after a failed poll before polling again.
const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Lifecycle state of a [`TopicSubscription`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    /// Never opened.
    Unopened,
    /// Consumer bound; delivering once started.
    Open,
    /// Consumer released.
    Closed,
}

impl std::fmt::Display for SubscriptionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unopened => write!(f, "unopened"),
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// One consumer bound to one cohort topic.
///
/// Opening binds the consumer; [`TopicSubscription::start`] spawns the task
/// that polls, decodes and delivers. [`TopicSubscription::close`] stops that
/// task and releases the consumer before returning.
pub struct TopicSubscription {
    cohort: CohortName,
    topic: String,
    generation: u64,
    state: SubscriptionState,
    /// Held here between `open` and `start`; owned by the task afterwards.
    consumer: Option<Box<dyn TopicConsumer>>,
    task: Option<JoinHandle<()>>,
    cancel: CancellationToken,
}

impl TopicSubscription {
    /// A subscription that has not been opened.
    pub fn unopened(cohort: CohortName, topic: impl Into<String>, generation: u64) -> Self {
        Self {
            cohort,
            topic: topic.into(),
            generation,
            state: SubscriptionState::Unopened,
            consumer: None,
            task: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Connect to the bus and bind a consumer to `topic`.
    ///
    /// Fails only when the broker cannot be reached. A topic that does not
    /// exist is reported later, through the sink, once polling starts.
    pub async fn open(
        source: &dyn TopicSource,
        cohort: CohortName,
        topic: impl Into<String>,
        generation: u64,
    ) -> Result<Self, BusError> {
        let mut subscription = Self::unopened(cohort, topic, generation);
        let consumer = source.open(&subscription.topic).await?;
        subscription.consumer = Some(consumer);
        subscription.state = SubscriptionState::Open;
        Ok(subscription)
    }

    /// Start delivering messages into `sink`. Does nothing unless open and not yet started.
    pub fn start(&mut self, sink: DeliverySink) {
        if self.state != SubscriptionState::Open {
            return;
        }
        let Some(consumer) = self.consumer.take() else {
            return;
        };

        let cancel = self.cancel.clone();
        let cohort = self.cohort.clone();
        let generation = self.generation;
        self.task = Some(tokio::spawn(consume(consumer, sink, cancel, cohort, generation)));
    }

    /// Stop delivering and release the consumer.
    ///
    /// Closing an unopened or already closed subscription is a no-op.
    pub async fn close(&mut self) {
        if self.state != SubscriptionState::Open {
            return;
        }
        self.state = SubscriptionState::Closed;
        self.cancel.cancel();

        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            warn!(cohort = %self.cohort, error = %e, "Subscription task panicked");
        }

        // Opened but never started: the consumer is still ours to release.
        if let Some(mut consumer) = self.consumer.take()
            && let Err(e) = consumer.close().await
        {
            warn!(cohort = %self.cohort, error = %e, "Failed to close consumer");
        }

        debug!(cohort = %self.cohort, generation = self.generation, "Subscription closed");
    }

    pub fn state(&self) -> SubscriptionState {
        self.state
    }

    pub fn cohort(&self) -> &CohortName {
        &self.cohort
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Poll until cancelled, then release the consumer.
async fn consume(
    mut consumer: Box<dyn TopicConsumer>,
    sink: DeliverySink,
    cancel: CancellationToken,
    cohort: CohortName,
    generation: u64,
) {
    info!(cohort = %cohort, topic = %consumer.topic(), generation, "Subscription started");

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = consumer.poll() => match result {
                Ok(batch) => {
                    for message in &batch {
                        sink.deliver(message);
                    }
                }
                Err(BusError::TopicNotFound { stream, topic }) => {
                    warn!(cohort = %cohort, %stream, %topic, "Cohort topic does not exist");
                    sink.report_unknown_cohort();
                    // Nothing will ever arrive; hold the consumer until closed.
                    cancel.cancelled().await;
                    break;
                }
                Err(e) => {
                    error!(cohort = %cohort, error = %e, "Poll failed");
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(POLL_ERROR_BACKOFF) => {}
                    }
                }
            },
        }
    }

    if let Err(e) = consumer.close().await {
        warn!(cohort = %cohort, error = %e, "Failed to close consumer");
    }
    info!(cohort = %cohort, generation, "Subscription stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicU64;

    use cohortwatch_bus::InMemoryBus;

    use crate::relay::{Broadcaster, RelayStats};
    use crate::ws::ServerMessage;

    fn cohort(name: &str) -> CohortName {
        CohortName::new(name).unwrap()
    }

    fn sink_for(
        name: &str,
        generation: u64,
        broadcaster: &Arc<Broadcaster>,
    ) -> (DeliverySink, Arc<AtomicU64>) {
        let current = Arc::new(AtomicU64::new(generation));
        let sink = DeliverySink::new(
            cohort(name),
            generation,
            Arc::clone(&current),
            Arc::clone(broadcaster),
            Arc::new(RelayStats::default()),
        );
        (sink, current)
    }

    #[tokio::test]
    async fn close_on_unopened_subscription_is_noop() {
        let mut sub = TopicSubscription::unopened(cohort("alpha"), "t.alpha", 1);
        sub.close().await;
        sub.close().await;
        assert_eq!(sub.state(), SubscriptionState::Unopened);
    }

    #[tokio::test]
    async fn close_twice_releases_consumer_once() {
        let bus = InMemoryBus::new();
        let mut sub = TopicSubscription::open(&bus, cohort("alpha"), "t.alpha", 1)
            .await
            .unwrap();
        assert_eq!(sub.state(), SubscriptionState::Open);
        assert_eq!(bus.active_consumers(), 1);

        sub.close().await;
        sub.close().await;

        assert_eq!(sub.state(), SubscriptionState::Closed);
        assert_eq!(bus.active_consumers(), 0);
    }

    #[tokio::test]
    async fn closing_one_subscription_leaves_another_running() {
        let bus = InMemoryBus::new();
        let broadcaster = Arc::new(Broadcaster::default());

        let mut a = TopicSubscription::open(&bus, cohort("a"), "t.a", 1).await.unwrap();
        let mut b = TopicSubscription::open(&bus, cohort("b"), "t.b", 2).await.unwrap();
        let (sink_b, _current_b) = sink_for("b", 2, &broadcaster);
        b.start(sink_b);

        a.close().await;
        a.close().await;
        assert_eq!(b.state(), SubscriptionState::Open);
        assert_eq!(bus.active_consumers(), 1);

        let (_, mut rx) = broadcaster.join();
        bus.publish("t.b", r#"{"type":"still-here"}"#).await;
        let msg = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("b keeps delivering")
            .unwrap();
        assert!(matches!(msg, ServerMessage::Event { cohort, .. } if cohort == "b"));

        b.close().await;
        assert_eq!(bus.active_consumers(), 0);
    }

    #[tokio::test]
    async fn open_fails_when_bus_unreachable() {
        let bus = InMemoryBus::new();
        bus.set_reachable(false);

        let result = TopicSubscription::open(&bus, cohort("alpha"), "t.alpha", 1).await;
        assert!(matches!(result, Err(BusError::Connection(_))));
    }

    #[tokio::test]
    async fn delivers_in_bus_order_skipping_malformed() {
        let bus = InMemoryBus::new();
        let broadcaster = Arc::new(Broadcaster::default());
        let (_, mut rx) = broadcaster.join();

        for payload in [r#"{"n":1}"#, "garbage", r#"{"n":2}"#, "[]", r#"{"n":3}"#] {
            bus.publish("t.alpha", payload).await;
        }

        let mut sub = TopicSubscription::open(&bus, cohort("alpha"), "t.alpha", 1)
            .await
            .unwrap();
        let (sink, _current) = sink_for("alpha", 1, &broadcaster);
        sub.start(sink);

        for expected in 1..=3 {
            let msg = tokio::time::timeout(Duration::from_secs(1), rx.recv())
                .await
                .expect("event arrives")
                .unwrap();
            match msg {
                ServerMessage::Event { event, .. } => assert_eq!(event["n"], expected),
                other => panic!("unexpected message: {other:?}"),
            }
        }

        sub.close().await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn missing_topic_is_reported_once() {
        let bus = InMemoryBus::new();
        let broadcaster = Arc::new(Broadcaster::default());
        broadcaster.announce_cohort(Some("ghost"));
        let (_, mut rx) = broadcaster.join();

        let mut sub = TopicSubscription::open(&bus, cohort("ghost"), "t.ghost", 1)
            .await
            .unwrap();
        let (sink, _current) = sink_for("ghost", 1, &broadcaster);
        sub.start(sink);

        let msg = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("notice arrives")
            .unwrap();
        assert_eq!(msg, ServerMessage::unknown_cohort("ghost"));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(sub.state(), SubscriptionState::Open);

        sub.close().await;
        assert_eq!(bus.active_consumers(), 0);
    }
}
