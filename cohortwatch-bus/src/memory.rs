//! In-memory topic source for testing.
//!
//! Topics are plain vectors of payloads. Acknowledged offsets are kept per
//! topic and shared by every consumer, so reopening a topic resumes after the
//! last message handed out, the same way a named Iggy consumer does.
//! Useful for testing and development without running an Iggy server.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Notify, RwLock};

use crate::error::{Error, Result};
use crate::traits::{Offset, RawMessage, TopicConsumer, TopicSource};

/// Stream name reported in errors raised by the in-memory bus.
pub const MEMORY_STREAM: &str = "memory";

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(20);
const BATCH_SIZE: usize = 100;

#[derive(Default)]
struct TopicLog {
    messages: RwLock<Vec<Vec<u8>>>,
    notify: Notify,
}

struct Inner {
    topics: RwLock<HashMap<String, Arc<TopicLog>>>,
    acked: RwLock<HashMap<String, Offset>>,
    reachable: AtomicBool,
    active: AtomicUsize,
    opened: AtomicUsize,
    poll_interval: Duration,
}

/// In-memory implementation of [`TopicSource`] for testing.
///
/// Cloning yields another handle to the same bus.
#[derive(Clone)]
pub struct InMemoryBus {
    inner: Arc<Inner>,
}

impl InMemoryBus {
    /// Create an empty, reachable bus.
    #[must_use]
    pub fn new() -> Self {
        Self::with_poll_interval(DEFAULT_POLL_INTERVAL)
    }

    /// Create a bus whose consumers wait at most `interval` per empty poll.
    #[must_use]
    pub fn with_poll_interval(interval: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                topics: RwLock::new(HashMap::new()),
                acked: RwLock::new(HashMap::new()),
                reachable: AtomicBool::new(true),
                active: AtomicUsize::new(0),
                opened: AtomicUsize::new(0),
                poll_interval: interval,
            }),
        }
    }

    /// Create a topic if it does not exist yet.
    pub async fn create_topic(&self, topic: &str) {
        self.log(topic).await;
    }

    /// Append a payload to a topic, creating the topic if needed.
    pub async fn publish(&self, topic: &str, payload: impl Into<Vec<u8>>) -> Offset {
        let log = self.log(topic).await;
        let offset = {
            let mut messages = log.messages.write().await;
            messages.push(payload.into());
            (messages.len() - 1) as Offset
        };
        log.notify.notify_waiters();
        offset
    }

    /// Number of messages stored in a topic (0 if the topic does not exist).
    pub async fn len(&self, topic: &str) -> usize {
        match self.inner.topics.read().await.get(topic) {
            Some(log) => log.messages.read().await.len(),
            None => 0,
        }
    }

    /// Make subsequent `open` calls succeed or fail with a connection error.
    pub fn set_reachable(&self, reachable: bool) {
        self.inner.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Consumers opened and not yet closed.
    pub fn active_consumers(&self) -> usize {
        self.inner.active.load(Ordering::SeqCst)
    }

    /// Consumers opened over the lifetime of the bus.
    pub fn opened_consumers(&self) -> usize {
        self.inner.opened.load(Ordering::SeqCst)
    }

    async fn log(&self, topic: &str) -> Arc<TopicLog> {
        let mut topics = self.inner.topics.write().await;
        Arc::clone(topics.entry(topic.to_string()).or_default())
    }
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TopicSource for InMemoryBus {
    async fn open(&self, topic: &str) -> Result<Box<dyn TopicConsumer>> {
        if !self.inner.reachable.load(Ordering::SeqCst) {
            return Err(Error::Connection("in-memory bus is unreachable".to_string()));
        }

        self.inner.active.fetch_add(1, Ordering::SeqCst);
        self.inner.opened.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(InMemoryConsumer {
            inner: Arc::clone(&self.inner),
            topic: topic.to_string(),
            closed: false,
        }))
    }
}

/// In-memory consumer implementation.
struct InMemoryConsumer {
    inner: Arc<Inner>,
    topic: String,
    closed: bool,
}

impl InMemoryConsumer {
    async fn take_available(&self, log: &TopicLog) -> Vec<RawMessage> {
        let mut acked = self.inner.acked.write().await;
        let start = acked.get(&self.topic).copied().unwrap_or(0);
        let messages = log.messages.read().await;

        let batch: Vec<RawMessage> = messages
            .iter()
            .enumerate()
            .skip(start as usize)
            .take(BATCH_SIZE)
            .map(|(i, payload)| RawMessage::new(i as Offset, payload.clone()))
            .collect();

        if let Some(last) = batch.last() {
            acked.insert(self.topic.clone(), last.offset + 1);
        }
        batch
    }
}

#[async_trait]
impl TopicConsumer for InMemoryConsumer {
    fn topic(&self) -> &str {
        &self.topic
    }

    async fn poll(&mut self) -> Result<Vec<RawMessage>> {
        if self.closed {
            return Err(Error::Connection("consumer is closed".to_string()));
        }

        let Some(log) = self.inner.topics.read().await.get(&self.topic).cloned() else {
            return Err(Error::TopicNotFound {
                stream: MEMORY_STREAM.to_string(),
                topic: self.topic.clone(),
            });
        };

        // Register interest before looking, so a publish in between is not missed.
        let notified = log.notify.notified();
        let batch = self.take_available(&log).await;
        if !batch.is_empty() {
            return Ok(batch);
        }

        let _ = tokio::time::timeout(self.inner.poll_interval, notified).await;
        Ok(self.take_available(&log).await)
    }

    async fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            self.inner.active.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(())
    }
}
