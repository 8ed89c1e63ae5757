//! Iggy-backed topic source.
//!
//! Each opened consumer gets its own client connection, so closing one
//! consumer never disturbs another. Consumers poll a single partition with
//! the `next` strategy and `auto_commit` enabled: a message is acknowledged
//! as soon as it has been fetched, and a restarted consumer with the same
//! name resumes after the last acknowledged offset.

use std::future::Future;

use async_trait::async_trait;
use iggy::prelude::*;
use tracing::{debug, info, warn};

use crate::config::BusConfig;
use crate::error::{Error, Result};
use crate::traits::{RawMessage, TopicConsumer, TopicSource};

/// Partition read by cohort consumers.
pub const COHORT_PARTITION: u32 = 0;

/// Partitions created for a cohort topic by [`IggyTopicSource::publish`].
const PARTITION_COUNT: u32 = 1;

/// Check if an Iggy error indicates a resource already exists.
fn is_already_exists_error(e: &IggyError) -> bool {
    let err_str = e.to_string();
    err_str.contains("already exists")
        || err_str.contains("already_exists")
        || err_str.contains("AlreadyExists")
}

/// Check if an Iggy error indicates the stream or topic is missing.
fn is_not_found_error(e: &IggyError) -> bool {
    let err_str = e.to_string();
    let lower = err_str.to_lowercase();
    lower.contains("not found")
        || lower.contains("does not exist")
        || err_str.contains("NotFound")
        || err_str.contains("not_found")
}

fn identifier(name: &str) -> Result<Identifier> {
    Identifier::named(name).map_err(|e| Error::Iggy(format!("Invalid name '{}': {}", name, e)))
}

/// Opens Iggy consumers bound to cohort topics.
#[derive(Debug, Clone)]
pub struct IggyTopicSource {
    config: BusConfig,
}

impl IggyTopicSource {
    /// Create a source for the configured broker.
    #[must_use]
    pub fn new(config: BusConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    /// Build a client, connect and log in, bounded by the connect timeout.
    async fn connected_client(&self) -> Result<IggyClient> {
        let client = IggyClient::builder()
            .with_tcp()
            .with_server_address(self.config.address.clone())
            .build()
            .map_err(|e| Error::Connection(e.to_string()))?;

        self.within_timeout(client.connect()).await?;
        self.within_timeout(
            client.login_user(&self.config.username, &self.config.password),
        )
        .await?;

        debug!(address = %self.config.address, "Logged in to Iggy");
        Ok(client)
    }

    async fn within_timeout<T>(
        &self,
        fut: impl Future<Output = std::result::Result<T, IggyError>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.config.connect_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(Error::Connection(format!(
                "{} ({})",
                e, self.config.address
            ))),
            Err(_) => Err(Error::Connection(format!(
                "timed out after {:?} connecting to {}",
                self.config.connect_timeout, self.config.address
            ))),
        }
    }

    /// Append one raw payload to `topic`, creating the stream and topic if needed.
    pub async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<()> {
        let client = self.connected_client().await?;
        let stream_id = identifier(&self.config.stream)?;

        match client.create_stream(&self.config.stream).await {
            Ok(_) => info!(stream = %self.config.stream, "Created stream"),
            Err(e) if is_already_exists_error(&e) => {
                debug!(stream = %self.config.stream, "Stream already exists");
            }
            Err(e) => return Err(e.into()),
        }

        match client
            .create_topic(
                &stream_id,
                topic,
                PARTITION_COUNT,
                CompressionAlgorithm::None,
                None, // replication_factor
                IggyExpiry::NeverExpire,
                MaxTopicSize::ServerDefault,
            )
            .await
        {
            Ok(_) => info!(topic, "Created topic"),
            Err(e) if is_already_exists_error(&e) => debug!(topic, "Topic already exists"),
            Err(e) => return Err(e.into()),
        }

        let message = IggyMessage::builder()
            .payload(payload.into())
            .build()
            .map_err(|e| Error::Iggy(e.to_string()))?;
        let topic_id = identifier(topic)?;
        let partitioning = Partitioning::partition_id(COHORT_PARTITION);

        let mut messages = [message];
        client
            .send_messages(&stream_id, &topic_id, &partitioning, &mut messages)
            .await?;

        if let Err(e) = client.disconnect().await {
            warn!(error = %e, "Failed to disconnect publisher cleanly");
        }
        Ok(())
    }
}

#[async_trait]
impl TopicSource for IggyTopicSource {
    async fn open(&self, topic: &str) -> Result<Box<dyn TopicConsumer>> {
        let client = self.connected_client().await?;
        info!(
            address = %self.config.address,
            stream = %self.config.stream,
            topic,
            "Opened Iggy consumer"
        );

        Ok(Box::new(IggyTopicConsumer {
            client: Some(client),
            stream: self.config.stream.clone(),
            topic: topic.to_string(),
            consumer_name: self.config.consumer_name.clone(),
            batch_size: self.config.batch_size,
            poll_interval: self.config.poll_interval,
        }))
    }
}

/// Iggy consumer bound to one topic of the configured stream.
pub struct IggyTopicConsumer {
    /// `None` once closed.
    client: Option<IggyClient>,
    stream: String,
    topic: String,
    consumer_name: String,
    batch_size: u32,
    poll_interval: std::time::Duration,
}

#[async_trait]
impl TopicConsumer for IggyTopicConsumer {
    fn topic(&self) -> &str {
        &self.topic
    }

    async fn poll(&mut self) -> Result<Vec<RawMessage>> {
        let Some(client) = self.client.as_ref() else {
            return Err(Error::Connection("consumer is closed".to_string()));
        };

        let stream_id = identifier(&self.stream)?;
        let topic_id = identifier(&self.topic)?;
        let consumer = Consumer::new(identifier(&self.consumer_name)?);

        let polled = match client
            .poll_messages(
                &stream_id,
                &topic_id,
                Some(COHORT_PARTITION),
                &consumer,
                &PollingStrategy::next(),
                self.batch_size,
                true, // auto_commit: acknowledged once fetched
            )
            .await
        {
            Ok(polled) => polled,
            Err(e) if is_not_found_error(&e) => {
                return Err(Error::TopicNotFound {
                    stream: self.stream.clone(),
                    topic: self.topic.clone(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        if polled.messages.is_empty() {
            tokio::time::sleep(self.poll_interval).await;
            return Ok(Vec::new());
        }

        Ok(polled
            .messages
            .into_iter()
            .map(|msg| RawMessage::new(msg.header.offset, msg.payload.to_vec()))
            .collect())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(client) = self.client.take() {
            client.disconnect().await?;
            info!(topic = %self.topic, "Closed Iggy consumer");
        }
        Ok(())
    }
}
