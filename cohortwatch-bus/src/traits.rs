//! Core traits for the bus capability.

use async_trait::async_trait;

/// Offset of a message within its topic partition.
pub type Offset = u64;

/// One undecoded message as delivered by the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    /// Position of the message in its partition.
    pub offset: Offset,
    /// The message body, exactly as produced.
    pub payload: Vec<u8>,
}

impl RawMessage {
    /// Create a message from an offset and payload.
    pub fn new(offset: Offset, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            offset,
            payload: payload.into(),
        }
    }
}

/// Opens consumers bound to a single topic.
///
/// Opening establishes the broker session. It does not check that the topic
/// exists; a missing topic surfaces later as [`crate::Error::TopicNotFound`]
/// from [`TopicConsumer::poll`].
#[async_trait]
pub trait TopicSource: Send + Sync {
    /// Connect to the broker and bind a consumer to `topic`.
    async fn open(&self, topic: &str) -> crate::Result<Box<dyn TopicConsumer>>;
}

/// A consumer bound to one topic, acknowledging messages as they are polled.
#[async_trait]
pub trait TopicConsumer: Send {
    /// The topic this consumer is bound to.
    fn topic(&self) -> &str;

    /// Wait briefly for new messages and return them in delivery order.
    ///
    /// An empty batch means nothing arrived within the poll interval.
    async fn poll(&mut self) -> crate::Result<Vec<RawMessage>>;

    /// Release the consumer and its broker session.
    ///
    /// Calling `close` more than once is a no-op.
    async fn close(&mut self) -> crate::Result<()>;
}
