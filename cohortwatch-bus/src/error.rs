//! Error types for bus operations.

/// Error type for bus operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The broker could not be reached or refused the session.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The topic bound to a consumer does not exist on the broker.
    #[error("topic '{topic}' does not exist in stream '{stream}'")]
    TopicNotFound { stream: String, topic: String },

    /// A cohort name failed validation.
    #[error("invalid cohort name '{name}': {reason}")]
    InvalidCohort { name: String, reason: &'static str },

    /// Any other error reported by the Iggy SDK.
    #[error("iggy error: {0}")]
    Iggy(String),
}

impl From<iggy::prelude::IggyError> for Error {
    fn from(e: iggy::prelude::IggyError) -> Self {
        Self::Iggy(e.to_string())
    }
}

/// Result type alias for bus operations.
pub type Result<T> = std::result::Result<T, Error>;
