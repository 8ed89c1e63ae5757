//! Message-bus capability for the cohort event relay.
//!
//! This crate describes the bus as a pair of traits ("open a consumer on a
//! topic", "poll and close it") and provides two implementations: one backed
//! by an Iggy server and one held in memory for tests and local development.
//!
//! # Key Types
//!
//! - [`CohortName`] - Validated cohort identifier
//! - [`TopicNaming`] - Derives a topic name from a cohort name
//! - [`TopicSource`] - Trait for opening consumers bound to one topic
//! - [`TopicConsumer`] - Trait for polling and releasing a consumer
//! - [`IggyTopicSource`] - Iggy-backed implementation of `TopicSource`
//! - [`InMemoryBus`] - In-memory implementation of `TopicSource`

pub mod cohort;
pub mod config;
pub mod error;
pub mod iggy_source;
pub mod memory;
pub mod traits;

// Re-exports
pub use cohort::{CohortName, TopicNaming};
pub use config::BusConfig;
pub use error::{Error, Result};
pub use iggy_source::{IggyTopicConsumer, IggyTopicSource};
pub use memory::InMemoryBus;
pub use traits::{Offset, RawMessage, TopicConsumer, TopicSource};
