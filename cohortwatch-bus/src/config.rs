//! Configuration for the bus client.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cohort::TopicNaming;

/// Configuration for connecting to the Iggy broker and consuming cohort topics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusConfig {
    /// TCP address of the Iggy server (`host:port`).
    #[serde(default = "default_address")]
    pub address: String,

    /// Username used to log in.
    #[serde(default = "default_username")]
    pub username: String,

    /// Password used to log in.
    #[serde(default = "default_password")]
    pub password: String,

    /// Stream holding the cohort topics.
    #[serde(default = "default_stream")]
    pub stream: String,

    /// Consumer name under which offsets are acknowledged.
    #[serde(default = "default_consumer_name")]
    pub consumer_name: String,

    /// How cohort names map to topic names.
    #[serde(default)]
    pub topics: TopicNaming,

    /// Maximum messages fetched per poll.
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Wait between polls that returned nothing.
    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,

    /// Upper bound on connecting and logging in.
    #[serde(default = "default_connect_timeout", with = "humantime_serde")]
    pub connect_timeout: Duration,
}

fn default_address() -> String {
    "127.0.0.1:8090".to_string()
}

fn default_username() -> String {
    iggy::prelude::DEFAULT_ROOT_USERNAME.to_string()
}

fn default_password() -> String {
    iggy::prelude::DEFAULT_ROOT_PASSWORD.to_string()
}

fn default_stream() -> String {
    "open-metadata".to_string()
}

fn default_consumer_name() -> String {
    "cohortwatch".to_string()
}

fn default_batch_size() -> u32 {
    100
}

fn default_poll_interval() -> Duration {
    Duration::from_millis(100)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(5)
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            username: default_username(),
            password: default_password(),
            stream: default_stream(),
            consumer_name: default_consumer_name(),
            topics: TopicNaming::default(),
            batch_size: default_batch_size(),
            poll_interval: default_poll_interval(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

impl BusConfig {
    /// Create a new config with a custom broker address.
    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    /// Create a new config with custom credentials.
    #[must_use]
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// Create a new config with a custom stream name.
    #[must_use]
    pub fn with_stream(mut self, stream: impl Into<String>) -> Self {
        self.stream = stream.into();
        self
    }

    /// Create a new config with a custom poll interval.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Create a new config with a custom connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}
