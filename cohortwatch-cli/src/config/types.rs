use std::time::Duration;

use cohortwatch_bus::{BusConfig, TopicNaming};
use cohortwatch_server::relay::DEFAULT_BROADCAST_CAPACITY;
use serde::{Deserialize, Serialize};

/// Default host for the relay server
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default port for the relay server
pub const DEFAULT_PORT: u16 = 7433;

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawCohortwatchConfig {
    #[serde(default)]
    pub server: RawServerConfig,

    #[serde(default)]
    pub bus: RawBusConfig,
}

/// Server config as stored in TOML (optional fields for proper merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawServerConfig {
    /// Host to bind to
    pub host: Option<String>,

    /// Port to listen on
    pub port: Option<u16>,

    /// Messages a viewer may fall behind before losing the oldest
    pub broadcast_capacity: Option<usize>,

    /// Cohort to follow at startup
    pub cohort: Option<String>,
}

/// Bus config as stored in TOML (optional fields for proper merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawBusConfig {
    pub address: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub stream: Option<String>,
    pub consumer_name: Option<String>,
    pub topic_prefix: Option<String>,
    pub topic_suffix: Option<String>,
    pub batch_size: Option<u32>,

    #[serde(default, with = "humantime_serde")]
    pub poll_interval: Option<Duration>,

    #[serde(default, with = "humantime_serde")]
    pub connect_timeout: Option<Duration>,
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CohortwatchConfig {
    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub bus: BusConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Messages a viewer may fall behind before losing the oldest
    pub broadcast_capacity: usize,

    /// Cohort to follow at startup
    pub cohort: Option<String>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            broadcast_capacity: DEFAULT_BROADCAST_CAPACITY,
            cohort: None,
        }
    }
}

impl RawBusConfig {
    /// Apply the set fields on top of `base`
    pub fn apply_to(self, mut base: BusConfig) -> BusConfig {
        if let Some(address) = self.address {
            base.address = address;
        }
        if let Some(username) = self.username {
            base.username = username;
        }
        if let Some(password) = self.password {
            base.password = password;
        }
        if let Some(stream) = self.stream {
            base.stream = stream;
        }
        if let Some(consumer_name) = self.consumer_name {
            base.consumer_name = consumer_name;
        }
        if let Some(prefix) = self.topic_prefix {
            base.topics.prefix = prefix;
        }
        if let Some(suffix) = self.topic_suffix {
            base.topics.suffix = suffix;
        }
        if let Some(batch_size) = self.batch_size {
            base.batch_size = batch_size;
        }
        if let Some(poll_interval) = self.poll_interval {
            base.poll_interval = poll_interval;
        }
        if let Some(connect_timeout) = self.connect_timeout {
            base.connect_timeout = connect_timeout;
        }
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = CohortwatchConfig::default();
        assert_eq!(config.server.host, DEFAULT_HOST);
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.server.broadcast_capacity, DEFAULT_BROADCAST_CAPACITY);
        assert!(config.server.cohort.is_none());
        assert_eq!(config.bus.address, "127.0.0.1:8090");
    }

    #[test]
    fn test_raw_config_parses_partial_sections() {
        let raw: RawCohortwatchConfig = toml::from_str(
            r#"
[server]
port = 9000

[bus]
address = "broker:8090"
poll_interval = "250ms"
topic_prefix = "test."
"#,
        )
        .unwrap();

        assert_eq!(raw.server.port, Some(9000));
        assert!(raw.server.host.is_none());
        assert_eq!(raw.bus.address.as_deref(), Some("broker:8090"));
        assert_eq!(raw.bus.poll_interval, Some(Duration::from_millis(250)));
        assert!(raw.bus.connect_timeout.is_none());
    }

    #[test]
    fn test_raw_bus_applies_only_set_fields() {
        let raw = RawBusConfig {
            stream: Some("egeria".to_string()),
            topic_suffix: Some(".events".to_string()),
            ..Default::default()
        };
        let bus = raw.apply_to(BusConfig::default());

        assert_eq!(bus.stream, "egeria");
        assert_eq!(bus.address, "127.0.0.1:8090");
        assert_eq!(bus.topics.prefix, TopicNaming::default().prefix);
        assert_eq!(bus.topics.suffix, ".events");
    }
}
