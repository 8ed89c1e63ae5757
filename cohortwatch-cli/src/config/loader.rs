use super::types::{
    CohortwatchConfig, RawBusConfig, RawCohortwatchConfig, RawServerConfig, ServerSection,
};
use anyhow::{Context, Result};
use cohortwatch_bus::BusConfig;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Environment variables that override file configuration
pub const ENV_BUS_ADDRESS: &str = "COHORTWATCH_BUS_ADDRESS";
pub const ENV_BUS_USERNAME: &str = "COHORTWATCH_BUS_USERNAME";
pub const ENV_BUS_PASSWORD: &str = "COHORTWATCH_BUS_PASSWORD";
pub const ENV_STREAM: &str = "COHORTWATCH_STREAM";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user + project + environment)
    pub fn load() -> Result<CohortwatchConfig> {
        Self::load_from(
            Self::user_config_path().as_deref(),
            &Self::project_config_path(),
        )
    }

    /// Load merged configuration from explicit file locations
    pub fn load_from(user_path: Option<&Path>, project_path: &Path) -> Result<CohortwatchConfig> {
        let mut raw = RawCohortwatchConfig::default();

        // Layer 1: User config
        if let Some(user_path) = user_path
            && user_path.exists()
        {
            raw = Self::merge_raw(raw, Self::read_file(user_path)?);
        }

        // Layer 2: Project config
        if project_path.exists() {
            raw = Self::merge_raw(raw, Self::read_file(project_path)?);
        }

        // Layer 3: Environment
        raw = Self::merge_raw(raw, Self::from_env());

        Ok(Self::finalize(raw))
    }

    /// Get user config path (platform-specific)
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "cohortwatch").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get project config path
    /// Can be overridden with COHORTWATCH_PROJECT_CONFIG_DIR env var (useful for isolated tests)
    pub fn project_config_path() -> PathBuf {
        if let Ok(dir) = std::env::var("COHORTWATCH_PROJECT_CONFIG_DIR") {
            PathBuf::from(dir).join("config.toml")
        } else {
            PathBuf::from(".cohortwatch/config.toml")
        }
    }

    fn read_file(path: &Path) -> Result<RawCohortwatchConfig> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("Invalid config in {}", path.display()))
    }

    /// Overrides taken from the environment
    fn from_env() -> RawCohortwatchConfig {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        RawCohortwatchConfig {
            server: RawServerConfig::default(),
            bus: RawBusConfig {
                address: var(ENV_BUS_ADDRESS),
                username: var(ENV_BUS_USERNAME),
                password: var(ENV_BUS_PASSWORD),
                stream: var(ENV_STREAM),
                ..Default::default()
            },
        }
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawCohortwatchConfig, overlay: RawCohortwatchConfig) -> RawCohortwatchConfig {
        RawCohortwatchConfig {
            server: RawServerConfig {
                host: overlay.server.host.or(base.server.host),
                port: overlay.server.port.or(base.server.port),
                broadcast_capacity: overlay
                    .server
                    .broadcast_capacity
                    .or(base.server.broadcast_capacity),
                cohort: overlay.server.cohort.or(base.server.cohort),
            },
            bus: RawBusConfig {
                address: overlay.bus.address.or(base.bus.address),
                username: overlay.bus.username.or(base.bus.username),
                password: overlay.bus.password.or(base.bus.password),
                stream: overlay.bus.stream.or(base.bus.stream),
                consumer_name: overlay.bus.consumer_name.or(base.bus.consumer_name),
                topic_prefix: overlay.bus.topic_prefix.or(base.bus.topic_prefix),
                topic_suffix: overlay.bus.topic_suffix.or(base.bus.topic_suffix),
                batch_size: overlay.bus.batch_size.or(base.bus.batch_size),
                poll_interval: overlay.bus.poll_interval.or(base.bus.poll_interval),
                connect_timeout: overlay.bus.connect_timeout.or(base.bus.connect_timeout),
            },
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawCohortwatchConfig) -> CohortwatchConfig {
        let defaults = ServerSection::default();
        CohortwatchConfig {
            server: ServerSection {
                host: raw.server.host.unwrap_or(defaults.host),
                port: raw.server.port.unwrap_or(defaults.port),
                broadcast_capacity: raw
                    .server
                    .broadcast_capacity
                    .filter(|&capacity| capacity > 0)
                    .unwrap_or(defaults.broadcast_capacity),
                cohort: raw.server.cohort,
            },
            bus: raw.bus.apply_to(BusConfig::default()),
        }
    }
}
