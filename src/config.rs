//! Engine configuration.
//!
//! Pool provisioning and queue sizing, loadable from YAML files or
//! environment variables.

use serde::Deserialize;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "fanout.yaml";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "FANOUT_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "FANOUT";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "FANOUT_LOG";

/// Default shared pool size (centralized mode).
pub const DEFAULT_WORKERS: usize = 4;
/// Default per-endpoint pool size (decentralized mode).
pub const DEFAULT_WORKERS_PER_ENDPOINT: usize = 2;
/// Default job queue capacity per pool.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Pool provisioning strategy discriminator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolMode {
    /// One shared worker pool serves every endpoint. A burst of work for one
    /// endpoint can starve pool slots needed by another.
    #[default]
    Centralized,
    /// Each endpoint owns a dedicated worker pool, isolating slow endpoints
    /// at the cost of a worker footprint proportional to endpoint count.
    Decentralized,
}

/// Worker pool configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Pool provisioning strategy.
    pub mode: PoolMode,
    /// Shared pool size. Only applies in centralized mode.
    pub workers: usize,
    /// Pool size per endpoint. Only applies in decentralized mode.
    pub workers_per_endpoint: usize,
    /// Job queue capacity per pool.
    pub queue_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            mode: PoolMode::Centralized,
            workers: DEFAULT_WORKERS,
            workers_per_endpoint: DEFAULT_WORKERS_PER_ENDPOINT,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl PoolConfig {
    /// Create a centralized configuration with `workers` shared workers.
    pub fn centralized(workers: usize) -> Self {
        Self {
            mode: PoolMode::Centralized,
            workers,
            ..Default::default()
        }
    }

    /// Create a decentralized configuration with `workers_per_endpoint`
    /// workers for each endpoint.
    pub fn decentralized(workers_per_endpoint: usize) -> Self {
        Self {
            mode: PoolMode::Decentralized,
            workers_per_endpoint,
            ..Default::default()
        }
    }
}

/// Main configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FanoutConfig {
    /// Worker pool configuration.
    pub pool: PoolConfig,
}

impl FanoutConfig {
    /// Load configuration from file and environment.
    ///
    /// Configuration sources (in order of priority, later overrides earlier):
    /// 1. `fanout.yaml` in current directory (if exists)
    /// 2. File specified by `path` argument (if provided)
    /// 3. File specified by `FANOUT_CONFIG` environment variable (if set)
    /// 4. Environment variables with `FANOUT` prefix
    pub fn load(path: Option<&str>) -> Result<Self, Box<dyn std::error::Error>> {
        use ::config::{Config as ConfigLib, Environment, File, FileFormat};

        let mut builder = ConfigLib::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }

        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: FanoutConfig = config.try_deserialize()?;
        Ok(config)
    }

    /// Create config for testing.
    pub fn for_test() -> Self {
        Self::default()
    }
}
