//! Configuration types for Kuwetex

use crate::cat::CatProfile;
use crate::protocol::{DEFAULT_HOST, DEFAULT_PORT};
use serde::{Deserialize, Serialize};

/// Where the server listens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerConfig {
    /// `host:port`, ready for `TcpListener::bind`
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Timings and household of the simulation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulationConfig {
    /// Dirtiness at which the monitor cleans on its own
    pub dirtiness_threshold: u32,

    /// Pause between monitor checks
    pub cleaning_interval_ms: u64,

    /// Upper bound (exclusive) of one visit
    pub max_use_ms: u64,

    /// Upper bound (exclusive) of one cleaning
    pub max_cleaning_ms: u64,

    /// Upper bound (exclusive) of a cat's idle time between visits
    pub max_idle_ms: u64,

    /// Fixed seed for reproducible runs
    pub seed: Option<u64>,

    pub cats: Vec<CatProfile>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            dirtiness_threshold: 7,
            cleaning_interval_ms: 8_000,
            max_use_ms: 5_000,
            max_cleaning_ms: 5_000,
            max_idle_ms: 15_000,
            seed: None,
            cats: CatProfile::default_roster(),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KuwetexConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl KuwetexConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the simulation cannot run
    pub fn validate(&self) -> crate::Result<()> {
        if self.simulation.dirtiness_threshold == 0 {
            return Err(crate::KuwetexError::Config(
                "dirtinessThreshold must be at least 1".to_string(),
            ));
        }
        if self.simulation.cleaning_interval_ms == 0 {
            return Err(crate::KuwetexError::Config(
                "cleaningIntervalMs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
