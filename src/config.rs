//! Runtime configuration: an optional TOML file overlaid with
//! `INVENTORY_`-prefixed environment variables.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::dashboard::DEFAULT_PERIOD_DAYS;
use crate::pipeline::DEFAULT_PAGE_SIZE;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] figment::Error),
    #[error("Invalid config: {0}")]
    Invalid(&'static str),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InventoryConfig {
    /// Artificial delay before the store serves each request.
    #[serde(default = "default_store_latency_ms")]
    pub store_latency_ms: u64,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Trailing window of the monthly orders chart.
    #[serde(default = "default_dashboard_period_days")]
    pub dashboard_period_days: u32,
    /// Directory of the file-backed blob store; in-memory when unset.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_store_latency_ms() -> u64 {
    300
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_dashboard_period_days() -> u32 {
    DEFAULT_PERIOD_DAYS
}

fn default_event_capacity() -> usize {
    64
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            store_latency_ms: default_store_latency_ms(),
            page_size: default_page_size(),
            dashboard_period_days: default_dashboard_period_days(),
            data_dir: None,
            event_capacity: default_event_capacity(),
        }
    }
}

impl InventoryConfig {
    /// Loads `path` (if it exists) and then the environment.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_figment(
            Figment::new()
                .merge(Toml::file(path.as_ref()))
                .merge(Env::prefixed("INVENTORY_")),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::Invalid("page_size must be at least 1"));
        }
        if self.dashboard_period_days == 0 {
            return Err(ConfigError::Invalid("dashboard_period_days must be at least 1"));
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::Invalid("event_capacity must be at least 1"));
        }
        Ok(())
    }

    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.store_latency_ms)
    }

    /// No latency, in-memory storage. What tests want.
    pub fn for_tests() -> Self {
        Self {
            store_latency_ms: 0,
            ..Self::default()
        }
    }
}
