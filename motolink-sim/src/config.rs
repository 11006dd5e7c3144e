//! Simulator configuration
//!
//! Loaded from a TOML file; every key is optional.
//!
//! ```toml
//! ms_per_tick = 1
//! log_io = true
//!
//! [link]
//! byte_timeout_ms = 20
//! frame_timeout_ms = 200
//! ```

use std::fs;
use std::path::Path;

use log::{debug, info};
use motolink_core::LinkConfig;
use serde::Deserialize;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

/// Driver settings for one simulated session
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Protocol engine timeouts
    pub link: LinkConfig,
    /// Simulated milliseconds per driver tick
    pub ms_per_tick: u32,
    /// Log every TX burst as hex
    pub log_io: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            link: LinkConfig::default(),
            ms_per_tick: 1,
            log_io: true,
        }
    }
}

impl SimConfig {
    /// Parse configuration from TOML text
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        info!("Loading configuration from {}", path.display());
        let text = fs::read_to_string(path)?;
        let config = Self::from_toml(&text)?;
        debug!("  ms_per_tick = {}", config.ms_per_tick);
        debug!("  byte_timeout_ms = {}", config.link.byte_timeout_ms);
        debug!("  frame_timeout_ms = {}", config.link.frame_timeout_ms);
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.ms_per_tick == 0 {
            return Err(ConfigError::Invalid("ms_per_tick must be at least 1"));
        }
        if self.link.byte_timeout_ms > self.link.frame_timeout_ms {
            return Err(ConfigError::Invalid(
                "byte_timeout_ms must not exceed frame_timeout_ms",
            ));
        }
        Ok(())
    }
}
