//! Link configuration
//!
//! Frame and queue sizes are compile-time constants; only the receive
//! deadlines are tunable at runtime.

use motolink_protocol::{Timeouts, BYTE_TIMEOUT_MS, FRAME_TIMEOUT_MS};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Protocol engine settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LinkConfig {
    /// Maximum gap between bytes of one frame (ms)
    pub byte_timeout_ms: u32,
    /// Maximum time to receive one complete frame (ms)
    pub frame_timeout_ms: u32,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            byte_timeout_ms: BYTE_TIMEOUT_MS,
            frame_timeout_ms: FRAME_TIMEOUT_MS,
        }
    }
}

impl From<LinkConfig> for Timeouts {
    fn from(config: LinkConfig) -> Self {
        Timeouts {
            byte_ms: config.byte_timeout_ms,
            frame_ms: config.frame_timeout_ms,
        }
    }
}
