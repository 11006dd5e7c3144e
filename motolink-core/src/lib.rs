//! Board-agnostic device logic for Motolink controllers
//!
//! This crate sits on top of `motolink-protocol` and contains everything
//! that turns decoded frames into device behavior:
//!
//! - Device state and command execution
//! - Command dispatcher (the protocol engine's [`LinkHandler`])
//! - STAT telemetry record layout
//! - Link configuration types
//!
//! [`LinkHandler`]: motolink_protocol::LinkHandler

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

mod fmt;

pub mod config;
pub mod device;
pub mod dispatch;
pub mod stat;

pub use config::LinkConfig;
pub use device::{CommandError, Device, Mode, MAX_SPEED};
pub use dispatch::Dispatcher;
pub use stat::{StatRecord, STAT_LEN};
