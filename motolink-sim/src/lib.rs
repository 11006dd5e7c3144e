//! Host-side driver for the Motolink protocol
//!
//! Runs the device side of the link on a desktop: a [`Session`] owns the
//! RX/TX queues, the protocol engine and the device, and is advanced one
//! simulated tick at a time. The [`ReplyDecoder`] plays the host, reading
//! replies back off the simulated wire.

pub mod config;
pub mod decoder;
pub mod scenario;
pub mod session;

pub use config::{ConfigError, SimConfig};
pub use decoder::{describe, ReplyDecoder};
pub use scenario::Demo;
pub use session::{Session, RX_CAPACITY, TX_CAPACITY};
