//! Motolink serial command protocol
//!
//! This crate implements the framed protocol spoken between a host and a
//! Motolink motor controller over an unreliable byte stream (typically a
//! UART). It contains the parts that must survive corrupted bytes, partial
//! frames and buffer overflow without operator intervention:
//!
//! - [`ByteQueue`] - bounded RX/TX queues with drop-on-full accounting
//! - [`frame`] - CRC-8 and frame encoding
//! - [`ProtocolEngine`] - incremental, timeout-aware frame parser
//! - [`reply`] - atomic ACK/NACK/reply enqueueing
//!
//! # Frame Format
//!
//! ```text
//! ┌─────┬─────┬─────┬─────────────┬─────┐
//! │ STX │ LEN │ CMD │ PAYLOAD     │ CRC │
//! │ 1B  │ 1B  │ 1B  │ 0–64B       │ 1B  │
//! └─────┴─────┴─────┴─────────────┴─────┘
//! ```
//!
//! LEN counts CMD + PAYLOAD. CRC is CRC-8 (poly 0x07, init 0x00) over LEN,
//! CMD and PAYLOAD.
//!
//! The engine never allocates and never blocks. The driver owns both
//! queues, feeds RX, calls [`ProtocolEngine::poll`] on every tick and
//! drains TX to the transport.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

mod fmt;

pub mod engine;
pub mod frame;
pub mod messages;
pub mod queue;
pub mod reply;

pub use engine::{
    FnHandler, FrameTiming, LinkHandler, LinkState, LinkStats, ProtocolEngine, Reply, Timeouts,
    BYTE_TIMEOUT_MS, FRAME_TIMEOUT_MS,
};
pub use frame::{crc8, encode, FrameError, Message, MAX_DATA, MAX_FRAME_SIZE, MAX_PAYLOAD, STX};
pub use messages::{command_name, Command, Reason};
pub use queue::{ByteQueue, TxSink};
