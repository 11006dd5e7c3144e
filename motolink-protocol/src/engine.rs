//! Incremental frame parser and link telemetry
//!
//! The engine consumes bytes from the RX queue on every [`ProtocolEngine::poll`],
//! hands validated frames to a [`LinkHandler`], reports structural and
//! integrity failures, and best-effort NACKs frames with a bad CRC.
//!
//! ```text
//!        STX            LEN ok          LEN bytes read
//! Idle ───────► Len ───────────► Data ────────────────► Crc
//!  ▲             │ LEN bad                                │ CRC ok / bad
//!  └─────────────┴────────────────────────────────────────┘
//!        (timeout from any non-Idle state also returns to Idle)
//! ```
//!
//! Any byte other than STX is discarded while idle, so a corrupted byte
//! never desynchronizes the parser for longer than one frame.

use crate::frame::{crc8_update, Message, MAX_DATA, STX};
use crate::messages::{command_name, Reason};
use crate::queue::{ByteQueue, TxSink};
use crate::reply;

/// Maximum gap between two bytes of one frame
pub const BYTE_TIMEOUT_MS: u32 = 20;

/// Maximum time to receive a complete frame
pub const FRAME_TIMEOUT_MS: u32 = 200;

/// Per-byte and per-frame receive deadlines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timeouts {
    /// Maximum idle gap between bytes of one frame (ms)
    pub byte_ms: u32,
    /// Maximum total time from STX to CRC (ms)
    pub frame_ms: u32,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            byte_ms: BYTE_TIMEOUT_MS,
            frame_ms: FRAME_TIMEOUT_MS,
        }
    }
}

/// Parser states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    /// Waiting for STX
    Idle,
    /// Got STX, waiting for LEN
    Len,
    /// Reading CMD + PAYLOAD
    Data,
    /// Waiting for CRC
    Crc,
}

/// Link telemetry
///
/// Counters accumulate for the whole session. `broken_frames` counts
/// structural failures (bad LEN, timeout) and never overlaps with
/// `crc_errors`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkStats {
    pub broken_frames: u32,
    pub crc_errors: u32,
    pub frame_timeouts: u32,
    /// Receive duration of the last command that was answered
    pub last_cmd_latency_ms: u32,
    pub last_error: Reason,
}

/// Receive window of a delivered frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameTiming {
    /// Time the STX byte was consumed
    pub start_ms: u32,
    /// Time the CRC byte was consumed
    pub end_ms: u32,
}

impl FrameTiming {
    pub fn latency_ms(&self) -> u32 {
        self.end_ms.wrapping_sub(self.start_ms)
    }
}

/// Reply channel lent to [`LinkHandler::on_message`]
///
/// Gives the handler the TX sink and the engine's telemetry for the
/// duration of one callback.
pub struct Reply<'a> {
    tx: &'a mut dyn TxSink,
    stats: &'a mut LinkStats,
}

impl<'a> Reply<'a> {
    /// Enqueue a complete frame, or nothing if it does not fit
    pub fn send(&mut self, cmd: u8, payload: &[u8]) -> bool {
        reply::send(&mut *self.tx, cmd, payload)
    }

    pub fn send_ack(&mut self, orig_cmd: u8) -> bool {
        reply::send_ack(&mut *self.tx, orig_cmd)
    }

    pub fn send_nack(&mut self, orig_cmd: u8, reason: Reason) -> bool {
        reply::send_nack(&mut *self.tx, orig_cmd, reason)
    }

    /// Current link telemetry
    pub fn stats(&self) -> &LinkStats {
        self.stats
    }

    /// Record how long the answered command took to arrive
    pub fn record_latency(&mut self, latency_ms: u32) {
        self.stats.last_cmd_latency_ms = latency_ms;
    }
}

/// Receiver of decoded frames and link errors
///
/// Both callbacks run synchronously inside [`ProtocolEngine::poll`], once
/// per event, and must not block.
pub trait LinkHandler {
    /// A frame passed validation
    fn on_message(&mut self, msg: &Message, timing: FrameTiming, reply: &mut Reply<'_>);

    /// A frame was dropped; `cmd` is the (unverified) command byte if known, else 0
    fn on_error(&mut self, reason: Reason, cmd: u8);
}

/// [`LinkHandler`] built from two closures
pub struct FnHandler<M, E> {
    on_message: M,
    on_error: E,
}

impl<M, E> FnHandler<M, E>
where
    M: FnMut(&Message, FrameTiming, &mut Reply<'_>),
    E: FnMut(Reason, u8),
{
    pub fn new(on_message: M, on_error: E) -> Self {
        Self {
            on_message,
            on_error,
        }
    }
}

impl<M, E> LinkHandler for FnHandler<M, E>
where
    M: FnMut(&Message, FrameTiming, &mut Reply<'_>),
    E: FnMut(Reason, u8),
{
    fn on_message(&mut self, msg: &Message, timing: FrameTiming, reply: &mut Reply<'_>) {
        (self.on_message)(msg, timing, reply)
    }

    fn on_error(&mut self, reason: Reason, cmd: u8) {
        (self.on_error)(reason, cmd)
    }
}

/// Protocol engine for one device session
///
/// Holds the parser state, the partial frame and link telemetry. The
/// driver owns the RX/TX queues and lends them to every poll.
#[derive(Debug, Clone)]
pub struct ProtocolEngine {
    state: LinkState,
    len: u8,
    data: [u8; MAX_DATA],
    data_idx: usize,
    crc: u8,
    frame_start_ms: u32,
    last_byte_ms: u32,
    stats: LinkStats,
    timeouts: Timeouts,
}

impl Default for ProtocolEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ProtocolEngine {
    /// Create an engine with the default timeouts
    pub fn new() -> Self {
        Self::with_timeouts(Timeouts::default())
    }

    pub fn with_timeouts(timeouts: Timeouts) -> Self {
        Self {
            state: LinkState::Idle,
            len: 0,
            data: [0; MAX_DATA],
            data_idx: 0,
            crc: 0,
            frame_start_ms: 0,
            last_byte_ms: 0,
            stats: LinkStats::default(),
            timeouts,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn stats(&self) -> &LinkStats {
        &self.stats
    }

    pub fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    /// Discard any partial frame (telemetry is kept)
    pub fn reset(&mut self) {
        self.state = LinkState::Idle;
        self.len = 0;
        self.data_idx = 0;
        self.crc = 0;
        self.frame_start_ms = 0;
        self.last_byte_ms = 0;
    }

    /// Check timeouts, then consume every byte currently in `rx`
    ///
    /// `now_ms` is a monotonic millisecond counter supplied by the driver;
    /// it may wrap.
    pub fn poll<const RX: usize, H>(
        &mut self,
        now_ms: u32,
        rx: &mut ByteQueue<RX>,
        tx: &mut impl TxSink,
        handler: &mut H,
    ) where
        H: LinkHandler + ?Sized,
    {
        if self.state != LinkState::Idle && self.deadline_passed(now_ms) {
            self.on_timeout(handler);
        }

        while let Some(byte) = rx.pop() {
            self.consume(byte, now_ms, tx, handler);
        }
    }

    fn deadline_passed(&self, now_ms: u32) -> bool {
        now_ms.wrapping_sub(self.last_byte_ms) > self.timeouts.byte_ms
            || now_ms.wrapping_sub(self.frame_start_ms) > self.timeouts.frame_ms
    }

    fn consume<H>(&mut self, byte: u8, now_ms: u32, tx: &mut impl TxSink, handler: &mut H)
    where
        H: LinkHandler + ?Sized,
    {
        if self.state == LinkState::Idle {
            if byte == STX {
                self.state = LinkState::Len;
                self.frame_start_ms = now_ms;
                self.last_byte_ms = now_ms;
                self.crc = 0;
            }
            return;
        }

        self.last_byte_ms = now_ms;

        match self.state {
            LinkState::Len => {
                if byte == 0 || byte as usize > MAX_DATA {
                    self.stats.broken_frames = self.stats.broken_frames.wrapping_add(1);
                    self.fail(Reason::BadLen, 0, handler);
                    return;
                }
                self.len = byte;
                self.crc = crc8_update(self.crc, byte);
                self.data_idx = 0;
                self.state = LinkState::Data;
            }
            LinkState::Data => {
                let Some(slot) = self.data.get_mut(self.data_idx) else {
                    self.reset();
                    return;
                };
                *slot = byte;
                self.data_idx += 1;
                self.crc = crc8_update(self.crc, byte);
                if self.data_idx >= self.len as usize {
                    self.state = LinkState::Crc;
                }
            }
            LinkState::Crc => {
                let cmd = self.data[0];
                if byte != self.crc {
                    self.stats.crc_errors = self.stats.crc_errors.wrapping_add(1);
                    self.fail(Reason::Crc, cmd, handler);
                    // The cmd byte is not covered by a valid CRC, so this NACK
                    // is best effort and may name the wrong command.
                    if !reply::send_nack(tx, cmd, Reason::Crc) {
                        trace!("NACK for {:#x} dropped, TX full", cmd);
                    }
                    return;
                }
                self.deliver(now_ms, tx, handler);
            }
            LinkState::Idle => self.reset(),
        }
    }

    fn deliver<H>(&mut self, now_ms: u32, tx: &mut impl TxSink, handler: &mut H)
    where
        H: LinkHandler + ?Sized,
    {
        let timing = FrameTiming {
            start_ms: self.frame_start_ms,
            end_ms: now_ms,
        };
        let Ok(msg) = Message::new(self.data[0], &self.data[1..self.len as usize]) else {
            self.reset();
            return;
        };
        self.reset();

        trace!(
            "RX: cmd={}({:#x}) payload_len={} crc=OK",
            command_name(msg.cmd),
            msg.cmd,
            msg.payload.len()
        );

        let mut reply = Reply {
            tx,
            stats: &mut self.stats,
        };
        handler.on_message(&msg, timing, &mut reply);
    }

    fn on_timeout<H>(&mut self, handler: &mut H)
    where
        H: LinkHandler + ?Sized,
    {
        self.stats.broken_frames = self.stats.broken_frames.wrapping_add(1);
        self.stats.frame_timeouts = self.stats.frame_timeouts.wrapping_add(1);
        let cmd = if self.data_idx > 0 { self.data[0] } else { 0 };
        self.fail(Reason::Timeout, cmd, handler);
    }

    /// Record the error, notify the handler and return to Idle
    fn fail<H>(&mut self, reason: Reason, cmd: u8, handler: &mut H)
    where
        H: LinkHandler + ?Sized,
    {
        debug!("Frame dropped: {} cmd={:#x}", reason.name(), cmd);
        self.stats.last_error = reason;
        handler.on_error(reason, cmd);
        self.reset();
    }
}
