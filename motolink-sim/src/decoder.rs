//! Host-side view of the device's replies
//!
//! Runs a second protocol engine over the bytes the session transmits, the
//! way a host application would read them off the wire.

use log::warn;
use motolink_core::StatRecord;
use motolink_protocol::{
    command_name, ByteQueue, Command, FnHandler, FrameTiming, Message, ProtocolEngine, Reason,
    Reply, TxSink,
};

const DECODER_CAPACITY: usize = 512;

/// Sink that refuses every byte; the host side never answers the device
struct Discard;

impl TxSink for Discard {
    fn free_space(&self) -> usize {
        0
    }

    fn push(&mut self, _byte: u8) -> bool {
        false
    }
}

/// Decodes reply frames from a TX byte stream
pub struct ReplyDecoder {
    engine: ProtocolEngine,
    rx: ByteQueue<DECODER_CAPACITY>,
}

impl Default for ReplyDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplyDecoder {
    pub fn new() -> Self {
        Self {
            engine: ProtocolEngine::new(),
            rx: ByteQueue::new(),
        }
    }

    /// Decode every complete frame in `bytes`
    ///
    /// A frame split across calls is completed by the next call; the
    /// decoder's clock never advances, so it never times out.
    pub fn decode(&mut self, bytes: &[u8]) -> Vec<Message> {
        let mut messages = Vec::new();
        for chunk in bytes.chunks(DECODER_CAPACITY) {
            self.rx.extend_from_slice(chunk);
            let mut handler = FnHandler::new(
                |msg: &Message, _timing: FrameTiming, _reply: &mut Reply<'_>| {
                    messages.push(msg.clone())
                },
                |reason: Reason, cmd: u8| {
                    warn!("Undecodable reply: {} cmd={:#04x}", reason.name(), cmd)
                },
            );
            self.engine.poll(0, &mut self.rx, &mut Discard, &mut handler);
        }
        messages
    }
}

/// One-line, human readable rendering of a reply
pub fn describe(msg: &Message) -> String {
    match (msg.command(), &msg.payload[..]) {
        (Some(Command::Ack), &[orig]) => format!("ACK {}", command_name(orig)),
        (Some(Command::Nack), &[orig, reason]) => format!(
            "NACK {} reason={}",
            command_name(orig),
            Reason::from_byte(reason).map_or("REASON_UNKNOWN", |r| r.name())
        ),
        (Some(Command::Stat), payload) => match StatRecord::from_bytes(payload) {
            Some(s) => format!(
                "STAT speed={} mode={:?} last_error={} ticks={} rx_dropped={} \
                 broken_frames={} crc_errors={} latency_ms={}",
                s.speed,
                s.mode,
                s.last_error.name(),
                s.ticks,
                s.rx_dropped,
                s.broken_frames,
                s.crc_errors,
                s.last_cmd_latency_ms
            ),
            None => format!("STAT malformed ({} bytes)", payload.len()),
        },
        (Some(cmd), _) if !cmd.is_reply() => format!("unexpected request {}", cmd.name()),
        _ => format!(
            "{}({:#04x}) payload_len={}",
            command_name(msg.cmd),
            msg.cmd,
            msg.payload.len()
        ),
    }
}
