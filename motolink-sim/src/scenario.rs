//! Scripted demo session
//!
//! Exercises the happy path and every recovery path of the link: valid
//! commands, a rejected payload, a corrupted CRC, a bad LEN, a truncated
//! frame that times out, and an RX burst that overflows the queue.

use log::{info, warn};
use motolink_core::StatRecord;
use motolink_protocol::frame::encode_to_vec;
use motolink_protocol::messages::{CMD_GET_STAT, CMD_SET_MODE, CMD_SET_SPEED, CMD_STAT, CMD_STOP};
use motolink_protocol::{Message, STX};

use crate::decoder::{describe, ReplyDecoder};
use crate::session::Session;

/// Ticks given to each step so replies and timeouts can settle
pub const TICKS_PER_STEP: u32 = 5;

/// Idle time that outlasts the frame timeout
const STALL_MS: u32 = 250;

/// Runs the demo steps against a session and decodes its replies
pub struct Demo<'s> {
    session: &'s mut Session,
    decoder: ReplyDecoder,
    replies: Vec<Message>,
}

impl<'s> Demo<'s> {
    pub fn new(session: &'s mut Session) -> Self {
        Self {
            session,
            decoder: ReplyDecoder::new(),
            replies: Vec::new(),
        }
    }

    /// Run every step and return the final STAT reply, if one arrived
    pub fn run(mut self) -> (Option<StatRecord>, Vec<Message>) {
        self.step("set speed 80", &frame(CMD_SET_SPEED, &[80]), TICKS_PER_STEP);
        self.step("closed-loop mode", &frame(CMD_SET_MODE, &[1]), TICKS_PER_STEP);
        let status = wire(&Message::empty(CMD_GET_STAT));
        self.step("status", &status, TICKS_PER_STEP);
        self.step("invalid mode", &frame(CMD_SET_MODE, &[7]), TICKS_PER_STEP);

        let mut corrupted = frame(CMD_SET_SPEED, &[99]);
        if let Some(crc) = corrupted.last_mut() {
            *crc ^= 0x01;
        }
        self.step("corrupted CRC", &corrupted, TICKS_PER_STEP);

        self.step("bad LEN", &[STX, 0xFF, 0x00], TICKS_PER_STEP);
        self.step("truncated frame", &[STX, 1, CMD_STOP], TICKS_PER_STEP);
        self.idle(STALL_MS);

        let mut burst = Vec::new();
        while burst.len() < 300 {
            burst.extend_from_slice(&wire(&Message::empty(CMD_STOP)));
        }
        self.step("RX burst", &burst, TICKS_PER_STEP);

        self.step("final status", &status, TICKS_PER_STEP);

        let last_stat = self
            .replies
            .iter()
            .rev()
            .find(|m| m.cmd == CMD_STAT)
            .and_then(|m| StatRecord::from_bytes(&m.payload));
        (last_stat, self.replies)
    }

    fn idle(&mut self, ms: u32) {
        info!("--- idle {} ms ---", ms);
        self.session.advance(ms);
        let out = self.session.tick();
        self.collect(&out);
    }

    fn step(&mut self, label: &str, bytes: &[u8], ticks: u32) {
        info!("--- {} ---", label);
        let accepted = self.session.inject(bytes);
        if accepted < bytes.len() {
            warn!("RX overflow: {} of {} bytes dropped", bytes.len() - accepted, bytes.len());
        }

        let out = self.session.run(ticks);
        self.collect(&out);
    }

    fn collect(&mut self, out: &[u8]) {
        for reply in self.decoder.decode(out) {
            info!("reply: {}", describe(&reply));
            self.replies.push(reply);
        }
    }
}

fn frame(cmd: u8, payload: &[u8]) -> Vec<u8> {
    encode_to_vec(cmd, payload)
        .map(|v| v.to_vec())
        .unwrap_or_default()
}

fn wire(msg: &Message) -> Vec<u8> {
    msg.encode_to_vec().map(|v| v.to_vec()).unwrap_or_default()
}
