//! Simulated device session
//!
//! Plays the role of the firmware main loop: owns the RX/TX queues, the
//! protocol engine and the device, and advances a millisecond clock one
//! tick at a time.

use log::info;
use motolink_core::{Device, Dispatcher, StatRecord};
use motolink_protocol::{frame, ByteQueue, FrameError, LinkStats, ProtocolEngine};

use crate::config::SimConfig;

/// RX queue capacity
pub const RX_CAPACITY: usize = 256;

/// TX queue capacity
pub const TX_CAPACITY: usize = 256;

/// One device session driven by simulated ticks
pub struct Session {
    rx: ByteQueue<RX_CAPACITY>,
    tx: ByteQueue<TX_CAPACITY>,
    engine: ProtocolEngine,
    device: Device,
    now_ms: u32,
    ticks: u32,
    ms_per_tick: u32,
    log_io: bool,
}

impl Session {
    pub fn new(config: &SimConfig) -> Self {
        info!("INFO: READY");
        Self {
            rx: ByteQueue::new(),
            tx: ByteQueue::new(),
            engine: ProtocolEngine::with_timeouts(config.link.into()),
            device: Device::new(),
            now_ms: 0,
            ticks: 0,
            ms_per_tick: config.ms_per_tick,
            log_io: config.log_io,
        }
    }

    /// Push raw bytes into RX as if they arrived on the wire
    ///
    /// Returns how many bytes were accepted; the rest count as dropped.
    pub fn inject(&mut self, bytes: &[u8]) -> usize {
        self.rx.extend_from_slice(bytes)
    }

    /// Encode a request frame and inject it
    pub fn inject_frame(&mut self, cmd: u8, payload: &[u8]) -> Result<usize, FrameError> {
        let bytes = frame::encode_to_vec(cmd, payload)?;
        Ok(self.inject(&bytes))
    }

    /// Advance the clock by one tick, poll the engine and drain TX
    ///
    /// Returns the bytes that would have gone out on the wire.
    pub fn tick(&mut self) -> Vec<u8> {
        self.ticks = self.ticks.wrapping_add(1);
        self.now_ms = self.now_ms.wrapping_add(self.ms_per_tick);

        let mut dispatcher = Dispatcher::new(&mut self.device, self.ticks, self.rx.dropped());
        self.engine
            .poll(self.now_ms, &mut self.rx, &mut self.tx, &mut dispatcher);

        let out: Vec<u8> = self.tx.drain().collect();
        if self.log_io && !out.is_empty() {
            info!("TX: {}", hex(&out));
        }
        out
    }

    /// Let `ms` of idle time pass without polling
    ///
    /// The next [`Session::tick`] sees the elapsed time, so a stalled frame
    /// expires on that poll.
    pub fn advance(&mut self, ms: u32) {
        self.now_ms = self.now_ms.wrapping_add(ms);
    }

    /// Run `count` ticks, collecting everything transmitted
    pub fn run(&mut self, count: u32) -> Vec<u8> {
        (0..count).flat_map(|_| self.tick()).collect()
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn stats(&self) -> &LinkStats {
        self.engine.stats()
    }

    pub fn rx_dropped(&self) -> u32 {
        self.rx.dropped()
    }

    pub fn now_ms(&self) -> u32 {
        self.now_ms
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Snapshot equivalent to what a GET_STAT reply would carry
    pub fn snapshot(&self) -> StatRecord {
        StatRecord::capture(&self.device, self.ticks, self.rx.dropped(), self.engine.stats())
    }
}

/// Format bytes as space-separated uppercase hex
pub fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::ReplyDecoder;
    use motolink_core::{Mode, STAT_LEN};
    use motolink_protocol::messages::{
        CMD_ACK, CMD_GET_STAT, CMD_NACK, CMD_SET_MODE, CMD_SET_SPEED, CMD_STAT, CMD_STOP,
    };
    use motolink_protocol::{Reason, STX};
    use proptest::prelude::*;

    fn quiet() -> Session {
        Session::new(&SimConfig {
            log_io: false,
            ..SimConfig::default()
        })
    }

    #[test]
    fn test_set_speed_then_get_stat() {
        let mut session = quiet();
        let mut decoder = ReplyDecoder::new();

        session.inject_frame(CMD_SET_SPEED, &[80]).unwrap();
        let replies = decoder.decode(&session.run(5));
        assert_eq!(session.device().speed(), 80);
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].cmd, CMD_ACK);
        assert_eq!(&replies[0].payload[..], &[CMD_SET_SPEED]);

        session.inject_frame(CMD_GET_STAT, &[]).unwrap();
        let replies = decoder.decode(&session.run(5));
        assert_eq!(replies[0].cmd, CMD_STAT);
        assert_eq!(replies[0].payload.len(), STAT_LEN);
        assert_eq!(replies[0].payload[0], 80);
    }

    #[test]
    fn test_tick_advances_clock() {
        let mut session = Session::new(&SimConfig {
            ms_per_tick: 10,
            log_io: false,
            ..SimConfig::default()
        });
        session.run(3);
        assert_eq!(session.ticks(), 3);
        assert_eq!(session.now_ms(), 30);
    }

    #[test]
    fn test_stat_reports_ticks_and_mode() {
        let mut session = quiet();
        let mut decoder = ReplyDecoder::new();
        session.inject_frame(CMD_SET_MODE, &[Mode::Closed.to_byte()]).unwrap();
        session.run(4);
        session.inject_frame(CMD_GET_STAT, &[]).unwrap();

        let replies = decoder.decode(&session.tick());
        let record = StatRecord::from_bytes(&replies[0].payload).unwrap();
        assert_eq!(record.mode, Mode::Closed);
        assert_eq!(record.ticks, 5);
    }

    #[test]
    fn test_truncated_frame_times_out() {
        let mut session = quiet();
        session.inject(&[STX, 1, CMD_STOP]);
        let out = session.run(205);

        assert!(out.is_empty());
        assert_eq!(session.stats().frame_timeouts, 1);
        assert_eq!(session.stats().broken_frames, 1);
        assert_eq!(session.stats().last_error, Reason::Timeout);
    }

    #[test]
    fn test_advance_expires_stalled_frame() {
        let mut session = quiet();
        session.inject(&[STX, 1, CMD_STOP]);
        session.tick();
        assert_eq!(session.stats().frame_timeouts, 0);

        session.advance(205);
        assert_eq!(session.now_ms(), 206);
        assert_eq!(session.ticks(), 1);
        assert!(session.tick().is_empty());

        assert_eq!(session.stats().frame_timeouts, 1);
        assert_eq!(session.stats().broken_frames, 1);
        assert_eq!(session.stats().last_error, Reason::Timeout);
    }

    #[test]
    fn test_crc_error_is_nacked() {
        let mut session = quiet();
        let mut decoder = ReplyDecoder::new();
        let mut bytes = frame::encode_to_vec(CMD_SET_SPEED, &[50]).unwrap();
        bytes[4] ^= 0x10;
        session.inject(&bytes);

        let replies = decoder.decode(&session.tick());
        assert_eq!(replies[0].cmd, CMD_NACK);
        assert_eq!(
            &replies[0].payload[..],
            &[CMD_SET_SPEED, Reason::Crc.to_byte()]
        );
        assert_eq!(session.device().speed(), 0);
    }

    #[test]
    fn test_rx_overflow_is_counted() {
        let mut session = quiet();
        let burst = [0x55u8; 300];
        assert_eq!(session.inject(&burst), RX_CAPACITY);
        assert_eq!(session.rx_dropped(), (300 - RX_CAPACITY) as u32);

        session.tick();
        assert_eq!(session.snapshot().rx_dropped, 44);
    }

    #[test]
    fn test_hex_format() {
        assert_eq!(hex(&[0x02, 0x80, 0xAB]), "02 80 AB");
        assert_eq!(hex(&[]), "");
    }

    proptest! {
        #[test]
        fn prop_session_survives_noise(
            noise in prop::collection::vec(any::<u8>(), 0..600),
        ) {
            let mut session = quiet();
            let mut decoder = ReplyDecoder::new();
            for chunk in noise.chunks(64) {
                session.inject(chunk);
                session.tick();
            }
            // Let any partial frame expire before the real request
            session.run(250);

            session.inject_frame(CMD_SET_SPEED, &[33]).unwrap();
            let replies = decoder.decode(&session.run(2));
            prop_assert_eq!(session.device().speed(), 33);
            prop_assert_eq!(replies.len(), 1);
            prop_assert_eq!(replies[0].cmd, CMD_ACK);
        }
    }
}
