//! Command dispatcher
//!
//! Bridges the protocol engine and the device: every decoded frame is
//! executed against the [`Device`] and answered with ACK, NACK or STAT.

use motolink_protocol::messages::{CMD_GET_STAT, CMD_STAT};
use motolink_protocol::{command_name, FrameTiming, LinkHandler, Message, Reason, Reply};

use crate::device::Device;
use crate::stat::StatRecord;

/// [`LinkHandler`] that drives a [`Device`]
///
/// Built by the driver for each poll, borrowing the device together with
/// the driver-side counters that go into STAT replies.
pub struct Dispatcher<'d> {
    device: &'d mut Device,
    ticks: u32,
    rx_dropped: u32,
}

impl<'d> Dispatcher<'d> {
    pub fn new(device: &'d mut Device, ticks: u32, rx_dropped: u32) -> Self {
        Self {
            device,
            ticks,
            rx_dropped,
        }
    }
}

impl LinkHandler for Dispatcher<'_> {
    fn on_message(&mut self, msg: &Message, timing: FrameTiming, reply: &mut Reply<'_>) {
        debug!(
            "RX: cmd={}({:#x}) payload_len={}",
            command_name(msg.cmd),
            msg.cmd,
            msg.payload.len()
        );

        if let Err(e) = self.device.handle(msg.cmd, &msg.payload) {
            let reason = Reason::from(e);
            info!("EVT: NACK reason={}", reason.name());
            reply.send_nack(msg.cmd, reason);
            return;
        }

        let sent = if msg.cmd == CMD_GET_STAT {
            let record =
                StatRecord::capture(self.device, self.ticks, self.rx_dropped, reply.stats());
            debug!("EVT: STAT");
            reply.send(CMD_STAT, &record.to_bytes())
        } else {
            debug!("EVT: ACK");
            reply.send_ack(msg.cmd)
        };
        if !sent {
            warn!("Reply to {} dropped, TX full", command_name(msg.cmd));
        }

        reply.record_latency(timing.latency_ms());
    }

    fn on_error(&mut self, reason: Reason, cmd: u8) {
        if cmd != 0 {
            warn!(
                "ERR: reason={} cmd={}({:#x})",
                reason.name(),
                command_name(cmd),
                cmd
            );
        } else {
            warn!("ERR: reason={}", reason.name());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Mode;
    use crate::stat::STAT_LEN;
    use motolink_protocol::frame::encode_to_vec;
    use motolink_protocol::messages::{CMD_ACK, CMD_NACK, CMD_SET_MODE, CMD_SET_SPEED, CMD_STOP};
    use motolink_protocol::{ByteQueue, ProtocolEngine, STX};

    struct Bench {
        engine: ProtocolEngine,
        device: Device,
        rx: ByteQueue<256>,
        tx: ByteQueue<256>,
    }

    impl Bench {
        fn new() -> Self {
            Self {
                engine: ProtocolEngine::new(),
                device: Device::new(),
                rx: ByteQueue::new(),
                tx: ByteQueue::new(),
            }
        }

        fn request(&mut self, cmd: u8, payload: &[u8], now_ms: u32) -> Vec<u8> {
            self.rx
                .extend_from_slice(&encode_to_vec(cmd, payload).unwrap());
            self.poll(now_ms)
        }

        fn poll(&mut self, now_ms: u32) -> Vec<u8> {
            let mut dispatcher = Dispatcher::new(&mut self.device, 17, self.rx.dropped());
            self.engine
                .poll(now_ms, &mut self.rx, &mut self.tx, &mut dispatcher);
            self.tx.drain().collect()
        }
    }

    fn frame(cmd: u8, payload: &[u8]) -> Vec<u8> {
        encode_to_vec(cmd, payload).unwrap().to_vec()
    }

    #[test]
    fn test_set_speed_acks() {
        let mut bench = Bench::new();
        let reply = bench.request(CMD_SET_SPEED, &[80], 0);

        assert_eq!(bench.device.speed(), 80);
        assert_eq!(reply, frame(CMD_ACK, &[CMD_SET_SPEED]));
    }

    #[test]
    fn test_bad_payload_nacks() {
        let mut bench = Bench::new();
        let reply = bench.request(CMD_SET_MODE, &[7], 0);

        assert_eq!(bench.device.mode(), Mode::Open);
        assert_eq!(
            reply,
            frame(CMD_NACK, &[CMD_SET_MODE, Reason::BadPayload.to_byte()])
        );
        // Semantic errors are not link errors
        assert_eq!(bench.engine.stats().last_error, Reason::Ok);
    }

    #[test]
    fn test_unknown_command_nacks() {
        let mut bench = Bench::new();
        let reply = bench.request(0x33, &[], 0);
        assert_eq!(reply, frame(CMD_NACK, &[0x33, Reason::UnknownCmd.to_byte()]));
    }

    #[test]
    fn test_get_stat_reports_state() {
        let mut bench = Bench::new();
        bench.request(CMD_SET_SPEED, &[80], 0);
        bench.request(CMD_SET_MODE, &[1], 1);

        let reply = bench.request(CMD_GET_STAT, &[], 2);
        assert_eq!(reply[0], STX);
        assert_eq!(reply[1] as usize, 1 + STAT_LEN);
        assert_eq!(reply[2], CMD_STAT);

        let record = StatRecord::from_bytes(&reply[3..3 + STAT_LEN]).unwrap();
        assert_eq!(record.speed, 80);
        assert_eq!(record.mode, Mode::Closed);
        assert_eq!(record.ticks, 17);
        assert_eq!(reply[3], 80);
    }

    #[test]
    fn test_latency_recorded_for_answered_commands() {
        let mut bench = Bench::new();
        let bytes = frame(CMD_STOP, &[]);
        bench.rx.extend_from_slice(&bytes[..2]);
        bench.poll(100);
        bench.rx.extend_from_slice(&bytes[2..]);
        bench.poll(112);

        assert_eq!(bench.engine.stats().last_cmd_latency_ms, 12);
    }

    #[test]
    fn test_latency_untouched_by_nack() {
        let mut bench = Bench::new();
        bench.rx.extend_from_slice(&frame(CMD_STOP, &[])[..2]);
        bench.poll(0);
        bench.rx.extend_from_slice(&frame(CMD_STOP, &[])[2..]);
        bench.poll(5);

        let bytes = frame(CMD_STOP, &[1]);
        bench.rx.extend_from_slice(&bytes[..2]);
        bench.poll(10);
        bench.rx.extend_from_slice(&bytes[2..]);
        let reply = bench.poll(19);

        assert_eq!(reply, frame(CMD_NACK, &[CMD_STOP, Reason::BadPayload.to_byte()]));
        assert_eq!(bench.engine.stats().last_cmd_latency_ms, 5);
    }

    #[test]
    fn test_link_errors_reach_stat() {
        let mut bench = Bench::new();
        let mut corrupted = frame(CMD_SET_SPEED, &[10]);
        corrupted[4] ^= 0x80;
        bench.rx.extend_from_slice(&corrupted);
        bench.rx.extend_from_slice(&[STX, 0]);
        bench.poll(0);

        let reply = bench.request(CMD_GET_STAT, &[], 1);
        let record = StatRecord::from_bytes(&reply[3..3 + STAT_LEN]).unwrap();
        assert_eq!(record.crc_errors, 1);
        assert_eq!(record.broken_frames, 1);
        assert_eq!(record.last_error, Reason::BadLen);
        assert_eq!(record.speed, 0);
    }
}
