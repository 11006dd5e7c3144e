//! STAT telemetry record
//!
//! Layout (24 bytes, multi-byte fields little-endian):
//!
//! ```text
//! offset  field                 type
//!  0      speed                 u8
//!  1      mode                  u8
//!  2      last_error            u8
//!  3      reserved (0)          u8
//!  4      ticks                 u32
//!  8      rx_dropped            u32
//! 12      broken_frames         u32
//! 16      crc_errors            u32
//! 20      last_cmd_latency_ms   u32
//! ```

use motolink_protocol::{LinkStats, Reason};

use crate::device::{Device, Mode};

/// Encoded size of a [`StatRecord`]
pub const STAT_LEN: usize = 24;

/// Snapshot of device state and link telemetry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatRecord {
    pub speed: u8,
    pub mode: Mode,
    pub last_error: Reason,
    /// Driver ticks since session start
    pub ticks: u32,
    /// Bytes lost to RX queue overflow
    pub rx_dropped: u32,
    pub broken_frames: u32,
    pub crc_errors: u32,
    pub last_cmd_latency_ms: u32,
}

impl StatRecord {
    /// Capture the current device state and link telemetry
    pub fn capture(device: &Device, ticks: u32, rx_dropped: u32, stats: &LinkStats) -> Self {
        Self {
            speed: device.speed(),
            mode: device.mode(),
            last_error: stats.last_error,
            ticks,
            rx_dropped,
            broken_frames: stats.broken_frames,
            crc_errors: stats.crc_errors,
            last_cmd_latency_ms: stats.last_cmd_latency_ms,
        }
    }

    /// Encode to the wire layout
    pub fn to_bytes(&self) -> [u8; STAT_LEN] {
        let mut out = [0u8; STAT_LEN];
        out[0] = self.speed;
        out[1] = self.mode.to_byte();
        out[2] = self.last_error.to_byte();
        out[3] = 0;
        out[4..8].copy_from_slice(&self.ticks.to_le_bytes());
        out[8..12].copy_from_slice(&self.rx_dropped.to_le_bytes());
        out[12..16].copy_from_slice(&self.broken_frames.to_le_bytes());
        out[16..20].copy_from_slice(&self.crc_errors.to_le_bytes());
        out[20..24].copy_from_slice(&self.last_cmd_latency_ms.to_le_bytes());
        out
    }

    /// Decode a STAT payload
    ///
    /// Returns `None` if the payload is not exactly [`STAT_LEN`] bytes or
    /// carries an unknown mode or reason.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let bytes: &[u8; STAT_LEN] = bytes.try_into().ok()?;
        let u32_at =
            |i: usize| u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);

        Some(Self {
            speed: bytes[0],
            mode: Mode::from_byte(bytes[1])?,
            last_error: Reason::from_byte(bytes[2])?,
            ticks: u32_at(4),
            rx_dropped: u32_at(8),
            broken_frames: u32_at(12),
            crc_errors: u32_at(16),
            last_cmd_latency_ms: u32_at(20),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use motolink_protocol::messages::{CMD_SET_MODE, CMD_SET_SPEED};

    fn sample() -> StatRecord {
        StatRecord {
            speed: 80,
            mode: Mode::Closed,
            last_error: Reason::Crc,
            ticks: 0x0102_0304,
            rx_dropped: 44,
            broken_frames: 2,
            crc_errors: 1,
            last_cmd_latency_ms: 7,
        }
    }

    #[test]
    fn test_layout() {
        let bytes = sample().to_bytes();

        assert_eq!(&bytes[..4], &[80, 1, 3, 0]);
        assert_eq!(&bytes[4..8], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(&bytes[8..12], &[44, 0, 0, 0]);
        assert_eq!(&bytes[12..16], &[2, 0, 0, 0]);
        assert_eq!(&bytes[16..20], &[1, 0, 0, 0]);
        assert_eq!(&bytes[20..24], &[7, 0, 0, 0]);
    }

    #[test]
    fn test_decode_matches_encode() {
        let record = sample();
        assert_eq!(StatRecord::from_bytes(&record.to_bytes()), Some(record));
    }

    #[test]
    fn test_decode_rejects_bad_input() {
        let bytes = sample().to_bytes();
        assert!(StatRecord::from_bytes(&bytes[..23]).is_none());

        let mut bad_mode = bytes;
        bad_mode[1] = 9;
        assert!(StatRecord::from_bytes(&bad_mode).is_none());
    }

    #[test]
    fn test_capture() {
        let mut device = Device::new();
        device.handle(CMD_SET_SPEED, &[55]).unwrap();
        device.handle(CMD_SET_MODE, &[1]).unwrap();
        let stats = LinkStats {
            broken_frames: 3,
            crc_errors: 4,
            frame_timeouts: 2,
            last_cmd_latency_ms: 9,
            last_error: Reason::Timeout,
        };

        let record = StatRecord::capture(&device, 1000, 12, &stats);
        assert_eq!(record.speed, 55);
        assert_eq!(record.mode, Mode::Closed);
        assert_eq!(record.last_error, Reason::Timeout);
        assert_eq!(record.ticks, 1000);
        assert_eq!(record.rx_dropped, 12);
        assert_eq!(record.broken_frames, 3);
        assert_eq!(record.crc_errors, 4);
        assert_eq!(record.last_cmd_latency_ms, 9);
    }
}
