//! Frame encoding and CRC for the Motolink protocol
//!
//! Frame format:
//! - STX (1 byte): 0x02 synchronization byte
//! - LEN (1 byte): number of CMD + PAYLOAD bytes (1-65)
//! - CMD (1 byte): command identifier
//! - PAYLOAD (0-64 bytes): command-specific data
//! - CRC (1 byte): CRC-8 (poly 0x07, init 0x00) over LEN, CMD and PAYLOAD
//!
//! Decoding is incremental and lives in [`crate::engine`].

use heapless::Vec;

use crate::messages::Command;

/// Frame synchronization byte
pub const STX: u8 = 0x02;

/// Maximum payload size in bytes
pub const MAX_PAYLOAD: usize = 64;

/// Maximum CMD + PAYLOAD size (largest valid LEN)
pub const MAX_DATA: usize = 1 + MAX_PAYLOAD;

/// Bytes a frame adds around its payload (STX + LEN + CMD + CRC)
pub const FRAME_OVERHEAD: usize = 4;

/// Maximum complete frame size
pub const MAX_FRAME_SIZE: usize = FRAME_OVERHEAD + MAX_PAYLOAD;

const CRC8_POLY: u8 = 0x07;

/// Errors that can occur while building a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload exceeds [`MAX_PAYLOAD`]
    PayloadTooLarge,
    /// Output buffer cannot hold the whole frame
    BufferTooSmall,
}

/// Feed one byte into a running CRC-8 (MSB first, no final XOR)
pub fn crc8_update(mut crc: u8, byte: u8) -> u8 {
    crc ^= byte;
    for _ in 0..8 {
        crc = if crc & 0x80 != 0 {
            (crc << 1) ^ CRC8_POLY
        } else {
            crc << 1
        };
    }
    crc
}

/// CRC-8 over the LEN byte followed by `data`
///
/// `data` is the CMD + PAYLOAD section, so `len` is normally `data.len()`.
pub fn crc8(len: u8, data: &[u8]) -> u8 {
    data.iter().fold(crc8_update(0, len), |crc, &b| crc8_update(crc, b))
}

/// Size of the encoded frame for a payload of `payload_len` bytes
pub const fn frame_len(payload_len: usize) -> usize {
    FRAME_OVERHEAD + payload_len
}

/// Encode `STX | LEN | CMD | PAYLOAD | CRC` into `out`
///
/// Returns the number of bytes written. Nothing is written on error.
pub fn encode(cmd: u8, payload: &[u8], out: &mut [u8]) -> Result<usize, FrameError> {
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge);
    }
    let total = frame_len(payload.len());
    if out.len() < total {
        return Err(FrameError::BufferTooSmall);
    }

    let len = (1 + payload.len()) as u8;
    let crc = payload
        .iter()
        .fold(crc8(len, &[cmd]), |crc, &b| crc8_update(crc, b));

    out[0] = STX;
    out[1] = len;
    out[2] = cmd;
    out[3..3 + payload.len()].copy_from_slice(payload);
    out[3 + payload.len()] = crc;

    Ok(total)
}

/// Encode a frame into a heapless Vec
pub fn encode_to_vec(cmd: u8, payload: &[u8]) -> Result<Vec<u8, MAX_FRAME_SIZE>, FrameError> {
    let mut buffer = [0u8; MAX_FRAME_SIZE];
    let len = encode(cmd, payload, &mut buffer)?;
    let mut vec = Vec::new();
    vec.extend_from_slice(&buffer[..len])
        .map_err(|_| FrameError::BufferTooSmall)?;
    Ok(vec)
}

/// A decoded (or to-be-encoded) command with its payload
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Message {
    /// Raw command byte
    pub cmd: u8,
    /// Payload data
    pub payload: Vec<u8, MAX_PAYLOAD>,
}

impl Message {
    /// Create a message with the given command and payload
    pub fn new(cmd: u8, payload: &[u8]) -> Result<Self, FrameError> {
        let payload = Vec::from_slice(payload).map_err(|_| FrameError::PayloadTooLarge)?;
        Ok(Self { cmd, payload })
    }

    /// Create a message with no payload
    pub fn empty(cmd: u8) -> Self {
        Self {
            cmd,
            payload: Vec::new(),
        }
    }

    /// Typed view of the command byte, if it is a known command
    pub fn command(&self) -> Option<Command> {
        Command::from_byte(self.cmd)
    }

    /// Encode this message into `out`
    pub fn encode(&self, out: &mut [u8]) -> Result<usize, FrameError> {
        encode(self.cmd, &self.payload, out)
    }

    /// Encode this message into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_FRAME_SIZE>, FrameError> {
        encode_to_vec(self.cmd, &self.payload)
    }
}
