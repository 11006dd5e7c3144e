//! Reply primitives
//!
//! Frames are enqueued atomically: either the whole frame fits in the TX
//! sink's free space and every byte is pushed, or nothing is pushed. Failed
//! sends are not queued or retried.

use crate::frame::{encode, frame_len, MAX_FRAME_SIZE, MAX_PAYLOAD};
use crate::messages::{Reason, CMD_ACK, CMD_NACK};
use crate::queue::TxSink;

/// Encode a frame and enqueue it into `tx`
///
/// Returns false if the payload is too large or `tx` cannot hold the
/// complete frame.
pub fn send<T: TxSink + ?Sized>(tx: &mut T, cmd: u8, payload: &[u8]) -> bool {
    if payload.len() > MAX_PAYLOAD {
        return false;
    }
    let need = frame_len(payload.len());
    if tx.free_space() < need {
        trace!("TX full: need {} bytes, have {}", need, tx.free_space());
        return false;
    }

    let mut buf = [0u8; MAX_FRAME_SIZE];
    let Ok(len) = encode(cmd, payload, &mut buf) else {
        return false;
    };
    for &b in &buf[..len] {
        tx.push(b);
    }
    true
}

/// Send `ACK [orig_cmd]`
pub fn send_ack<T: TxSink + ?Sized>(tx: &mut T, orig_cmd: u8) -> bool {
    send(tx, CMD_ACK, &[orig_cmd])
}

/// Send `NACK [orig_cmd, reason]`
pub fn send_nack<T: TxSink + ?Sized>(tx: &mut T, orig_cmd: u8, reason: Reason) -> bool {
    send(tx, CMD_NACK, &[orig_cmd, reason.to_byte()])
}
