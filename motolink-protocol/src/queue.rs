//! Bounded byte queues for the RX and TX paths
//!
//! A [`ByteQueue`] never blocks and never grows. When it is full the
//! incoming byte is discarded and counted in [`ByteQueue::dropped`], so the
//! queue (not the producer) decides what is lost.

use heapless::Deque;

/// Destination for encoded reply frames
///
/// Implemented by every [`ByteQueue`] so reply primitives can work against
/// any TX capacity.
pub trait TxSink {
    /// Number of bytes that can be pushed before the sink is full
    fn free_space(&self) -> usize;

    /// Push a single byte, returning false if it was dropped
    fn push(&mut self, byte: u8) -> bool;
}

/// Fixed-capacity FIFO of bytes with overflow accounting
#[derive(Debug, Clone)]
pub struct ByteQueue<const N: usize> {
    buf: Deque<u8, N>,
    dropped: u32,
}

impl<const N: usize> Default for ByteQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ByteQueue<N> {
    /// Create an empty queue
    pub const fn new() -> Self {
        Self {
            buf: Deque::new(),
            dropped: 0,
        }
    }

    /// Enqueue a byte
    ///
    /// Returns false and bumps the drop counter if the queue is full.
    pub fn push(&mut self, byte: u8) -> bool {
        match self.buf.push_back(byte) {
            Ok(()) => true,
            Err(_) => {
                self.dropped = self.dropped.wrapping_add(1);
                false
            }
        }
    }

    /// Remove and return the oldest byte
    pub fn pop(&mut self) -> Option<u8> {
        self.buf.pop_front()
    }

    /// Enqueue every byte of `data`, returning how many were accepted
    ///
    /// Bytes that do not fit are counted as dropped.
    pub fn extend_from_slice(&mut self, data: &[u8]) -> usize {
        data.iter().filter(|&&b| self.push(b)).count()
    }

    /// Pop bytes until the queue is empty
    pub fn drain(&mut self) -> impl Iterator<Item = u8> + '_ {
        core::iter::from_fn(move || self.pop())
    }

    /// Number of queued bytes
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.buf.is_full()
    }

    /// Number of bytes that can be pushed before the queue is full
    pub fn free_space(&self) -> usize {
        N - self.buf.len()
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Total bytes discarded because the queue was full
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Discard queued bytes (the drop counter is kept)
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

impl<const N: usize> TxSink for ByteQueue<N> {
    fn free_space(&self) -> usize {
        ByteQueue::free_space(self)
    }

    fn push(&mut self, byte: u8) -> bool {
        ByteQueue::push(self, byte)
    }
}
