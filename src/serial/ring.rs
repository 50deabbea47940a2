//! Receive ring buffer
//!
//! Fixed-capacity FIFO of inbound bytes. Writes beyond capacity are refused,
//! never overwritten.

use bytes::{Buf, BytesMut};

/// Fixed-capacity byte FIFO
#[derive(Debug)]
pub struct RingBuffer {
    buf: BytesMut,
    capacity: usize,
}

impl RingBuffer {
    /// Create an empty ring holding at most `capacity` bytes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            capacity,
        }
    }

    /// Append as much of `data` as fits; returns the number of bytes accepted
    pub fn push(&mut self, data: &[u8]) -> usize {
        let accepted = data.len().min(self.free());
        self.buf.extend_from_slice(&data[..accepted]);
        accepted
    }

    /// Move up to `out.len()` bytes from the front of the ring into `out`
    pub fn pop_into(&mut self, out: &mut [u8]) -> usize {
        let n = out.len().min(self.buf.len());
        out[..n].copy_from_slice(&self.buf[..n]);
        self.buf.advance(n);
        n
    }

    /// Bytes waiting to be popped
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True when no bytes are waiting
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Remaining space in bytes
    pub fn free(&self) -> usize {
        self.capacity - self.buf.len()
    }
}
