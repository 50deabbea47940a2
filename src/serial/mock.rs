//! Mock serial bus for testing
//!
//! Provides in-memory receive/transmit buffers so the transport and the
//! gateway can be exercised without hardware. The handle is cheaply
//! cloneable: keep one clone in the test after moving the other into the
//! transport.
//!
//! # Example
//!
//! ```
//! use meshgate::serial::{SerialBus, UartParams};
//! use meshgate::serial::mock::MockSerialBus;
//!
//! let mut bus = MockSerialBus::new();
//! bus.configure(&UartParams::default(), 1024).unwrap();
//!
//! bus.inject_rx_data(b"hi");
//! assert_eq!(bus.peek().unwrap(), 2);
//!
//! bus.transmit(&[0x03, 0x20, 0x01, 0x02]).unwrap();
//! assert_eq!(bus.transmitted(), vec![vec![0x03, 0x20, 0x01, 0x02]]);
//! ```

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{GatewayError, Result};

use super::{RingBuffer, SerialBus, UartParams};

#[derive(Debug)]
struct MockBusState {
    params: Option<UartParams>,
    ring: RingBuffer,
    /// Bytes that arrived while the ring was full (the "device" side)
    backlog: Vec<u8>,
    transmitted: Vec<Vec<u8>>,
    reads: Vec<usize>,
    fail_configure: bool,
    fail_transmit: bool,
}

/// In-memory serial bus
#[derive(Debug, Clone)]
pub struct MockSerialBus {
    state: Arc<Mutex<MockBusState>>,
}

impl Default for MockSerialBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSerialBus {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockBusState {
                params: None,
                ring: RingBuffer::with_capacity(0),
                backlog: Vec::new(),
                transmitted: Vec::new(),
                reads: Vec::new(),
                fail_configure: false,
                fail_transmit: false,
            })),
        }
    }

    /// Inject receive data (for test setup)
    pub fn inject_rx_data(&self, data: &[u8]) {
        let mut state = self.state.lock();
        state.backlog.extend_from_slice(data);
        Self::refill(&mut state);
    }

    /// Every transmitted write, in order
    pub fn transmitted(&self) -> Vec<Vec<u8>> {
        self.state.lock().transmitted.clone()
    }

    pub fn clear_transmitted(&self) {
        self.state.lock().transmitted.clear();
    }

    /// Sizes returned by each `receive` call
    pub fn reads(&self) -> Vec<usize> {
        self.state.lock().reads.clone()
    }

    /// Bytes still waiting (ring plus backlog)
    pub fn pending(&self) -> usize {
        let state = self.state.lock();
        state.ring.len() + state.backlog.len()
    }

    pub fn params(&self) -> Option<UartParams> {
        self.state.lock().params
    }

    pub fn fail_configure(&self, fail: bool) {
        self.state.lock().fail_configure = fail;
    }

    pub fn fail_transmit(&self, fail: bool) {
        self.state.lock().fail_transmit = fail;
    }

    fn refill(state: &mut MockBusState) {
        let accepted = state.ring.push(&state.backlog);
        state.backlog.drain(..accepted);
    }
}

impl SerialBus for MockSerialBus {
    fn configure(&mut self, params: &UartParams, ring_capacity: usize) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_configure {
            return Err(GatewayError::Transport("mock configure failure".to_string()));
        }
        state.params = Some(*params);
        state.ring = RingBuffer::with_capacity(ring_capacity);
        Self::refill(&mut state);
        Ok(())
    }

    fn peek(&mut self) -> Result<usize> {
        let mut state = self.state.lock();
        Self::refill(&mut state);
        Ok(state.ring.len())
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut state = self.state.lock();
        let n = state.ring.pop_into(buf);
        state.reads.push(n);
        Ok(n)
    }

    fn transmit(&mut self, bytes: &[u8]) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_transmit {
            return Err(GatewayError::Transport("mock transmit failure".to_string()));
        }
        state.transmitted.push(bytes.to_vec());
        Ok(())
    }
}
