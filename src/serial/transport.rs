//! Serial Transport
//!
//! Drives a [`SerialBus`]: configuration, periodic drain, frame transmit.

use crate::error::{GatewayError, Result};
use crate::protocol::Frame;

use super::{SerialBus, UartParams};

/// Maximum bytes drained in a single poll
pub const RX_CHUNK_SIZE: usize = 256;

/// Counters exposed for logging and tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransportStats {
    pub polls: u64,
    pub rx_bytes: u64,
    pub tx_frames: u64,
    pub tx_bytes: u64,
}

/// Owns the bus and its configuration
pub struct SerialTransport<B: SerialBus> {
    bus: B,
    params: UartParams,
    ring_capacity: usize,
    rx_chunk: usize,
    configured: bool,
    stats: TransportStats,
}

impl<B: SerialBus> SerialTransport<B> {
    pub fn new(bus: B, params: UartParams, ring_capacity: usize) -> Self {
        Self {
            bus,
            params,
            ring_capacity,
            rx_chunk: RX_CHUNK_SIZE,
            configured: false,
            stats: TransportStats::default(),
        }
    }

    /// Lower the per-poll drain bound (clamped to `1..=RX_CHUNK_SIZE`)
    pub fn with_rx_chunk(mut self, bytes: usize) -> Self {
        self.rx_chunk = bytes.clamp(1, RX_CHUNK_SIZE);
        self
    }

    /// Configure the UART
    ///
    /// A failure is logged and returned; the transport stays unconfigured and
    /// every later poll/transmit reports a transport error.
    pub fn configure(&mut self) -> Result<()> {
        match self.bus.configure(&self.params, self.ring_capacity) {
            Ok(()) => {
                tracing::info!(
                    "UART configured: {} baud, {:?}/{:?}/{:?}, flow {:?}, ring {} bytes",
                    self.params.baud_rate,
                    self.params.data_bits,
                    self.params.parity,
                    self.params.stop_bits,
                    self.params.flow_control,
                    self.ring_capacity
                );
                self.configured = true;
                Ok(())
            }
            Err(e) => {
                tracing::error!("UART configuration failed: {}", e);
                self.configured = false;
                Err(e)
            }
        }
    }

    /// Drain whatever is available, up to the chunk bound (256 bytes by default)
    ///
    /// Never waits for data. Bytes beyond the chunk stay buffered for the
    /// next cycle.
    pub fn poll(&mut self) -> Result<usize> {
        self.ensure_configured()?;
        self.stats.polls += 1;

        let available = self.bus.peek()?;
        if available == 0 {
            return Ok(0);
        }

        let mut rx_buffer = [0u8; RX_CHUNK_SIZE];
        let want = available.min(self.rx_chunk);
        let read = self.bus.receive(&mut rx_buffer[..want])?;

        self.stats.rx_bytes += read as u64;
        tracing::trace!("UART read {} bytes: {:02X?}", read, &rx_buffer[..read]);
        Ok(read)
    }

    /// Write a frame to the bus (no acknowledgement expected)
    pub fn transmit(&mut self, frame: &Frame) -> Result<()> {
        self.ensure_configured()?;
        self.bus.transmit(frame.as_bytes())?;

        self.stats.tx_frames += 1;
        self.stats.tx_bytes += frame.len() as u64;
        tracing::debug!("Sent {} byte frame: {}", frame.len(), frame.to_hex());
        Ok(())
    }

    fn ensure_configured(&self) -> Result<()> {
        if !self.configured {
            return Err(GatewayError::Transport("serial bus not configured".to_string()));
        }
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    pub fn params(&self) -> &UartParams {
        &self.params
    }

    pub fn stats(&self) -> TransportStats {
        self.stats
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }
}
