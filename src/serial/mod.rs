//! Serial Module
//!
//! UART link to the mesh controller.
//!
//! ## Responsibilities
//! - One-time UART configuration (115200 8N1, RTS/CTS)
//! - Fixed-capacity receive ring buffer
//! - Non-blocking drain on a fixed poll cadence
//! - Fire-and-forget frame transmission
//!
//! The bus itself sits behind [`SerialBus`] so the transport can run against
//! a real port ([`SerialPortBus`]) or an in-memory one ([`mock::MockSerialBus`]).

mod ring;
mod transport;
mod port;
pub mod mock;

pub use ring::RingBuffer;
pub use transport::{SerialTransport, TransportStats, RX_CHUNK_SIZE};
pub use port::SerialPortBus;

use crate::error::Result;

/// Word width
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataBits {
    Seven,
    Eight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    None,
    Even,
    Odd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopBits {
    One,
    Two,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowControl {
    None,
    RtsCts,
}

/// UART line settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UartParams {
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub flow_control: FlowControl,
}

impl Default for UartParams {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            flow_control: FlowControl::RtsCts,
        }
    }
}

/// Byte-oriented serial bus consumed by the transport
///
/// `peek` and `receive` must never block.
pub trait SerialBus: Send {
    /// Apply line settings and allocate a receive ring of `ring_capacity` bytes
    fn configure(&mut self, params: &UartParams, ring_capacity: usize) -> Result<()>;

    /// Number of bytes ready to be received
    fn peek(&mut self) -> Result<usize>;

    /// Copy up to `buf.len()` buffered bytes into `buf`
    fn receive(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Write all of `bytes` to the bus
    fn transmit(&mut self, bytes: &[u8]) -> Result<()>;
}

impl<B: SerialBus + ?Sized> SerialBus for Box<B> {
    fn configure(&mut self, params: &UartParams, ring_capacity: usize) -> Result<()> {
        (**self).configure(params, ring_capacity)
    }

    fn peek(&mut self) -> Result<usize> {
        (**self).peek()
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).receive(buf)
    }

    fn transmit(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).transmit(bytes)
    }
}
