//! Serial port adapter
//!
//! Binds [`SerialBus`] to a host serial device through the `serialport` crate.
//! Inbound bytes are staged in the owned [`RingBuffer`] on every `peek`, so
//! the OS buffer absorbs anything the ring cannot hold.

use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use serialport::SerialPort;

use crate::error::{GatewayError, Result};

use super::{DataBits, FlowControl, Parity, RingBuffer, SerialBus, StopBits, UartParams};

/// Read timeout for the underlying port; reads are only issued for bytes
/// already reported available, so this is never actually waited on
const PORT_TIMEOUT_MS: u64 = 10;

/// Serial device such as `/dev/ttyUSB0`
pub struct SerialPortBus {
    path: String,
    port: Option<Box<dyn SerialPort>>,
    ring: RingBuffer,
}

impl SerialPortBus {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            port: None,
            ring: RingBuffer::with_capacity(0),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn SerialPort>> {
        self.port
            .as_mut()
            .ok_or_else(|| GatewayError::Transport(format!("{} is not open", self.path)))
    }

    /// Move bytes waiting in the OS buffer into the ring
    fn fill_ring(&mut self) -> Result<()> {
        let free = self.ring.free();
        if free == 0 {
            return Ok(());
        }

        let port = self.port_mut()?;
        let waiting = port.bytes_to_read().map_err(serial_error)? as usize;
        let want = waiting.min(free);
        if want == 0 {
            return Ok(());
        }

        let mut chunk = vec![0u8; want];
        let read = match port.read(&mut chunk) {
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::TimedOut || e.kind() == ErrorKind::WouldBlock => 0,
            Err(e) => return Err(e.into()),
        };
        self.ring.push(&chunk[..read]);
        Ok(())
    }
}

impl SerialBus for SerialPortBus {
    fn configure(&mut self, params: &UartParams, ring_capacity: usize) -> Result<()> {
        let port = serialport::new(&self.path, params.baud_rate)
            .data_bits(match params.data_bits {
                DataBits::Seven => serialport::DataBits::Seven,
                DataBits::Eight => serialport::DataBits::Eight,
            })
            .parity(match params.parity {
                Parity::None => serialport::Parity::None,
                Parity::Even => serialport::Parity::Even,
                Parity::Odd => serialport::Parity::Odd,
            })
            .stop_bits(match params.stop_bits {
                StopBits::One => serialport::StopBits::One,
                StopBits::Two => serialport::StopBits::Two,
            })
            .flow_control(match params.flow_control {
                FlowControl::None => serialport::FlowControl::None,
                FlowControl::RtsCts => serialport::FlowControl::Hardware,
            })
            .timeout(Duration::from_millis(PORT_TIMEOUT_MS))
            .open()
            .map_err(serial_error)?;

        self.port = Some(port);
        self.ring = RingBuffer::with_capacity(ring_capacity);
        Ok(())
    }

    fn peek(&mut self) -> Result<usize> {
        self.fill_ring()?;
        Ok(self.ring.len())
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<usize> {
        Ok(self.ring.pop_into(buf))
    }

    fn transmit(&mut self, bytes: &[u8]) -> Result<()> {
        let port = self.port_mut()?;
        port.write_all(bytes)?;
        port.flush()?;
        Ok(())
    }
}

fn serial_error(e: serialport::Error) -> GatewayError {
    GatewayError::Transport(format!("serial port: {}", e))
}
