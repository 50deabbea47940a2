//! Configuration for meshgate
//!
//! Runtime knobs of the gateway process. Broker connection parameters are not
//! here: they live in the persisted settings record (see [`crate::settings`]).

use std::path::PathBuf;
use std::time::Duration;

use crate::broker::DEFAULT_REQUEST_CAPACITY;
use crate::error::{GatewayError, Result};
use crate::serial::{UartParams, RX_CHUNK_SIZE};

/// Main configuration for a gateway instance
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    // -------------------------------------------------------------------------
    // Settings Configuration
    // -------------------------------------------------------------------------
    /// Persisted connection settings record
    pub settings_path: PathBuf,

    // -------------------------------------------------------------------------
    // Serial Configuration
    // -------------------------------------------------------------------------
    /// UART device path (e.g. /dev/ttyUSB0)
    pub serial_path: String,

    /// Line parameters (115200 8N1, RTS/CTS by default)
    pub uart: UartParams,

    /// Receive ring buffer capacity (bytes)
    pub ring_capacity: usize,

    /// Upper bound on bytes drained per poll
    pub rx_chunk_size: usize,

    /// Receive poll cadence (milliseconds)
    pub poll_interval_ms: u64,

    // -------------------------------------------------------------------------
    // Broker Configuration
    // -------------------------------------------------------------------------
    /// Bound on transport open and CONNACK wait (milliseconds)
    pub connect_timeout_ms: u64,

    /// Capacity of the MQTT client's outbound request queue
    pub request_queue_capacity: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            settings_path: PathBuf::from("./meshgate_settings.bin"),
            serial_path: "/dev/ttyUSB0".to_string(),
            uart: UartParams::default(),
            ring_capacity: 1024,
            rx_chunk_size: RX_CHUNK_SIZE,
            poll_interval_ms: 200,
            connect_timeout_ms: 10_000,
            request_queue_capacity: DEFAULT_REQUEST_CAPACITY,
        }
    }
}

impl GatewayConfig {
    /// Create a new config builder
    pub fn builder() -> GatewayConfigBuilder {
        GatewayConfigBuilder::default()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Reject values the runtime cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.ring_capacity == 0 {
            return Err(GatewayError::Config("ring capacity must be non-zero".to_string()));
        }
        if self.rx_chunk_size == 0 || self.rx_chunk_size > RX_CHUNK_SIZE {
            return Err(GatewayError::Config(format!(
                "rx chunk size must be 1..={}",
                RX_CHUNK_SIZE
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(GatewayError::Config("poll interval must be non-zero".to_string()));
        }
        if self.request_queue_capacity == 0 {
            return Err(GatewayError::Config("request queue capacity must be non-zero".to_string()));
        }
        Ok(())
    }
}

/// Builder for GatewayConfig
#[derive(Default)]
pub struct GatewayConfigBuilder {
    config: GatewayConfig,
}

impl GatewayConfigBuilder {
    /// Set the settings record path
    pub fn settings_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.settings_path = path.into();
        self
    }

    /// Set the UART device path
    pub fn serial_path(mut self, path: impl Into<String>) -> Self {
        self.config.serial_path = path.into();
        self
    }

    pub fn uart(mut self, params: UartParams) -> Self {
        self.config.uart = params;
        self
    }

    /// Set the baud rate, keeping the other line parameters
    pub fn baud_rate(mut self, baud: u32) -> Self {
        self.config.uart.baud_rate = baud;
        self
    }

    pub fn ring_capacity(mut self, bytes: usize) -> Self {
        self.config.ring_capacity = bytes;
        self
    }

    pub fn rx_chunk_size(mut self, bytes: usize) -> Self {
        self.config.rx_chunk_size = bytes;
        self
    }

    /// Set the poll cadence (in milliseconds)
    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    /// Set the broker connect timeout (in milliseconds)
    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.config.connect_timeout_ms = ms;
        self
    }

    pub fn request_queue_capacity(mut self, capacity: usize) -> Self {
        self.config.request_queue_capacity = capacity;
        self
    }

    /// Finish, validating the result
    pub fn build(self) -> Result<GatewayConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
