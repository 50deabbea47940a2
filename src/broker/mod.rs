//! Broker Module
//!
//! Connection life-cycle for the cloud message broker.
//!
//! ## Architecture
//! - [`BrokerClient`]: the broker library seen through a narrow trait
//! - [`BrokerEvent`]: asynchronous notifications from that library, delivered
//!   over a channel instead of a callback
//! - [`ConnectionMachine`]: owns the [`ConnectionState`] and decides which
//!   outbound operations are legal
//!
//! ```text
//!   connect-intent ──► Uninitialized ──init──► (connect action)
//!                                                  │ open ok
//!                                                  ▼
//!                       Disconnected ◄──event── Connecting ──CONNACK──► Connected
//!                            │                                            │
//!                            └──────── connect-intent (immediate) ◄───────┘
//! ```

mod credentials;
mod state;
mod mqtt;
pub mod mock;

pub use credentials::{device_topic, Credentials, MAX_PASSWORD_LEN, MAX_USERNAME_LEN};
pub use state::{ConnectOutcome, ConnectionMachine, ConnectionState, EventAction};
pub use mqtt::{RumqttBroker, DEFAULT_REQUEST_CAPACITY};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};

/// Packet identifier returned by publish/subscribe/unsubscribe; 0 means failure
pub type MessageId = u16;

/// MQTT 3.1.1
pub const MQTT_PROTOCOL_V4: u8 = 4;

/// Delivery guarantee level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum QoS {
    AtMostOnce = 0,
    AtLeastOnce = 1,
    ExactlyOnce = 2,
}

impl TryFrom<u8> for QoS {
    type Error = ValidationError;

    fn try_from(level: u8) -> std::result::Result<Self, Self::Error> {
        match level {
            0 => Ok(QoS::AtMostOnce),
            1 => Ok(QoS::AtLeastOnce),
            2 => Ok(QoS::ExactlyOnce),
            other => Err(ValidationError::OutOfRange {
                field: "qos",
                value: other.to_string(),
                min: 0,
                max: 2,
            }),
        }
    }
}

/// Session handshake parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectParams {
    pub version: u8,
    pub clean_session: bool,
    pub client_id: String,
    pub keepalive: u16,
    pub username: String,
    pub password: String,
}

/// Notification emitted by the broker library
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerEvent {
    Connected,
    Disconnected,
    Published(MessageId),
    Subscribed(MessageId),
    Unsubscribed(MessageId),
    MessageReceived { topic: String, payload: Vec<u8> },
}

/// Broker library consumed by the connection machine
///
/// Implementations report asynchronous [`BrokerEvent`]s through the channel
/// they were constructed with.
pub trait BrokerClient: Send {
    /// Prepare the client session; called once before the first connect
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    /// Open the network transport to the broker
    fn open(&mut self, host: &str, port: u16, security: bool) -> Result<()>;

    /// Send the session handshake over an opened transport
    fn connect(&mut self, params: &ConnectParams) -> Result<()>;

    fn publish(&mut self, topic: &str, payload: &[u8], qos: QoS) -> Result<MessageId>;

    fn subscribe(&mut self, topic: &str, qos: QoS) -> Result<MessageId>;

    fn unsubscribe(&mut self, topic: &str) -> Result<MessageId>;

    fn disconnect(&mut self) -> Result<()>;
}

impl<C: BrokerClient + ?Sized> BrokerClient for Box<C> {
    fn init(&mut self) -> Result<()> {
        (**self).init()
    }

    fn open(&mut self, host: &str, port: u16, security: bool) -> Result<()> {
        (**self).open(host, port, security)
    }

    fn connect(&mut self, params: &ConnectParams) -> Result<()> {
        (**self).connect(params)
    }

    fn publish(&mut self, topic: &str, payload: &[u8], qos: QoS) -> Result<MessageId> {
        (**self).publish(topic, payload, qos)
    }

    fn subscribe(&mut self, topic: &str, qos: QoS) -> Result<MessageId> {
        (**self).subscribe(topic, qos)
    }

    fn unsubscribe(&mut self, topic: &str) -> Result<MessageId> {
        (**self).unsubscribe(topic)
    }

    fn disconnect(&mut self) -> Result<()> {
        (**self).disconnect()
    }
}
