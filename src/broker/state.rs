//! Connection State Machine
//!
//! Owns the broker connection state. Only connect/disconnect intents and the
//! asynchronous connected/disconnected events move it.

use crate::error::{GatewayError, Result};
use crate::settings::ConnectionSettings;

use super::{BrokerClient, BrokerEvent, ConnectParams, Credentials, MessageId, QoS, MQTT_PROTOCOL_V4};

/// Broker connection status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Client session never initialized
    Uninitialized,
    /// Transport open, handshake sent
    Connecting,
    Connected,
    Disconnected,
}

/// Result of a connect intent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// Already connected; nothing was dispatched
    AlreadyConnected,
    /// Handshake accepted; the caller should subscribe the device topic
    Connected,
}

/// Follow-up the dispatcher must perform after an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventAction {
    None,
    /// Issue a connect intent
    Reconnect,
    /// Route a broker-delivered payload to the mesh
    RouteMessage { topic: String, payload: Vec<u8> },
}

/// Gatekeeper between the dispatcher and the broker client
pub struct ConnectionMachine<C: BrokerClient> {
    client: C,
    state: ConnectionState,
}

impl<C: BrokerClient> ConnectionMachine<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            state: ConnectionState::Uninitialized,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    // =========================================================================
    // Intents
    // =========================================================================

    /// Connect intent
    ///
    /// - Uninitialized: initialize the session, then connect. A failed init
    ///   is reported and not retried here.
    /// - Connected: no-op.
    /// - Otherwise: connect.
    pub fn connect(&mut self, settings: &ConnectionSettings) -> Result<ConnectOutcome> {
        match self.state {
            ConnectionState::Uninitialized => {
                tracing::info!("Broker session not initialized, initializing");
                if let Err(e) = self.client.init() {
                    tracing::error!("Broker session initialization failed: {}", e);
                    return Err(e);
                }
                self.connect_action(settings)
            }
            ConnectionState::Connected => {
                tracing::info!("Already connected, nothing to do");
                Ok(ConnectOutcome::AlreadyConnected)
            }
            ConnectionState::Connecting | ConnectionState::Disconnected => {
                self.connect_action(settings)
            }
        }
    }

    /// Open the transport and perform the session handshake
    fn connect_action(&mut self, settings: &ConnectionSettings) -> Result<ConnectOutcome> {
        let credentials = Credentials::from_settings(settings)?;

        tracing::info!("Opening connection with broker {}:{}", settings.host, settings.port);
        if let Err(e) = self.client.open(&settings.host, settings.port, settings.security) {
            tracing::error!("Error opening connection (keys and certificates set properly?): {}", e);
            return Err(e);
        }
        self.state = ConnectionState::Connecting;

        let params = ConnectParams {
            version: MQTT_PROTOCOL_V4,
            clean_session: true,
            client_id: settings.device.clone(),
            keepalive: settings.keepalive,
            username: credentials.username,
            password: credentials.password,
        };
        tracing::debug!("Connecting as client {} (user {})", params.client_id, params.username);

        match self.client.connect(&params) {
            Ok(()) => {
                self.state = ConnectionState::Connected;
                tracing::info!("Connected to {}:{}", settings.host, settings.port);
                Ok(ConnectOutcome::Connected)
            }
            Err(e) => {
                tracing::error!("Error connecting: {}", e);
                Err(e)
            }
        }
    }

    /// Disconnect intent; attempted whatever the current state
    pub fn disconnect(&mut self) -> Result<()> {
        if !self.is_connected() {
            tracing::warn!("Connection not open ({:?}), disconnecting anyway", self.state);
        }

        if let Err(e) = self.client.disconnect() {
            tracing::error!("Error disconnecting: {}", e);
            return Err(e);
        }

        if self.state != ConnectionState::Uninitialized {
            self.state = ConnectionState::Disconnected;
        }
        Ok(())
    }

    /// Publish intent; refused unless connected
    pub fn publish(&mut self, topic: &str, message: &str, qos: QoS) -> Result<MessageId> {
        if !self.is_connected() {
            tracing::warn!("Not connected, dropping publish to '{}' (connect first)", topic);
            return Err(GatewayError::NotConnected);
        }

        tracing::info!("Publishing to topic '{}', message '{}'", topic, message);
        let id = self.client.publish(topic, message.as_bytes(), qos)?;
        check_message_id("publish", id)
    }

    /// Subscribe intent; sent even when not connected
    pub fn subscribe(&mut self, topic: &str, qos: QoS) -> Result<MessageId> {
        if !self.is_connected() {
            tracing::warn!("Not connected ({:?}), subscribing to '{}' anyway", self.state, topic);
        }

        tracing::info!("Subscribing to topic '{}'", topic);
        let id = self.client.subscribe(topic, qos)?;
        check_message_id("subscribe", id)
    }

    /// Unsubscribe intent; sent even when not connected
    pub fn unsubscribe(&mut self, topic: &str) -> Result<MessageId> {
        if !self.is_connected() {
            tracing::warn!("Not connected ({:?}), unsubscribing from '{}' anyway", self.state, topic);
        }

        tracing::info!("Unsubscribing from topic '{}'", topic);
        let id = self.client.unsubscribe(topic)?;
        check_message_id("unsubscribe", id)
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Apply an asynchronous broker event
    pub fn handle_event(&mut self, event: BrokerEvent) -> EventAction {
        match event {
            BrokerEvent::Connected => {
                tracing::info!("Broker reports connected");
                EventAction::None
            }
            BrokerEvent::Disconnected => {
                tracing::warn!("Broker disconnected, reconnecting");
                if self.state != ConnectionState::Uninitialized {
                    self.state = ConnectionState::Disconnected;
                }
                EventAction::Reconnect
            }
            BrokerEvent::Published(id) => {
                tracing::debug!("Message {} published", id);
                EventAction::None
            }
            BrokerEvent::Subscribed(id) => {
                tracing::debug!("Subscription {} acknowledged", id);
                EventAction::None
            }
            BrokerEvent::Unsubscribed(id) => {
                tracing::debug!("Unsubscription {} acknowledged", id);
                EventAction::None
            }
            BrokerEvent::MessageReceived { topic, payload } => {
                tracing::info!(
                    "Message received on '{}': {}",
                    topic,
                    String::from_utf8_lossy(&payload)
                );
                EventAction::RouteMessage { topic, payload }
            }
        }
    }
}

fn check_message_id(operation: &str, id: MessageId) -> Result<MessageId> {
    if id == 0 {
        tracing::error!("Error on {}: packet ID = 0", operation);
        return Err(GatewayError::Transport(format!("{} returned packet id 0", operation)));
    }
    Ok(id)
}
