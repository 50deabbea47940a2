//! Gateway Module
//!
//! The ingress dispatcher: everything a console line or a broker event can
//! trigger goes through [`Gateway`].
//!
//! ## Responsibilities
//! - Route mesh command text (console `cmd` or broker payload) through the
//!   codec to the serial transport
//! - Route lifecycle verbs through the [`ConnectionMachine`]
//! - Stage topics/messages in the [`Scratch`] buffers
//! - Serve the settings getters and setters
//!
//! ```text
//!   console line ──► LocalCommand ──┬──► ConnectionMachine ──► BrokerClient
//!                                   │
//!   broker payload ─────────────────┴──► parse ──► encode ──► SerialTransport
//! ```

mod console;
mod runtime;
mod scratch;

pub use console::{mesh_command_text, LocalCommand, CMD_USAGE, HELP_TEXT};
pub use runtime::{GatewayEvent, Runtime};
pub use scratch::{Scratch, MAX_MESSAGE_LEN, MAX_TOPIC_LEN};

use crate::broker::{
    device_topic, BrokerClient, BrokerEvent, ConnectOutcome, ConnectionMachine, ConnectionState,
    EventAction, MessageId,
};
use crate::error::{GatewayError, Result, ValidationError};
use crate::protocol::{encode_frame, parse_command, Frame};
use crate::serial::{SerialBus, SerialTransport};
use crate::settings::SettingsStore;

/// Ingress dispatcher owning every piece of mutable gateway state
pub struct Gateway<C: BrokerClient, B: SerialBus> {
    /// Broker connection gatekeeper
    machine: ConnectionMachine<C>,

    /// UART link to the mesh controller
    transport: SerialTransport<B>,

    /// Persisted connection parameters
    settings: SettingsStore,

    /// Topic/message staging
    scratch: Scratch,
}

impl<C: BrokerClient, B: SerialBus> Gateway<C, B> {
    /// Assemble a gateway; the transport is expected to be configured already
    pub fn new(client: C, transport: SerialTransport<B>, settings: SettingsStore) -> Self {
        Self {
            machine: ConnectionMachine::new(client),
            transport,
            settings,
            scratch: Scratch::new(),
        }
    }

    // =========================================================================
    // Console
    // =========================================================================

    /// Execute one console line
    ///
    /// Returns the text to print on success (`None` for a bare OK).
    pub fn execute_line(&mut self, line: &str) -> Result<Option<String>> {
        match LocalCommand::parse(line)? {
            LocalCommand::Empty => Ok(None),
            LocalCommand::Usage => Ok(Some(CMD_USAGE.to_string())),
            LocalCommand::Help => Ok(Some(HELP_TEXT.to_string())),
            LocalCommand::Mesh { code, target } => {
                let text = mesh_command_text(code, target);
                self.handle_mesh_command(&text)?;
                Ok(None)
            }
            LocalCommand::Connect => match self.connect()? {
                ConnectOutcome::AlreadyConnected => Ok(Some("already connected".to_string())),
                ConnectOutcome::Connected => Ok(None),
            },
            LocalCommand::Disconnect => {
                self.disconnect()?;
                Ok(None)
            }
            LocalCommand::Publish { topic, message } => {
                self.publish(topic, message)?;
                Ok(None)
            }
            LocalCommand::Subscribe { topic } => {
                self.subscribe(topic)?;
                Ok(None)
            }
            LocalCommand::Unsubscribe { topic } => {
                self.unsubscribe(topic)?;
                Ok(None)
            }
            LocalCommand::List => {
                let listing = self
                    .settings
                    .list()
                    .into_iter()
                    .map(|(key, value)| format!("{} = {}", key, value))
                    .collect::<Vec<_>>()
                    .join("\n");
                Ok(Some(listing))
            }
            LocalCommand::Get { key } => Ok(Some(self.settings.get(key)?)),
            LocalCommand::Set { key, value } => {
                self.settings.set(key, value)?;
                Ok(None)
            }
        }
    }

    // =========================================================================
    // Mesh Path
    // =========================================================================

    /// Parse, encode and transmit one mesh command
    ///
    /// Shared by the console `cmd` verb and broker-delivered payloads. Needs
    /// no broker connectivity.
    pub fn handle_mesh_command(&mut self, text: &str) -> Result<Frame> {
        let command = parse_command(text).map_err(|e| {
            tracing::warn!("Rejected mesh command {:?}: {}", text, e);
            e
        })?;
        let frame = encode_frame(&command);
        tracing::debug!("{:?} -> {}", command, frame.to_hex());

        self.transport.transmit(&frame)?;
        Ok(frame)
    }

    /// One receive poll cycle
    pub fn poll_serial(&mut self) -> Result<usize> {
        self.transport.poll()
    }

    // =========================================================================
    // Broker Path
    // =========================================================================

    /// Connect intent, followed by the device topic subscription on success
    pub fn connect(&mut self) -> Result<ConnectOutcome> {
        let outcome = self.machine.connect(self.settings.settings())?;

        if outcome == ConnectOutcome::Connected {
            let topic = device_topic(&self.settings.settings().device);
            if let Err(e) = self.subscribe(&topic) {
                tracing::error!("Device topic subscription failed: {}", e);
            }
        }
        Ok(outcome)
    }

    pub fn disconnect(&mut self) -> Result<()> {
        self.machine.disconnect()
    }

    /// Publish intent
    ///
    /// Lengths are checked first, then connectivity; the staging buffers are
    /// only written once both pass.
    pub fn publish(&mut self, topic: &str, message: &str) -> Result<MessageId> {
        ValidationError::check_len("topic", topic, MAX_TOPIC_LEN)?;
        ValidationError::check_len("message", message, MAX_MESSAGE_LEN)?;
        if !self.machine.is_connected() {
            tracing::warn!("Not connected, publish to '{}' refused", topic);
            return Err(GatewayError::NotConnected);
        }

        self.scratch.stage_topic(topic)?;
        self.scratch.stage_message(message)?;
        let qos = self.settings.settings().qos;
        self.machine
            .publish(self.scratch.topic(), self.scratch.message(), qos)
    }

    pub fn subscribe(&mut self, topic: &str) -> Result<MessageId> {
        self.scratch.stage_topic(topic)?;
        let qos = self.settings.settings().qos;
        self.machine.subscribe(self.scratch.topic(), qos)
    }

    pub fn unsubscribe(&mut self, topic: &str) -> Result<MessageId> {
        self.scratch.stage_topic(topic)?;
        self.machine.unsubscribe(self.scratch.topic())
    }

    /// Apply an asynchronous broker event and run its follow-up
    pub fn handle_broker_event(&mut self, event: BrokerEvent) -> Result<()> {
        match self.machine.handle_event(event) {
            EventAction::None => Ok(()),
            EventAction::Reconnect => self.connect().map(|_| ()),
            EventAction::RouteMessage { topic, payload } => {
                let text = String::from_utf8_lossy(&payload);
                tracing::debug!("Routing message from '{}' to mesh", topic);
                self.handle_mesh_command(&text).map(|_| ())
            }
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn connection_state(&self) -> ConnectionState {
        self.machine.state()
    }

    pub fn machine(&self) -> &ConnectionMachine<C> {
        &self.machine
    }

    pub fn transport(&self) -> &SerialTransport<B> {
        &self.transport
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn scratch(&self) -> &Scratch {
        &self.scratch
    }
}
