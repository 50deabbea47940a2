//! rumqttc adapter
//!
//! Binds [`BrokerClient`] to the synchronous `rumqttc` client. A pump thread
//! drives the rumqttc connection and forwards what it sees as
//! [`BrokerEvent`]s. The pump stops on the first connection error instead of
//! letting rumqttc reconnect on its own: reconnection belongs to the
//! connection machine.
//!
//! Every connect starts a new session generation. A pump whose generation is
//! no longer current goes quiet, so a session closed by a later connect never
//! reports itself as lost.

use std::net::{TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Sender};
use rumqttc::{
    Client, ConnectReturnCode, Connection, Event, MqttOptions, Outgoing, Packet,
    QoS as MqttQoS, Transport,
};

use crate::error::{GatewayError, Result};

use super::{BrokerClient, BrokerEvent, ConnectParams, MessageId, QoS, MQTT_PROTOCOL_V4};

/// Default capacity of rumqttc's request queue
pub const DEFAULT_REQUEST_CAPACITY: usize = 16;

#[derive(Debug, Clone)]
struct Endpoint {
    host: String,
    port: u16,
    security: bool,
}

/// Generation a pump belongs to, checked against the broker's current one
#[derive(Debug, Clone)]
struct SessionTag {
    generation: u64,
    current: Arc<AtomicU64>,
}

impl SessionTag {
    fn is_live(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.generation
    }
}

/// MQTT 3.1.1 client backed by rumqttc
pub struct RumqttBroker {
    events: Sender<BrokerEvent>,
    connect_timeout: Duration,
    request_capacity: usize,
    endpoint: Option<Endpoint>,
    client: Option<Client>,
    pump: Option<JoinHandle<()>>,
    /// Current session generation, shared with the pumps
    session: Arc<AtomicU64>,
    /// rumqttc keeps packet ids internal; requests get local ids instead
    next_id: MessageId,
}

impl RumqttBroker {
    /// `events` receives every notification; `connect_timeout` bounds the
    /// transport probe and the wait for CONNACK
    pub fn new(events: Sender<BrokerEvent>, connect_timeout: Duration) -> Self {
        Self {
            events,
            connect_timeout,
            request_capacity: DEFAULT_REQUEST_CAPACITY,
            endpoint: None,
            client: None,
            pump: None,
            session: Arc::new(AtomicU64::new(0)),
            next_id: 1,
        }
    }

    /// Size of rumqttc's outbound request queue (at least 1)
    pub fn with_request_capacity(mut self, capacity: usize) -> Self {
        self.request_capacity = capacity.max(1);
        self
    }

    /// Generation of the newest session
    pub fn session_generation(&self) -> u64 {
        self.session.load(Ordering::SeqCst)
    }

    fn client(&self) -> Result<&Client> {
        self.client
            .as_ref()
            .ok_or_else(|| GatewayError::Transport("no broker session".to_string()))
    }

    fn allocate_id(&mut self) -> MessageId {
        let id = self.next_id;
        self.next_id = self.next_id.checked_add(1).unwrap_or(1);
        id
    }

    /// Silence the pump of the current session
    fn retire_session(&self) -> u64 {
        self.session.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Drop any previous session before starting a new one
    fn teardown(&mut self) -> u64 {
        let generation = self.retire_session();
        if let Some(client) = self.client.take() {
            let _ = client.disconnect();
        }
        // The pump exits on its own once the old connection errors out
        self.pump.take();
        generation
    }
}

impl BrokerClient for RumqttBroker {
    fn open(&mut self, host: &str, port: u16, security: bool) -> Result<()> {
        let addr = (host, port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| GatewayError::Transport(format!("{} did not resolve", host)))?;

        // Reachability probe; rumqttc opens its own socket on connect
        TcpStream::connect_timeout(&addr, self.connect_timeout)?;

        self.endpoint = Some(Endpoint {
            host: host.to_string(),
            port,
            security,
        });
        Ok(())
    }

    fn connect(&mut self, params: &ConnectParams) -> Result<()> {
        if params.version != MQTT_PROTOCOL_V4 {
            return Err(GatewayError::Protocol(format!(
                "unsupported protocol version {}",
                params.version
            )));
        }
        let endpoint = self
            .endpoint
            .clone()
            .ok_or_else(|| GatewayError::Transport("transport not opened".to_string()))?;

        let tag = SessionTag {
            generation: self.teardown(),
            current: Arc::clone(&self.session),
        };

        let mut options = MqttOptions::new(&params.client_id, &endpoint.host, endpoint.port);
        options.set_keep_alive(Duration::from_secs(u64::from(params.keepalive)));
        options.set_clean_session(params.clean_session);
        options.set_credentials(&params.username, &params.password);
        if endpoint.security {
            options.set_transport(Transport::tls_with_default_config());
        }

        let (client, connection) = Client::new(options, self.request_capacity);
        let (ack_tx, ack_rx) = channel::bounded(1);
        let events = self.events.clone();
        let pump = thread::Builder::new()
            .name("mqtt-pump".to_string())
            .spawn(move || pump_events(connection, events, ack_tx, tag))?;

        match ack_rx.recv_timeout(self.connect_timeout) {
            Ok(Ok(())) => {
                self.client = Some(client);
                self.pump = Some(pump);
                Ok(())
            }
            Ok(Err(e)) => Err(e),
            Err(_) => {
                // A late CONNACK must not surface a session nobody owns
                self.retire_session();
                let _ = client.disconnect();
                Err(GatewayError::Transport(format!(
                    "no CONNACK within {} ms",
                    self.connect_timeout.as_millis()
                )))
            }
        }
    }

    fn publish(&mut self, topic: &str, payload: &[u8], qos: QoS) -> Result<MessageId> {
        self.client()?
            .publish(topic, to_mqtt_qos(qos), false, payload.to_vec())
            .map_err(client_error)?;
        Ok(self.allocate_id())
    }

    fn subscribe(&mut self, topic: &str, qos: QoS) -> Result<MessageId> {
        self.client()?
            .subscribe(topic, to_mqtt_qos(qos))
            .map_err(client_error)?;
        Ok(self.allocate_id())
    }

    fn unsubscribe(&mut self, topic: &str) -> Result<MessageId> {
        self.client()?.unsubscribe(topic).map_err(client_error)?;
        Ok(self.allocate_id())
    }

    fn disconnect(&mut self) -> Result<()> {
        let client = self
            .client
            .take()
            .ok_or_else(|| GatewayError::Transport("no broker session".to_string()))?;
        client.disconnect().map_err(client_error)
    }
}

/// Forward rumqttc notifications until the connection ends
///
/// The first CONNACK (or failure before it) answers `ack`. A drop after a
/// successful CONNACK is reported as [`BrokerEvent::Disconnected`]; a failure
/// before it is only reported through `ack`, so an unreachable broker cannot
/// trigger a reconnect loop. Nothing is forwarded once `tag` is retired.
fn pump_events(
    mut connection: Connection,
    events: Sender<BrokerEvent>,
    ack: Sender<Result<()>>,
    tag: SessionTag,
) {
    let mut acked = false;

    for notification in connection.iter() {
        if !tag.is_live() {
            tracing::debug!("Session {} retired, pump exiting", tag.generation);
            return;
        }

        let event = match notification {
            Ok(Event::Incoming(Packet::ConnAck(connack))) => {
                if connack.code != ConnectReturnCode::Success {
                    let _ = ack.send(Err(GatewayError::Protocol(format!(
                        "connection refused: {:?}",
                        connack.code
                    ))));
                    return;
                }
                acked = true;
                let _ = ack.send(Ok(()));
                BrokerEvent::Connected
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => BrokerEvent::MessageReceived {
                topic: publish.topic.clone(),
                payload: publish.payload.to_vec(),
            },
            Ok(Event::Incoming(Packet::PubAck(puback))) => BrokerEvent::Published(puback.pkid),
            Ok(Event::Incoming(Packet::PubComp(pubcomp))) => BrokerEvent::Published(pubcomp.pkid),
            Ok(Event::Incoming(Packet::SubAck(suback))) => BrokerEvent::Subscribed(suback.pkid),
            Ok(Event::Incoming(Packet::UnsubAck(unsuback))) => {
                BrokerEvent::Unsubscribed(unsuback.pkid)
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                tracing::debug!("DISCONNECT sent");
                continue;
            }
            Ok(other) => {
                tracing::trace!("mqtt: {:?}", other);
                continue;
            }
            Err(e) => {
                if !tag.is_live() {
                    tracing::debug!("Retired session {} closed: {}", tag.generation, e);
                } else if acked {
                    tracing::warn!("Broker connection lost: {}", e);
                    let _ = events.send(BrokerEvent::Disconnected);
                } else {
                    let _ = ack.send(Err(GatewayError::Transport(format!(
                        "connection failed: {}",
                        e
                    ))));
                }
                return;
            }
        };

        if events.send(event).is_err() {
            // Runtime is gone
            return;
        }
    }

    if acked && tag.is_live() {
        let _ = events.send(BrokerEvent::Disconnected);
    }
}

fn to_mqtt_qos(qos: QoS) -> MqttQoS {
    match qos {
        QoS::AtMostOnce => MqttQoS::AtMostOnce,
        QoS::AtLeastOnce => MqttQoS::AtLeastOnce,
        QoS::ExactlyOnce => MqttQoS::ExactlyOnce,
    }
}

fn client_error(e: rumqttc::ClientError) -> GatewayError {
    GatewayError::Transport(format!("mqtt client: {}", e))
}
