//! Mock broker client for testing
//!
//! Records every call the connection machine makes and lets tests force
//! failures. Events are not emitted on their own; tests feed
//! [`BrokerEvent`](super::BrokerEvent)s to the machine directly.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{GatewayError, Result};

use super::{BrokerClient, ConnectParams, MessageId, QoS};

/// A call observed by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerCall {
    Init,
    Open { host: String, port: u16, security: bool },
    Connect(ConnectParams),
    Publish { topic: String, payload: Vec<u8>, qos: QoS },
    Subscribe { topic: String, qos: QoS },
    Unsubscribe { topic: String },
    Disconnect,
}

#[derive(Debug, Default)]
struct MockBrokerState {
    calls: Vec<BrokerCall>,
    next_id: MessageId,
    fail_init: bool,
    fail_open: bool,
    fail_connect: bool,
    fail_disconnect: bool,
    zero_ids: bool,
}

/// In-memory broker client
#[derive(Debug, Clone, Default)]
pub struct MockBroker {
    state: Arc<Mutex<MockBrokerState>>,
}

impl MockBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call so far, in order
    pub fn calls(&self) -> Vec<BrokerCall> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    pub fn connect_count(&self) -> usize {
        self.count(|c| matches!(c, BrokerCall::Connect(_)))
    }

    pub fn init_count(&self) -> usize {
        self.count(|c| matches!(c, BrokerCall::Init))
    }

    /// Topics and payloads of recorded publishes
    pub fn published(&self) -> Vec<(String, Vec<u8>, QoS)> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                BrokerCall::Publish { topic, payload, qos } => {
                    Some((topic.clone(), payload.clone(), *qos))
                }
                _ => None,
            })
            .collect()
    }

    /// Topics of recorded subscribes
    pub fn subscribed(&self) -> Vec<String> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                BrokerCall::Subscribe { topic, .. } => Some(topic.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn fail_init(&self, fail: bool) {
        self.state.lock().fail_init = fail;
    }

    pub fn fail_open(&self, fail: bool) {
        self.state.lock().fail_open = fail;
    }

    pub fn fail_connect(&self, fail: bool) {
        self.state.lock().fail_connect = fail;
    }

    pub fn fail_disconnect(&self, fail: bool) {
        self.state.lock().fail_disconnect = fail;
    }

    /// Make publish/subscribe/unsubscribe return packet id 0
    pub fn zero_ids(&self, zero: bool) {
        self.state.lock().zero_ids = zero;
    }

    fn count(&self, pred: impl Fn(&BrokerCall) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|c| pred(c)).count()
    }

    fn record_with_id(&self, call: BrokerCall) -> MessageId {
        let mut state = self.state.lock();
        state.calls.push(call);
        if state.zero_ids {
            return 0;
        }
        state.next_id = state.next_id.wrapping_add(1).max(1);
        state.next_id
    }
}

impl BrokerClient for MockBroker {
    fn init(&mut self) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push(BrokerCall::Init);
        if state.fail_init {
            return Err(GatewayError::Transport("mock init failure".to_string()));
        }
        Ok(())
    }

    fn open(&mut self, host: &str, port: u16, security: bool) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push(BrokerCall::Open {
            host: host.to_string(),
            port,
            security,
        });
        if state.fail_open {
            return Err(GatewayError::Transport("mock open failure".to_string()));
        }
        Ok(())
    }

    fn connect(&mut self, params: &ConnectParams) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push(BrokerCall::Connect(params.clone()));
        if state.fail_connect {
            return Err(GatewayError::Protocol("mock handshake refused".to_string()));
        }
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &[u8], qos: QoS) -> Result<MessageId> {
        Ok(self.record_with_id(BrokerCall::Publish {
            topic: topic.to_string(),
            payload: payload.to_vec(),
            qos,
        }))
    }

    fn subscribe(&mut self, topic: &str, qos: QoS) -> Result<MessageId> {
        Ok(self.record_with_id(BrokerCall::Subscribe {
            topic: topic.to_string(),
            qos,
        }))
    }

    fn unsubscribe(&mut self, topic: &str) -> Result<MessageId> {
        Ok(self.record_with_id(BrokerCall::Unsubscribe {
            topic: topic.to_string(),
        }))
    }

    fn disconnect(&mut self) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push(BrokerCall::Disconnect);
        if state.fail_disconnect {
            return Err(GatewayError::Transport("mock disconnect failure".to_string()));
        }
        Ok(())
    }
}
