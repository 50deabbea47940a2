//! Connection State Machine Tests
//!
//! Drives `ConnectionMachine` against the mock broker client.

use meshgate::broker::mock::{BrokerCall, MockBroker};
use meshgate::broker::{
    BrokerEvent, ConnectOutcome, ConnectionMachine, ConnectionState, EventAction, QoS,
    MQTT_PROTOCOL_V4,
};
use meshgate::error::{GatewayError, ValidationError};
use meshgate::settings::ConnectionSettings;

fn machine() -> (ConnectionMachine<MockBroker>, MockBroker) {
    let broker = MockBroker::new();
    (ConnectionMachine::new(broker.clone()), broker)
}

fn connected() -> (ConnectionMachine<MockBroker>, MockBroker) {
    let (mut machine, broker) = machine();
    machine.connect(&ConnectionSettings::default()).unwrap();
    broker.clear_calls();
    (machine, broker)
}

// =============================================================================
// Connect Tests
// =============================================================================

#[test]
fn test_first_connect_initializes_then_connects() {
    let (mut machine, broker) = machine();
    assert_eq!(machine.state(), ConnectionState::Uninitialized);

    let outcome = machine.connect(&ConnectionSettings::default()).unwrap();
    assert_eq!(outcome, ConnectOutcome::Connected);
    assert_eq!(machine.state(), ConnectionState::Connected);

    let calls = broker.calls();
    assert_eq!(calls[0], BrokerCall::Init);
    assert_eq!(
        calls[1],
        BrokerCall::Open {
            host: "ambient-hub.azure-devices.net".to_string(),
            port: 8883,
            security: true,
        }
    );
    match &calls[2] {
        BrokerCall::Connect(params) => {
            assert_eq!(params.version, MQTT_PROTOCOL_V4);
            assert!(params.clean_session);
            assert_eq!(params.client_id, "007");
            assert_eq!(params.keepalive, 120);
            assert_eq!(params.username, "ambient-hub.azure-devices.net/007/api-version=2016-11-14");
            assert!(params.password.starts_with("SharedAccessSignature sr="));
        }
        other => panic!("Expected connect, got {:?}", other),
    }
}

#[test]
fn test_connect_while_connected_dispatches_nothing() {
    let (mut machine, broker) = connected();

    let outcome = machine.connect(&ConnectionSettings::default()).unwrap();
    assert_eq!(outcome, ConnectOutcome::AlreadyConnected);
    assert!(broker.calls().is_empty());
}

#[test]
fn test_init_failure_is_not_retried_within_intent() {
    let (mut machine, broker) = machine();
    broker.fail_init(true);

    assert!(machine.connect(&ConnectionSettings::default()).is_err());
    assert_eq!(machine.state(), ConnectionState::Uninitialized);
    assert_eq!(broker.calls(), vec![BrokerCall::Init]);
}

#[test]
fn test_open_failure_leaves_state_unchanged() {
    let (mut machine, broker) = machine();
    broker.fail_open(true);

    assert!(machine.connect(&ConnectionSettings::default()).is_err());
    assert_eq!(machine.state(), ConnectionState::Uninitialized);
    assert_eq!(broker.connect_count(), 0);

    // Next intent initializes again
    broker.fail_open(false);
    machine.connect(&ConnectionSettings::default()).unwrap();
    assert_eq!(broker.init_count(), 2);
    assert!(machine.is_connected());
}

#[test]
fn test_handshake_failure_stays_connecting() {
    let (mut machine, broker) = machine();
    broker.fail_connect(true);

    let err = machine.connect(&ConnectionSettings::default()).unwrap_err();
    assert!(matches!(err, GatewayError::Protocol(_)));
    assert_eq!(machine.state(), ConnectionState::Connecting);

    // Connecting retries without another init
    broker.fail_connect(false);
    machine.connect(&ConnectionSettings::default()).unwrap();
    assert_eq!(broker.init_count(), 1);
    assert_eq!(machine.state(), ConnectionState::Connected);
}

#[test]
fn test_oversized_credentials_abort_connect() {
    let (mut machine, broker) = machine();
    let settings = ConnectionSettings {
        host: "h".repeat(40),
        device: "d".repeat(50),
        ..ConnectionSettings::default()
    };

    let err = machine.connect(&settings).unwrap_err();
    assert!(matches!(err, GatewayError::Validation(ValidationError::TooLong { .. })));
    assert_eq!(broker.calls(), vec![BrokerCall::Init]);
}

// =============================================================================
// Outbound Operation Tests
// =============================================================================

#[test]
fn test_publish_refused_unless_connected() {
    let (mut machine, broker) = machine();

    let err = machine.publish("t", "C3B7", QoS::AtMostOnce).unwrap_err();
    assert!(matches!(err, GatewayError::NotConnected));
    assert!(broker.published().is_empty());
}

#[test]
fn test_publish_when_connected() {
    let (mut machine, broker) = connected();

    let id = machine.publish("devices/007/messages/events/", "hello", QoS::AtLeastOnce).unwrap();
    assert_ne!(id, 0);
    assert_eq!(
        broker.published(),
        vec![(
            "devices/007/messages/events/".to_string(),
            b"hello".to_vec(),
            QoS::AtLeastOnce
        )]
    );
}

#[test]
fn test_subscribe_and_unsubscribe_sent_when_not_connected() {
    let (mut machine, broker) = machine();

    machine.subscribe("a/b", QoS::AtMostOnce).unwrap();
    machine.unsubscribe("a/b").unwrap();
    assert_eq!(
        broker.calls(),
        vec![
            BrokerCall::Subscribe {
                topic: "a/b".to_string(),
                qos: QoS::AtMostOnce
            },
            BrokerCall::Unsubscribe {
                topic: "a/b".to_string()
            },
        ]
    );
}

#[test]
fn test_zero_message_id_is_transport_error() {
    let (mut machine, broker) = connected();
    broker.zero_ids(true);

    assert!(matches!(
        machine.publish("t", "m", QoS::AtMostOnce),
        Err(GatewayError::Transport(_))
    ));
    assert!(matches!(
        machine.subscribe("t", QoS::AtMostOnce),
        Err(GatewayError::Transport(_))
    ));
    assert!(matches!(machine.unsubscribe("t"), Err(GatewayError::Transport(_))));
}

#[test]
fn test_disconnect_moves_to_disconnected() {
    let (mut machine, broker) = connected();

    machine.disconnect().unwrap();
    assert_eq!(machine.state(), ConnectionState::Disconnected);
    assert_eq!(broker.calls(), vec![BrokerCall::Disconnect]);
}

#[test]
fn test_disconnect_failure_keeps_state() {
    let (mut machine, broker) = connected();
    broker.fail_disconnect(true);

    assert!(machine.disconnect().is_err());
    assert_eq!(machine.state(), ConnectionState::Connected);
}

#[test]
fn test_disconnect_before_init_stays_uninitialized() {
    let (mut machine, _broker) = machine();
    machine.disconnect().unwrap();
    assert_eq!(machine.state(), ConnectionState::Uninitialized);
}

// =============================================================================
// Event Tests
// =============================================================================

#[test]
fn test_disconnected_event_requests_reconnect() {
    let (mut machine, _broker) = connected();

    let action = machine.handle_event(BrokerEvent::Disconnected);
    assert_eq!(action, EventAction::Reconnect);
    assert_eq!(machine.state(), ConnectionState::Disconnected);
}

#[test]
fn test_acknowledgement_events_change_nothing() {
    let (mut machine, broker) = connected();

    for event in [
        BrokerEvent::Connected,
        BrokerEvent::Published(1),
        BrokerEvent::Subscribed(2),
        BrokerEvent::Unsubscribed(3),
    ] {
        assert_eq!(machine.handle_event(event), EventAction::None);
    }
    assert_eq!(machine.state(), ConnectionState::Connected);
    assert!(broker.calls().is_empty());
}

#[test]
fn test_message_event_routes_payload() {
    let (mut machine, _broker) = connected();

    let action = machine.handle_event(BrokerEvent::MessageReceived {
        topic: "devices/007/messages/devicebound/x".to_string(),
        payload: b"C3B7".to_vec(),
    });
    assert_eq!(
        action,
        EventAction::RouteMessage {
            topic: "devices/007/messages/devicebound/x".to_string(),
            payload: b"C3B7".to_vec(),
        }
    );
}
