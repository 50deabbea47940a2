//! Serial Transport Tests
//!
//! Configuration, bounded polling and frame transmission against the mock bus.

use meshgate::error::GatewayError;
use meshgate::protocol::{encode_frame, MeshCommand};
use meshgate::serial::mock::MockSerialBus;
use meshgate::serial::{FlowControl, SerialTransport, UartParams, RX_CHUNK_SIZE};

fn configured_transport(ring_capacity: usize) -> (SerialTransport<MockSerialBus>, MockSerialBus) {
    let bus = MockSerialBus::new();
    let mut transport = SerialTransport::new(bus.clone(), UartParams::default(), ring_capacity);
    transport.configure().unwrap();
    (transport, bus)
}

// =============================================================================
// Configuration Tests
// =============================================================================

#[test]
fn test_configure_applies_line_settings() {
    let (transport, bus) = configured_transport(1024);
    assert!(transport.is_configured());

    let params = bus.params().unwrap();
    assert_eq!(params.baud_rate, 115_200);
    assert_eq!(params.flow_control, FlowControl::RtsCts);
}

#[test]
fn test_configure_failure_leaves_transport_unusable() {
    let bus = MockSerialBus::new();
    bus.fail_configure(true);
    let mut transport = SerialTransport::new(bus.clone(), UartParams::default(), 1024);

    assert!(transport.configure().is_err());
    assert!(!transport.is_configured());
    assert!(matches!(transport.poll(), Err(GatewayError::Transport(_))));

    let frame = encode_frame(&MeshCommand::Board { code: 1, board: 1 });
    assert!(transport.transmit(&frame).is_err());
    assert!(bus.transmitted().is_empty());
}

// =============================================================================
// Polling Tests
// =============================================================================

#[test]
fn test_poll_with_nothing_available() {
    let (mut transport, bus) = configured_transport(1024);
    assert_eq!(transport.poll().unwrap(), 0);
    assert!(bus.reads().is_empty());
    assert_eq!(transport.stats().polls, 1);
}

#[test]
fn test_poll_drains_at_most_one_chunk() {
    let (mut transport, bus) = configured_transport(1024);
    bus.inject_rx_data(&[0xAA; 600]);

    assert_eq!(transport.poll().unwrap(), RX_CHUNK_SIZE);
    assert_eq!(bus.pending(), 600 - RX_CHUNK_SIZE);

    assert_eq!(transport.poll().unwrap(), RX_CHUNK_SIZE);
    assert_eq!(transport.poll().unwrap(), 600 - 2 * RX_CHUNK_SIZE);
    assert_eq!(transport.poll().unwrap(), 0);

    assert_eq!(bus.reads(), vec![256, 256, 88]);
    assert_eq!(transport.stats().rx_bytes, 600);
}

#[test]
fn test_poll_respects_lowered_chunk() {
    let bus = MockSerialBus::new();
    let mut transport =
        SerialTransport::new(bus.clone(), UartParams::default(), 1024).with_rx_chunk(16);
    transport.configure().unwrap();
    bus.inject_rx_data(&[1; 40]);

    assert_eq!(transport.poll().unwrap(), 16);
    assert_eq!(bus.pending(), 24);
}

#[test]
fn test_ring_overflow_stays_buffered_upstream() {
    let (mut transport, bus) = configured_transport(64);
    bus.inject_rx_data(&[7; 100]);

    assert_eq!(transport.poll().unwrap(), 64);
    assert_eq!(transport.poll().unwrap(), 36);
    assert_eq!(bus.pending(), 0);
}

// =============================================================================
// Transmit Tests
// =============================================================================

#[test]
fn test_transmit_writes_exact_frame() {
    let (mut transport, bus) = configured_transport(1024);
    let frame = encode_frame(&MeshCommand::Order { code: 6, order: 0x1A2B });
    transport.transmit(&frame).unwrap();

    assert_eq!(bus.transmitted(), vec![vec![0x04, 0x20, 0x06, 0x1A, 0x2B]]);
    let stats = transport.stats();
    assert_eq!(stats.tx_frames, 1);
    assert_eq!(stats.tx_bytes, 5);
}

#[test]
fn test_transmit_failure_is_reported() {
    let (mut transport, bus) = configured_transport(1024);
    bus.fail_transmit(true);
    let frame = encode_frame(&MeshCommand::Board { code: 3, board: 7 });

    assert!(matches!(transport.transmit(&frame), Err(GatewayError::Transport(_))));
    assert_eq!(transport.stats().tx_frames, 0);
}
