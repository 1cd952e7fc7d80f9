//! Tests for the in-memory transport

use policy_enforcement_point::core::{AckStatus, TransportError};
use policy_enforcement_point::transport::{InMemoryTransport, PolicyTransport};
use std::time::Duration;

#[test]
fn test_emitted_in_order() {
    let transport = InMemoryTransport::new();
    transport.emit_status(1, AckStatus::Ack).unwrap();
    transport.emit_status(2, AckStatus::Nack).unwrap();

    let emitted = transport.emitted();
    assert_eq!(emitted.len(), 2);
    assert_eq!(emitted[0].transaction_id, 1);
    assert_eq!(emitted[1].status, AckStatus::Nack);
    assert!(emitted[0].emitted_at <= emitted[1].emitted_at);
}

#[test]
fn test_recv_status_timeout() {
    let transport = InMemoryTransport::new();
    assert!(transport.recv_status_timeout(Duration::from_millis(10)).is_none());
    transport.emit_status(3, AckStatus::Ack).unwrap();
    assert_eq!(
        transport
            .recv_status_timeout(Duration::from_millis(10))
            .map(|s| s.transaction_id),
        Some(3)
    );
}

#[test]
fn test_injected_emission_failure() {
    let transport = InMemoryTransport::new();
    transport.set_emission_failure(true);
    assert!(matches!(
        transport.emit_status(4, AckStatus::Ack),
        Err(TransportError::Emission(_))
    ));
    assert!(transport.emitted().is_empty());
}

#[test]
fn test_usable_as_trait_object() {
    let transport: Box<dyn PolicyTransport> = Box::new(InMemoryTransport::default());
    transport.register().unwrap();
    transport.unregister().unwrap();
}
