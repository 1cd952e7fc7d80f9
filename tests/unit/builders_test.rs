//! Tests for builders

use policy_enforcement_point::builders::build_runtime;
use policy_enforcement_point::config::{EndpointConfig, SchedulerConfig};
use policy_enforcement_point::core::EndpointError;
use policy_enforcement_point::transport::InMemoryTransport;
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_build_runtime_success() {
    let cfg = EndpointConfig::new().with_ack_delay(Duration::from_millis(5));
    let transport = Arc::new(InMemoryTransport::new());
    let runtime = build_runtime(&cfg, Arc::clone(&transport)).unwrap();
    assert!(transport.is_registered());
    assert!(runtime.endpoint().ack_delay() >= Duration::from_millis(4));
    runtime.shutdown();
}

#[test]
fn test_build_runtime_invalid_scheduler() {
    let cfg = EndpointConfig::new().with_scheduler(SchedulerConfig::new().with_stack_size(0));
    let result = build_runtime(&cfg, Arc::new(InMemoryTransport::new()));
    assert!(matches!(result, Err(EndpointError::Config(msg)) if msg.contains("scheduler")));
}
