//! Tests for configuration validation

use policy_enforcement_point::config::{BusConfig, EndpointConfig, SchedulerConfig};
use std::time::Duration;

#[test]
fn test_scheduler_config_validation() {
    assert!(SchedulerConfig::default().validate().is_ok());
    assert!(SchedulerConfig::new().with_thread_name(" ").validate().is_err());
    assert!(SchedulerConfig::new().with_stack_size(1024).validate().is_err());
    assert!(SchedulerConfig::new()
        .with_join_timeout(Duration::ZERO)
        .validate()
        .is_err());
}

#[test]
fn test_scheduler_join_timeout_roundtrip() {
    let cfg = SchedulerConfig::new().with_join_timeout(Duration::from_millis(750));
    assert_eq!(cfg.join_timeout_ms, 750);
    assert_eq!(cfg.join_timeout(), Duration::from_millis(750));
}

#[test]
fn test_bus_config_defaults() {
    let bus = BusConfig::default();
    assert_eq!(bus.service_name, "org.freedesktop.ohm");
    assert_eq!(bus.interface, "com.nokia.policy");
    assert_eq!(bus.object_path, "/com/nokia/policy");
    assert_eq!(bus.decision_signal, "actions");
    assert!(bus.validate().is_ok());
}

#[test]
fn test_bus_config_invalid_path() {
    let bus = BusConfig {
        object_path: "com/nokia/policy".to_string(),
        ..BusConfig::default()
    };
    assert!(bus.validate().is_err());
}

#[test]
fn test_endpoint_config_invalid_attempts() {
    let cfg = EndpointConfig::new().with_register_retry(0, 10);
    assert!(cfg.validate().is_err());
}

#[test]
fn test_endpoint_config_from_json_partial() {
    let cfg = EndpointConfig::from_json_str(
        r#"{"ack_delay_secs": 0.5, "scheduler": {"drain_on_shutdown": false}}"#,
    )
    .unwrap();
    assert!((cfg.ack_delay_secs - 0.5).abs() < f64::EPSILON);
    assert!(!cfg.scheduler.drain_on_shutdown);
    assert_eq!(cfg.scheduler.thread_name, "policy-ep-scheduler");
    assert_eq!(cfg.bus, BusConfig::default());
}

#[test]
fn test_endpoint_config_from_json_rejects_invalid() {
    assert!(EndpointConfig::from_json_str("{not json").is_err());
    let err = EndpointConfig::from_json_str(r#"{"ack_delay_secs": -2.0}"#).unwrap_err();
    assert!(err.contains("ack_delay_secs"));
}

#[test]
fn test_endpoint_config_with_ack_delay() {
    let cfg = EndpointConfig::new().with_ack_delay(Duration::from_millis(250));
    assert!((cfg.ack_delay_secs - 0.25).abs() < f64::EPSILON);
    assert_eq!(cfg.register_backoff(), Duration::from_millis(500));
}
