//! Tests for utility functions

use policy_enforcement_point::core::{delay_from_secs, SchedulerError};
use policy_enforcement_point::util::{init_tracing, now_ms};
use std::time::Duration;

#[test]
fn test_now_ms_monotonic_enough() {
    let a = now_ms();
    let b = now_ms();
    assert!(b >= a);
    assert!(a > 1_600_000_000_000);
}

#[test]
fn test_init_tracing_idempotent() {
    init_tracing();
    init_tracing();
}

#[test]
fn test_delay_from_secs() {
    assert_eq!(delay_from_secs(1.5).unwrap(), Duration::from_millis(1500));
    assert_eq!(delay_from_secs(0.0).unwrap(), Duration::ZERO);
    assert!(matches!(
        delay_from_secs(-0.001),
        Err(SchedulerError::InvalidArgument(_))
    ));
    assert!(delay_from_secs(f64::INFINITY).is_err());
}
