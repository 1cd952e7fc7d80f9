//! Tests for error types

use policy_enforcement_point::core::{EndpointError, SchedulerError, TransportError};
use std::error::Error;

#[test]
fn test_invalid_argument_error() {
    let err = SchedulerError::InvalidArgument("negative delay".to_string());
    assert_eq!(format!("{}", err), "invalid argument: negative delay");
}

#[test]
fn test_shut_down_error() {
    assert_eq!(format!("{}", SchedulerError::ShutDown), "scheduler shut down");
}

#[test]
fn test_worker_spawn_error_keeps_source() {
    let io = std::io::Error::new(std::io::ErrorKind::Other, "no threads left");
    let err = SchedulerError::WorkerSpawn(io);
    assert!(format!("{}", err).starts_with("failed to spawn worker thread"));
    assert!(err.source().is_some());
}

#[test]
fn test_transport_errors() {
    let err = TransportError::Emission("bus gone".to_string());
    assert_eq!(format!("{}", err), "signal emission failed: bus gone");
    assert_eq!(format!("{}", TransportError::Disconnected), "transport disconnected");
}

#[test]
fn test_endpoint_error_from_scheduler() {
    let err: EndpointError = SchedulerError::ShutDown.into();
    assert!(matches!(err, EndpointError::Scheduler(SchedulerError::ShutDown)));
    assert_eq!(format!("{}", err), "scheduler error: scheduler shut down");
}

#[test]
fn test_endpoint_error_from_transport() {
    let err: EndpointError = TransportError::Registration("refused".to_string()).into();
    assert_eq!(format!("{}", err), "transport error: registration failed: refused");
}

#[test]
fn test_errors_convert_to_anyhow() {
    fn fails() -> policy_enforcement_point::core::AppResult<()> {
        let result: Result<(), TransportError> = Err(TransportError::Disconnected);
        result?;
        Ok(())
    }
    let err = fails().unwrap_err();
    assert!(err.downcast_ref::<TransportError>().is_some());
}
