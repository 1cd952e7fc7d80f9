//! Error types for scheduling, transport, and endpoint operations.

use thiserror::Error;

/// Errors produced by the delayed-event scheduler.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Delay rejected before touching the queue (negative, NaN, or infinite).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Scheduler no longer accepts events.
    #[error("scheduler shut down")]
    ShutDown,
    /// The dedicated worker thread could not be spawned.
    #[error("failed to spawn worker thread: {0}")]
    WorkerSpawn(#[source] std::io::Error),
}

/// Failures reported by the bus transport collaborator.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Registering with (or unregistering from) the policy authority failed.
    #[error("registration failed: {0}")]
    Registration(String),
    /// A status signal could not be emitted.
    #[error("signal emission failed: {0}")]
    Emission(String),
    /// The underlying bus connection is gone.
    #[error("transport disconnected")]
    Disconnected,
}

/// Errors surfaced by the enforcement endpoint and its runtime.
#[derive(Debug, Error)]
pub enum EndpointError {
    /// Scheduling the acknowledgment failed.
    #[error("scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),
    /// The transport reported a failure.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    /// Configuration did not validate.
    #[error("config invalid: {0}")]
    Config(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
