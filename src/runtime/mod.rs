//! Runtime context owning the scheduler, endpoint, and transport registration.

pub mod context;
#[cfg(feature = "tokio-runtime")]
pub mod tokio_bridge;

pub use context::{EndpointRuntime, RunSummary, ShutdownReport, ShutdownTrigger};
#[cfg(feature = "tokio-runtime")]
pub use tokio_bridge::spawn_notification_pump;
