//! Configuration models for the endpoint, its scheduler, and the bus.

pub mod endpoint;

pub use endpoint::{BusConfig, EndpointConfig, SchedulerConfig};
