//! Bus transport seam between the endpoint and the policy authority.
//!
//! Connection setup, marshaling, and name registration belong to the
//! implementation behind [`PolicyTransport`]; the endpoint only registers,
//! unregisters, and emits status signals through it.

pub mod memory;

pub use memory::{EmittedStatus, InMemoryTransport};

use crate::core::{AckStatus, TransportError};

/// Capability the endpoint needs from the bus.
pub trait PolicyTransport: Send + Sync + 'static {
    /// Invoke the authority's registration method.
    fn register(&self) -> Result<(), TransportError>;

    /// Invoke the authority's unregistration method.
    fn unregister(&self) -> Result<(), TransportError>;

    /// Emit a status signal carrying `(transaction_id, status)`.
    fn emit_status(&self, transaction_id: u32, status: AckStatus) -> Result<(), TransportError>;
}
