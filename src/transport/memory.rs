//! In-memory transport for development and testing.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use tracing::debug;

use crate::config::BusConfig;
use crate::core::{AckStatus, TransportError};
use crate::transport::PolicyTransport;
use crate::util::clock::now_ms;

/// A status signal captured by [`InMemoryTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedStatus {
    /// Transaction being acknowledged.
    pub transaction_id: u32,
    /// Acknowledgment status.
    pub status: AckStatus,
    /// Fully qualified signal name, `interface.status_signal`.
    pub signal: String,
    /// Monotonic emission time.
    pub emitted_at: Instant,
    /// Wall-clock emission time in milliseconds since epoch.
    pub emitted_at_ms: u128,
}

/// Transport that records everything instead of talking to a bus.
pub struct InMemoryTransport {
    bus: BusConfig,
    registered: AtomicBool,
    registrations: AtomicU32,
    failing_registrations: AtomicU32,
    fail_emissions: AtomicBool,
    emitted: Mutex<Vec<EmittedStatus>>,
    status_tx: Sender<EmittedStatus>,
    status_rx: Receiver<EmittedStatus>,
}

impl Default for InMemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTransport {
    /// Create an unregistered transport using the default bus names.
    #[must_use]
    pub fn new() -> Self {
        Self::with_bus(BusConfig::default())
    }

    /// Create an unregistered transport addressing the authority through `bus`.
    #[must_use]
    pub fn with_bus(bus: BusConfig) -> Self {
        let (status_tx, status_rx) = unbounded();
        Self {
            bus,
            registered: AtomicBool::new(false),
            registrations: AtomicU32::new(0),
            failing_registrations: AtomicU32::new(0),
            fail_emissions: AtomicBool::new(false),
            emitted: Mutex::new(Vec::new()),
            status_tx,
            status_rx,
        }
    }

    /// Bus names this transport addresses.
    #[must_use]
    pub const fn bus(&self) -> &BusConfig {
        &self.bus
    }

    /// Make the next `count` registration attempts fail.
    pub fn fail_next_registrations(&self, count: u32) {
        self.failing_registrations.store(count, Ordering::SeqCst);
    }

    /// Make status emission fail until switched back.
    pub fn set_emission_failure(&self, fail: bool) {
        self.fail_emissions.store(fail, Ordering::SeqCst);
    }

    /// Whether the endpoint is currently registered.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.registered.load(Ordering::SeqCst)
    }

    /// Registration attempts seen so far, failed ones included.
    #[must_use]
    pub fn registration_attempts(&self) -> u32 {
        self.registrations.load(Ordering::SeqCst)
    }

    /// Snapshot of every emitted status, in emission order.
    #[must_use]
    pub fn emitted(&self) -> Vec<EmittedStatus> {
        self.emitted.lock().clone()
    }

    /// Block until the next status signal or `timeout`.
    pub fn recv_status_timeout(&self, timeout: Duration) -> Option<EmittedStatus> {
        match self.status_rx.recv_timeout(timeout) {
            Ok(status) => Some(status),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }
}

impl PolicyTransport for InMemoryTransport {
    fn register(&self) -> Result<(), TransportError> {
        self.registrations.fetch_add(1, Ordering::SeqCst);
        let injected = self
            .failing_registrations
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(TransportError::Registration(format!(
                "{} unavailable for {}.{}",
                self.bus.service_name, self.bus.interface, self.bus.register_method
            )));
        }
        self.registered.store(true, Ordering::SeqCst);
        debug!(
            method = %self.bus.register_method,
            path = %self.bus.object_path,
            subscribed = %format!("{}.{}", self.bus.interface, self.bus.decision_signal),
            "registered"
        );
        Ok(())
    }

    fn unregister(&self) -> Result<(), TransportError> {
        if !self.registered.swap(false, Ordering::SeqCst) {
            return Err(TransportError::Registration(format!(
                "{} called while not registered",
                self.bus.unregister_method
            )));
        }
        debug!(method = %self.bus.unregister_method, "unregistered");
        Ok(())
    }

    fn emit_status(&self, transaction_id: u32, status: AckStatus) -> Result<(), TransportError> {
        if self.fail_emissions.load(Ordering::SeqCst) {
            return Err(TransportError::Emission(format!(
                "injected failure for transaction {transaction_id}"
            )));
        }
        let record = EmittedStatus {
            transaction_id,
            status,
            signal: format!("{}.{}", self.bus.interface, self.bus.status_signal),
            emitted_at: Instant::now(),
            emitted_at_ms: now_ms(),
        };
        self.emitted.lock().push(record.clone());
        self.status_tx
            .send(record)
            .map_err(|_| TransportError::Disconnected)
    }
}
