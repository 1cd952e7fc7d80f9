//! Enforcement endpoint: turns decision notifications into delayed acknowledgments.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::core::decision::{AckStatus, DecisionNotification};
use crate::core::scheduler::SchedulerHandle;
use crate::core::{EndpointError, TransportError};
use crate::transport::PolicyTransport;

/// What the endpoint did with a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckDisposition {
    /// Transaction id 0: nothing scheduled.
    NotRequired,
    /// An acknowledgment was queued on the scheduler.
    Scheduled {
        /// Transaction that will be acknowledged.
        transaction_id: u32,
        /// Status the acknowledgment will carry.
        status: AckStatus,
    },
}

/// Bridges bus notifications to scheduled acknowledgments.
///
/// Holds the transport by composition and keeps no state between
/// notifications; each one is handled on its own.
pub struct EnforcementEndpoint<T: PolicyTransport> {
    transport: Arc<T>,
    scheduler: SchedulerHandle,
    ack_delay: Duration,
}

impl<T: PolicyTransport> Clone for EnforcementEndpoint<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            scheduler: self.scheduler.clone(),
            ack_delay: self.ack_delay,
        }
    }
}

impl<T: PolicyTransport> EnforcementEndpoint<T> {
    /// Create an endpoint acknowledging `ack_delay` after receipt.
    pub fn new(transport: Arc<T>, scheduler: SchedulerHandle, ack_delay: Duration) -> Self {
        Self {
            transport,
            scheduler,
            ack_delay,
        }
    }

    /// Delay applied before every acknowledgment.
    #[must_use]
    pub const fn ack_delay(&self) -> Duration {
        self.ack_delay
    }

    /// Handle one decision notification.
    ///
    /// Logs the command/fact structure, then, unless the transaction id is 0,
    /// schedules exactly one acknowledgment after the configured delay.
    ///
    /// # Errors
    ///
    /// `EndpointError::Scheduler` if the scheduler refused the acknowledgment.
    pub fn on_decision_received(
        &self,
        notification: DecisionNotification,
    ) -> Result<AckDisposition, EndpointError> {
        let transaction_id = notification.transaction_id;
        debug!(
            transaction_id,
            commands = notification.decisions.len(),
            facts = notification.fact_count(),
            "decision notification received"
        );
        notification.trace_structure();

        if !notification.requires_ack() {
            debug!("transaction id 0, no acknowledgment expected");
            return Ok(AckDisposition::NotRequired);
        }

        let status = match notification.validate() {
            Ok(()) => AckStatus::Ack,
            Err(e) => {
                warn!(transaction_id, error = %e, "malformed decision, will NACK");
                AckStatus::Nack
            }
        };

        let endpoint = self.clone();
        self.scheduler.schedule(self.ack_delay, move || {
            endpoint.emit_ack(transaction_id, status)?;
            Ok(())
        })?;

        Ok(AckDisposition::Scheduled {
            transaction_id,
            status,
        })
    }

    /// Emit the acknowledgment signal onto the bus.
    ///
    /// # Errors
    ///
    /// Whatever the transport reports.
    pub fn emit_ack(&self, transaction_id: u32, status: AckStatus) -> Result<(), TransportError> {
        match status {
            AckStatus::Ack => info!(transaction_id, "emitting ACK signal"),
            AckStatus::Nack => warn!(transaction_id, "emitting NACK signal"),
        }
        self.transport.emit_status(transaction_id, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchedulerConfig;
    use crate::core::DelayedEventScheduler;
    use crate::transport::InMemoryTransport;

    #[test]
    fn test_zero_transaction_not_acked() {
        let scheduler = DelayedEventScheduler::start(SchedulerConfig::default()).unwrap();
        let transport = Arc::new(InMemoryTransport::new());
        let endpoint = EnforcementEndpoint::new(
            Arc::clone(&transport),
            scheduler.handle(),
            Duration::from_millis(10),
        );

        let disposition = endpoint
            .on_decision_received(DecisionNotification::new(0).with_fact("cmd", [("a", "b")]))
            .unwrap();
        assert_eq!(disposition, AckDisposition::NotRequired);
        assert_eq!(scheduler.stats().scheduled, 0);
        scheduler.shutdown();
        assert!(transport.emitted().is_empty());
    }

    #[test]
    fn test_emit_ack_direct() {
        let scheduler = DelayedEventScheduler::start(SchedulerConfig::default()).unwrap();
        let transport = Arc::new(InMemoryTransport::new());
        let endpoint =
            EnforcementEndpoint::new(Arc::clone(&transport), scheduler.handle(), Duration::ZERO);

        endpoint.emit_ack(3, AckStatus::Nack).unwrap();
        let emitted = transport.emitted();
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].status, AckStatus::Nack);
        scheduler.shutdown();
    }

    #[test]
    fn test_scheduling_error_surfaces() {
        let scheduler = DelayedEventScheduler::start(SchedulerConfig::default()).unwrap();
        let endpoint = EnforcementEndpoint::new(
            Arc::new(InMemoryTransport::new()),
            scheduler.handle(),
            Duration::ZERO,
        );
        scheduler.shutdown();

        let err = endpoint
            .on_decision_received(DecisionNotification::new(5))
            .unwrap_err();
        assert!(matches!(err, EndpointError::Scheduler(_)));
    }
}
