//! Tokio adapter for transports that deliver notifications asynchronously.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::core::{AckDisposition, DecisionNotification, EnforcementEndpoint};
use crate::runtime::RunSummary;
use crate::transport::PolicyTransport;

/// Forward every notification from `rx` into `endpoint` on the given runtime.
///
/// The task ends when all senders are dropped and returns what it saw.
/// `on_decision_received` only takes the scheduler lock briefly, so it is
/// called inline on the async task.
pub fn spawn_notification_pump<T: PolicyTransport>(
    handle: &tokio::runtime::Handle,
    mut rx: mpsc::Receiver<DecisionNotification>,
    endpoint: EnforcementEndpoint<T>,
) -> JoinHandle<RunSummary> {
    handle.spawn(async move {
        let mut summary = RunSummary::default();
        while let Some(notification) = rx.recv().await {
            summary.received += 1;
            match endpoint.on_decision_received(notification) {
                Ok(AckDisposition::Scheduled { .. }) => summary.acks_scheduled += 1,
                Ok(AckDisposition::NotRequired) => {}
                Err(e) => {
                    summary.errors += 1;
                    error!(error = %e, "failed to handle decision notification");
                }
            }
        }
        debug!(received = summary.received, "notification pump finished");
        summary
    })
}
