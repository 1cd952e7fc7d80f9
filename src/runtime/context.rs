//! Owned runtime context: registration, dispatch loop, and teardown.

use std::sync::Arc;
use std::thread;

use crossbeam_channel::{bounded, select, Receiver, Sender};
use tracing::{debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::config::EndpointConfig;
use crate::core::{
    delay_from_secs, AckDisposition, DecisionNotification, DelayedEventScheduler, EndpointError,
    EnforcementEndpoint, SchedulerStats,
};
use crate::transport::PolicyTransport;

/// Stops a running [`EndpointRuntime::run`] loop from another thread.
#[derive(Clone)]
pub struct ShutdownTrigger {
    tx: Sender<()>,
}

impl ShutdownTrigger {
    /// Ask the dispatch loop to return. Repeated calls are harmless.
    pub fn fire(&self) {
        let _ = self.tx.try_send(());
    }
}

/// Counters from one `run` invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Notifications taken off the channel.
    pub received: u64,
    /// Acknowledgments handed to the scheduler.
    pub acks_scheduled: u64,
    /// Notifications that could not be handled.
    pub errors: u64,
}

/// Outcome of [`EndpointRuntime::shutdown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Events dropped because draining was disabled.
    pub discarded_events: usize,
    /// Scheduler statistics after the worker stopped.
    pub stats: SchedulerStats,
}

/// Everything an endpoint process owns, with an explicit start/run/shutdown lifecycle.
pub struct EndpointRuntime<T: PolicyTransport> {
    id: Uuid,
    transport: Arc<T>,
    scheduler: DelayedEventScheduler,
    endpoint: EnforcementEndpoint<T>,
    shutdown_tx: Sender<()>,
    shutdown_rx: Receiver<()>,
}

impl<T: PolicyTransport> EndpointRuntime<T> {
    /// Start the scheduler and register with the policy authority.
    ///
    /// Registration is retried `register_attempts` times, sleeping
    /// `register_backoff_ms` in between.
    ///
    /// # Errors
    ///
    /// - `EndpointError::Config` for an invalid acknowledgment delay
    /// - `EndpointError::Scheduler` if the worker cannot be spawned
    /// - `EndpointError::Transport` with the last registration failure
    pub fn start(config: &EndpointConfig, transport: Arc<T>) -> Result<Self, EndpointError> {
        let ack_delay = delay_from_secs(config.ack_delay_secs)
            .map_err(|e| EndpointError::Config(e.to_string()))?;
        let id = Uuid::new_v4();
        let span = info_span!("endpoint_runtime", runtime_id = %id);
        let _enter = span.enter();

        let scheduler = DelayedEventScheduler::start(config.scheduler.clone())?;

        if let Err(e) = register_with_retry(transport.as_ref(), config) {
            error!(error = %e, "registration with policy authority failed");
            scheduler.shutdown();
            return Err(e.into());
        }
        info!(
            service = %config.bus.service_name,
            path = %config.bus.object_path,
            interface = %config.bus.interface,
            ack_delay_ms = u64::try_from(ack_delay.as_millis()).unwrap_or(u64::MAX),
            "registered with policy authority"
        );

        let endpoint = EnforcementEndpoint::new(Arc::clone(&transport), scheduler.handle(), ack_delay);
        let (shutdown_tx, shutdown_rx) = bounded(1);
        Ok(Self {
            id,
            transport,
            scheduler,
            endpoint,
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// Instance identifier, also recorded on the tracing span.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// The endpoint, for transports that call it directly.
    #[must_use]
    pub const fn endpoint(&self) -> &EnforcementEndpoint<T> {
        &self.endpoint
    }

    /// Handle that makes `run` return.
    #[must_use]
    pub fn shutdown_trigger(&self) -> ShutdownTrigger {
        ShutdownTrigger {
            tx: self.shutdown_tx.clone(),
        }
    }

    /// Dispatch notifications until the channel disconnects or the trigger fires.
    pub fn run(&self, notifications: &Receiver<DecisionNotification>) -> RunSummary {
        let span = info_span!("endpoint_runtime", runtime_id = %self.id);
        let _enter = span.enter();
        // A trigger fired after the previous run returned must not end this one.
        while self.shutdown_rx.try_recv().is_ok() {}
        info!("dispatch loop started");

        let mut summary = RunSummary::default();
        loop {
            let next = select! {
                recv(notifications) -> msg => msg.map_err(|_| "notification channel closed"),
                recv(self.shutdown_rx) -> _ => Err("shutdown requested"),
            };
            let notification = match next {
                Ok(notification) => notification,
                Err(reason) => {
                    debug!(reason, "dispatch loop exiting");
                    break;
                }
            };

            summary.received += 1;
            match self.endpoint.on_decision_received(notification) {
                Ok(AckDisposition::Scheduled { .. }) => summary.acks_scheduled += 1,
                Ok(AckDisposition::NotRequired) => {}
                Err(e) => {
                    summary.errors += 1;
                    error!(error = %e, "failed to handle decision notification");
                }
            }
        }

        info!(
            received = summary.received,
            acks_scheduled = summary.acks_scheduled,
            errors = summary.errors,
            "dispatch loop stopped"
        );
        summary
    }

    /// Stop the scheduler, then unregister.
    ///
    /// Acknowledgments still queued when the scheduler's join timeout expires
    /// are discarded and counted in the report, so nothing is emitted after
    /// unregistering. Unregistration failures are logged; teardown continues
    /// regardless.
    pub fn shutdown(self) -> ShutdownReport {
        let span = info_span!("endpoint_runtime", runtime_id = %self.id);
        let _enter = span.enter();

        let discarded_events = self.scheduler.shutdown();
        if let Err(e) = self.transport.unregister() {
            warn!(error = %e, "unregistering from policy authority failed");
        }
        let stats = self.scheduler.stats();
        info!(
            executed = stats.executed,
            failed = stats.failed,
            discarded = discarded_events,
            "endpoint runtime shut down"
        );
        ShutdownReport {
            discarded_events,
            stats,
        }
    }
}

fn register_with_retry<T: PolicyTransport>(
    transport: &T,
    config: &EndpointConfig,
) -> Result<(), crate::core::TransportError> {
    let attempts = config.register_attempts.max(1);
    let mut attempt = 1;
    loop {
        match transport.register() {
            Ok(()) => return Ok(()),
            Err(e) if attempt < attempts => {
                warn!(attempt, attempts, error = %e, "registration failed, retrying");
                thread::sleep(config.register_backoff());
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

