//! Delayed-event scheduler with a single dedicated worker thread.
//!
//! Producers call [`SchedulerHandle::schedule`] from any thread; one worker
//! pops events in `(fire_at, seq)` order and runs them synchronously.
//!
//! # Wakeup protocol
//!
//! - The queue and the lifecycle flag live behind one `parking_lot::Mutex`.
//! - Producers insert and `notify_one` while holding that lock.
//! - The worker inspects the queue head under the lock and only ever waits
//!   through `Condvar::wait`/`wait_until`, which release the lock atomically.
//!
//! A producer can therefore never slip an event in between the worker's
//! "queue is empty" check and its wait. Every wake, timed out or signalled,
//! sends the worker back to the top of the loop where the head is read again,
//! so an earlier event inserted during a timed sleep shortens that sleep.

use std::collections::BinaryHeap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

use crate::config::SchedulerConfig;
use crate::core::event::{DeferredAction, PendingEvent};
use crate::core::SchedulerError;

/// Convert a delay in seconds, rejecting negative and non-finite values.
pub fn delay_from_secs(secs: f64) -> Result<Duration, SchedulerError> {
    if !secs.is_finite() {
        return Err(SchedulerError::InvalidArgument(format!(
            "delay must be finite, got {secs}"
        )));
    }
    if secs < 0.0 {
        return Err(SchedulerError::InvalidArgument(format!(
            "delay must be non-negative, got {secs}"
        )));
    }
    Duration::try_from_secs_f64(secs)
        .map_err(|e| SchedulerError::InvalidArgument(format!("delay {secs}s: {e}")))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Running,
    /// Closed to producers; worker exits once the queue is empty.
    Draining,
    /// Closed to producers; worker exits at its next check.
    Stopping,
}

struct SchedulerState {
    queue: BinaryHeap<PendingEvent>,
    next_seq: u64,
    lifecycle: Lifecycle,
}

#[derive(Debug, Default)]
struct SchedulerCounters {
    scheduled: AtomicU64,
    executed: AtomicU64,
    failed: AtomicU64,
}

struct Shared {
    state: Mutex<SchedulerState>,
    wake: Condvar,
    counters: SchedulerCounters,
}

/// Snapshot of scheduler activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Events accepted by `schedule`.
    pub scheduled: u64,
    /// Actions run by the worker, failed ones included.
    pub executed: u64,
    /// Actions that returned an error or panicked.
    pub failed: u64,
    /// Events still queued.
    pub pending: usize,
}

/// Cloneable producer side of the scheduler.
#[derive(Clone)]
pub struct SchedulerHandle {
    shared: Arc<Shared>,
}

impl SchedulerHandle {
    /// Run `action` once, no earlier than `delay` from now.
    ///
    /// # Errors
    ///
    /// - `SchedulerError::InvalidArgument` if `now + delay` is not representable
    /// - `SchedulerError::ShutDown` once shutdown has been requested
    pub fn schedule<F>(&self, delay: Duration, action: F) -> Result<(), SchedulerError>
    where
        F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    {
        self.submit(delay, Box::new(action))
    }

    /// Run `action(args)` once, no earlier than `delay` from now.
    ///
    /// # Errors
    ///
    /// Same as [`schedule`](Self::schedule).
    pub fn schedule_with<A, F>(&self, delay: Duration, action: F, args: A) -> Result<(), SchedulerError>
    where
        A: Send + 'static,
        F: FnOnce(A) -> anyhow::Result<()> + Send + 'static,
    {
        self.schedule(delay, move || action(args))
    }

    /// Run `action` once, no earlier than `delay_secs` seconds from now.
    ///
    /// # Errors
    ///
    /// `SchedulerError::InvalidArgument` for negative or non-finite delays; the
    /// queue is not touched in that case.
    pub fn schedule_secs<F>(&self, delay_secs: f64, action: F) -> Result<(), SchedulerError>
    where
        F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    {
        let delay = delay_from_secs(delay_secs)?;
        self.schedule(delay, action)
    }

    fn submit(&self, delay: Duration, action: DeferredAction) -> Result<(), SchedulerError> {
        let fire_at = Instant::now().checked_add(delay).ok_or_else(|| {
            SchedulerError::InvalidArgument(format!("delay {delay:?} overflows the clock"))
        })?;

        let mut state = self.shared.state.lock();
        if state.lifecycle != Lifecycle::Running {
            return Err(SchedulerError::ShutDown);
        }
        let seq = state.next_seq;
        state.next_seq += 1;
        state.queue.push(PendingEvent::new(fire_at, seq, action));
        self.shared.counters.scheduled.fetch_add(1, Ordering::Relaxed);
        self.shared.wake.notify_one();
        drop(state);

        debug!(
            seq,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "event scheduled"
        );
        Ok(())
    }

    /// Number of events waiting in the queue.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.shared.state.lock().queue.len()
    }

    /// Whether new events are still accepted.
    #[must_use]
    pub fn is_accepting(&self) -> bool {
        self.shared.state.lock().lifecycle == Lifecycle::Running
    }

    /// Current statistics.
    #[must_use]
    pub fn stats(&self) -> SchedulerStats {
        let pending = self.pending();
        let counters = &self.shared.counters;
        SchedulerStats {
            scheduled: counters.scheduled.load(Ordering::Relaxed),
            executed: counters.executed.load(Ordering::Relaxed),
            failed: counters.failed.load(Ordering::Relaxed),
            pending,
        }
    }
}

/// Owner of the scheduler worker thread.
///
/// Created once per process (or per runtime context); producers use
/// [`handle`](Self::handle). Call [`shutdown`](Self::shutdown) for an orderly
/// stop; dropping only signals the worker and detaches it.
pub struct DelayedEventScheduler {
    config: SchedulerConfig,
    handle: SchedulerHandle,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl DelayedEventScheduler {
    /// Spawn the worker thread and return the scheduler.
    ///
    /// # Errors
    ///
    /// `SchedulerError::WorkerSpawn` if the OS refuses the thread.
    pub fn start(config: SchedulerConfig) -> Result<Self, SchedulerError> {
        let shared = Arc::new(Shared {
            state: Mutex::new(SchedulerState {
                queue: BinaryHeap::new(),
                next_seq: 0,
                lifecycle: Lifecycle::Running,
            }),
            wake: Condvar::new(),
            counters: SchedulerCounters::default(),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name(config.thread_name.clone())
            .stack_size(config.stack_size)
            .spawn(move || run_worker(&worker_shared))
            .map_err(SchedulerError::WorkerSpawn)?;

        info!(
            thread = %config.thread_name,
            drain_on_shutdown = config.drain_on_shutdown,
            "delayed event scheduler started"
        );

        Ok(Self {
            config,
            handle: SchedulerHandle { shared },
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Producer handle sharing this scheduler's queue.
    #[must_use]
    pub fn handle(&self) -> SchedulerHandle {
        self.handle.clone()
    }

    /// See [`SchedulerHandle::schedule`].
    ///
    /// # Errors
    ///
    /// See [`SchedulerHandle::schedule`].
    pub fn schedule<F>(&self, delay: Duration, action: F) -> Result<(), SchedulerError>
    where
        F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    {
        self.handle.schedule(delay, action)
    }

    /// Current statistics.
    #[must_use]
    pub fn stats(&self) -> SchedulerStats {
        self.handle.stats()
    }

    /// Stop accepting events and wait for the worker to exit.
    ///
    /// With `drain_on_shutdown` the worker first fires everything already
    /// queued, each at its own `fire_at`, for up to `join_timeout_ms`. Events
    /// still queued at the timeout are discarded, as is the whole queue when
    /// draining is off. No event fires once this returns; only an action
    /// already running at the timeout may still complete on the detached worker.
    ///
    /// Returns the number of discarded events. Calling it again returns 0.
    pub fn shutdown(&self) -> usize {
        let Some(discarded) = self.begin_shutdown() else {
            return 0;
        };
        let mut discarded_count = discarded.len();
        drop(discarded);

        if let Some(worker) = self.worker.lock().take() {
            let (tx, rx) = crossbeam_channel::bounded(1);
            let _joiner = thread::spawn(move || {
                let _ = tx.send(worker.join().is_ok());
            });
            let joined = match rx.recv_timeout(self.config.join_timeout()) {
                Ok(ok) => Some(ok),
                Err(_) => {
                    let leftover = self.force_stop();
                    warn!(
                        timeout_ms = self.config.join_timeout_ms,
                        leftover, "drain did not finish within timeout"
                    );
                    discarded_count += leftover;
                    rx.recv_timeout(self.config.join_timeout()).ok()
                }
            };
            match joined {
                Some(true) => debug!("scheduler worker joined"),
                Some(false) => warn!("scheduler worker panicked"),
                None => warn!("scheduler worker still busy in an action - detaching"),
            }
        }

        if discarded_count > 0 {
            warn!(discarded = discarded_count, "pending events discarded on shutdown");
        }
        info!("delayed event scheduler shut down");
        discarded_count
    }

    /// Switch to `Stopping` and take whatever is still queued.
    fn force_stop(&self) -> usize {
        let shared = &self.handle.shared;
        let mut state = shared.state.lock();
        state.lifecycle = Lifecycle::Stopping;
        let leftover = std::mem::take(&mut state.queue);
        shared.wake.notify_all();
        drop(state);
        leftover.len()
    }

    /// Move to the closing state. `None` if shutdown already began.
    fn begin_shutdown(&self) -> Option<BinaryHeap<PendingEvent>> {
        let shared = &self.handle.shared;
        let mut state = shared.state.lock();
        if state.lifecycle != Lifecycle::Running {
            return None;
        }
        let discarded = if self.config.drain_on_shutdown {
            state.lifecycle = Lifecycle::Draining;
            BinaryHeap::new()
        } else {
            state.lifecycle = Lifecycle::Stopping;
            std::mem::take(&mut state.queue)
        };
        shared.wake.notify_all();
        Some(discarded)
    }
}

impl Drop for DelayedEventScheduler {
    fn drop(&mut self) {
        if self.begin_shutdown().is_some() {
            debug!("DelayedEventScheduler dropped without explicit shutdown - worker detached");
        }
    }
}

/// Worker loop. Runs exactly once per scheduler, on its dedicated thread.
fn run_worker(shared: &Shared) {
    debug!("scheduler worker started");
    let mut state = shared.state.lock();
    loop {
        if state.lifecycle == Lifecycle::Stopping {
            break;
        }
        let next_fire = state.queue.peek().map(|head| head.fire_at);
        match next_fire {
            None => {
                if state.lifecycle == Lifecycle::Draining {
                    break;
                }
                shared.wake.wait(&mut state);
            }
            Some(fire_at) if fire_at <= Instant::now() => {
                if let Some(event) = state.queue.pop() {
                    MutexGuard::unlocked(&mut state, || execute(shared, event));
                }
            }
            Some(fire_at) => {
                let _ = shared.wake.wait_until(&mut state, fire_at);
            }
        }
    }
    drop(state);
    debug!("scheduler worker exiting");
}

fn execute(shared: &Shared, event: PendingEvent) {
    let PendingEvent {
        fire_at, seq, action, ..
    } = event;
    debug!(
        seq,
        late_us = u64::try_from(fire_at.elapsed().as_micros()).unwrap_or(u64::MAX),
        "executing deferred action"
    );

    let outcome = catch_unwind(AssertUnwindSafe(action));
    shared.counters.executed.fetch_add(1, Ordering::Relaxed);
    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            shared.counters.failed.fetch_add(1, Ordering::Relaxed);
            error!(seq, error = %e, "deferred action failed");
        }
        Err(panic) => {
            shared.counters.failed.fetch_add(1, Ordering::Relaxed);
            error!(seq, panic = panic_message(panic.as_ref()), "deferred action panicked");
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&'static str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
