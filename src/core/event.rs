//! Pending events and their time ordering.

use std::cmp::Ordering;
use std::fmt;
use std::time::Instant;

/// Fixed priority carried by every event. Never consulted beyond the tie-break.
pub const DEFAULT_PRIORITY: u8 = 1;

/// A deferred action: a callable with its arguments already bound.
///
/// Returning `Err` marks the execution as failed; the worker logs it and moves on.
pub type DeferredAction = Box<dyn FnOnce() -> anyhow::Result<()> + Send + 'static>;

/// A one-shot callback waiting in the scheduler queue.
///
/// Owned by the queue from submission until the worker pops it for execution.
pub struct PendingEvent {
    /// Earliest instant at which the action may run.
    pub fire_at: Instant,
    /// Always [`DEFAULT_PRIORITY`].
    pub priority: u8,
    /// Submission order, used to keep equal-time events FIFO.
    pub seq: u64,
    /// The bound action.
    pub action: DeferredAction,
}

impl PendingEvent {
    /// Create an event with the default priority.
    pub fn new(fire_at: Instant, seq: u64, action: DeferredAction) -> Self {
        Self {
            fire_at,
            priority: DEFAULT_PRIORITY,
            seq,
            action,
        }
    }

    /// Whether the event may run at `now`.
    #[must_use]
    pub fn is_due(&self, now: Instant) -> bool {
        self.fire_at <= now
    }

    fn sort_key(&self) -> (Instant, u8, u64) {
        (self.fire_at, self.priority, self.seq)
    }
}

impl fmt::Debug for PendingEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingEvent")
            .field("fire_at", &self.fire_at)
            .field("priority", &self.priority)
            .field("seq", &self.seq)
            .finish_non_exhaustive()
    }
}

impl PartialEq for PendingEvent {
    fn eq(&self, other: &Self) -> bool {
        self.sort_key() == other.sort_key()
    }
}

impl Eq for PendingEvent {}

impl PartialOrd for PendingEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PendingEvent {
    /// Earliest `fire_at` is the greatest element, so `BinaryHeap` pops it first.
    fn cmp(&self, other: &Self) -> Ordering {
        other.sort_key().cmp(&self.sort_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BinaryHeap;
    use std::time::Duration;

    fn noop() -> DeferredAction {
        Box::new(|| Ok(()))
    }

    #[test]
    fn test_earliest_fire_at_pops_first() {
        let base = Instant::now();
        let mut heap = BinaryHeap::new();
        heap.push(PendingEvent::new(base + Duration::from_millis(30), 0, noop()));
        heap.push(PendingEvent::new(base + Duration::from_millis(10), 1, noop()));
        heap.push(PendingEvent::new(base + Duration::from_millis(20), 2, noop()));

        let order: Vec<u64> = std::iter::from_fn(|| heap.pop().map(|e| e.seq)).collect();
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn test_fifo_for_equal_fire_at() {
        let at = Instant::now() + Duration::from_millis(5);
        let mut heap = BinaryHeap::new();
        for seq in [3, 0, 2, 1] {
            heap.push(PendingEvent::new(at, seq, noop()));
        }

        let order: Vec<u64> = std::iter::from_fn(|| heap.pop().map(|e| e.seq)).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_is_due() {
        let now = Instant::now();
        let event = PendingEvent::new(now + Duration::from_secs(1), 0, noop());
        assert!(!event.is_due(now));
        assert!(event.is_due(now + Duration::from_secs(1)));
        assert_eq!(event.priority, DEFAULT_PRIORITY);
    }
}
