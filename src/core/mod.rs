//! Delayed-event scheduling core and the enforcement endpoint built on it.

pub mod decision;
pub mod endpoint;
pub mod error;
pub mod event;
pub mod scheduler;

pub use decision::{AckStatus, DecisionError, DecisionNotification, Fact, TagValue, NO_ACK_TRANSACTION};
pub use endpoint::{AckDisposition, EnforcementEndpoint};
pub use error::{AppResult, EndpointError, SchedulerError, TransportError};
pub use event::{DeferredAction, PendingEvent, DEFAULT_PRIORITY};
pub use scheduler::{delay_from_secs, DelayedEventScheduler, SchedulerHandle, SchedulerStats};
