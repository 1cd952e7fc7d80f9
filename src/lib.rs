//! # Policy Enforcement Point
//!
//! A minimal policy enforcement endpoint: it registers with a central policy
//! authority over a message bus, receives decision notifications, and
//! acknowledges each one after a delay without blocking further reception.
//!
//! ## Delayed-event scheduler
//!
//! The core is [`core::DelayedEventScheduler`]: one dedicated worker thread
//! runs one-shot deferred actions at or after their requested time.
//!
//! - Events fire in `fire_at` order, FIFO among equal times
//! - Producers may schedule from any thread, including from inside an action
//! - The worker sleeps when idle and wakes immediately on a new event
//! - A failing or panicking action is logged and never stops the worker
//!
//! ```rust
//! use policy_enforcement_point::config::SchedulerConfig;
//! use policy_enforcement_point::core::DelayedEventScheduler;
//! use std::time::Duration;
//!
//! let scheduler = DelayedEventScheduler::start(SchedulerConfig::default()).unwrap();
//! let (tx, rx) = crossbeam_channel::bounded(1);
//! scheduler
//!     .handle()
//!     .schedule(Duration::from_millis(10), move || {
//!         tx.send("fired")?;
//!         Ok(())
//!     })
//!     .unwrap();
//! assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), "fired");
//! scheduler.shutdown();
//! ```
//!
//! ## Enforcement endpoint
//!
//! [`core::EnforcementEndpoint`] turns each [`core::DecisionNotification`]
//! into a scheduled `(transaction_id, status)` acknowledgment emitted through
//! a [`transport::PolicyTransport`]. Transaction id 0 is never acknowledged.
//!
//! ```rust,ignore
//! use policy_enforcement_point::builders::build_runtime;
//! use policy_enforcement_point::config::EndpointConfig;
//!
//! let runtime = build_runtime(&EndpointConfig::from_env()?, transport)?;
//! let summary = runtime.run(&notifications);
//! let report = runtime.shutdown();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Delayed-event scheduler, decision model, and the enforcement endpoint.
pub mod core;
/// Configuration models for the endpoint, scheduler, and bus names.
pub mod config;
/// Builders to construct a runtime from configuration.
pub mod builders;
/// Bus transport seam and in-memory implementation.
pub mod transport;
/// Owned runtime context (start, run, shutdown) and async adapters.
pub mod runtime;
/// Shared utilities.
pub mod util;
