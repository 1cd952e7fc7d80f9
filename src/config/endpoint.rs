//! Endpoint, scheduler, and bus configuration structures.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable overriding [`EndpointConfig::ack_delay_secs`].
pub const ENV_ACK_DELAY_SECS: &str = "POLICY_EP_ACK_DELAY_SECS";
/// Environment variable overriding [`EndpointConfig::register_attempts`].
pub const ENV_REGISTER_ATTEMPTS: &str = "POLICY_EP_REGISTER_ATTEMPTS";
/// Environment variable overriding [`EndpointConfig::register_backoff_ms`].
pub const ENV_REGISTER_BACKOFF_MS: &str = "POLICY_EP_REGISTER_BACKOFF_MS";
/// Environment variable overriding [`SchedulerConfig::drain_on_shutdown`].
pub const ENV_DRAIN_ON_SHUTDOWN: &str = "POLICY_EP_DRAIN_ON_SHUTDOWN";

const MIN_STACK_SIZE: usize = 16 * 1024;

/// Delayed-event scheduler worker configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Name given to the worker thread.
    pub thread_name: String,
    /// Worker thread stack size in bytes.
    pub stack_size: usize,
    /// Fire already-queued events before the worker exits on shutdown.
    pub drain_on_shutdown: bool,
    /// How long `shutdown` waits for the worker to exit.
    pub join_timeout_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            thread_name: "policy-ep-scheduler".into(),
            stack_size: 256 * 1024,
            drain_on_shutdown: true,
            join_timeout_ms: 2000,
        }
    }
}

impl SchedulerConfig {
    /// Create a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the worker thread name.
    #[must_use]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Set the worker stack size in bytes.
    #[must_use]
    pub const fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = bytes;
        self
    }

    /// Choose whether queued events fire or are discarded on shutdown.
    #[must_use]
    pub const fn with_drain_on_shutdown(mut self, drain: bool) -> Self {
        self.drain_on_shutdown = drain;
        self
    }

    /// Set the join timeout used by `shutdown`.
    #[must_use]
    pub fn with_join_timeout(mut self, timeout: Duration) -> Self {
        self.join_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Join timeout as a `Duration`.
    #[must_use]
    pub const fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms)
    }

    /// Validate worker configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.thread_name.trim().is_empty() {
            return Err("thread_name must not be empty".into());
        }
        if self.stack_size < MIN_STACK_SIZE {
            return Err(format!("stack_size must be at least {MIN_STACK_SIZE} bytes"));
        }
        if self.join_timeout_ms == 0 {
            return Err("join_timeout_ms must be greater than 0".into());
        }
        Ok(())
    }
}

/// Well-known names exposed by the policy authority on the bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Bus name owned by the policy authority.
    pub service_name: String,
    /// Interface carrying registration, decisions, and status.
    pub interface: String,
    /// Object path of the policy authority.
    pub object_path: String,
    /// Method invoked to register the endpoint.
    pub register_method: String,
    /// Method invoked to unregister the endpoint.
    pub unregister_method: String,
    /// Signal delivering decision notifications.
    pub decision_signal: String,
    /// Signal carrying `(transaction_id, status)` acknowledgments.
    pub status_signal: String,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            service_name: "org.freedesktop.ohm".into(),
            interface: "com.nokia.policy".into(),
            object_path: "/com/nokia/policy".into(),
            register_method: "register".into(),
            unregister_method: "unregister".into(),
            decision_signal: "actions".into(),
            status_signal: "status".into(),
        }
    }
}

impl BusConfig {
    /// Validate bus naming.
    pub fn validate(&self) -> Result<(), String> {
        let names = [
            ("service_name", &self.service_name),
            ("interface", &self.interface),
            ("register_method", &self.register_method),
            ("unregister_method", &self.unregister_method),
            ("decision_signal", &self.decision_signal),
            ("status_signal", &self.status_signal),
        ];
        for (field, value) in names {
            if value.trim().is_empty() {
                return Err(format!("{field} must not be empty"));
            }
        }
        if !self.object_path.starts_with('/') {
            return Err(format!("object_path `{}` must start with '/'", self.object_path));
        }
        Ok(())
    }
}

/// Root endpoint configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Delay before a decision is acknowledged, in seconds.
    pub ack_delay_secs: f64,
    /// Registration attempts before giving up.
    pub register_attempts: u32,
    /// Pause between registration attempts.
    pub register_backoff_ms: u64,
    /// Scheduler worker settings.
    pub scheduler: SchedulerConfig,
    /// Bus naming.
    pub bus: BusConfig,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            ack_delay_secs: 1.0,
            register_attempts: 1,
            register_backoff_ms: 500,
            scheduler: SchedulerConfig::default(),
            bus: BusConfig::default(),
        }
    }
}

impl EndpointConfig {
    /// Create a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the acknowledgment delay.
    #[must_use]
    pub fn with_ack_delay(mut self, delay: Duration) -> Self {
        self.ack_delay_secs = delay.as_secs_f64();
        self
    }

    /// Set registration retry policy.
    #[must_use]
    pub const fn with_register_retry(mut self, attempts: u32, backoff_ms: u64) -> Self {
        self.register_attempts = attempts;
        self.register_backoff_ms = backoff_ms;
        self
    }

    /// Replace the scheduler settings.
    #[must_use]
    pub fn with_scheduler(mut self, scheduler: SchedulerConfig) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Pause between registration attempts as a `Duration`.
    #[must_use]
    pub const fn register_backoff(&self) -> Duration {
        Duration::from_millis(self.register_backoff_ms)
    }

    /// Validate all sections.
    pub fn validate(&self) -> Result<(), String> {
        if !self.ack_delay_secs.is_finite() || self.ack_delay_secs < 0.0 {
            return Err(format!(
                "ack_delay_secs must be a finite non-negative number, got {}",
                self.ack_delay_secs
            ));
        }
        if self.register_attempts == 0 {
            return Err("register_attempts must be greater than 0".into());
        }
        self.scheduler
            .validate()
            .map_err(|e| format!("scheduler invalid: {e}"))?;
        self.bus.validate().map_err(|e| format!("bus invalid: {e}"))?;
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from defaults overridden by the process environment.
    ///
    /// A `.env` file in the working directory is loaded first, if present.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from defaults overridden through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(raw) = lookup(ENV_ACK_DELAY_SECS) {
            cfg.ack_delay_secs = parse_var(ENV_ACK_DELAY_SECS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_REGISTER_ATTEMPTS) {
            cfg.register_attempts = parse_var(ENV_REGISTER_ATTEMPTS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_REGISTER_BACKOFF_MS) {
            cfg.register_backoff_ms = parse_var(ENV_REGISTER_BACKOFF_MS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_DRAIN_ON_SHUTDOWN) {
            cfg.scheduler.drain_on_shutdown = parse_var(ENV_DRAIN_ON_SHUTDOWN, &raw)?;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn parse_var<T>(key: &str, raw: &str) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| format!("{key}=`{raw}` invalid: {e}"))
}
