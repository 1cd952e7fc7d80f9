//! Decision notifications delivered by the policy authority.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Transaction id meaning "no acknowledgment expected".
pub const NO_ACK_TRANSACTION: u32 = 0;

/// One `(tag, value)` pair of a fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagValue {
    /// Tag name, e.g. `"device"`.
    pub tag: String,
    /// Tag value, e.g. `"headset"`.
    pub value: String,
}

impl TagValue {
    /// Build a pair.
    pub fn new(tag: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            value: value.into(),
        }
    }
}

/// A fact: an ordered sequence of tag/value pairs.
pub type Fact = Vec<TagValue>;

/// Status carried by an acknowledgment signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AckStatus {
    /// Decision could not be enforced.
    Nack = 0,
    /// Decision enforced.
    Ack = 1,
}

impl AckStatus {
    /// Wire value of the status.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self as u32
    }
}

/// Reasons a notification is considered malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecisionError {
    /// A command entry has an empty name.
    #[error("empty command name")]
    EmptyCommand,
    /// A fact carries a pair with an empty tag.
    #[error("empty tag in fact {fact} of command `{command}`")]
    EmptyTag {
        /// Command owning the fact.
        command: String,
        /// Index of the fact within the command.
        fact: usize,
    },
}

/// A decision notification as received from the bus.
///
/// Transient: built per inbound signal and dropped after dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionNotification {
    /// Correlation id for the acknowledgment; 0 means none is expected.
    pub transaction_id: u32,
    /// Command name to its facts.
    #[serde(default)]
    pub decisions: BTreeMap<String, Vec<Fact>>,
}

impl DecisionNotification {
    /// Create an empty notification for `transaction_id`.
    #[must_use]
    pub fn new(transaction_id: u32) -> Self {
        Self {
            transaction_id,
            decisions: BTreeMap::new(),
        }
    }

    /// Append a fact to `command`.
    #[must_use]
    pub fn with_fact<I, K, V>(mut self, command: impl Into<String>, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let fact = pairs
            .into_iter()
            .map(|(tag, value)| TagValue::new(tag, value))
            .collect();
        self.decisions.entry(command.into()).or_default().push(fact);
        self
    }

    /// Parse a notification from JSON.
    pub fn from_json_str(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }

    /// Whether the authority expects an acknowledgment.
    #[must_use]
    pub const fn requires_ack(&self) -> bool {
        self.transaction_id != NO_ACK_TRANSACTION
    }

    /// Total number of facts across all commands.
    #[must_use]
    pub fn fact_count(&self) -> usize {
        self.decisions.values().map(Vec::len).sum()
    }

    /// Check the structure is usable.
    pub fn validate(&self) -> Result<(), DecisionError> {
        for (command, facts) in &self.decisions {
            if command.is_empty() {
                return Err(DecisionError::EmptyCommand);
            }
            for (idx, fact) in facts.iter().enumerate() {
                if fact.iter().any(|pair| pair.tag.is_empty()) {
                    return Err(DecisionError::EmptyTag {
                        command: command.clone(),
                        fact: idx,
                    });
                }
            }
        }
        Ok(())
    }

    /// Emit the command/fact/tag structure at debug level.
    pub fn trace_structure(&self) {
        let txid = self.transaction_id;
        for (command, facts) in &self.decisions {
            debug!(transaction_id = txid, command = %command, facts = facts.len(), "decision command");
            for (idx, fact) in facts.iter().enumerate() {
                for pair in fact {
                    debug!(
                        transaction_id = txid,
                        command = %command,
                        fact = idx,
                        tag = %pair.tag,
                        value = %pair.value,
                        "decision fact"
                    );
                }
            }
        }
    }
}
