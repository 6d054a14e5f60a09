//! Alert envelope wire types
//!
//! Envelopes are what the notifier puts on the wire: a `topic` discriminator,
//! an emission `timestamp`, and a topic-specific `data` body. Consumers of
//! the callback deduplicate on `(destination_id, consecutive_failures.current,
//! threshold)` and order on `timestamp`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::delivery::{AttemptRecord, Destination, Event};

/// Why a destination was disabled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisableReason {
    /// The consecutive-failure count reached the configured maximum
    ConsecutiveFailure,
}

/// Consecutive-failure progress embedded in threshold alerts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsecutiveFailures {
    /// Current consecutive failure count
    pub current: u64,
    /// Failure count representing 100%
    pub max: u64,
    /// Threshold percentage this alert reports
    pub threshold: u32,
}

/// Body of a consecutive-failure threshold alert
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsecutiveFailureData {
    /// Owning tenant
    pub tenant_id: String,
    /// Event whose delivery failed
    pub event: Event,
    /// The failing attempt
    pub attempt: AttemptRecord,
    /// Destination snapshot; `disabled_at` is set when threshold is 100
    pub destination: Destination,
    /// Threshold progress
    pub consecutive_failures: ConsecutiveFailures,
}

/// Body of a destination-disabled alert
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationDisabledData {
    /// Owning tenant
    pub tenant_id: String,
    /// Post-disable destination snapshot
    pub destination: Destination,
    /// When the destination was disabled
    pub disabled_at: DateTime<Utc>,
    /// Why the destination was disabled
    pub reason: DisableReason,
    /// The attempt that tripped the disable
    pub attempt: AttemptRecord,
    /// The event that tripped the disable
    pub event: Event,
}

/// An alert as POSTed to the configured callback URL
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "topic")]
pub enum AlertEnvelope {
    /// A consecutive-failure threshold was crossed
    #[serde(rename = "alert.destination.consecutive_failure")]
    ConsecutiveFailure {
        /// Emission time
        timestamp: DateTime<Utc>,
        /// Alert body
        data: ConsecutiveFailureData,
    },

    /// A destination was auto-disabled
    #[serde(rename = "alert.destination.disabled")]
    DestinationDisabled {
        /// Emission time
        timestamp: DateTime<Utc>,
        /// Alert body
        data: DestinationDisabledData,
    },
}

impl AlertEnvelope {
    /// The wire-format topic discriminator
    pub fn topic(&self) -> &'static str {
        match self {
            Self::ConsecutiveFailure { .. } => "alert.destination.consecutive_failure",
            Self::DestinationDisabled { .. } => "alert.destination.disabled",
        }
    }
}
