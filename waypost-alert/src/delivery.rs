//! Delivery attempt domain types
//!
//! The delivery pipeline hands the alert subsystem one
//! [`DeliveryAttempt`] per attempt outcome. These types are also embedded
//! verbatim in outgoing alert payloads, so they carry serde definitions
//! matching the gateway's wire format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tenant-owned endpoint receiving events (HTTP URL, queue, topic, …)
///
/// The alert subsystem only reads identity and `disabled_at`; the remaining
/// fields ride along so alert payloads carry a full destination snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    /// Destination identifier
    pub id: String,

    /// Owning tenant
    pub tenant_id: String,

    /// Destination type ("webhook", "aws_sqs", "rabbitmq", …)
    #[serde(rename = "type")]
    pub kind: String,

    /// Topic subscriptions ("*" for all)
    #[serde(default)]
    pub topics: Vec<String>,

    /// Provider-specific configuration (endpoint URL, queue name, …)
    #[serde(default)]
    pub config: serde_json::Map<String, serde_json::Value>,

    /// When the destination was disabled; `null` while active
    pub disabled_at: Option<DateTime<Utc>>,
}

/// A published event routed to one or more destinations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event identifier
    pub id: String,

    /// Topic the event was published under
    pub topic: String,

    /// Publish time
    pub time: DateTime<Utc>,

    /// Event payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Terminal status of a delivery attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptStatus {
    /// The destination accepted the event
    Success,
    /// The destination rejected the event or was unreachable
    Failed,
}

/// Record of a single delivery try for one (event, destination) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// Attempt identifier
    pub id: String,

    /// Terminal status
    pub status: AttemptStatus,

    /// Provider response code ("500", "ECONNREFUSED", …)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Snapshot of the provider response body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_data: Option<serde_json::Value>,

    /// When the attempt completed
    pub time: DateTime<Utc>,
}

/// One attempt outcome, as reported by the delivery pipeline
///
/// Passed to [`AlertMonitor::handle_attempt`](crate::alert::AlertMonitor::handle_attempt)
/// once per attempt, success or failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryAttempt {
    /// Whether the attempt succeeded
    pub success: bool,

    /// Destination the event was delivered to
    pub destination: Destination,

    /// Event being delivered
    pub event: Event,

    /// Attempt record (status, code, response snapshot)
    pub attempt: AttemptRecord,

    /// Raw provider response metadata
    #[serde(default)]
    pub delivery_response: serde_json::Map<String, serde_json::Value>,
}
