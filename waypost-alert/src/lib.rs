//! # waypost-alert
//!
//! Delivery-failure alerting and auto-disable for the Waypost event gateway.
//!
//! Waypost fans published events out to per-tenant destinations (HTTP
//! webhooks, queues, topics). This crate is the piece the delivery workers
//! call once per attempt outcome: it counts consecutive failures per
//! destination in shared state, fires webhook alerts at configured
//! percentage thresholds, and disables a destination once failures reach
//! the configured maximum.
//!
//! ## Features
//!
//! - **Distributed counting**: atomic Redis increments keep concurrent
//!   workers consistent; an in-memory store covers tests and single-worker
//!   setups
//! - **Threshold alerts**: configurable percentage thresholds with
//!   debouncing; 100% is terminal and never suppressed
//! - **Auto-disable**: destinations failing at 100% are disabled through a
//!   pluggable collaborator and a terminal alert is emitted
//! - **Deployment isolation**: persisted state is namespaced by deployment
//!   id so deployments can share one Redis
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use waypost_alert::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config)?;
//!
//!     let store: Arc<dyn AlertStore> = match &config.redis {
//!         Some(redis) => {
//!             let store = RedisAlertStore::connect(redis).await?;
//!             Arc::new(match &config.service.deployment_id {
//!                 Some(id) => store.with_deployment_id(id),
//!                 None => store,
//!             })
//!         }
//!         None => Arc::new(InMemoryAlertStore::new()),
//!     };
//!
//!     let monitor = AlertMonitor::new(
//!         config.alert.clone(),
//!         store,
//!         Arc::new(HttpNotifier::from_config(&config.alert)?),
//!         Arc::new(LocalDisabler),
//!     )?;
//!
//!     // hand `monitor` to the delivery workers
//!     # let _ = monitor;
//!     Ok(())
//! }
//! ```

pub mod alert;
pub mod config;
pub mod delivery;
pub mod error;
pub mod observability;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::alert::{
        AlertConfig, AlertEnvelope, AlertMonitor, AlertNotifier, AlertState, AlertStore,
        ConsecutiveFailures, DebouncePolicy, DestinationDisabler, DisableReason, HttpNotifier,
        InMemoryAlertStore, LocalDisabler, RedisAlertStore,
    };
    pub use crate::config::{Config, RedisConfig, ServiceConfig};
    pub use crate::delivery::{
        AttemptRecord, AttemptStatus, DeliveryAttempt, Destination, Event,
    };
    pub use crate::error::{Error, Result};
    pub use crate::observability::init_tracing;

    // Re-export tracing macros and types
    pub use tracing::{debug, error, info, instrument, trace, warn};

    // Re-export async runtime and trait helpers
    pub use async_trait::async_trait;
    pub use tokio;

    // Re-export time utilities
    pub use chrono::{DateTime, Utc};

    // Re-export futures utilities
    pub use futures::{future, stream, Future, Stream, StreamExt};
}
