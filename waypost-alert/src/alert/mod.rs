//! Delivery-failure alerting and auto-disable
//!
//! Tracks consecutive delivery failures per destination in a shared store,
//! emits webhook alerts at configured percentage thresholds, and disables
//! the destination when failures reach 100% of the configured maximum.
//!
//! # Architecture
//!
//! - **Store**: [`AlertStore`] holds the failure counter and last-alert
//!   metadata ([`RedisAlertStore`] in production, [`InMemoryAlertStore`]
//!   for tests and single-worker setups)
//! - **Evaluator**: [`evaluator::decide`] is a pure function from state to
//!   an alert decision
//! - **Notifier**: [`AlertNotifier`] delivers envelopes ([`HttpNotifier`]
//!   POSTs them to the configured callback)
//! - **Disabler**: [`DestinationDisabler`] persists the disabled state
//! - **Monitor**: [`AlertMonitor`] orchestrates all of the above per attempt
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use waypost_alert::alert::{
//!     AlertConfig, AlertMonitor, HttpNotifier, LocalDisabler, RedisAlertStore,
//! };
//!
//! let store = RedisAlertStore::connect(&redis_config)
//!     .await?
//!     .with_deployment_id("dp_eu_1");
//! let notifier = HttpNotifier::from_config(&config.alert)?;
//! let monitor = AlertMonitor::new(
//!     config.alert.clone(),
//!     Arc::new(store),
//!     Arc::new(notifier),
//!     Arc::new(LocalDisabler),
//! )?;
//!
//! // In the delivery worker, once per attempt outcome:
//! monitor.handle_attempt(&attempt).await?;
//! ```

pub mod config;
pub mod disabler;
pub mod envelope;
pub mod evaluator;
pub mod monitor;
pub mod notifier;
pub mod store;

pub use config::{AlertConfig, DebouncePolicy};
pub use disabler::{DestinationDisabler, LocalDisabler};
pub use envelope::{
    AlertEnvelope, ConsecutiveFailureData, ConsecutiveFailures, DestinationDisabledData,
    DisableReason,
};
pub use evaluator::{decide, Decision};
pub use monitor::AlertMonitor;
pub use notifier::{AlertNotifier, HttpNotifier};
pub use store::{AlertState, AlertStore, InMemoryAlertStore, RedisAlertStore};
