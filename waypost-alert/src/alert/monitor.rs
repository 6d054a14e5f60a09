//! Attempt monitoring and alert orchestration
//!
//! One [`AlertMonitor`] is shared by all delivery workers in a process. It
//! holds no mutable state of its own (the failure counters live in the
//! [`AlertStore`]), so it is reentrant and safe to call concurrently for
//! the same or different destinations.

use std::sync::Arc;

use chrono::Utc;

use super::config::AlertConfig;
use super::disabler::DestinationDisabler;
use super::envelope::{
    AlertEnvelope, ConsecutiveFailureData, ConsecutiveFailures, DestinationDisabledData,
    DisableReason,
};
use super::evaluator;
use super::notifier::AlertNotifier;
use super::store::AlertStore;
use crate::delivery::DeliveryAttempt;
use crate::error::{Error, Result};

/// Orchestrates per-attempt failure tracking, alerting, and auto-disable
///
/// Construct once and share. Dependencies are the narrow capabilities the
/// monitor needs (state store, notifier, disabler) plus the immutable
/// [`AlertConfig`]; threshold evaluation itself is a pure function.
#[derive(Clone)]
pub struct AlertMonitor {
    config: AlertConfig,
    store: Arc<dyn AlertStore>,
    notifier: Arc<dyn AlertNotifier>,
    disabler: Arc<dyn DestinationDisabler>,
}

impl AlertMonitor {
    /// Create a monitor, validating the configuration
    pub fn new(
        config: AlertConfig,
        store: Arc<dyn AlertStore>,
        notifier: Arc<dyn AlertNotifier>,
        disabler: Arc<dyn DestinationDisabler>,
    ) -> Result<Self> {
        config.validate().map_err(Error::InvalidConfig)?;
        Ok(Self {
            config,
            store,
            notifier,
            disabler,
        })
    }

    /// Process one delivery attempt outcome
    ///
    /// Success resets the destination's failure streak. Failure increments
    /// the counter and, when a threshold is crossed, emits a
    /// consecutive-failure alert; at 100% the destination is disabled and a
    /// terminal destination-disabled alert follows.
    ///
    /// Any store, notifier, or disabler error aborts handling and is
    /// returned. The store may then be mid-streak (counter incremented,
    /// last-alert not yet recorded); the next attempt observes that state
    /// and may re-emit the same threshold, so callback consumers must
    /// deduplicate on `(destination_id, consecutive_failures.current,
    /// threshold)`.
    pub async fn handle_attempt(&self, attempt: &DeliveryAttempt) -> Result<()> {
        let tenant_id = &attempt.destination.tenant_id;
        let destination_id = &attempt.destination.id;

        if attempt.success {
            self.store
                .reset_alert_state(tenant_id, destination_id)
                .await?;
            tracing::debug!(
                tenant_id = %tenant_id,
                destination_id = %destination_id,
                "Delivery succeeded; failure streak cleared"
            );
            return Ok(());
        }

        let state = self
            .store
            .increment_and_get(tenant_id, destination_id)
            .await?;
        let now = Utc::now();

        let decision = evaluator::decide(&self.config, &state, now);
        if !decision.should_alert {
            tracing::debug!(
                tenant_id = %tenant_id,
                destination_id = %destination_id,
                failure_count = state.failure_count,
                level = decision.level,
                "Failure recorded below alerting threshold"
            );
            return Ok(());
        }

        // At the terminal threshold the destination is disabled first so the
        // alert payloads carry the post-disable snapshot
        let mut destination = attempt.destination.clone();
        if decision.level == 100 {
            destination = self
                .disabler
                .disable_destination(tenant_id, &destination)
                .await
                .map_err(|e| {
                    Error::Disable(format!(
                        "failed to disable destination {}: {}",
                        destination_id, e
                    ))
                })?;
        }

        tracing::warn!(
            tenant_id = %tenant_id,
            destination_id = %destination_id,
            failure_count = state.failure_count,
            max_consecutive_failures = self.config.max_consecutive_failures,
            threshold = decision.level,
            "Consecutive delivery failures crossed alert threshold"
        );

        self.notifier
            .notify(&AlertEnvelope::ConsecutiveFailure {
                timestamp: now,
                data: ConsecutiveFailureData {
                    tenant_id: tenant_id.clone(),
                    event: attempt.event.clone(),
                    attempt: attempt.attempt.clone(),
                    destination: destination.clone(),
                    consecutive_failures: ConsecutiveFailures {
                        current: state.failure_count,
                        max: self.config.max_consecutive_failures,
                        threshold: decision.level,
                    },
                },
            })
            .await?;

        self.store
            .update_last_alert(tenant_id, destination_id, now, decision.level)
            .await?;

        if decision.level == 100 {
            let disabled_at = destination.disabled_at.ok_or_else(|| {
                Error::Disable(format!(
                    "destination {} missing disabled_at after disable",
                    destination_id
                ))
            })?;

            self.notifier
                .notify(&AlertEnvelope::DestinationDisabled {
                    timestamp: now,
                    data: DestinationDisabledData {
                        tenant_id: tenant_id.clone(),
                        destination,
                        disabled_at,
                        reason: DisableReason::ConsecutiveFailure,
                        attempt: attempt.attempt.clone(),
                        event: attempt.event.clone(),
                    },
                })
                .await?;
        }

        Ok(())
    }
}
