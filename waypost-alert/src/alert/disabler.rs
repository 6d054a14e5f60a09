//! Destination disabling
//!
//! Disabling a destination is owned by the destination registry, not by
//! this crate; the monitor only needs the narrow capability below. The
//! default wiring plugs in the registry client; tests use an in-memory
//! implementation.

use async_trait::async_trait;
use chrono::Utc;

use crate::delivery::Destination;
use crate::error::Result;

/// Capability to persist a destination's disabled state
#[async_trait]
pub trait DestinationDisabler: Send + Sync + 'static {
    /// Persist `disabled_at` on the destination and return the post-disable
    /// snapshot
    ///
    /// Must be idempotent: disabling an already-disabled destination returns
    /// the existing `disabled_at` without error.
    async fn disable_destination(
        &self,
        tenant_id: &str,
        destination: &Destination,
    ) -> Result<Destination>;
}

/// In-process disabler that stamps `disabled_at` on the snapshot
///
/// Suitable for single-worker deployments where the destination registry
/// lives in the same process, and for tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalDisabler;

#[async_trait]
impl DestinationDisabler for LocalDisabler {
    async fn disable_destination(
        &self,
        tenant_id: &str,
        destination: &Destination,
    ) -> Result<Destination> {
        let mut disabled = destination.clone();
        if disabled.disabled_at.is_none() {
            disabled.disabled_at = Some(Utc::now());
            tracing::info!(
                tenant_id = %tenant_id,
                destination_id = %disabled.id,
                "Destination disabled"
            );
        }
        Ok(disabled)
    }
}
