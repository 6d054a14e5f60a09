//! Alert state persistence
//!
//! Per-destination failure counters and last-alert metadata. The Redis
//! implementation is shared by every worker in a deployment; the atomic
//! `INCR` is what makes concurrent failure counting safe. Records are
//! namespaced by deployment id so multiple logical deployments can share
//! one physical Redis.

use std::collections::HashMap;
use std::ops::DerefMut;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_redis::{Pool as RedisPool, Runtime};

use crate::config::RedisConfig;
use crate::error::{Error, Result};

/// Snapshot of a destination's alert state
///
/// `last_alert_time`/`last_alert_level` are zero-valued (`None`/`0`) until
/// the first alert of a streak has been recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertState {
    /// Consecutive failures since the last successful attempt
    pub failure_count: u64,
    /// When the most recent alert was emitted
    pub last_alert_time: Option<DateTime<Utc>>,
    /// Threshold percentage of the most recent alert (0 = never alerted)
    pub last_alert_level: u32,
}

/// Persistent store for per-destination alert state
///
/// Implementations must guarantee that `increment_and_get` is atomic on the
/// counter: concurrent callers each observe a distinct failure count that
/// reflects all increments that completed before their call.
#[async_trait]
pub trait AlertStore: Send + Sync + 'static {
    /// Atomically add one failure and return the updated state
    ///
    /// The counter increment and the read of the last-alert fields are
    /// issued in a single round trip; each returned field reflects a value
    /// that existed at some moment during the call.
    async fn increment_and_get(&self, tenant_id: &str, destination_id: &str)
        -> Result<AlertState>;

    /// Clear the failure streak after a successful attempt
    async fn reset_alert_state(&self, tenant_id: &str, destination_id: &str) -> Result<()>;

    /// Record the most recent alert's time and level as one unit
    async fn update_last_alert(
        &self,
        tenant_id: &str,
        destination_id: &str,
        time: DateTime<Utc>,
        level: u32,
    ) -> Result<()>;
}

/// Redis-backed alert store
///
/// Two records per destination: a plain integer counter and a two-field
/// hash (`time` as epoch milliseconds, `level`). The hash is written with a
/// single `HSET` so the pair always moves together.
#[derive(Clone)]
pub struct RedisAlertStore {
    pool: RedisPool,
    deployment_id: Option<String>,
}

impl RedisAlertStore {
    /// Create a store on an existing pool
    pub fn new(pool: RedisPool) -> Self {
        Self {
            pool,
            deployment_id: None,
        }
    }

    /// Connect a store, building its own connection pool
    ///
    /// The pool is verified with an initial checkout, retried with
    /// exponential backoff per the config, so delivery workers can come up
    /// before Redis does.
    pub async fn connect(config: &RedisConfig) -> Result<Self> {
        let pool = build_pool(config)?;

        let mut delay = Duration::from_secs(config.retry_delay_secs);
        let mut attempt = 0;
        loop {
            match pool.get().await {
                Ok(_) => break,
                Err(e) if attempt < config.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        attempt,
                        error = %e,
                        "Alert store could not reach Redis; retrying in {:?}",
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                Err(e) => {
                    return Err(Error::Store(format!(
                        "failed to connect alert store to Redis after {} attempts: {}",
                        attempt + 1,
                        e
                    )));
                }
            }
        }

        tracing::info!(
            max_connections = config.max_connections,
            "Alert store connected to Redis"
        );
        Ok(Self::new(pool))
    }

    /// Namespace all keys with a deployment id
    ///
    /// Required when multiple logical deployments share one Redis.
    pub fn with_deployment_id(mut self, deployment_id: impl Into<String>) -> Self {
        let deployment_id = deployment_id.into();
        self.deployment_id = (!deployment_id.is_empty()).then_some(deployment_id);
        self
    }

    /// Build the key for the failure counter
    fn failures_key(&self, tenant_id: &str, destination_id: &str) -> String {
        match &self.deployment_id {
            Some(deployment) => {
                format!("alert:failures:{}:{}:{}", deployment, tenant_id, destination_id)
            }
            None => format!("alert:failures:{}:{}", tenant_id, destination_id),
        }
    }

    /// Build the key for the last-alert hash
    fn last_alert_key(&self, tenant_id: &str, destination_id: &str) -> String {
        match &self.deployment_id {
            Some(deployment) => {
                format!("alert:last:{}:{}:{}", deployment, tenant_id, destination_id)
            }
            None => format!("alert:last:{}:{}", tenant_id, destination_id),
        }
    }

    /// Get a Redis connection from the pool
    async fn get_connection(&self) -> Result<deadpool_redis::Connection> {
        self.pool.get().await.map_err(|e| {
            let redis_err = redis::RedisError::from((
                redis::ErrorKind::IoError,
                "Failed to get Redis connection for alert store",
                e.to_string(),
            ));
            Error::Redis(Box::new(redis_err))
        })
    }
}

fn build_pool(config: &RedisConfig) -> Result<RedisPool> {
    deadpool_redis::Config::from_url(&config.url)
        .builder()
        .map_err(|e| Error::Store(format!("invalid Redis configuration: {}", e)))?
        .max_size(config.max_connections)
        .runtime(Runtime::Tokio1)
        .build()
        .map_err(|e| Error::Store(format!("failed to create Redis pool: {}", e)))
}

#[async_trait]
impl AlertStore for RedisAlertStore {
    async fn increment_and_get(
        &self,
        tenant_id: &str,
        destination_id: &str,
    ) -> Result<AlertState> {
        let mut conn = self.get_connection().await?;

        let failures_key = self.failures_key(tenant_id, destination_id);
        let last_alert_key = self.last_alert_key(tenant_id, destination_id);

        // One round trip: the increment is atomic, the hash read rides along
        let (failure_count, (time_ms, level)): (u64, (Option<i64>, Option<u32>)) = redis::pipe()
            .cmd("INCR")
            .arg(&failures_key)
            .cmd("HMGET")
            .arg(&last_alert_key)
            .arg("time")
            .arg("level")
            .query_async(conn.deref_mut())
            .await
            .map_err(|e| Error::Store(format!("failed to get alert state: {}", e)))?;

        Ok(AlertState {
            failure_count,
            last_alert_time: time_ms.and_then(DateTime::from_timestamp_millis),
            last_alert_level: level.unwrap_or(0),
        })
    }

    async fn reset_alert_state(&self, tenant_id: &str, destination_id: &str) -> Result<()> {
        let mut conn = self.get_connection().await?;

        // Counter and last-alert metadata are cleared together so the next
        // streak starts from a clean slate
        let _: () = redis::cmd("DEL")
            .arg(self.failures_key(tenant_id, destination_id))
            .arg(self.last_alert_key(tenant_id, destination_id))
            .query_async(conn.deref_mut())
            .await
            .map_err(|e| Error::Store(format!("failed to reset alert state: {}", e)))?;

        Ok(())
    }

    async fn update_last_alert(
        &self,
        tenant_id: &str,
        destination_id: &str,
        time: DateTime<Utc>,
        level: u32,
    ) -> Result<()> {
        let mut conn = self.get_connection().await?;

        // Single HSET so time and level never tear
        let _: () = redis::cmd("HSET")
            .arg(self.last_alert_key(tenant_id, destination_id))
            .arg("time")
            .arg(time.timestamp_millis())
            .arg("level")
            .arg(level)
            .query_async(conn.deref_mut())
            .await
            .map_err(|e| Error::Store(format!("failed to update alert state: {}", e)))?;

        Ok(())
    }
}

/// In-memory alert store
///
/// Single-process equivalent of [`RedisAlertStore`], used by tests and by
/// deployments that run one worker without Redis. The mutex is never held
/// across an await point.
#[derive(Default)]
pub struct InMemoryAlertStore {
    state: Mutex<HashMap<(String, String), AlertState>>,
}

impl InMemoryAlertStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state for a destination, if any failures are recorded
    pub fn snapshot(&self, tenant_id: &str, destination_id: &str) -> Option<AlertState> {
        self.state
            .lock()
            .unwrap()
            .get(&(tenant_id.to_string(), destination_id.to_string()))
            .cloned()
    }
}

#[async_trait]
impl AlertStore for InMemoryAlertStore {
    async fn increment_and_get(
        &self,
        tenant_id: &str,
        destination_id: &str,
    ) -> Result<AlertState> {
        let mut state = self.state.lock().unwrap();
        let entry = state
            .entry((tenant_id.to_string(), destination_id.to_string()))
            .or_default();
        entry.failure_count += 1;
        Ok(entry.clone())
    }

    async fn reset_alert_state(&self, tenant_id: &str, destination_id: &str) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .remove(&(tenant_id.to_string(), destination_id.to_string()));
        Ok(())
    }

    async fn update_last_alert(
        &self,
        tenant_id: &str,
        destination_id: &str,
        time: DateTime<Utc>,
        level: u32,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let entry = state
            .entry((tenant_id.to_string(), destination_id.to_string()))
            .or_default();
        entry.last_alert_time = Some(time);
        entry.last_alert_level = level;
        Ok(())
    }
}
