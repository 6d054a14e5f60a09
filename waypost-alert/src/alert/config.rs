//! Delivery-failure alerting configuration
//!
//! Controls the consecutive-failure thresholds, the debounce window, and the
//! alert callback endpoint. Constructed once per monitor and immutable after.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How repeated alerts inside the debounce window are suppressed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebouncePolicy {
    /// Each non-terminal threshold alerts at most once per failure streak;
    /// threshold upgrades inside the debounce window are suppressed
    #[default]
    PerStreak,

    /// Legacy behavior: any non-terminal alert inside the debounce window is
    /// suppressed regardless of threshold; once the window expires the current
    /// threshold alerts again, even if it already fired this streak
    WindowOnly,
}

/// Delivery-failure alerting configuration
///
/// # Example (config.toml)
///
/// ```toml
/// [alert]
/// callback_url = "https://ops.example.com/alerts"
/// bearer_token = "s3cret"
/// max_consecutive_failures = 20
/// alert_thresholds = [50, 70, 90, 100]
/// debouncing_interval_ms = 60000
/// notify_timeout_secs = 30
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[non_exhaustive]
pub struct AlertConfig {
    /// Minimum wall-clock gap in milliseconds between two alerts reporting
    /// the same threshold for the same destination
    #[serde(default = "default_debouncing_interval_ms")]
    pub debouncing_interval_ms: u64,

    /// Failure count representing 100%; at this count the destination is
    /// auto-disabled
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u64,

    /// Percentage thresholds at which alerts fire
    ///
    /// Values outside (0, 100] are pruned; 100 is always implicitly included.
    #[serde(default = "default_alert_thresholds")]
    pub alert_thresholds: Vec<i32>,

    /// URL the alert callbacks are POSTed to
    #[serde(default)]
    pub callback_url: String,

    /// Bearer token sent in the `Authorization` header (optional)
    #[serde(default)]
    pub bearer_token: Option<String>,

    /// Per-POST deadline for alert callbacks, in seconds
    #[serde(default = "default_notify_timeout_secs")]
    pub notify_timeout_secs: u64,

    /// Debounce suppression policy
    #[serde(default)]
    pub debounce_policy: DebouncePolicy,
}

impl AlertConfig {
    /// Validate the configuration, returning an error message if invalid
    pub fn validate(&self) -> Result<(), String> {
        if self.max_consecutive_failures == 0 {
            return Err("max_consecutive_failures must be greater than 0".to_string());
        }
        if self.callback_url.is_empty() {
            return Err("callback_url must not be empty".to_string());
        }
        Ok(())
    }

    /// Configured thresholds, normalized
    ///
    /// Prunes values outside (0, 100], deduplicates, sorts ascending, and
    /// always includes 100.
    pub fn normalized_thresholds(&self) -> Vec<u32> {
        let mut thresholds: Vec<u32> = self
            .alert_thresholds
            .iter()
            .filter(|&&t| t > 0 && t <= 100)
            .map(|&t| t as u32)
            .collect();
        thresholds.push(100);
        thresholds.sort_unstable();
        thresholds.dedup();
        thresholds
    }

    /// Alert callback deadline as a [`Duration`]
    pub fn notify_timeout(&self) -> Duration {
        Duration::from_secs(self.notify_timeout_secs)
    }

    /// Debounce window as a chrono [`Duration`](chrono::Duration)
    pub(crate) fn debounce_window(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.debouncing_interval_ms.min(i64::MAX as u64) as i64)
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            debouncing_interval_ms: default_debouncing_interval_ms(),
            max_consecutive_failures: default_max_consecutive_failures(),
            alert_thresholds: default_alert_thresholds(),
            callback_url: String::new(),
            bearer_token: None,
            notify_timeout_secs: default_notify_timeout_secs(),
            debounce_policy: DebouncePolicy::default(),
        }
    }
}

fn default_debouncing_interval_ms() -> u64 {
    60_000 // 1 minute
}

fn default_max_consecutive_failures() -> u64 {
    20
}

fn default_alert_thresholds() -> Vec<i32> {
    vec![50, 70, 90, 100]
}

fn default_notify_timeout_secs() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AlertConfig::default();
        assert_eq!(config.debouncing_interval_ms, 60_000);
        assert_eq!(config.max_consecutive_failures, 20);
        assert_eq!(config.alert_thresholds, vec![50, 70, 90, 100]);
        assert!(config.bearer_token.is_none());
        assert_eq!(config.notify_timeout_secs, 30);
        assert_eq!(config.debounce_policy, DebouncePolicy::PerStreak);
    }

    #[test]
    fn test_validate_rejects_zero_max_failures() {
        let mut config = AlertConfig::default();
        config.callback_url = "https://example.com/alerts".to_string();
        config.max_consecutive_failures = 0;
        assert_eq!(
            config.validate(),
            Err("max_consecutive_failures must be greater than 0".to_string())
        );
    }

    #[test]
    fn test_validate_rejects_empty_callback_url() {
        let config = AlertConfig::default();
        assert_eq!(
            config.validate(),
            Err("callback_url must not be empty".to_string())
        );
    }

    #[test]
    fn test_normalized_thresholds_prunes_and_sorts() {
        let mut config = AlertConfig::default();
        config.alert_thresholds = vec![90, 50, 66];
        assert_eq!(config.normalized_thresholds(), vec![50, 66, 90, 100]);
    }

    #[test]
    fn test_normalized_thresholds_drops_invalid_entries() {
        let mut config = AlertConfig::default();
        config.alert_thresholds = vec![-5, 0, 101, 150];
        // All invalid entries dropped; 100 auto-added
        assert_eq!(config.normalized_thresholds(), vec![100]);
    }

    #[test]
    fn test_normalized_thresholds_dedups() {
        let mut config = AlertConfig::default();
        config.alert_thresholds = vec![50, 50, 100];
        assert_eq!(config.normalized_thresholds(), vec![50, 100]);
    }

    #[test]
    fn test_debounce_policy_wire_format() {
        assert_eq!(
            serde_json::to_string(&DebouncePolicy::WindowOnly).unwrap(),
            "\"window_only\""
        );
        let parsed: DebouncePolicy = serde_json::from_str("\"per_streak\"").unwrap();
        assert_eq!(parsed, DebouncePolicy::PerStreak);
    }

    #[test]
    fn test_serde_roundtrip() {
        let mut config = AlertConfig::default();
        config.callback_url = "https://example.com/alerts".to_string();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: AlertConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.callback_url, config.callback_url);
        assert_eq!(deserialized.alert_thresholds, config.alert_thresholds);
        assert_eq!(deserialized.debounce_policy, config.debounce_policy);
    }
}
