//! Threshold evaluation
//!
//! Pure decision logic: given the failure count, the last-alert metadata,
//! and the clock, decide which threshold (if any) to alert at. Stateless
//! and deterministic; all persistence lives in the store.

use chrono::{DateTime, Utc};

use super::config::{AlertConfig, DebouncePolicy};
use super::store::AlertState;

/// Outcome of evaluating one failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// The threshold percentage currently reached (0 if below every threshold)
    pub level: u32,
    /// Whether an alert should be emitted for this attempt
    pub should_alert: bool,
}

impl Decision {
    fn muted(level: u32) -> Self {
        Self {
            level,
            should_alert: false,
        }
    }

    fn alert(level: u32) -> Self {
        Self {
            level,
            should_alert: true,
        }
    }
}

/// Decide whether the current failure count warrants an alert
///
/// The current level is the greatest configured threshold at or below the
/// failure percentage, computed with integer truncation:
/// `percent = failure_count * 100 / max_consecutive_failures`. With
/// `max = 20` and thresholds `{50, 66, 90, 100}` the 66% alert fires at the
/// 14th failure (13 failures is 65%).
///
/// Threshold 100 is terminal: it bypasses debouncing and fires on every
/// failure at or beyond `max_consecutive_failures`, so the caller disables
/// the destination even when concurrent workers raced past the exact
/// boundary. Non-terminal thresholds are debounced per the configured
/// [`DebouncePolicy`].
pub fn decide(config: &AlertConfig, state: &AlertState, now: DateTime<Utc>) -> Decision {
    let level = current_level(config, state.failure_count);
    if level == 0 {
        return Decision::muted(0);
    }

    match config.debounce_policy {
        DebouncePolicy::PerStreak => decide_per_streak(config, state, level, now),
        DebouncePolicy::WindowOnly => decide_window_only(config, state, level, now),
    }
}

/// Default policy: levels never repeat or go backwards within a streak
fn decide_per_streak(
    config: &AlertConfig,
    state: &AlertState,
    level: u32,
    now: DateTime<Utc>,
) -> Decision {
    if state.last_alert_level == 0 {
        return Decision::alert(level);
    }
    if level < state.last_alert_level {
        // Levels never go backwards while failures continue
        return Decision::muted(level);
    }
    if level == state.last_alert_level {
        if level == 100 {
            return Decision::alert(level);
        }
        // A non-terminal threshold alerts at most once per streak
        return Decision::muted(level);
    }
    // Threshold upgrade: suppressed inside the debounce window unless terminal
    if level < 100 && within_debounce_window(config, state, now) {
        return Decision::muted(level);
    }
    Decision::alert(level)
}

/// Legacy policy: the debounce window alone gates repeats, including
/// re-alerting the same level once the window expires
fn decide_window_only(
    config: &AlertConfig,
    state: &AlertState,
    level: u32,
    now: DateTime<Utc>,
) -> Decision {
    if state.last_alert_level == 0 || level == 100 {
        return Decision::alert(level);
    }
    if within_debounce_window(config, state, now) {
        return Decision::muted(level);
    }
    Decision::alert(level)
}

fn within_debounce_window(config: &AlertConfig, state: &AlertState, now: DateTime<Utc>) -> bool {
    state
        .last_alert_time
        .map(|last| now.signed_duration_since(last) < config.debounce_window())
        .unwrap_or(false)
}

/// Greatest configured threshold at or below the current failure percentage
///
/// A zero `max_consecutive_failures` is rejected by
/// [`AlertConfig::validate`]; if such a config reaches this function anyway,
/// no level is ever current.
fn current_level(config: &AlertConfig, failure_count: u64) -> u32 {
    if failure_count == 0 || config.max_consecutive_failures == 0 {
        return 0;
    }
    let percent = failure_count.saturating_mul(100) / config.max_consecutive_failures;
    config
        .normalized_thresholds()
        .into_iter()
        .rev()
        .find(|&t| u64::from(t) <= percent)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn config(max: u64, thresholds: &[i32]) -> AlertConfig {
        let mut config = AlertConfig::default();
        config.max_consecutive_failures = max;
        config.alert_thresholds = thresholds.to_vec();
        config.callback_url = "https://example.com/alerts".to_string();
        config
    }

    fn state(count: u64, last_time: Option<DateTime<Utc>>, last_level: u32) -> AlertState {
        AlertState {
            failure_count: count,
            last_alert_time: last_time,
            last_alert_level: last_level,
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_760_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_level_zero_below_first_threshold() {
        let config = config(20, &[50, 66, 90, 100]);
        let decision = decide(&config, &state(9, None, 0), at(0));
        assert_eq!(decision, Decision::muted(0));
    }

    #[test]
    fn test_level_placement_with_truncation() {
        let config = config(20, &[50, 66, 90, 100]);
        // 13 failures is 65%, still below the 66% threshold
        assert_eq!(decide(&config, &state(13, None, 0), at(0)).level, 50);
        // 14 failures is 70%, so the 66% threshold is reached
        assert_eq!(decide(&config, &state(14, None, 0), at(0)).level, 66);
        assert_eq!(decide(&config, &state(18, None, 0), at(0)).level, 90);
        assert_eq!(decide(&config, &state(20, None, 0), at(0)).level, 100);
    }

    #[test]
    fn test_first_alert_fires_without_debounce() {
        let config = config(20, &[50, 66, 90, 100]);
        assert_eq!(decide(&config, &state(10, None, 0), at(0)), Decision::alert(50));
    }

    #[test]
    fn test_same_level_muted_per_streak() {
        let config = config(20, &[50, 66, 90, 100]);
        let decision = decide(&config, &state(11, Some(at(0)), 50), at(1));
        assert_eq!(decision, Decision::muted(50));
    }

    #[test]
    fn test_lower_level_never_fires() {
        let config = config(20, &[50, 66, 90, 100]);
        // A worker that raced behind sees a stale, lower level
        let decision = decide(&config, &state(13, Some(at(0)), 66), at(1));
        assert_eq!(decision, Decision::muted(50));
    }

    #[test]
    fn test_upgrade_suppressed_inside_debounce_window() {
        let mut config = config(20, &[50, 66, 90, 100]);
        config.debouncing_interval_ms = 60_000;
        let decision = decide(&config, &state(14, Some(at(0)), 50), at(30));
        assert_eq!(decision, Decision::muted(66));
    }

    #[test]
    fn test_upgrade_fires_after_debounce_window() {
        let mut config = config(20, &[50, 66, 90, 100]);
        config.debouncing_interval_ms = 60_000;
        let decision = decide(&config, &state(14, Some(at(0)), 50), at(61));
        assert_eq!(decision, Decision::alert(66));
    }

    #[test]
    fn test_terminal_level_punches_through_debounce() {
        let mut config = config(20, &[50, 66, 90, 100]);
        config.debouncing_interval_ms = 3_600_000;
        let decision = decide(&config, &state(20, Some(at(0)), 90), at(1));
        assert_eq!(decision, Decision::alert(100));
    }

    #[test]
    fn test_terminal_level_repeats_every_failure() {
        let config = config(20, &[50, 66, 90, 100]);
        for count in 20..=25 {
            let decision = decide(&config, &state(count, Some(at(0)), 100), at(1));
            assert_eq!(decision, Decision::alert(100), "count={}", count);
        }
    }

    #[test]
    fn test_window_only_policy_suppresses_any_level_inside_window() {
        let mut config = config(10, &[1, 2, 100]);
        config.debounce_policy = DebouncePolicy::WindowOnly;
        config.debouncing_interval_ms = 1_000;

        // t=0: first failure, never alerted before
        let first = decide(&config, &state(1, None, 0), at(0));
        assert!(first.should_alert);
        let level = first.level;

        // t=100ms, t=200ms: inside the window
        let within = Utc.timestamp_millis_opt(at(0).timestamp_millis() + 100).unwrap();
        assert!(!decide(&config, &state(2, Some(at(0)), level), within).should_alert);
        let within = Utc.timestamp_millis_opt(at(0).timestamp_millis() + 200).unwrap();
        assert!(!decide(&config, &state(3, Some(at(0)), level), within).should_alert);

        // t=1.1s: window expired, the same level fires again
        let after = Utc.timestamp_millis_opt(at(0).timestamp_millis() + 1_100).unwrap();
        assert!(decide(&config, &state(4, Some(at(0)), level), after).should_alert);
    }

    #[test]
    fn test_window_only_policy_terminal_punches_through() {
        let mut config = config(10, &[1, 2, 100]);
        config.debounce_policy = DebouncePolicy::WindowOnly;
        config.debouncing_interval_ms = 3_600_000;
        let decision = decide(&config, &state(10, Some(at(0)), 2), at(1));
        assert_eq!(decision, Decision::alert(100));
    }

    #[test]
    fn test_counts_beyond_max_stay_terminal() {
        let config = config(20, &[50, 70, 90, 100]);
        assert_eq!(decide(&config, &state(25, Some(at(0)), 100), at(1)).level, 100);
    }

    #[test]
    fn test_zero_max_failures_never_alerts() {
        // Rejected by validation, but a direct caller must not panic
        let config = config(0, &[50, 100]);
        assert_eq!(decide(&config, &state(5, None, 0), at(0)), Decision::muted(0));
    }

    #[test]
    fn test_pruned_thresholds_only_alert_at_max() {
        let config = config(100, &[-5, 0, 101, 150]);
        for count in 1..100 {
            assert_eq!(
                decide(&config, &state(count, None, 0), at(0)),
                Decision::muted(0),
                "count={}",
                count
            );
        }
        assert_eq!(decide(&config, &state(100, None, 0), at(0)), Decision::alert(100));
    }
}
