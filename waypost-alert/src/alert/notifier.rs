//! Alert delivery
//!
//! Hands finished [`AlertEnvelope`]s to an external sink. The HTTP
//! implementation POSTs JSON to the configured callback URL. Failures are
//! returned to the caller with no retries; the monitor aborts the current
//! attempt handling and the delivery worker decides what to do.

use async_trait::async_trait;
use std::time::Duration;

use super::config::AlertConfig;
use super::envelope::AlertEnvelope;
use crate::error::{Error, Result};

/// Sink for outgoing alerts
#[async_trait]
pub trait AlertNotifier: Send + Sync + 'static {
    /// Deliver one alert envelope
    ///
    /// An error means the alert was not accepted by the sink; the envelope
    /// is never partially delivered.
    async fn notify(&self, alert: &AlertEnvelope) -> Result<()>;
}

/// HTTP alert notifier
///
/// POSTs envelopes as JSON with `Content-Type: application/json` and, when
/// configured, `Authorization: Bearer <token>`. Any response status below
/// 400 counts as accepted.
pub struct HttpNotifier {
    client: reqwest::Client,
    callback_url: String,
    bearer_token: Option<String>,
}

impl HttpNotifier {
    /// Create a notifier with an explicit timeout
    pub fn new(
        callback_url: impl Into<String>,
        bearer_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            callback_url: callback_url.into(),
            bearer_token,
        })
    }

    /// Create a notifier from the alert configuration
    pub fn from_config(config: &AlertConfig) -> Result<Self> {
        Self::new(
            config.callback_url.clone(),
            config.bearer_token.clone(),
            config.notify_timeout(),
        )
    }
}

#[async_trait]
impl AlertNotifier for HttpNotifier {
    async fn notify(&self, alert: &AlertEnvelope) -> Result<()> {
        let mut request = self.client.post(&self.callback_url).json(alert);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Notify(format!("alert callback request failed: {}", e)))?;

        let status = response.status();
        if status.as_u16() >= 400 {
            return Err(Error::Notify(format!(
                "alert callback failed with status {}",
                status.as_u16()
            )));
        }

        tracing::debug!(
            topic = alert.topic(),
            status = status.as_u16(),
            "Alert callback delivered"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::envelope::{ConsecutiveFailureData, ConsecutiveFailures};
    use crate::delivery::{AttemptRecord, AttemptStatus, Destination, Event};
    use chrono::Utc;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_alert() -> AlertEnvelope {
        AlertEnvelope::ConsecutiveFailure {
            timestamp: Utc::now(),
            data: ConsecutiveFailureData {
                tenant_id: "ten_1".to_string(),
                event: Event {
                    id: "evt_1".to_string(),
                    topic: "orders.created".to_string(),
                    time: Utc::now(),
                    data: None,
                },
                attempt: AttemptRecord {
                    id: "att_1".to_string(),
                    status: AttemptStatus::Failed,
                    code: Some("500".to_string()),
                    response_data: None,
                    time: Utc::now(),
                },
                destination: Destination {
                    id: "des_1".to_string(),
                    tenant_id: "ten_1".to_string(),
                    kind: "webhook".to_string(),
                    topics: vec!["*".to_string()],
                    config: serde_json::Map::new(),
                    disabled_at: None,
                },
                consecutive_failures: ConsecutiveFailures {
                    current: 10,
                    max: 20,
                    threshold: 50,
                },
            },
        }
    }

    #[tokio::test]
    async fn test_posts_json_with_bearer_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/alerts"))
            .and(header("content-type", "application/json"))
            .and(header("authorization", "Bearer s3cret"))
            .and(body_partial_json(serde_json::json!({
                "topic": "alert.destination.consecutive_failure",
                "data": {"tenant_id": "ten_1"}
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = HttpNotifier::new(
            format!("{}/alerts", server.uri()),
            Some("s3cret".to_string()),
            Duration::from_secs(5),
        )
        .unwrap();

        notifier.notify(&sample_alert()).await.unwrap();
    }

    #[tokio::test]
    async fn test_no_authorization_header_without_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let notifier =
            HttpNotifier::new(server.uri(), None, Duration::from_secs(5)).unwrap();

        notifier.notify(&sample_alert()).await.unwrap();

        let received = server.received_requests().await.unwrap();
        assert!(received[0]
            .headers
            .iter()
            .all(|(name, _)| name.as_str() != "authorization"));
    }

    #[tokio::test]
    async fn test_status_400_and_above_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let notifier =
            HttpNotifier::new(server.uri(), None, Duration::from_secs(5)).unwrap();

        let err = notifier.notify(&sample_alert()).await.unwrap_err();
        assert!(err
            .to_string()
            .contains("alert callback failed with status 500"));
    }

    #[tokio::test]
    async fn test_redirect_class_status_is_accepted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(302))
            .mount(&server)
            .await;

        let notifier =
            HttpNotifier::new(server.uri(), None, Duration::from_secs(5)).unwrap();

        // Anything below 400 counts as accepted
        notifier.notify(&sample_alert()).await.unwrap();
    }

    #[tokio::test]
    async fn test_connection_refused_is_an_error() {
        // Nothing listens on this port
        let notifier = HttpNotifier::new(
            "http://127.0.0.1:1/alerts",
            None,
            Duration::from_secs(1),
        )
        .unwrap();

        let err = notifier.notify(&sample_alert()).await.unwrap_err();
        assert!(matches!(err, Error::Notify(_)));
    }
}
