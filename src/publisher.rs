//! Publishing feedback events to an Event Grid topic.
//!
//! Two authentication strategies reach the same endpoint: the raw topic key
//! (`aeg-sas-key`, what the vendor client sends) and a SAS token signed with that key
//! (`aeg-sas-token`). `PublishMode` picks one at startup.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use log::{debug, error, info};
use reqwest::Client;
use url::Url;

use crate::config::{mask_secret, FeedbackConfig, PublishMode};
use crate::error::FeedbackError;
use crate::event::EventEnvelope;
use crate::feedback::Feedback;
use crate::sas::{build_sas_token, SAS_KEY_HEADER, SAS_TOKEN_HEADER};
use crate::util::sanitize_for_logging;

const EVENTS_PATH: &str = "/api/events";

/// Something that can deliver events to a topic.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, events: &[EventEnvelope<Feedback>]) -> Result<(), FeedbackError>;
}

/// Normalizes a topic host name or URL to its `https://<host>/api/events` endpoint.
///
/// # Example
///
/// ```rust
/// use feedback_grid::publisher::topic_endpoint;
///
/// let endpoint = topic_endpoint("feedback.westus2-1.eventgrid.azure.net").unwrap();
/// assert_eq!(endpoint, "https://feedback.westus2-1.eventgrid.azure.net/api/events");
/// ```
pub fn topic_endpoint(host: &str) -> Result<String, FeedbackError> {
    let trimmed = host.trim().trim_end_matches('/');
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let mut url = Url::parse(&candidate).map_err(|e| FeedbackError::InvalidConfiguration {
        name: crate::config::TOPIC_HOST_NAME_VAR,
        reason: format!("'{}' is not a valid host: {}", host, e),
    })?;
    if url.host_str().is_none() {
        return Err(FeedbackError::InvalidConfiguration {
            name: crate::config::TOPIC_HOST_NAME_VAR,
            reason: format!("'{}' has no host", host),
        });
    }

    url.set_path(EVENTS_PATH);
    url.set_query(None);
    Ok(url.to_string())
}

/// HTTP publisher for an Event Grid topic.
#[derive(Debug, Clone)]
pub struct GridPublisher {
    client: Client,
    endpoint: String,
    topic_key: String,
    mode: PublishMode,
    sas_ttl: Duration,
}

impl GridPublisher {
    pub fn new(
        topic_host_name: &str,
        topic_key: impl Into<String>,
        mode: PublishMode,
        sas_ttl: Duration,
    ) -> Result<Self, FeedbackError> {
        Ok(GridPublisher {
            client: Client::new(),
            endpoint: topic_endpoint(topic_host_name)?,
            topic_key: topic_key.into(),
            mode,
            sas_ttl,
        })
    }

    pub fn from_config(config: &FeedbackConfig) -> Result<Self, FeedbackError> {
        Self::new(
            &config.topic_host_name,
            config.topic_key.clone(),
            config.publish_mode,
            config.sas_ttl()?,
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn mode(&self) -> PublishMode {
        self.mode
    }

    /// The authentication header for one request, as `(name, value)`.
    fn auth_header(&self) -> Result<(&'static str, String), FeedbackError> {
        match self.mode {
            PublishMode::Client => Ok((SAS_KEY_HEADER, self.topic_key.clone())),
            PublishMode::SignedRequest => {
                let expires = Utc::now().checked_add_signed(self.sas_ttl).ok_or_else(|| {
                    FeedbackError::InvalidConfiguration {
                        name: crate::config::SAS_TTL_HOURS_VAR,
                        reason: "token expiry is out of range".to_string(),
                    }
                })?;
                let token = build_sas_token(&self.endpoint, expires, &self.topic_key)?;
                Ok((SAS_TOKEN_HEADER, token))
            }
        }
    }
}

#[async_trait]
impl EventPublisher for GridPublisher {
    async fn publish(&self, events: &[EventEnvelope<Feedback>]) -> Result<(), FeedbackError> {
        info!(
            "Publishing {} event(s) to {} using {:?}",
            events.len(),
            self.endpoint,
            self.mode
        );

        let (header, value) = self.auth_header()?;
        debug!("Request headers: {}: {}", header, mask_secret(&value));

        let response = self
            .client
            .post(&self.endpoint)
            .header(header, value)
            .header("Accept", "application/json")
            .json(events)
            .send()
            .await
            .map_err(|e| {
                error!("Publish request failed: {}", e);
                FeedbackError::ServiceUnavailable(e.to_string())
            })?;

        let status = response.status();
        info!("Received publish response with status: {}", status);

        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        error!("Publishing failed - Status: {}", status);
        debug!("Error response: {}", sanitize_for_logging(&body, 200));
        Err(FeedbackError::from_status(status, body, |status, message| {
            FeedbackError::Publish { status, message }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sas::verify_sas_token;

    const ZERO_KEY: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=";

    #[test]
    fn test_topic_endpoint_from_host_or_url() {
        let expected = "https://feedback.westus2-1.eventgrid.azure.net/api/events";
        for host in [
            "feedback.westus2-1.eventgrid.azure.net",
            "https://feedback.westus2-1.eventgrid.azure.net/",
            "https://feedback.westus2-1.eventgrid.azure.net/api/events?api-version=2018-01-01",
        ] {
            assert_eq!(topic_endpoint(host).unwrap(), expected);
        }
    }

    #[test]
    fn test_topic_endpoint_rejects_garbage() {
        assert!(matches!(
            topic_endpoint("https://"),
            Err(FeedbackError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_client_mode_sends_raw_key() {
        let publisher = GridPublisher::new(
            "topic.example.net",
            ZERO_KEY,
            PublishMode::Client,
            Duration::hours(1),
        )
        .unwrap();
        let (header, value) = publisher.auth_header().unwrap();
        assert_eq!(header, "aeg-sas-key");
        assert_eq!(value, ZERO_KEY);
    }

    #[test]
    fn test_signed_mode_sends_verifiable_token_for_endpoint() {
        let publisher = GridPublisher::new(
            "topic.example.net",
            ZERO_KEY,
            PublishMode::SignedRequest,
            Duration::hours(24),
        )
        .unwrap();
        let (header, token) = publisher.auth_header().unwrap();
        assert_eq!(header, "aeg-sas-token");
        assert!(token.starts_with("r=https%3A%2F%2Ftopic.example.net%2Fapi%2Fevents&e="));
        assert!(verify_sas_token(&token, ZERO_KEY).unwrap());
    }

    #[test]
    fn test_signed_mode_with_bad_key_fails_before_sending() {
        let publisher = GridPublisher::new(
            "topic.example.net",
            "not base64!!",
            PublishMode::SignedRequest,
            Duration::hours(24),
        )
        .unwrap();
        assert!(matches!(
            publisher.auth_header(),
            Err(FeedbackError::Sas(crate::error::SasError::InvalidKeyFormat(_)))
        ));
    }

    /// An expiry past the representable range is an error, not a panic.
    #[test]
    fn test_signed_mode_with_unrepresentable_expiry_fails() {
        let publisher = GridPublisher::new(
            "topic.example.net",
            ZERO_KEY,
            PublishMode::SignedRequest,
            Duration::MAX,
        )
        .unwrap();
        assert!(matches!(
            publisher.auth_header(),
            Err(FeedbackError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_from_config_uses_configured_ttl() {
        let config = FeedbackConfig {
            topic_host_name: "topic.example.net".to_string(),
            topic_key: ZERO_KEY.to_string(),
            text_analytics_key: "0123456789abcdef".to_string(),
            text_analytics_region: "westus".to_string(),
            publish_mode: PublishMode::SignedRequest,
            sas_ttl_hours: 2,
        };
        let publisher = GridPublisher::from_config(&config).unwrap();
        assert_eq!(publisher.sas_ttl, Duration::hours(2));

        let oversized = FeedbackConfig {
            sas_ttl_hours: 10_000_000_000,
            ..config
        };
        assert!(matches!(
            GridPublisher::from_config(&oversized),
            Err(FeedbackError::InvalidConfiguration { .. })
        ));
    }

    #[tokio::test]
    async fn test_unreachable_topic_is_service_unavailable() {
        let publisher = GridPublisher::new(
            "http://127.0.0.1:9",
            ZERO_KEY,
            PublishMode::Client,
            Duration::hours(1),
        )
        .unwrap();
        let events = vec![EventEnvelope::feedback(Feedback::new("hi", 80))];
        let result = publisher.publish(&events).await;
        assert!(matches!(result, Err(FeedbackError::ServiceUnavailable(_))));
    }
}
