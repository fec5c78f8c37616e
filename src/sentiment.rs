//! Sentiment scoring through the Text Analytics API.
//!
//! This module defines the `SentimentScorer` seam used by the feedback flow and a
//! reqwest-backed implementation for the Text Analytics v2.0 sentiment endpoint.

use async_trait::async_trait;
use log::{debug, error, info, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::{mask_secret, FeedbackConfig};
use crate::error::FeedbackError;
use crate::util::sanitize_for_logging;

/// Language tag sent with every document.
pub const DEFAULT_LANGUAGE: &str = "en";

const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Something that can rate the tone of a short text.
#[async_trait]
pub trait SentimentScorer: Send + Sync {
    /// Returns the raw normalized score for `text`, where higher is more positive.
    async fn score(&self, text: &str, language: &str) -> Result<f64, FeedbackError>;
}

/// Converts a raw score to an integer from 0 to 100.
///
/// Scores outside [0, 1] are clamped, and the fractional part is truncated.
pub fn to_percentage(score: f64) -> u8 {
    if score.is_nan() {
        return 0;
    }
    (score.clamp(0.0, 1.0) * 100.0) as u8
}

#[derive(Debug, Serialize)]
struct SentimentRequest<'a> {
    documents: [SentimentDocument<'a>; 1],
}

#[derive(Debug, Serialize)]
struct SentimentDocument<'a> {
    language: &'a str,
    id: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct SentimentResponse {
    #[serde(default)]
    documents: Vec<DocumentScore>,
    #[serde(default)]
    errors: Vec<DocumentError>,
}

#[derive(Debug, Deserialize)]
struct DocumentScore {
    #[allow(dead_code)]
    id: String,
    score: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct DocumentError {
    id: String,
    message: String,
}

/// Text Analytics v2.0 client.
#[derive(Debug, Clone)]
pub struct TextAnalyticsScorer {
    client: Client,
    endpoint: String,
    subscription_key: String,
}

impl TextAnalyticsScorer {
    /// Creates a scorer for the regional endpoint, e.g. `westus`.
    pub fn new(region: &str, subscription_key: impl Into<String>) -> Self {
        let endpoint = format!(
            "https://{}.api.cognitive.microsoft.com/text/analytics/v2.0/sentiment",
            region
        );
        Self::with_endpoint(endpoint, subscription_key)
    }

    /// Creates a scorer that posts to an explicit endpoint URL.
    pub fn with_endpoint(endpoint: impl Into<String>, subscription_key: impl Into<String>) -> Self {
        TextAnalyticsScorer {
            client: Client::new(),
            endpoint: endpoint.into(),
            subscription_key: subscription_key.into(),
        }
    }

    pub fn from_config(config: &FeedbackConfig) -> Self {
        Self::new(
            &config.text_analytics_region,
            config.text_analytics_key.clone(),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SentimentScorer for TextAnalyticsScorer {
    async fn score(&self, text: &str, language: &str) -> Result<f64, FeedbackError> {
        info!("Requesting sentiment score from {}", self.endpoint);
        debug!(
            "Request headers: {}: {}, Content-Type: application/json",
            SUBSCRIPTION_KEY_HEADER,
            mask_secret(&self.subscription_key)
        );

        let payload = SentimentRequest {
            documents: [SentimentDocument {
                language,
                id: "0",
                text,
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header(SUBSCRIPTION_KEY_HEADER, &self.subscription_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!("Sentiment request failed: {}", e);
                FeedbackError::ServiceUnavailable(e.to_string())
            })?;

        let status = response.status();
        info!("Received sentiment response with status: {}", status);

        let body = response.text().await?;
        if !status.is_success() {
            error!("Sentiment scoring failed - Status: {}", status);
            debug!("Error response: {}", sanitize_for_logging(&body, 200));
            return Err(FeedbackError::from_status(status, body, |status, message| {
                FeedbackError::Api { status, message }
            }));
        }

        parse_sentiment_response(&body)
    }
}

/// Extracts the first document's score from a sentiment response body.
///
/// An empty `documents` array scores 0; a document with no score also scores 0.
fn parse_sentiment_response(body: &str) -> Result<f64, FeedbackError> {
    let parsed: SentimentResponse = serde_json::from_str(body)?;

    for doc_error in &parsed.errors {
        warn!(
            "Sentiment API reported an error for document {}: {}",
            doc_error.id, doc_error.message
        );
    }

    match parsed.documents.first() {
        Some(document) => Ok(document.score.unwrap_or_default()),
        None => {
            warn!("Sentiment API returned no documents, scoring 0");
            Ok(0.0)
        }
    }
}
