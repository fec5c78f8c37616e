//! Error types for the feedback-grid service.
//!
//! `SasError` covers the signing core and has no knowledge of HTTP. `FeedbackError`
//! is what the collaborators (scorer, publisher, webhook parsing) and the handlers
//! return.

use thiserror::Error;

/// Errors raised while building or parsing a SAS token.
///
/// None of these are retryable: signing the same inputs again fails the same way.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SasError {
    /// The shared key is not valid base64
    #[error("Invalid key format: {0}")]
    InvalidKeyFormat(String),

    /// A token field could not be represented as UTF-8
    #[error("Encoding error: {0}")]
    EncodingError(String),

    /// The token is not `r=...&e=...&s=...`
    #[error("Malformed token: {0}")]
    MalformedToken(String),
}

/// Errors raised while receiving, scoring or publishing feedback.
#[derive(Error, Debug)]
pub enum FeedbackError {
    /// Signing failed
    #[error(transparent)]
    Sas(#[from] SasError),

    /// A required configuration value is absent or empty
    #[error("Missing configuration: {0} is not set")]
    MissingConfiguration(&'static str),

    /// A configuration value is present but unusable
    #[error("Invalid configuration for {name}: {reason}")]
    InvalidConfiguration { name: &'static str, reason: String },

    /// The inbound webhook request could not be used
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The remote service is down or unreachable
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The remote service rejected the call because of rate or quota limits
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    /// The sentiment API answered with an unexpected status
    #[error("Sentiment API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The topic rejected the published events
    #[error("Publish failed ({status}): {message}")]
    Publish { status: u16, message: String },

    /// Transport-level HTTP failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Payload serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FeedbackError {
    /// Maps a non-success HTTP status to the matching error kind.
    ///
    /// 429 is a quota problem and 5xx means the service is down. Anything else is
    /// handed to `other`, which builds the caller-specific variant.
    pub(crate) fn from_status(
        status: reqwest::StatusCode,
        message: String,
        other: impl FnOnce(u16, String) -> FeedbackError,
    ) -> FeedbackError {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            FeedbackError::QuotaExceeded(message)
        } else if status.is_server_error() {
            FeedbackError::ServiceUnavailable(format!("{} {}", status.as_u16(), message))
        } else {
            other(status.as_u16(), message)
        }
    }
}
