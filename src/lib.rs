//! # Feedback Grid Library
//!
//! A Rust web service library that turns SMS feedback into events. An inbound SMS
//! webhook is scored with the Text Analytics sentiment API, wrapped in a feedback
//! record and published to an Azure Event Grid topic.
//!
//! ## Features
//!
//! - SMS webhook endpoint replying with TwiML
//! - Sentiment scoring through Text Analytics v2.0
//! - Event Grid publishing with either the topic key or a signed SAS token
//! - Structured logging
//! - Health check endpoint
//!
//! ## Configuration
//!
//! - `TopicHostName`: Event Grid topic host name
//! - `TopicKey`: Event Grid topic access key
//! - `TextAnalyticsApiKey`: Text Analytics subscription key
//! - `TextAnalyticsRegion`: Text Analytics region (defaults to `westus`)
//! - `TopicPublishMode`: `client` or `signed` (defaults to `client`)
//! - `TopicSasTtlHours`: SAS token lifetime (defaults to 24)
//! - `PORT`: Server port (defaults to 3000)
//!
//! ## API Endpoints
//!
//! - `GET /`: Returns a banner
//! - `GET /health`: Returns service health status
//! - `POST /api/SessionFeedback`: SMS webhook

pub mod config;
pub mod error;
pub mod event;
pub mod feedback;
pub mod handlers;
pub mod publisher;
pub mod sas;
pub mod sentiment;
pub mod webhook;

mod util;

// Re-export commonly used types and functions
pub use config::{get_server_port, FeedbackConfig, PublishMode};
pub use error::{FeedbackError, SasError};
pub use event::EventEnvelope;
pub use feedback::{
    publish_feedback, record_feedback, score_feedback, Feedback, Sentiment,
    POSITIVE_SCORE_THRESHOLD,
};
pub use handlers::{build_app, build_router, AppState};
pub use publisher::{EventPublisher, GridPublisher};
pub use sas::{build_sas_token, verify_sas_token};
pub use sentiment::{SentimentScorer, TextAnalyticsScorer};

#[cfg(test)]
mod testing;
