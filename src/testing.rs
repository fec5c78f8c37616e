//! Test doubles for the scoring and publishing collaborators.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::error::FeedbackError;
use crate::event::EventEnvelope;
use crate::feedback::Feedback;
use crate::publisher::EventPublisher;
use crate::sentiment::SentimentScorer;

/// Always returns the same raw score.
pub(crate) struct FixedScorer(pub f64);

#[async_trait]
impl SentimentScorer for FixedScorer {
    async fn score(&self, _text: &str, _language: &str) -> Result<f64, FeedbackError> {
        Ok(self.0)
    }
}

/// Always fails as if the sentiment service were down.
pub(crate) struct FailingScorer;

#[async_trait]
impl SentimentScorer for FailingScorer {
    async fn score(&self, _text: &str, _language: &str) -> Result<f64, FeedbackError> {
        Err(FeedbackError::ServiceUnavailable("scorer offline".to_string()))
    }
}

/// Always fails as if the subscription ran out of calls.
pub(crate) struct ExhaustedScorer;

#[async_trait]
impl SentimentScorer for ExhaustedScorer {
    async fn score(&self, _text: &str, _language: &str) -> Result<f64, FeedbackError> {
        Err(FeedbackError::QuotaExceeded("monthly quota used".to_string()))
    }
}

/// Keeps every published envelope in memory.
#[derive(Default)]
pub(crate) struct RecordingPublisher {
    events: Mutex<Vec<EventEnvelope<Feedback>>>,
}

impl RecordingPublisher {
    pub(crate) fn published(&self) -> Vec<EventEnvelope<Feedback>> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, events: &[EventEnvelope<Feedback>]) -> Result<(), FeedbackError> {
        self.events.lock().unwrap().extend_from_slice(events);
        Ok(())
    }
}

/// Rejects every publish with 401, like a topic given the wrong key.
pub(crate) struct RejectingPublisher;

#[async_trait]
impl EventPublisher for RejectingPublisher {
    async fn publish(&self, _events: &[EventEnvelope<Feedback>]) -> Result<(), FeedbackError> {
        Err(FeedbackError::Publish {
            status: 401,
            message: "invalid key".to_string(),
        })
    }
}
