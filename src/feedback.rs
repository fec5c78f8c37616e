//! Feedback records and the score-then-publish flow.

use log::info;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::FeedbackError;
use crate::event::EventEnvelope;
use crate::publisher::EventPublisher;
use crate::sentiment::{to_percentage, SentimentScorer, DEFAULT_LANGUAGE};
use crate::util::sanitize_for_logging;

/// Scores strictly above this are labelled positive.
///
/// This is a policy choice with no stated rationale; change it here if the cut-off
/// turns out to be wrong.
pub const POSITIVE_SCORE_THRESHOLD: u8 = 70;

/// A scored piece of feedback, published as the `data` of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: Uuid,
    pub message: String,
    /// Sentiment score from 0 (negative) to 100 (positive)
    pub score: u8,
}

impl Feedback {
    pub fn new(message: impl Into<String>, score: u8) -> Self {
        Feedback {
            id: Uuid::new_v4(),
            message: message.into(),
            score,
        }
    }

    pub fn sentiment(&self) -> Sentiment {
        Sentiment::from_score(self.score)
    }
}

/// Coarse label derived from a score, used as the event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentiment {
    Positive,
    Negative,
}

impl Sentiment {
    pub fn from_score(score: u8) -> Self {
        if score > POSITIVE_SCORE_THRESHOLD {
            Sentiment::Positive
        } else {
            Sentiment::Negative
        }
    }

    pub fn as_event_type(&self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::Negative => "Negative",
        }
    }
}

/// Scores `message` and wraps it in a new feedback record. Nothing is published.
pub async fn score_feedback(
    scorer: &dyn SentimentScorer,
    message: &str,
) -> Result<Feedback, FeedbackError> {
    let raw = scorer.score(message, DEFAULT_LANGUAGE).await?;
    let feedback = Feedback::new(message, to_percentage(raw));
    info!(
        "Feedback {} scored {} ({})",
        feedback.id,
        feedback.score,
        feedback.sentiment().as_event_type()
    );
    Ok(feedback)
}

/// Publishes `feedback` as a single event and returns the envelope that was sent.
pub async fn publish_feedback(
    publisher: &dyn EventPublisher,
    feedback: &Feedback,
) -> Result<EventEnvelope<Feedback>, FeedbackError> {
    let envelope = EventEnvelope::feedback(feedback.clone());
    publisher.publish(std::slice::from_ref(&envelope)).await?;
    info!("Feedback {} published as event {}", feedback.id, envelope.id);
    Ok(envelope)
}

/// Scores `message`, wraps it in a feedback event and publishes it.
///
/// Runs exactly one scoring call followed by one publish call. Collaborator errors
/// are returned as-is; nothing is retried.
///
/// # Returns
///
/// - `Ok(Feedback)`: The record that was published
/// - `Err(FeedbackError)`: Whatever the scorer or publisher failed with
pub async fn record_feedback(
    scorer: &dyn SentimentScorer,
    publisher: &dyn EventPublisher,
    message: &str,
) -> Result<Feedback, FeedbackError> {
    info!("Recording feedback: '{}'", sanitize_for_logging(message, 100));

    let feedback = score_feedback(scorer, message).await?;
    publish_feedback(publisher, &feedback).await?;
    Ok(feedback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingScorer, FixedScorer, RecordingPublisher, RejectingPublisher};

    #[test]
    fn test_threshold_is_exclusive() {
        assert_eq!(Sentiment::from_score(70), Sentiment::Negative);
        assert_eq!(Sentiment::from_score(71), Sentiment::Positive);
        assert_eq!(Sentiment::from_score(0), Sentiment::Negative);
        assert_eq!(Sentiment::from_score(100), Sentiment::Positive);
    }

    #[test]
    fn test_feedback_serializes_in_camel_case() {
        let feedback = Feedback::new("great talk", 93);
        let json = serde_json::to_value(&feedback).unwrap();
        assert_eq!(json["message"], "great talk");
        assert_eq!(json["score"], 93);
        assert_eq!(json["id"], feedback.id.to_string());
    }

    #[tokio::test]
    async fn test_record_feedback_publishes_one_event() {
        let scorer = FixedScorer(0.93);
        let publisher = RecordingPublisher::default();

        let feedback = record_feedback(&scorer, &publisher, "This is a very useful service")
            .await
            .unwrap();
        assert_eq!(feedback.score, 93);

        let published = publisher.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].event_type, "Positive");
        assert_eq!(published[0].data, feedback);
    }

    #[tokio::test]
    async fn test_scoring_failure_skips_publish() {
        let publisher = RecordingPublisher::default();
        let result = record_feedback(&FailingScorer, &publisher, "meh").await;

        assert!(matches!(result, Err(FeedbackError::ServiceUnavailable(_))));
        assert!(publisher.published().is_empty());
    }

    #[tokio::test]
    async fn test_score_feedback_does_not_publish() {
        let feedback = score_feedback(&FixedScorer(0.42), "so-so").await.unwrap();
        assert_eq!(feedback.score, 42);
        assert_eq!(feedback.message, "so-so");
        assert_eq!(feedback.sentiment(), Sentiment::Negative);
    }

    #[tokio::test]
    async fn test_publish_feedback_returns_sent_envelope() {
        let publisher = RecordingPublisher::default();
        let feedback = Feedback::new("loved it", 88);

        let envelope = publish_feedback(&publisher, &feedback).await.unwrap();
        assert_eq!(envelope.data, feedback);
        assert_eq!(envelope.event_type, "Positive");

        let published = publisher.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].id, envelope.id);
    }

    #[tokio::test]
    async fn test_publish_feedback_passes_rejection_through() {
        let feedback = Feedback::new("loved it", 88);
        let result = publish_feedback(&RejectingPublisher, &feedback).await;
        assert!(matches!(result, Err(FeedbackError::Publish { .. })));
    }
}
