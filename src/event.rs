//! Event Grid event envelope.
//!
//! Both publish paths send the same envelope, serialized with the Event Grid
//! schema field names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::feedback::Feedback;

/// Subject attached to every feedback event.
pub const FEEDBACK_SUBJECT: &str = "eventgrid/demo/feedback";

/// Schema version of the `data` payload.
pub const DATA_VERSION: &str = "1.0";

/// A single event as accepted by an Event Grid topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope<T> {
    pub id: String,
    pub subject: String,
    pub event_type: String,
    pub data: T,
    pub event_time: DateTime<Utc>,
    pub data_version: String,
}

impl EventEnvelope<Feedback> {
    /// Wraps a feedback record, typed `Positive` or `Negative` by its score.
    pub fn feedback(feedback: Feedback) -> Self {
        EventEnvelope {
            id: Uuid::new_v4().to_string(),
            subject: FEEDBACK_SUBJECT.to_string(),
            event_type: feedback.sentiment().as_event_type().to_string(),
            data: feedback,
            event_time: Utc::now(),
            data_version: DATA_VERSION.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feedback_envelope_fields() {
        let feedback = Feedback::new("too long", 12);
        let envelope = EventEnvelope::feedback(feedback.clone());

        assert_eq!(envelope.subject, "eventgrid/demo/feedback");
        assert_eq!(envelope.event_type, "Negative");
        assert_eq!(envelope.data_version, "1.0");
        assert_eq!(envelope.data, feedback);
        assert_ne!(envelope.id, feedback.id.to_string());
    }

    #[test]
    fn test_envelope_uses_event_grid_field_names() {
        let envelope = EventEnvelope::feedback(Feedback::new("loved it", 99));
        let json = serde_json::to_value(&envelope).unwrap();

        for field in ["id", "subject", "eventType", "data", "eventTime", "dataVersion"] {
            assert!(json.get(field).is_some(), "missing field {}", field);
        }
        assert_eq!(json["eventType"], "Positive");
        assert!(json["eventTime"].as_str().unwrap().ends_with('Z'));
    }
}
