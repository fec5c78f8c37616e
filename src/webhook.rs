//! Inbound SMS webhook parsing and replies.
//!
//! The SMS provider posts the message as a URL-form-encoded body and expects a
//! TwiML document back, whose `<Message>` is sent to the user as a reply text.

use log::warn;
use std::collections::HashMap;

use crate::error::FeedbackError;

/// Form field holding the SMS text.
pub const MESSAGE_FIELD: &str = "Body";

/// Content type of the webhook reply.
pub const TWIML_CONTENT_TYPE: &str = "application/xml";

/// Extracts `field` from a URL-form-encoded body.
///
/// `+` decodes to a space, as in any HTML form submission.
///
/// # Returns
///
/// - `Ok(String)`: The decoded field value (may be empty if the sender sent `Body=`)
/// - `Err(FeedbackError::BadRequest)`: If the body is empty, not form-encoded, or lacks the field
pub fn extract_form_field(body: &str, field: &str) -> Result<String, FeedbackError> {
    if body.trim().is_empty() {
        warn!("Webhook request body is empty");
        return Err(FeedbackError::BadRequest("request body is empty".to_string()));
    }

    let mut form: HashMap<String, String> = serde_urlencoded::from_str(body)
        .map_err(|e| FeedbackError::BadRequest(format!("body is not form-encoded: {}", e)))?;

    form.remove(field).ok_or_else(|| {
        warn!("Webhook request has no '{}' field", field);
        FeedbackError::BadRequest(format!("missing form field '{}'", field))
    })
}

/// Builds the TwiML reply that texts `message` back to the sender.
///
/// # Example
///
/// ```rust
/// use feedback_grid::webhook::messaging_response;
///
/// let twiml = messaging_response("Your score: 93");
/// assert!(twiml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?><Response>"));
/// assert!(twiml.ends_with("<Message>Your score: 93</Message></Response>"));
/// ```
pub fn messaging_response(message: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?><Response><Message>{}</Message></Response>",
        xml_escape(message)
    )
}

/// Escapes XML special characters.
fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_body_field_from_sms_webhook() {
        let body = concat!(
            "ToCountry=US&SmsMessageSid=SM123",
            "&Body=Great+session%2C+thanks%21&From=%2B15555550100"
        );
        assert_eq!(
            extract_form_field(body, MESSAGE_FIELD).unwrap(),
            "Great session, thanks!"
        );
    }

    #[test]
    fn test_empty_body_is_bad_request() {
        assert!(matches!(
            extract_form_field("", MESSAGE_FIELD),
            Err(FeedbackError::BadRequest(_))
        ));
        assert!(matches!(
            extract_form_field("   ", MESSAGE_FIELD),
            Err(FeedbackError::BadRequest(_))
        ));
    }

    #[test]
    fn test_missing_field_is_bad_request() {
        assert!(matches!(
            extract_form_field("From=%2B15555550100", MESSAGE_FIELD),
            Err(FeedbackError::BadRequest(_))
        ));
    }

    #[test]
    fn test_field_name_is_case_sensitive() {
        assert!(extract_form_field("body=hello", MESSAGE_FIELD).is_err());
    }

    #[test]
    fn test_messaging_response_escapes_text() {
        assert_eq!(
            messaging_response("<3 & more"),
            concat!(
                "<?xml version=\"1.0\" encoding=\"utf-8\"?>",
                "<Response><Message>&lt;3 &amp; more</Message></Response>"
            )
        );
    }
}
