//! HTTP route handlers for the feedback-grid service.
//!
//! This module contains the HTTP route handler functions and the router that
//! wires them to the scoring and publishing collaborators.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use log::{error, info, warn};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::error::FeedbackError;
use crate::feedback::record_feedback;
use crate::publisher::EventPublisher;
use crate::sentiment::SentimentScorer;
use crate::webhook::{extract_form_field, messaging_response, MESSAGE_FIELD, TWIML_CONTENT_TYPE};

/// Route the SMS provider is configured to call.
pub const FEEDBACK_ROUTE: &str = "/api/SessionFeedback";

/// Collaborators shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub scorer: Arc<dyn SentimentScorer>,
    pub publisher: Arc<dyn EventPublisher>,
}

impl AppState {
    pub fn new(scorer: Arc<dyn SentimentScorer>, publisher: Arc<dyn EventPublisher>) -> Self {
        AppState { scorer, publisher }
    }
}

/// Builds the application router with all routes.
///
/// - `GET /`: Banner
/// - `GET /health`: Health check
/// - `POST /api/SessionFeedback`: SMS webhook
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .route(FEEDBACK_ROUTE, post(handle_session_feedback))
        .with_state(state)
}

/// The router with HTTP request tracing, as served by the binary.
pub fn build_app(state: AppState) -> Router {
    build_router(state).layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

/// Handles GET requests to the root `/` endpoint.
pub async fn handle_root() -> &'static str {
    "feedback-grid: text your feedback, get a score"
}

/// Handles GET requests to the `/health` endpoint.
///
/// # Example Response
///
/// ```json
/// {
///   "status": "healthy",
///   "service": "feedback-grid"
/// }
/// ```
pub async fn handle_health() -> Json<Value> {
    Json(json!({"status": "healthy", "service": "feedback-grid"}))
}

/// Handles POST requests from the SMS webhook.
///
/// Reads the `Body` form field, scores it, publishes the feedback event and replies
/// with TwiML so the sender receives their score as a text message.
///
/// # Responses
///
/// - `200`: TwiML `<Message>Your score: N</Message>`
/// - `400`: Empty body or missing `Body` field (empty response body)
/// - `429`: The sentiment or topic quota is exhausted
/// - `503`: The sentiment service or topic is unreachable
/// - `500`: Any other failure
pub async fn handle_session_feedback(State(state): State<AppState>, body: String) -> Response {
    info!("Session feedback webhook triggered");

    let message = match extract_form_field(&body, MESSAGE_FIELD) {
        Ok(message) => message,
        Err(e) => return error_response(e),
    };

    match record_feedback(state.scorer.as_ref(), state.publisher.as_ref(), &message).await {
        Ok(feedback) => {
            info!("Replying with score {} for feedback {}", feedback.score, feedback.id);
            let twiml = messaging_response(&format!("Your score: {}", feedback.score));
            ([(header::CONTENT_TYPE, TWIML_CONTENT_TYPE)], twiml).into_response()
        }
        Err(e) => error_response(e),
    }
}

fn error_response(err: FeedbackError) -> Response {
    let status = match &err {
        FeedbackError::BadRequest(reason) => {
            warn!("Rejecting webhook request: {}", reason);
            return StatusCode::BAD_REQUEST.into_response();
        }
        FeedbackError::QuotaExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
        FeedbackError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    error!("Failed to record feedback: {}", err);
    (
        status,
        Json(json!({
            "status": "error",
            "message": "Failed to record feedback",
            "error": err.to_string()
        })),
    )
        .into_response()
}
