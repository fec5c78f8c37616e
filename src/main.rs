//! # Feedback Grid
//!
//! A Rust web service that receives SMS feedback through a webhook, scores it with
//! the Text Analytics sentiment API and publishes the result to an Azure Event Grid
//! topic.
//!
//! ## Environment Variables
//!
//! - `TopicHostName`, `TopicKey`, `TextAnalyticsApiKey`: required
//! - `TextAnalyticsRegion`, `TopicPublishMode`, `TopicSasTtlHours`: optional
//! - `PORT`: Server port (defaults to 3000)
//!
//! ## API Endpoints
//!
//! - `GET /`: Returns a banner
//! - `GET /health`: Returns service health status
//! - `POST /api/SessionFeedback`: SMS webhook

use feedback_grid::{
    build_app, get_server_port, AppState, FeedbackConfig, GridPublisher, TextAnalyticsScorer,
};
use log::{error, info};
use std::net::SocketAddr;
use std::sync::Arc;

/// Main entry point for the feedback-grid web service.
///
/// Initializes logging, loads configuration (exiting if anything required is
/// missing), builds the collaborators and serves until Ctrl-C.
///
/// # Example Usage
///
/// ```bash
/// TopicHostName=mytopic.westus2-1.eventgrid.azure.net \
/// TopicKey=... TextAnalyticsApiKey=... \
/// RUST_LOG=info cargo run
/// ```
///
/// # Panics
///
/// This function will panic if the server port cannot be bound.
#[tokio::main]
async fn main() {
    // Initialize the logging system
    env_logger::init();

    let config = match FeedbackConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let publisher = match GridPublisher::from_config(&config) {
        Ok(publisher) => publisher,
        Err(e) => {
            error!("Failed to configure topic publisher: {}", e);
            std::process::exit(1);
        }
    };
    info!(
        "Publishing to {} using {:?}",
        publisher.endpoint(),
        publisher.mode()
    );

    let state = AppState::new(
        Arc::new(TextAnalyticsScorer::from_config(&config)),
        Arc::new(publisher),
    );
    let app = build_app(state);

    // Get the server port and bind address
    let port = get_server_port();
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();

    info!("Starting feedback-grid server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("HTTP server error: {}", e);
    }

    info!("Server stopped");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
