//! Console Feedback Publisher
//!
//! This script runs the same score-then-publish flow as the webhook, using a
//! hardcoded message instead of an SMS. It reads the same environment variables
//! as the server, so `TopicPublishMode=signed` exercises the SAS token path.

use feedback_grid::{
    publish_feedback, score_feedback, FeedbackConfig, GridPublisher, TextAnalyticsScorer,
};

const MESSAGE: &str = "This is a very useful service";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::init();

    println!("📨 Feedback Publisher");
    println!("=====================");

    let config = match FeedbackConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e);
            eprintln!();
            eprintln!("Set TopicHostName, TopicKey and TextAnalyticsApiKey, then try again.");
            std::process::exit(1);
        }
    };

    let scorer = TextAnalyticsScorer::from_config(&config);
    let publisher = GridPublisher::from_config(&config)?;
    println!("📍 Topic endpoint: {}", publisher.endpoint());
    println!("🔐 Publish mode: {:?}", publisher.mode());
    println!("📝 Message: {}", MESSAGE);

    let feedback = score_feedback(&scorer, MESSAGE).await?;
    println!("Score: {}", feedback.score);
    println!("Sending message...");

    let event = match publish_feedback(&publisher, &feedback).await {
        Ok(event) => event,
        Err(e) => {
            eprintln!("💥 Failed to publish feedback: {}", e);
            return Err(e.into());
        }
    };

    println!("Message sent");
    println!(
        "🆔 Feedback {} published as {} event {}",
        feedback.id, event.event_type, event.id
    );

    Ok(())
}
