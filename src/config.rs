//! Configuration module for the feedback-grid service.
//!
//! This module reads the topic and sentiment API settings from the process
//! environment once at startup and fails fast with a named error when something
//! required is missing, instead of letting the remote service reject the request later.

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::Duration;
use log::{debug, error, info, warn};
use std::env;

use crate::error::FeedbackError;

/// Topic host name, e.g. `mytopic.westus2-1.eventgrid.azure.net`.
pub const TOPIC_HOST_NAME_VAR: &str = "TopicHostName";
/// Base64 topic access key.
pub const TOPIC_KEY_VAR: &str = "TopicKey";
/// Text Analytics subscription key.
pub const TEXT_ANALYTICS_KEY_VAR: &str = "TextAnalyticsApiKey";
/// Text Analytics region (optional).
pub const TEXT_ANALYTICS_REGION_VAR: &str = "TextAnalyticsRegion";
/// `client` or `signed` (optional).
pub const PUBLISH_MODE_VAR: &str = "TopicPublishMode";
/// Lifetime of SAS tokens in hours (optional).
pub const SAS_TTL_HOURS_VAR: &str = "TopicSasTtlHours";

const DEFAULT_REGION: &str = "westus";
const DEFAULT_SAS_TTL_HOURS: i64 = 24;

/// Longest SAS token lifetime accepted, one year.
pub const MAX_SAS_TTL_HOURS: i64 = 8760;

/// How events are authenticated against the topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishMode {
    /// Send the raw topic key, as the vendor client does with topic credentials.
    Client,
    /// Send a SAS token signed with the topic key.
    SignedRequest,
}

impl PublishMode {
    fn parse(value: &str) -> Result<Self, FeedbackError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "client" | "sdk" | "key" => Ok(PublishMode::Client),
            "signed" | "sas" | "signed-request" => Ok(PublishMode::SignedRequest),
            other => Err(FeedbackError::InvalidConfiguration {
                name: PUBLISH_MODE_VAR,
                reason: format!(
                    "unknown publish mode '{}', expected 'client' or 'signed'",
                    other
                ),
            }),
        }
    }
}

/// Settings for the sentiment scorer and the topic publisher.
#[derive(Debug, Clone)]
pub struct FeedbackConfig {
    pub topic_host_name: String,
    pub topic_key: String,
    pub text_analytics_key: String,
    pub text_analytics_region: String,
    pub publish_mode: PublishMode,
    pub sas_ttl_hours: i64,
}

impl FeedbackConfig {
    /// Loads the configuration from environment variables.
    ///
    /// # Required Environment Variables
    ///
    /// - `TopicHostName`: Event Grid topic host name
    /// - `TopicKey`: Event Grid topic access key (base64)
    /// - `TextAnalyticsApiKey`: Text Analytics subscription key
    ///
    /// # Optional Environment Variables
    ///
    /// - `TextAnalyticsRegion`: Azure region of the Text Analytics resource (default `westus`)
    /// - `TopicPublishMode`: `client` (default) or `signed`
    /// - `TopicSasTtlHours`: SAS token lifetime in hours (default 24)
    ///
    /// # Returns
    ///
    /// - `Ok(FeedbackConfig)`: If every required value is present and usable
    /// - `Err(FeedbackError::MissingConfiguration)`: If a required value is absent or empty
    /// - `Err(FeedbackError::InvalidConfiguration)`: If an optional value cannot be parsed
    pub fn from_env() -> Result<Self, FeedbackError> {
        info!("Loading feedback configuration from environment variables");
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads the configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, FeedbackError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let topic_host_name = required(&lookup, TOPIC_HOST_NAME_VAR)?;
        let topic_key = required(&lookup, TOPIC_KEY_VAR)?;
        let text_analytics_key = required(&lookup, TEXT_ANALYTICS_KEY_VAR)?;

        debug!("Topic key (masked): {}", mask_secret(&topic_key));
        debug!(
            "Text Analytics key (masked): {}",
            mask_secret(&text_analytics_key)
        );

        let text_analytics_region = optional(&lookup, TEXT_ANALYTICS_REGION_VAR)
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        let publish_mode = match optional(&lookup, PUBLISH_MODE_VAR) {
            Some(value) => PublishMode::parse(&value)?,
            None => PublishMode::Client,
        };

        let sas_ttl_hours = match optional(&lookup, SAS_TTL_HOURS_VAR) {
            Some(value) => parse_sas_ttl_hours(&value)?,
            None => DEFAULT_SAS_TTL_HOURS,
        };

        if publish_mode == PublishMode::SignedRequest
            && STANDARD.decode(topic_key.trim()).is_err()
        {
            error!("{} is not valid base64, SAS tokens cannot be signed", TOPIC_KEY_VAR);
            return Err(FeedbackError::InvalidConfiguration {
                name: TOPIC_KEY_VAR,
                reason: "signed publishing requires a base64 topic key".to_string(),
            });
        }

        if topic_host_name.contains('<') || topic_host_name.contains('>') {
            warn!(
                "{} looks like a placeholder: {}",
                TOPIC_HOST_NAME_VAR, topic_host_name
            );
        }

        let config = FeedbackConfig {
            topic_host_name,
            topic_key,
            text_analytics_key,
            text_analytics_region,
            publish_mode,
            sas_ttl_hours,
        };

        info!(
            "Feedback configuration loaded: topic {}, region {}, mode {:?}",
            config.topic_host_name, config.text_analytics_region, config.publish_mode
        );

        Ok(config)
    }

    /// The SAS token lifetime as a duration.
    pub fn sas_ttl(&self) -> Result<Duration, FeedbackError> {
        sas_ttl(self.sas_ttl_hours)
    }
}

/// Parses a SAS token lifetime in hours, accepting 1 to `MAX_SAS_TTL_HOURS`.
pub fn parse_sas_ttl_hours(value: &str) -> Result<i64, FeedbackError> {
    match value.trim().parse::<i64>() {
        Ok(hours) => sas_ttl(hours).map(|_| hours),
        Err(_) => Err(FeedbackError::InvalidConfiguration {
            name: SAS_TTL_HOURS_VAR,
            reason: format!("'{}' is not a number of hours", value),
        }),
    }
}

/// Converts a lifetime in hours to a duration.
///
/// Values outside 1 to `MAX_SAS_TTL_HOURS` are rejected.
pub fn sas_ttl(hours: i64) -> Result<Duration, FeedbackError> {
    if !(1..=MAX_SAS_TTL_HOURS).contains(&hours) {
        return Err(FeedbackError::InvalidConfiguration {
            name: SAS_TTL_HOURS_VAR,
            reason: format!("{} hours is outside 1..={}", hours, MAX_SAS_TTL_HOURS),
        });
    }
    Duration::try_hours(hours).ok_or_else(|| FeedbackError::InvalidConfiguration {
        name: SAS_TTL_HOURS_VAR,
        reason: format!("{} hours cannot be represented", hours),
    })
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String, FeedbackError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => {
            info!("Found {} environment variable", name);
            Ok(value)
        }
        Some(_) => {
            error!("{} is set but empty", name);
            Err(FeedbackError::MissingConfiguration(name))
        }
        None => {
            error!("Make sure {} environment variable is set", name);
            Err(FeedbackError::MissingConfiguration(name))
        }
    }
}

fn optional<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).filter(|value| !value.trim().is_empty())
}

/// Masks a secret for logging, keeping at most 4 characters at each end.
pub(crate) fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    let len = chars.len();
    if len > 16 {
        let prefix: String = chars[..4].iter().collect();
        let suffix: String = chars[len - 4..].iter().collect();
        format!("{}...{}", prefix, suffix)
    } else if len > 8 {
        let prefix: String = chars[..4].iter().collect();
        format!("{}...", prefix)
    } else {
        "...".to_string()
    }
}

/// Gets the server port from environment variables or returns the default.
///
/// Reads `PORT` and parses it as a u16. If it is not set or cannot be parsed,
/// the default of 3000 is used.
///
/// # Example
///
/// ```rust
/// use feedback_grid::get_server_port;
///
/// let port = get_server_port();
/// assert!(port > 0);
/// ```
pub fn get_server_port() -> u16 {
    match env::var("PORT") {
        Ok(value) => value.parse().unwrap_or_else(|_| {
            warn!("PORT '{}' is not a valid port number, using 3000", value);
            3000
        }),
        Err(_) => 3000,
    }
}
