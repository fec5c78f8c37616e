//! SAS Token Utility
//!
//! This script builds an `aeg-sas-token` value for an Event Grid topic endpoint,
//! useful for publishing by hand with curl:
//!
//! ```bash
//! curl -X POST -H "aeg-sas-token: <token>" -d @events.json https://<topic>/api/events
//! ```

use chrono::Utc;
use std::io::{self, Write};

use feedback_grid::config::{parse_sas_ttl_hours, sas_ttl, MAX_SAS_TTL_HOURS};
use feedback_grid::publisher::topic_endpoint;
use feedback_grid::sas::{build_sas_token, format_expiration};

fn prompt(label: &str) -> io::Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut value = String::new();
    io::stdin().read_line(&mut value)?;
    Ok(value.trim().to_string())
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    println!("🔏 Event Grid SAS Token Utility");
    println!("===============================");
    println!();

    let host = prompt("Topic host name or endpoint: ")?;
    if host.is_empty() {
        eprintln!("❌ Error: Topic host cannot be empty");
        std::process::exit(1);
    }
    let endpoint = topic_endpoint(&host)?;

    let key = prompt("Topic key (base64): ")?;
    let hours = prompt("Valid for how many hours? [24]: ")?;
    let hours = if hours.is_empty() { Ok(24) } else { parse_sas_ttl_hours(&hours) };
    let expires = hours
        .and_then(sas_ttl)
        .ok()
        .and_then(|ttl| Utc::now().checked_add_signed(ttl));
    let Some(expires) = expires else {
        eprintln!("❌ Error: Hours must be a whole number from 1 to {}", MAX_SAS_TTL_HOURS);
        std::process::exit(1);
    };

    match build_sas_token(&endpoint, expires, &key) {
        Ok(token) => {
            println!();
            println!("✅ Token for {} (expires {} UTC):", endpoint, format_expiration(expires));
            println!();
            println!("{}", token);
        }
        Err(e) => {
            eprintln!("❌ Could not sign token: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
