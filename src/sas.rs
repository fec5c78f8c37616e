//! Shared Access Signature (SAS) tokens for Event Grid topics.
//!
//! A topic accepts either its raw key in the `aeg-sas-key` header or a SAS token in
//! the `aeg-sas-token` header. The token lets a publisher authenticate without handing
//! the key itself to the request, and is built as:
//!
//! ```text
//! r=<url-encoded resource>&e=<url-encoded expiration>&s=<url-encoded base64 HMAC-SHA256>
//! ```
//!
//! The signature covers exactly the `r=...&e=...` prefix as transmitted, so a verifier
//! holding the same key can recompute it from the token alone.
//!
//! Encoding here is RFC 3986 style (uppercase hex, space as `%20`). .NET's
//! `HttpUtility.UrlEncode` emits lowercase hex and `+` for space, so tokens from the two
//! differ textually. Both verify, since the verifier signs the fields as transmitted.

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use log::debug;
use sha2::Sha256;

use crate::error::SasError;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying a SAS token on a publish request.
pub const SAS_TOKEN_HEADER: &str = "aeg-sas-token";

/// Header carrying the raw topic key on a publish request.
pub const SAS_KEY_HEADER: &str = "aeg-sas-key";

const RESOURCE_FIELD: &str = "r";
const EXPIRATION_FIELD: &str = "e";
const SIGNATURE_FIELD: &str = "s";

/// Invariant-culture date-time layout understood by the topic, e.g. `01/31/2026 13:05:00`.
const EXPIRATION_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

/// Formats an expiration instant in the fixed, locale-independent form used in tokens.
///
/// # Example
///
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use feedback_grid::sas::format_expiration;
///
/// let at = Utc.with_ymd_and_hms(2026, 1, 31, 13, 5, 0).unwrap();
/// assert_eq!(format_expiration(at), "01/31/2026 13:05:00");
/// ```
pub fn format_expiration(expiration_utc: DateTime<Utc>) -> String {
    expiration_utc.format(EXPIRATION_FORMAT).to_string()
}

/// Builds the unsigned part of a token: `r=<resource>&e=<expiration>`, both percent-encoded.
pub fn unsigned_message(resource_path: &str, expiration_utc: DateTime<Utc>) -> String {
    let encoded_resource = urlencoding::encode(resource_path);
    let expiration = format_expiration(expiration_utc);
    let encoded_expiration = urlencoding::encode(&expiration);

    format!(
        "{}={}&{}={}",
        RESOURCE_FIELD, encoded_resource, EXPIRATION_FIELD, encoded_expiration
    )
}

/// Builds a signed SAS token for a topic endpoint.
///
/// # Parameters
///
/// - `resource_path`: The topic endpoint URL the token authorizes
/// - `expiration_utc`: When the token stops being accepted (not checked here)
/// - `shared_key`: The base64-encoded topic key
///
/// # Returns
///
/// - `Ok(String)`: The token, ready to be used as the `aeg-sas-token` header value
/// - `Err(SasError::InvalidKeyFormat)`: If `shared_key` is not valid base64 or is empty
///
/// # Example
///
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use feedback_grid::sas::build_sas_token;
///
/// let expires = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
/// let token = build_sas_token(
///     "https://example.eventgrid.azure.net/api/events",
///     expires,
///     "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=",
/// )
/// .unwrap();
/// assert!(token.starts_with("r=https%3A%2F%2Fexample"));
/// ```
pub fn build_sas_token(
    resource_path: &str,
    expiration_utc: DateTime<Utc>,
    shared_key: &str,
) -> Result<String, SasError> {
    let key = decode_key(shared_key)?;
    let unsigned = unsigned_message(resource_path, expiration_utc);

    let signature = STANDARD.encode(sign(&key, &unsigned)?);
    let encoded_signature = urlencoding::encode(&signature);

    debug!(
        "Built SAS token for {} expiring {}",
        resource_path,
        format_expiration(expiration_utc)
    );

    Ok(format!("{}&{}={}", unsigned, SIGNATURE_FIELD, encoded_signature))
}

/// Checks that a token's signature matches its own `r=` and `e=` fields under `shared_key`.
///
/// Expiry is not checked; that is the receiving service's call.
///
/// # Returns
///
/// - `Ok(true)`: The signature matches
/// - `Ok(false)`: The signature does not match (or is not base64 at all)
/// - `Err(...)`: The key is unusable or the token is not shaped like a SAS token
pub fn verify_sas_token(token: &str, shared_key: &str) -> Result<bool, SasError> {
    let key = decode_key(shared_key)?;
    let parsed = SasToken::parse(token)?;

    let signature = match STANDARD.decode(parsed.signature.as_bytes()) {
        Ok(bytes) => bytes,
        Err(_) => return Ok(false),
    };

    let mut mac = HmacSha256::new_from_slice(&key)
        .map_err(|e| SasError::InvalidKeyFormat(e.to_string()))?;
    mac.update(parsed.unsigned_message().as_bytes());
    Ok(mac.verify_slice(&signature).is_ok())
}

/// A SAS token split into its fields.
///
/// The `encoded_*` fields are kept byte-for-byte as transmitted, because the signature
/// is computed over them rather than over the decoded values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SasToken {
    pub encoded_resource: String,
    pub encoded_expiration: String,
    pub encoded_signature: String,
    /// Decoded resource URL
    pub resource: String,
    /// Decoded expiration, in the `MM/dd/yyyy HH:mm:ss` form
    pub expiration: String,
    /// Decoded base64 signature
    pub signature: String,
}

impl SasToken {
    /// Parses `r=...&e=...&s=...`. Field names and order are fixed.
    pub fn parse(token: &str) -> Result<Self, SasError> {
        let parts: Vec<&str> = token.split('&').collect();
        if parts.len() != 3 {
            return Err(SasError::MalformedToken(format!(
                "expected 3 fields, found {}",
                parts.len()
            )));
        }

        let encoded_resource = field_value(parts[0], RESOURCE_FIELD)?;
        let encoded_expiration = field_value(parts[1], EXPIRATION_FIELD)?;
        let encoded_signature = field_value(parts[2], SIGNATURE_FIELD)?;

        Ok(SasToken {
            resource: decode_field(encoded_resource)?,
            expiration: decode_field(encoded_expiration)?,
            signature: decode_field(encoded_signature)?,
            encoded_resource: encoded_resource.to_string(),
            encoded_expiration: encoded_expiration.to_string(),
            encoded_signature: encoded_signature.to_string(),
        })
    }

    /// The signed prefix, reconstructed exactly as it was transmitted.
    pub fn unsigned_message(&self) -> String {
        format!(
            "{}={}&{}={}",
            RESOURCE_FIELD, self.encoded_resource, EXPIRATION_FIELD, self.encoded_expiration
        )
    }
}

fn decode_key(shared_key: &str) -> Result<Vec<u8>, SasError> {
    let key = STANDARD
        .decode(shared_key.trim())
        .map_err(|e| SasError::InvalidKeyFormat(e.to_string()))?;
    if key.is_empty() {
        return Err(SasError::InvalidKeyFormat("key is empty".to_string()));
    }
    Ok(key)
}

fn sign(key: &[u8], message: &str) -> Result<Vec<u8>, SasError> {
    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|e| SasError::InvalidKeyFormat(e.to_string()))?;
    mac.update(message.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

fn field_value<'a>(part: &'a str, name: &str) -> Result<&'a str, SasError> {
    part.strip_prefix(name)
        .and_then(|rest| rest.strip_prefix('='))
        .ok_or_else(|| SasError::MalformedToken(format!("expected field '{}'", name)))
}

fn decode_field(encoded: &str) -> Result<String, SasError> {
    urlencoding::decode(encoded)
        .map(|value| value.into_owned())
        .map_err(|e| SasError::EncodingError(e.to_string()))
}
