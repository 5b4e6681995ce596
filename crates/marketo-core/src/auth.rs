//! Request signing for the Marketo authentication header
//!
//! Every call carries a fresh header: the signature is an HMAC-SHA1 over
//! `timestamp || access_id`, keyed with the secret key and hex-encoded. The
//! remote side rejects timestamps outside its tolerance window, so headers
//! are never cached or reused.

use crate::error::{MarketoError, Result};
use chrono::{DateTime, Local, TimeZone};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// ISO-8601 with a numeric offset, e.g. `2024-03-01T09:30:00+01:00`
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Contents of the `AuthenticationHeader` SOAP header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthHeader {
    pub mktows_user_id: String,
    pub request_signature: String,
    pub request_timestamp: String,
}

/// Sign a request with the current local time
pub fn sign_request(access_id: &str, secret_key: &str) -> Result<AuthHeader> {
    sign_request_with_clock(access_id, secret_key, &Local::now())
}

/// Sign a request at a given instant
pub fn sign_request_with_clock<Tz: TimeZone>(
    access_id: &str,
    secret_key: &str,
    now: &DateTime<Tz>,
) -> Result<AuthHeader>
where
    Tz::Offset: std::fmt::Display,
{
    let timestamp = now.format(TIMESTAMP_FORMAT).to_string();
    sign_request_at(access_id, secret_key, &timestamp)
}

/// Sign a request with an already formatted timestamp
pub fn sign_request_at(access_id: &str, secret_key: &str, timestamp: &str) -> Result<AuthHeader> {
    let signature = compute_signature(secret_key, &format!("{}{}", timestamp, access_id))?;

    log::debug!("Signed request for {} at {}", access_id, timestamp);

    Ok(AuthHeader {
        mktows_user_id: access_id.to_string(),
        request_signature: signature,
        request_timestamp: timestamp.to_string(),
    })
}

/// Lowercase hex HMAC-SHA1 of `message` keyed with `secret_key`
pub fn compute_signature(secret_key: &str, message: &str) -> Result<String> {
    let mut mac = HmacSha1::new_from_slice(secret_key.as_bytes())
        .map_err(|e| MarketoError::Config(format!("Invalid signing key: {}", e)))?;
    mac.update(message.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}
