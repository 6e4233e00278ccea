//! Authenticated transport handshake for the Spark endpoint.
//!
//! The service authenticates each connection through a signed URL:
//!
//! 1. Build the canonical string `host: {host}\ndate: {date}\nGET {path} HTTP/1.1`
//!    with an RFC-1123 GMT timestamp.
//! 2. Compute `HMAC-SHA256(api_secret, canonical)` and base64-encode it.
//! 3. Assemble the authorization value naming the key, algorithm, and
//!    signed header list, and base64-encode the whole value.
//! 4. Append `authorization`, `date`, and `host` as query parameters.
//!
//! The timestamp MUST be reused byte-for-byte in the signed string, the
//! `date` query parameter, and the outgoing `X-Date` header -- any
//! mismatch invalidates the signature.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use url::Url;

use crate::error::{Result, SparkError};

type HmacSha256 = Hmac<Sha256>;

/// A signed connection URL plus the exact timestamp embedded in its
/// signature.
#[derive(Debug, Clone)]
pub struct SignedUrl {
    /// The endpoint URL with authentication query parameters appended.
    pub url: String,
    /// The RFC-1123 GMT timestamp the signature covers. Must be sent
    /// unchanged as the connection's `X-Date` header.
    pub date: String,
    /// The host value the signature covers (includes a port when the
    /// endpoint names one explicitly).
    pub host: String,
}

/// Sign the endpoint URL with the current GMT time.
pub fn sign_url(endpoint: &str, api_key: &str, api_secret: &str) -> Result<SignedUrl> {
    sign_url_at(endpoint, api_key, api_secret, &rfc1123_now())
}

/// Sign the endpoint URL with an explicit timestamp.
///
/// Split out from [`sign_url`] so signing is deterministic under test.
pub fn sign_url_at(
    endpoint: &str,
    api_key: &str,
    api_secret: &str,
    date: &str,
) -> Result<SignedUrl> {
    let parsed =
        Url::parse(endpoint).map_err(|e| SparkError::InvalidEndpoint(format!("{endpoint}: {e}")))?;
    let host_name = parsed
        .host_str()
        .ok_or_else(|| SparkError::InvalidEndpoint(format!("{endpoint}: no host")))?;
    let host = match parsed.port() {
        Some(port) => format!("{host_name}:{port}"),
        None => host_name.to_string(),
    };
    let path = parsed.path();

    let canonical = format!("host: {host}\ndate: {date}\nGET {path} HTTP/1.1");

    let mut mac = HmacSha256::new_from_slice(api_secret.as_bytes())
        .map_err(|e| SparkError::InvalidEndpoint(format!("bad secret: {e}")))?;
    mac.update(canonical.as_bytes());
    let signature = BASE64.encode(mac.finalize().into_bytes());

    let authorization_origin = format!(
        "api_key=\"{api_key}\", algorithm=\"hmac-sha256\", \
         headers=\"host date request-line\", signature=\"{signature}\""
    );
    let authorization = BASE64.encode(authorization_origin.as_bytes());

    let mut signed = parsed;
    signed
        .query_pairs_mut()
        .append_pair("authorization", &authorization)
        .append_pair("date", date)
        .append_pair("host", &host);

    Ok(SignedUrl {
        url: signed.to_string(),
        date: date.to_string(),
        host,
    })
}

/// The current time as an RFC-1123 GMT string, e.g.
/// `Mon, 01 Jan 2024 12:00:00 GMT`.
pub fn rfc1123_now() -> String {
    chrono::Utc::now()
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

/// Absolute clock skew in seconds between two RFC-1123 timestamps.
///
/// Returns `None` when either timestamp does not parse. Used to
/// diagnose handshake rejections: skew beyond the server's tolerance
/// invalidates otherwise-correct signatures.
pub fn skew_seconds(client_date: &str, server_date: &str) -> Option<i64> {
    let client = chrono::DateTime::parse_from_rfc2822(client_date).ok()?;
    let server = chrono::DateTime::parse_from_rfc2822(server_date).ok()?;
    Some((client.timestamp() - server.timestamp()).abs())
}
