//! Signed session-identifier transport.
//!
//! The identifier sent to the client is `<id>.<sig>` where `sig` is the
//! base64url-encoded HMAC-SHA256 of the id under the server's session
//! secret. A cookie whose signature does not verify is treated exactly like
//! an absent cookie: the middleware issues a fresh session and never trusts
//! unsigned input.

use axum::http::HeaderMap;
use axum::http::header::COOKIE;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "sid";

/// Sign a session identifier for transmission to the client.
pub fn sign(id: &str, secret: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret).expect("HMAC accepts keys of any length");
    mac.update(id.as_bytes());
    let sig = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
    format!("{}.{}", id, sig)
}

/// Verify a transmitted cookie value and extract the session identifier.
///
/// Returns `None` for a missing separator, an undecodable signature, or a
/// signature mismatch. Verification is constant-time via the HMAC itself.
pub fn verify(value: &str, secret: &[u8]) -> Option<String> {
    let (id, sig) = value.rsplit_once('.')?;
    if id.is_empty() {
        return None;
    }
    let sig = URL_SAFE_NO_PAD.decode(sig).ok()?;

    let mut mac =
        HmacSha256::new_from_slice(secret).expect("HMAC accepts keys of any length");
    mac.update(id.as_bytes());
    mac.verify_slice(&sig).ok()?;
    Some(id.to_string())
}

/// Extract the raw session cookie value from the request headers.
pub fn from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == SESSION_COOKIE).then(|| value.to_string())
        })
        .next()
}

/// Build the `Set-Cookie` value for a freshly issued session.
pub fn set_cookie(signed: &str) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, signed)
}
