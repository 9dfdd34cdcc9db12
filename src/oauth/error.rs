//! Authentication errors and WWW-Authenticate challenge construction.
//!
//! Implements the challenge format of RFC 6750 Section 3, including the
//! `resource_metadata` parameter from RFC 9728 so rejected clients can
//! discover the authorization server.

use std::fmt;

/// Reason a bearer-token check failed.
///
/// The distinction between variants exists for server-side logging and for
/// choosing the HTTP status code. Client-visible output is deliberately
/// uniform: every token defect surfaces as `error="invalid_token"` and a
/// generic body, so the response never reveals which validation step failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No `Authorization: Bearer` credential was presented.
    /// The challenge carries no `error` code per RFC 6750 Section 3.
    MissingToken,

    /// The token is malformed or its signature does not verify.
    InvalidToken,

    /// The token's `exp` claim is in the past.
    ExpiredToken,

    /// The token's `aud` claim does not cover this resource server.
    InvalidAudience,

    /// The token is valid but lacks a required scope.
    /// Returns HTTP 403 with `error="insufficient_scope"`.
    InsufficientScope {
        /// Scopes the operation requires.
        required: Vec<String>,
    },
}

impl AuthError {
    /// HTTP status code for this error: 403 for authorization failures,
    /// 401 for everything else.
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::InsufficientScope { .. } => 403,
            _ => 401,
        }
    }

    /// Standard OAuth error code for the `WWW-Authenticate` challenge,
    /// or `None` when no credential was presented at all.
    pub fn error_code(&self) -> Option<&'static str> {
        match self {
            AuthError::MissingToken => None,
            AuthError::InsufficientScope { .. } => Some("insufficient_scope"),
            _ => Some("invalid_token"),
        }
    }

    /// Build the `WWW-Authenticate` header value.
    ///
    /// Includes `resource_metadata` (RFC 9728) when a URL is provided, the
    /// standard `error` code, and for insufficient scope the `scope`
    /// parameter listing what the operation requires. No other detail is
    /// exposed.
    pub fn www_authenticate(&self, resource_metadata_url: Option<&str>) -> String {
        let mut parts = Vec::new();

        if let Some(url) = resource_metadata_url {
            parts.push(format!("resource_metadata=\"{}\"", url));
        }

        if let Some(code) = self.error_code() {
            parts.push(format!("error=\"{}\"", code));
        }

        if let AuthError::InsufficientScope { required } = self {
            if !required.is_empty() {
                let mut scopes = required.clone();
                scopes.sort();
                parts.push(format!("scope=\"{}\"", scopes.join(" ")));
            }
        }

        if parts.is_empty() {
            "Bearer".to_string()
        } else {
            format!("Bearer {}", parts.join(", "))
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::MissingToken => write!(f, "missing bearer token"),
            AuthError::InvalidToken => write!(f, "invalid token"),
            AuthError::ExpiredToken => write!(f, "token has expired"),
            AuthError::InvalidAudience => write!(f, "token audience does not match this resource"),
            AuthError::InsufficientScope { required } => {
                write!(f, "insufficient scope: requires [{}]", required.join(", "))
            }
        }
    }
}

impl std::error::Error for AuthError {}
