//! Access-token validation for the gateway.
//!
//! Provides the [`TokenValidator`] trait for pluggable token validation,
//! [`JwtValidator`] for JWT validation with static keys, and the
//! [`AccessTokenContext`] attached to requests that pass the bearer guard.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use super::error::AuthError;

/// Result of a successful token validation, attached to the request's
/// extensions for exactly the duration of that request.
///
/// Present on a request if and only if the bearer guard accepted it.
/// Immutable once attached.
#[derive(Clone)]
pub struct AccessTokenContext {
    /// Identifier of the authenticated principal (opaque).
    pub subject: String,
    /// Scopes granted to the token.
    pub scopes: HashSet<String>,
    /// Absolute expiry instant, absent when the token carries no `exp`.
    pub expires_at: Option<SystemTime>,
    /// The original token string, retained only for downstream pass-through.
    raw: String,
}

impl AccessTokenContext {
    /// Create a context from validated claim values.
    pub fn new(
        subject: impl Into<String>,
        scopes: impl IntoIterator<Item = impl Into<String>>,
        expires_at: Option<SystemTime>,
        raw: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            scopes: scopes.into_iter().map(Into::into).collect(),
            expires_at,
            raw: raw.into(),
        }
    }

    /// Check if the token was granted a specific scope.
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }

    /// The original bearer token, for pass-through to downstream services.
    ///
    /// Never log the returned value.
    pub fn raw_token(&self) -> &str {
        &self.raw
    }
}

// The raw token must not leak through Debug output or tracing fields.
impl fmt::Debug for AccessTokenContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessTokenContext")
            .field("subject", &self.subject)
            .field("scopes", &self.scopes)
            .field("expires_at", &self.expires_at)
            .field("raw", &"[REDACTED]")
            .finish()
    }
}

/// Claims decoded out of a JWT before they are shaped into an
/// [`AccessTokenContext`]. Audience and issuer checks run inside
/// `jsonwebtoken` against the raw payload, so only the claims the gateway
/// extracts appear here.
#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    exp: Option<u64>,
    #[serde(default)]
    scope: Option<String>,
}

impl Claims {
    fn scopes(&self) -> HashSet<String> {
        self.scope
            .as_deref()
            .unwrap_or("")
            .split_whitespace()
            .map(String::from)
            .collect()
    }

    fn expires_at(&self) -> Option<SystemTime> {
        self.exp.map(|exp| UNIX_EPOCH + Duration::from_secs(exp))
    }
}

/// Trait for validating bearer tokens.
///
/// Implement this trait to provide custom validation logic (JWT
/// verification, token introspection, opaque token lookup).
///
/// # Example
///
/// ```rust
/// use mcp_gateway::oauth::{TokenValidator, AccessTokenContext, AuthError};
///
/// #[derive(Clone)]
/// struct MyValidator;
///
/// impl TokenValidator for MyValidator {
///     async fn validate_token(&self, token: &str) -> Result<AccessTokenContext, AuthError> {
///         // Custom validation logic here
///         # todo!()
///     }
/// }
/// ```
pub trait TokenValidator: Clone + Send + Sync + 'static {
    /// Validate a bearer token and return the extracted context.
    fn validate_token(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<AccessTokenContext, AuthError>> + Send;
}

/// JWT token validator using static keys.
///
/// Validates JWTs using pre-configured decoding keys via the `jsonwebtoken`
/// crate. Supports HMAC and RSA algorithms.
///
/// # Example
///
/// ```rust
/// use mcp_gateway::oauth::JwtValidator;
///
/// let validator = JwtValidator::from_secret(b"shared-secret")
///     .expected_audience("https://mcp.example.com")
///     .expected_issuer("https://auth.example.com");
/// ```
#[derive(Clone)]
pub struct JwtValidator {
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
}

impl JwtValidator {
    /// Create a default `Validation` with audience validation disabled.
    ///
    /// `jsonwebtoken::Validation` requires an `aud` claim by default; callers
    /// opt in via [`expected_audience`](Self::expected_audience). Likewise
    /// `exp` is not required to be present, but is checked when it is.
    fn default_validation(algorithm: Algorithm) -> Validation {
        let mut validation = Validation::new(algorithm);
        validation.validate_aud = false;
        validation.required_spec_claims.clear();
        validation
    }

    /// Create a validator from an HMAC secret.
    pub fn from_secret(secret: &[u8]) -> Self {
        let decoding_key = Arc::new(DecodingKey::from_secret(secret));
        let validation = Arc::new(Self::default_validation(Algorithm::HS256));
        Self {
            decoding_key,
            validation,
        }
    }

    /// Create a validator from an RSA PEM-encoded public key.
    ///
    /// # Errors
    ///
    /// Returns an error if the PEM data is invalid.
    pub fn from_rsa_pem(pem: &[u8]) -> Result<Self, jsonwebtoken::errors::Error> {
        let decoding_key = Arc::new(DecodingKey::from_rsa_pem(pem)?);
        let validation = Arc::new(Self::default_validation(Algorithm::RS256));
        Ok(Self {
            decoding_key,
            validation,
        })
    }

    /// Set the expected audience for token validation.
    ///
    /// Tokens without a matching `aud` claim will be rejected.
    pub fn expected_audience(mut self, audience: &str) -> Self {
        let mut validation = (*self.validation).clone();
        validation.set_audience(&[audience]);
        self.validation = Arc::new(validation);
        self
    }

    /// Set the expected issuer for token validation.
    ///
    /// Tokens without a matching `iss` claim will be rejected.
    pub fn expected_issuer(mut self, issuer: &str) -> Self {
        let mut validation = (*self.validation).clone();
        validation.set_issuer(&[issuer]);
        self.validation = Arc::new(validation);
        self
    }

    /// Disable expiration validation.
    ///
    /// Use with caution -- tokens without expiration checks may be reused
    /// indefinitely.
    pub fn disable_exp_validation(mut self) -> Self {
        let mut validation = (*self.validation).clone();
        validation.validate_exp = false;
        self.validation = Arc::new(validation);
        self
    }
}

impl TokenValidator for JwtValidator {
    async fn validate_token(&self, token: &str) -> Result<AccessTokenContext, AuthError> {
        let token_data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!(reason = %e, "token validation failed");
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                    jsonwebtoken::errors::ErrorKind::InvalidAudience => AuthError::InvalidAudience,
                    _ => AuthError::InvalidToken,
                }
            })?;

        let claims = token_data.claims;
        let Some(subject) = claims.sub.clone() else {
            tracing::debug!("token has no sub claim");
            return Err(AuthError::InvalidToken);
        };

        Ok(AccessTokenContext::new(
            subject,
            claims.scopes(),
            claims.expires_at(),
            token,
        ))
    }
}

/// Validator that accepts a static set of opaque tokens.
///
/// Each accepted token maps to a subject and a space-delimited scope string.
/// Intended for development and tests; production deployments validate
/// tokens issued by the authorization server instead.
#[derive(Clone, Default)]
pub struct StaticTokenValidator {
    tokens: Arc<HashMap<String, (String, String)>>,
}

impl StaticTokenValidator {
    /// Create an empty validator that rejects everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a token for the given subject with the given scopes.
    pub fn accept(
        mut self,
        token: impl Into<String>,
        subject: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        Arc::make_mut(&mut self.tokens).insert(token.into(), (subject.into(), scope.into()));
        self
    }
}

impl TokenValidator for StaticTokenValidator {
    async fn validate_token(&self, token: &str) -> Result<AccessTokenContext, AuthError> {
        match self.tokens.get(token) {
            Some((subject, scope)) => Ok(AccessTokenContext::new(
                subject.clone(),
                scope.split_whitespace().map(String::from),
                None,
                token,
            )),
            None => Err(AuthError::InvalidToken),
        }
    }
}
