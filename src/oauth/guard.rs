//! Bearer-token guard middleware for the protected MCP route.
//!
//! Provides [`BearerGuardLayer`] and [`BearerGuardService`], a tower
//! `Layer`/`Service` pair that extracts and validates bearer tokens and
//! attaches an [`AccessTokenContext`] to accepted requests.
//!
//! The guard is composed onto the protected route only; discovery routes
//! such as the protected-resource metadata document stay outside it, so a
//! client can always learn where to obtain a token.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::{IntoResponse, Response};
use tower::Layer;

use super::error::AuthError;
use super::metadata::ProtectedResourceMetadata;
use super::scope::ScopePolicy;
use super::token::TokenValidator;

/// Tower layer that wraps the protected route with bearer-token validation.
///
/// # Example
///
/// ```rust
/// use mcp_gateway::oauth::{BearerGuardLayer, JwtValidator, ProtectedResourceMetadata};
///
/// let validator = JwtValidator::from_secret(b"shared-secret");
/// let metadata = ProtectedResourceMetadata::new("https://mcp.example.com/mcp")
///     .authorization_server("https://auth.example.com");
///
/// let layer = BearerGuardLayer::new(validator, metadata);
/// ```
#[derive(Clone)]
pub struct BearerGuardLayer<V: TokenValidator> {
    validator: V,
    metadata: ProtectedResourceMetadata,
    scope_policy: ScopePolicy,
}

impl<V: TokenValidator> BearerGuardLayer<V> {
    /// Create a new guard layer with the given token validator and metadata.
    pub fn new(validator: V, metadata: ProtectedResourceMetadata) -> Self {
        Self {
            validator,
            metadata,
            scope_policy: ScopePolicy::new(),
        }
    }

    /// Set the scope policy enforced after token validation.
    pub fn scope_policy(mut self, policy: ScopePolicy) -> Self {
        self.scope_policy = policy;
        self
    }
}

impl<S, V: TokenValidator> Layer<S> for BearerGuardLayer<V> {
    type Service = BearerGuardService<S, V>;

    fn layer(&self, inner: S) -> Self::Service {
        BearerGuardService {
            inner,
            validator: self.validator.clone(),
            metadata: self.metadata.clone(),
            scope_policy: self.scope_policy.clone(),
        }
    }
}

/// Tower service that validates bearer tokens on each request.
///
/// Created by [`BearerGuardLayer`]. For each incoming request:
///
/// 1. Extracts the `Authorization: Bearer <token>` header
/// 2. Validates the token via [`TokenValidator`]
/// 3. Checks the route's scope requirements via [`ScopePolicy`]
/// 4. On success, inserts [`AccessTokenContext`] into request extensions
///    and forwards to the inner service
/// 5. On failure, short-circuits with 401/403 and a `WWW-Authenticate`
///    challenge; the inner service never sees the request
#[derive(Clone)]
pub struct BearerGuardService<S, V: TokenValidator> {
    inner: S,
    validator: V,
    metadata: ProtectedResourceMetadata,
    scope_policy: ScopePolicy,
}

impl<S, V> tower_service::Service<Request<Body>> for BearerGuardService<S, V>
where
    S: tower_service::Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
    S::Error: Send,
    V: TokenValidator,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let path = req.uri().path().to_string();
        let validator = self.validator.clone();
        let metadata = self.metadata.clone();
        let scope_policy = self.scope_policy.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            // Absence, a malformed scheme, and an empty token all take the
            // same rejection path as an invalid token.
            let token = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty());

            let metadata_url = metadata.metadata_url();

            let Some(token) = token else {
                return Ok(reject(&AuthError::MissingToken, &metadata_url));
            };

            let context = match validator.validate_token(&token).await {
                Ok(context) => context,
                Err(error) => {
                    tracing::debug!(%error, "bearer guard rejected token");
                    return Ok(reject(&error, &metadata_url));
                }
            };

            if let Err(error) = scope_policy.check(&path, &context) {
                tracing::debug!(%error, subject = %context.subject, "scope check failed");
                return Ok(reject(&error, &metadata_url));
            }

            let mut req = req;
            req.extensions_mut().insert(context);
            inner.call(req).await
        })
    }
}

/// Build the rejection response for a failed check.
///
/// The body is uniform JSON carrying only the standard OAuth error code;
/// which validation step failed is visible to the server logs alone.
fn reject(error: &AuthError, resource_metadata_url: &str) -> Response {
    let status = match error.status_code() {
        403 => StatusCode::FORBIDDEN,
        _ => StatusCode::UNAUTHORIZED,
    };

    let body = serde_json::json!({
        "error": error.error_code().unwrap_or("unauthorized"),
    });

    let mut response = (status, axum::Json(body)).into_response();
    if let Ok(value) = error.www_authenticate(Some(resource_metadata_url)).parse() {
        response.headers_mut().insert("WWW-Authenticate", value);
    }
    response
}
