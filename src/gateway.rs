//! Route composition for the protected MCP service.
//!
//! [`Gateway`] binds the pieces into one `axum::Router`:
//!
//! - the session middleware wraps every route, so each request resolves its
//!   session before anything else runs;
//! - the bearer guard wraps only the protected MCP route;
//! - the protected-resource metadata document is served unauthenticated at
//!   its well-known path.
//!
//! Per request the lifecycle is session resolution, then (on the protected
//! route) the token check, then dispatch. A guard rejection short-circuits
//! before dispatch; nothing outlives the request except the session record
//! written back to the store.

use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use tower_http::trace::TraceLayer;

use crate::config::GatewayConfig;
use crate::error::{Error, JsonRpcError, Result};
use crate::mcp::{JsonRpcRequest, McpHandler};
use crate::oauth::{
    AccessTokenContext, BearerGuardLayer, ProtectedResourceMetadata, ScopePolicy, TokenValidator,
};
use crate::session::{MemoryStore, SessionLayer, SessionStore};

/// Builder wiring guard, session middleware, metadata responder, and MCP
/// dispatch into one HTTP application.
///
/// # Example
///
/// ```rust,no_run
/// use mcp_gateway::{Gateway, GatewayConfig, oauth::JwtValidator};
///
/// # fn example(config: GatewayConfig) -> Result<(), mcp_gateway::Error> {
/// let validator = JwtValidator::from_secret(config.token_secret.as_bytes())
///     .expected_issuer(config.issuer.as_str());
///
/// let app = Gateway::new(config, validator).into_router()?;
/// # Ok(()) }
/// ```
pub struct Gateway<V: TokenValidator> {
    config: GatewayConfig,
    validator: V,
    store: Arc<dyn SessionStore>,
    scope_policy: ScopePolicy,
}

impl<V: TokenValidator> Gateway<V> {
    /// Create a gateway over the given configuration and token validator,
    /// with an in-memory session store.
    pub fn new(config: GatewayConfig, validator: V) -> Self {
        Self {
            config,
            validator,
            store: Arc::new(MemoryStore::new()),
            scope_policy: ScopePolicy::new(),
        }
    }

    /// Inject a session store backend, replacing the in-memory default.
    pub fn session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = store;
        self
    }

    /// Set the scope policy enforced by the bearer guard.
    pub fn scope_policy(mut self, policy: ScopePolicy) -> Self {
        self.scope_policy = policy;
        self
    }

    /// Build the axum router.
    ///
    /// Fails only on invalid configuration, before any request is served.
    pub fn into_router(self) -> Result<Router> {
        let metadata = self.config.metadata()?;
        // Serialized once so repeated reads are byte-identical.
        let metadata_body: Arc<str> = serde_json::to_string(&metadata)?.into();
        let well_known =
            ProtectedResourceMetadata::well_known_path(&self.config.resource_path);

        let state = AppState {
            metadata_body,
            mcp: McpHandler::new(&self.config.server_name, &self.config.server_version),
        };

        let guard =
            BearerGuardLayer::new(self.validator, metadata).scope_policy(self.scope_policy);
        let session = SessionLayer::new(self.store, self.config.session_secret.as_bytes());

        let protected = Router::new()
            .route(&self.config.resource_path, any(handle_mcp))
            .route_layer(guard);

        let router = protected
            .route(&well_known, get(serve_metadata))
            .with_state(state)
            .layer(session)
            .layer(TraceLayer::new_for_http());

        Ok(router)
    }

    /// Bind and serve on the configured port.
    pub async fn serve(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.config.port);
        let router = self.into_router()?;

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::Transport(format!("failed to bind to {}: {}", addr, e)))?;

        tracing::info!(%addr, "mcp-server listening");

        axum::serve(listener, router)
            .await
            .map_err(|e| Error::Transport(format!("server error: {}", e)))?;

        Ok(())
    }
}

#[derive(Clone)]
struct AppState {
    metadata_body: Arc<str>,
    mcp: McpHandler,
}

/// Serve the protected-resource metadata document.
///
/// Unauthenticated: a client must be able to discover the authorization
/// server before it holds a token.
async fn serve_metadata(State(state): State<AppState>) -> Response {
    (
        [(header::CONTENT_TYPE, "application/json")],
        state.metadata_body.to_string(),
    )
        .into_response()
}

/// Forward a guarded request to MCP dispatch.
///
/// The guard has already attached the [`AccessTokenContext`]; this handler
/// runs only for accepted requests.
async fn handle_mcp(
    State(state): State<AppState>,
    method: Method,
    axum::Extension(auth): axum::Extension<AccessTokenContext>,
    body: Bytes,
) -> Response {
    if method != Method::POST {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let request: JsonRpcRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            let error = serde_json::json!({
                "jsonrpc": "2.0",
                "id": null,
                "error": JsonRpcError::parse_error(e.to_string()),
            });
            return (StatusCode::BAD_REQUEST, axum::Json(error)).into_response();
        }
    };

    match state.mcp.handle(request, &auth) {
        Some(response) => axum::Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}
