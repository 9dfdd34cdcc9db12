//! Authorization-server stub.
//!
//! The authorization-processing backend (token issuance, consent, JWKS
//! signing) is an external collaborator behind the narrow
//! [`AuthorizationBackend`] interface: submit the raw request parameters,
//! receive a standards-compliant response. This service only wires HTTP
//! endpoints to that boundary; it never implements OAuth logic itself.
//!
//! [`UnimplementedBackend`] is the shipped implementation: every operation
//! answers `501 {"error":"not_implemented"}` until a real backend is
//! injected.

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::extract::{RawQuery, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::AuthServerConfig;
use crate::error::{Error, Result};
use crate::session::{MemoryStore, SessionLayer, SessionStore};

/// Response from the authorization-processing backend.
#[derive(Debug, Clone)]
pub enum BackendResponse {
    /// A JSON document to return to the caller.
    Json(serde_json::Value),
    /// A redirect the caller should follow (authorization decisions).
    Redirect(String),
}

/// Failure from the authorization-processing backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The operation is not implemented by this backend.
    #[error("not implemented")]
    NotImplemented,

    /// The backend could not be reached.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Narrow interface to the external authorization-processing service.
///
/// Raw authorization/token/consent parameters go in; standards-compliant
/// OAuth responses come out. The gateway makes no assumptions about the
/// backend's internals.
#[async_trait]
pub trait AuthorizationBackend: Send + Sync {
    /// Process an authorization request (the `/authorize` query string).
    async fn authorize(&self, parameters: &str) -> std::result::Result<BackendResponse, BackendError>;

    /// Process a consent decision.
    async fn consent(&self, parameters: &str) -> std::result::Result<BackendResponse, BackendError>;

    /// Process a token request.
    async fn token(&self, parameters: &str) -> std::result::Result<BackendResponse, BackendError>;

    /// Produce the JWK Set document.
    async fn jwks(&self) -> std::result::Result<BackendResponse, BackendError>;

    /// Produce the OpenID Provider configuration document.
    async fn openid_configuration(&self) -> std::result::Result<BackendResponse, BackendError>;
}

/// Backend that implements nothing.
#[derive(Debug, Clone, Default)]
pub struct UnimplementedBackend;

#[async_trait]
impl AuthorizationBackend for UnimplementedBackend {
    async fn authorize(&self, _parameters: &str) -> std::result::Result<BackendResponse, BackendError> {
        Err(BackendError::NotImplemented)
    }

    async fn consent(&self, _parameters: &str) -> std::result::Result<BackendResponse, BackendError> {
        Err(BackendError::NotImplemented)
    }

    async fn token(&self, _parameters: &str) -> std::result::Result<BackendResponse, BackendError> {
        Err(BackendError::NotImplemented)
    }

    async fn jwks(&self) -> std::result::Result<BackendResponse, BackendError> {
        Err(BackendError::NotImplemented)
    }

    async fn openid_configuration(&self) -> std::result::Result<BackendResponse, BackendError> {
        Err(BackendError::NotImplemented)
    }
}

/// Builder for the authorization-server stub application.
pub struct AuthServer {
    config: AuthServerConfig,
    backend: Arc<dyn AuthorizationBackend>,
    store: Arc<dyn SessionStore>,
}

impl AuthServer {
    /// Create the stub server over the given configuration, with the
    /// unimplemented backend and an in-memory session store.
    pub fn new(config: AuthServerConfig) -> Self {
        Self {
            config,
            backend: Arc::new(UnimplementedBackend),
            store: Arc::new(MemoryStore::new()),
        }
    }

    /// Inject a real authorization-processing backend.
    pub fn backend(mut self, backend: Arc<dyn AuthorizationBackend>) -> Self {
        self.backend = backend;
        self
    }

    /// Inject a session store backend, replacing the in-memory default.
    pub fn session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = store;
        self
    }

    /// Build the axum router.
    pub fn into_router(self) -> Router {
        let state = AppState {
            backend: self.backend,
        };
        let session = SessionLayer::new(self.store, self.config.session_secret.as_bytes());

        // Credential-bearing endpoints accept cross-origin calls only from
        // the configured allow-list, never from a reflected origin.
        let origins: Vec<HeaderValue> = self
            .config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        let cors = CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([
                header::AUTHORIZATION,
                header::CONTENT_TYPE,
                header::HeaderName::from_static("dpop"),
            ]);

        let cors_routes = Router::new()
            .route("/token", post(handle_token))
            .route("/jwks", get(handle_jwks))
            .route(
                "/.well-known/openid-configuration",
                get(handle_openid_configuration),
            )
            .layer(cors);

        Router::new()
            .route("/", get(handle_status))
            .route("/authorize", get(handle_authorize))
            .route("/consent", post(handle_consent))
            .merge(cors_routes)
            .with_state(state)
            .layer(session)
            .layer(TraceLayer::new_for_http())
    }

    /// Bind and serve on the configured port.
    pub async fn serve(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.config.port);
        let router = self.into_router();

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::Transport(format!("failed to bind to {}: {}", addr, e)))?;

        tracing::info!(%addr, "oauth-server listening");

        axum::serve(listener, router)
            .await
            .map_err(|e| Error::Transport(format!("server error: {}", e)))?;

        Ok(())
    }
}

#[derive(Clone)]
struct AppState {
    backend: Arc<dyn AuthorizationBackend>,
}

async fn handle_status() -> Response {
    axum::Json(serde_json::json!({
        "service": "oauth-server",
        "status": "ok",
        "note": "Development stub running over http",
    }))
    .into_response()
}

async fn handle_authorize(State(state): State<AppState>, RawQuery(query): RawQuery) -> Response {
    tracing::debug!("GET /authorize");
    backend_response(state.backend.authorize(query.as_deref().unwrap_or("")).await)
}

async fn handle_consent(State(state): State<AppState>, body: String) -> Response {
    backend_response(state.backend.consent(&body).await)
}

async fn handle_token(State(state): State<AppState>, body: String) -> Response {
    backend_response(state.backend.token(&body).await)
}

async fn handle_jwks(State(state): State<AppState>) -> Response {
    backend_response(state.backend.jwks().await)
}

async fn handle_openid_configuration(State(state): State<AppState>) -> Response {
    backend_response(state.backend.openid_configuration().await)
}

/// Map a backend outcome to an HTTP response.
fn backend_response(
    result: std::result::Result<BackendResponse, BackendError>,
) -> Response {
    match result {
        Ok(BackendResponse::Json(value)) => axum::Json(value).into_response(),
        Ok(BackendResponse::Redirect(location)) => match location.parse::<HeaderValue>() {
            Ok(value) => (StatusCode::FOUND, [(header::LOCATION, value)]).into_response(),
            Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        },
        Err(BackendError::NotImplemented) => (
            StatusCode::NOT_IMPLEMENTED,
            axum::Json(serde_json::json!({"error": "not_implemented"})),
        )
            .into_response(),
        Err(BackendError::Unavailable(reason)) => {
            tracing::error!(%reason, "authorization backend unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                axum::Json(serde_json::json!({"error": "temporarily_unavailable"})),
            )
                .into_response()
        }
    }
}
