//! Store-backed session middleware.
//!
//! Provides [`SessionLayer`] and [`SessionService`], a tower
//! `Layer`/`Service` pair that resolves a signed session for every request
//! and exposes it to downstream handlers through a [`Session`] handle in the
//! request extensions.
//!
//! A request presenting no cookie, or a cookie whose signature fails to
//! verify, silently receives a fresh session; tampering is never surfaced as
//! a client-visible error. Store failures surface as 500.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::{IntoResponse, Response};
use tower::Layer;

use super::cookie;
use super::store::{SessionRecord, SessionStore};

/// Transient, request-scoped view of one session.
///
/// Cheap to clone; all clones share the same payload. The middleware holds
/// the authoritative copy and persists it with one atomic store call after
/// the inner service responds, so the store never observes a half-written
/// record.
#[derive(Clone)]
pub struct Session {
    id: Arc<str>,
    fresh: bool,
    data: Arc<Mutex<HashMap<String, serde_json::Value>>>,
}

impl Session {
    fn new(id: &str, fresh: bool, record: SessionRecord) -> Self {
        Self {
            id: Arc::from(id),
            fresh,
            data: Arc::new(Mutex::new(record.payload)),
        }
    }

    /// The session identifier (unsigned form).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// True when the session was issued during this request rather than
    /// resumed from a presented cookie.
    pub fn is_fresh(&self) -> bool {
        self.fresh
    }

    /// Read a value from the session payload.
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.lock().get(key).cloned()
    }

    /// Write a value into the session payload.
    pub fn insert(&self, key: impl Into<String>, value: serde_json::Value) {
        self.lock().insert(key.into(), value);
    }

    /// Remove a value from the session payload.
    pub fn remove(&self, key: &str) -> Option<serde_json::Value> {
        self.lock().remove(key)
    }

    /// Snapshot the payload for persistence.
    fn snapshot(&self) -> SessionRecord {
        SessionRecord {
            payload: self.lock().clone(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, serde_json::Value>> {
        // A poisoned payload mutex only means a handler panicked mid-write;
        // the map itself is still usable.
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("fresh", &self.fresh)
            .finish_non_exhaustive()
    }
}

/// Tower layer that attaches a [`Session`] to every request.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use mcp_gateway::session::{MemoryStore, SessionLayer};
///
/// let layer = SessionLayer::new(Arc::new(MemoryStore::new()), b"session-secret");
/// ```
#[derive(Clone)]
pub struct SessionLayer {
    store: Arc<dyn SessionStore>,
    secret: Arc<[u8]>,
}

impl SessionLayer {
    /// Create a session layer over the given store, signing identifiers
    /// with `secret`.
    pub fn new(store: Arc<dyn SessionStore>, secret: &[u8]) -> Self {
        Self {
            store,
            secret: Arc::from(secret),
        }
    }
}

impl<S> Layer<S> for SessionLayer {
    type Service = SessionService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SessionService {
            inner,
            store: self.store.clone(),
            secret: self.secret.clone(),
        }
    }
}

/// Tower service created by [`SessionLayer`]. For each incoming request:
///
/// 1. Reads the session cookie and verifies its signature
/// 2. Absent or tampered cookie: synthesizes a fresh session identifier
/// 3. Loads the record from the store (miss creates an empty record)
/// 4. Exposes a [`Session`] handle via request extensions
/// 5. After the inner service responds, persists the record with a single
///    `set` call and appends `Set-Cookie` when the session is fresh
#[derive(Clone)]
pub struct SessionService<S> {
    inner: S,
    store: Arc<dyn SessionStore>,
    secret: Arc<[u8]>,
}

impl<S> tower_service::Service<Request<Body>> for SessionService<S>
where
    S: tower_service::Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
    S::Error: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let store = self.store.clone();
        let secret = self.secret.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let presented = cookie::from_headers(req.headers());
            let verified = presented
                .as_deref()
                .and_then(|value| cookie::verify(value, &secret));

            let (id, fresh) = match verified {
                Some(id) => (id, false),
                None => {
                    if presented.is_some() {
                        tracing::debug!("session cookie failed verification, issuing fresh session");
                    }
                    (uuid::Uuid::new_v4().to_string(), true)
                }
            };

            let record = if fresh {
                SessionRecord::new()
            } else {
                match store.get(&id).await {
                    Ok(Some(record)) => record,
                    Ok(None) => SessionRecord::new(),
                    Err(error) => {
                        tracing::error!(%error, "session store read failed");
                        return Ok(store_unavailable());
                    }
                }
            };

            let session = Session::new(&id, fresh, record);
            let mut req = req;
            req.extensions_mut().insert(session.clone());

            let response = inner.call(req).await?;

            if let Err(error) = store.set(&id, session.snapshot()).await {
                tracing::error!(%error, "session store write failed");
                return Ok(store_unavailable());
            }

            let mut response = response;
            if fresh {
                let signed = cookie::sign(&id, &secret);
                if let Ok(value) = cookie::set_cookie(&signed).parse() {
                    response.headers_mut().append(header::SET_COOKIE, value);
                }
            }
            Ok(response)
        })
    }
}

fn store_unavailable() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        axum::Json(serde_json::json!({"error": "store_unavailable"})),
    )
        .into_response()
}
