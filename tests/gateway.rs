//! Integration tests for the composed gateway.
//!
//! Drives the full axum application: session resolution, bearer guard,
//! metadata discovery, and MCP dispatch.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::any;
use mcp_gateway::oauth::{
    AccessTokenContext, BearerGuardLayer, JwtValidator, ProtectedResourceMetadata, ScopePolicy,
};
use mcp_gateway::session::{MemoryStore, SessionLayer};
use mcp_gateway::{Gateway, GatewayConfig, SecretString};
use tower::ServiceExt;
use url::Url;

const TOKEN_SECRET: &[u8] = b"integration-token-secret";

fn test_config() -> GatewayConfig {
    GatewayConfig {
        port: 0,
        base_url: Url::parse("https://example.com").unwrap(),
        resource_path: "/mcp".to_string(),
        issuer: Url::parse("https://auth.example.com").unwrap(),
        scopes: vec!["mcp:read".to_string(), "mcp:write".to_string()],
        resource_name: "Example MCP Server".to_string(),
        documentation_url: Some(Url::parse("https://docs.example.com/mcp").unwrap()),
        token_secret: SecretString::new(String::from_utf8_lossy(TOKEN_SECRET)),
        session_secret: SecretString::new("integration-session-secret"),
        server_name: "integration".to_string(),
        server_version: "1.0.0".to_string(),
    }
}

fn gateway_router() -> Router {
    let validator = JwtValidator::from_secret(TOKEN_SECRET)
        .expected_audience("https://example.com/mcp");
    Gateway::new(test_config(), validator)
        .into_router()
        .unwrap()
}

fn make_token(claims: &serde_json::Value) -> String {
    jsonwebtoken::encode(
        &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256),
        claims,
        &jsonwebtoken::EncodingKey::from_secret(TOKEN_SECRET),
    )
    .unwrap()
}

fn valid_token(sub: &str, scope: &str) -> String {
    make_token(&serde_json::json!({
        "sub": sub,
        "scope": scope,
        "aud": "https://example.com/mcp",
        "exp": now() + 3600,
    }))
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

fn mcp_request(token: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// =============================================================================
// Metadata discovery
// =============================================================================

#[tokio::test]
async fn metadata_is_served_unauthenticated() {
    let router = gateway_router();
    let req = Request::builder()
        .uri("/.well-known/oauth-protected-resource/mcp")
        .body(Body::empty())
        .unwrap();

    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json = body_json(resp).await;
    // Base URL without trailing slash joins with exactly one slash
    assert_eq!(json["resource"], "https://example.com/mcp");
    assert_eq!(json["authorization_servers"][0], "https://auth.example.com/");
    assert_eq!(json["scopes_supported"], serde_json::json!(["mcp:read", "mcp:write"]));
    assert_eq!(json["resource_name"], "Example MCP Server");
    assert_eq!(json["resource_documentation"], "https://docs.example.com/mcp");
}

#[tokio::test]
async fn metadata_is_byte_identical_across_calls() {
    let router = gateway_router();

    let mut bodies = Vec::new();
    for _ in 0..2 {
        let req = Request::builder()
            .uri("/.well-known/oauth-protected-resource/mcp")
            .body(Body::empty())
            .unwrap();
        let resp = router.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        bodies.push(
            axum::body::to_bytes(resp.into_body(), 64 * 1024)
                .await
                .unwrap(),
        );
    }
    assert_eq!(bodies[0], bodies[1]);
}

// =============================================================================
// Bearer guard
// =============================================================================

#[tokio::test]
async fn missing_token_is_rejected_with_challenge() {
    let router = gateway_router();
    let resp = router
        .oneshot(mcp_request(None, serde_json::json!({
            "jsonrpc": "2.0", "id": 1, "method": "tools/list"
        })))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let www_auth = resp
        .headers()
        .get("WWW-Authenticate")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(www_auth.starts_with("Bearer"));
    assert!(www_auth.contains(
        "resource_metadata=\"https://example.com/.well-known/oauth-protected-resource/mcp\""
    ));
    // No credential presented: no error code per RFC 6750
    assert!(!www_auth.contains("error="));
}

#[tokio::test]
async fn expired_token_is_rejected_as_invalid() {
    let router = gateway_router();
    let token = make_token(&serde_json::json!({
        "sub": "user",
        "aud": "https://example.com/mcp",
        "exp": 1,
    }));

    let resp = router
        .oneshot(mcp_request(
            Some(&token),
            serde_json::json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let www_auth = resp
        .headers()
        .get("WWW-Authenticate")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(www_auth.contains("error=\"invalid_token\""));
}

#[tokio::test]
async fn wrong_audience_is_rejected_as_invalid() {
    let router = gateway_router();
    let token = make_token(&serde_json::json!({
        "sub": "user",
        "aud": "https://other.example.com",
        "exp": now() + 3600,
    }));

    let resp = router
        .oneshot(mcp_request(
            Some(&token),
            serde_json::json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(
        resp.headers()
            .get("WWW-Authenticate")
            .unwrap()
            .to_str()
            .unwrap()
            .contains("error=\"invalid_token\"")
    );
}

#[tokio::test]
async fn read_scope_cannot_reach_write_route() {
    let validator = JwtValidator::from_secret(TOKEN_SECRET)
        .expected_audience("https://example.com/mcp");
    let router = Gateway::new(test_config(), validator)
        .scope_policy(ScopePolicy::new().default_scope("mcp:write"))
        .into_router()
        .unwrap();

    let token = valid_token("reader", "mcp:read");
    let resp = router
        .oneshot(mcp_request(
            Some(&token),
            serde_json::json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let www_auth = resp
        .headers()
        .get("WWW-Authenticate")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(www_auth.contains("error=\"insufficient_scope\""));
    assert!(www_auth.contains("scope=\"mcp:write\""));
}

// =============================================================================
// MCP dispatch through the gateway
// =============================================================================

#[tokio::test]
async fn full_tool_flow_with_valid_token() {
    let router = gateway_router();
    let token = valid_token("alice", "mcp:read mcp:write");

    // initialize
    let resp = router
        .clone()
        .oneshot(mcp_request(
            Some(&token),
            serde_json::json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["result"]["serverInfo"]["name"], "integration");

    // tools/list
    let resp = router
        .clone()
        .oneshot(mcp_request(
            Some(&token),
            serde_json::json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
        ))
        .await
        .unwrap();
    let json = body_json(resp).await;
    let tools: Vec<&str> = json["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(tools, vec!["echo", "greet"]);

    // tools/call
    let resp = router
        .oneshot(mcp_request(
            Some(&token),
            serde_json::json!({
                "jsonrpc": "2.0", "id": 3, "method": "tools/call",
                "params": {"name": "echo", "arguments": {"message": "round trip"}},
            }),
        ))
        .await
        .unwrap();
    let json = body_json(resp).await;
    assert_eq!(json["result"]["content"][0]["text"], "round trip");
}

// =============================================================================
// Session lifecycle through the gateway
// =============================================================================

#[tokio::test]
async fn session_cookie_is_issued_and_resumed() {
    let router = gateway_router();

    let req = Request::builder()
        .uri("/.well-known/oauth-protected-resource/mcp")
        .body(Body::empty())
        .unwrap();
    let resp = router.clone().oneshot(req).await.unwrap();

    let set_cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .expect("first contact sets a session cookie")
        .to_str()
        .unwrap();
    let cookie_pair = set_cookie.split(';').next().unwrap().to_string();

    // Replaying the cookie resumes the session instead of issuing another
    let req = Request::builder()
        .uri("/.well-known/oauth-protected-resource/mcp")
        .header("Cookie", cookie_pair)
        .body(Body::empty())
        .unwrap();
    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn tampered_session_cookie_gets_a_fresh_session() {
    let router = gateway_router();

    let req = Request::builder()
        .uri("/.well-known/oauth-protected-resource/mcp")
        .body(Body::empty())
        .unwrap();
    let resp = router.clone().oneshot(req).await.unwrap();
    let set_cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    let mut cookie_pair = set_cookie.split(';').next().unwrap().to_string();

    // Flip the last signature character
    let last = cookie_pair.pop().unwrap();
    cookie_pair.push(if last == 'A' { 'B' } else { 'A' });

    // Tampering is recovered silently with a fresh session, repeatedly
    for _ in 0..2 {
        let req = Request::builder()
            .uri("/.well-known/oauth-protected-resource/mcp")
            .header("Cookie", cookie_pair.clone())
            .body(Body::empty())
            .unwrap();
        let resp = router.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let reissued = resp
            .headers()
            .get(header::SET_COOKIE)
            .expect("tampered cookie triggers a fresh session")
            .to_str()
            .unwrap()
            .to_string();
        assert_ne!(reissued.split(';').next(), cookie_pair.split(';').next());
    }
}

// =============================================================================
// Concurrency: contexts never cross-contaminate
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_keep_their_own_context() {
    // A downstream handler that echoes the authenticated subject, composed
    // the same way the gateway composes MCP dispatch.
    async fn echo_subject(
        axum::Extension(auth): axum::Extension<AccessTokenContext>,
    ) -> axum::response::Response {
        auth.subject.clone().into_response()
    }

    let metadata = ProtectedResourceMetadata::new("https://example.com/mcp")
        .authorization_server("https://auth.example.com");
    let validator = JwtValidator::from_secret(TOKEN_SECRET)
        .expected_audience("https://example.com/mcp");
    let counter = Arc::new(AtomicUsize::new(0));

    let count = counter.clone();
    let router = Router::new()
        .route(
            "/mcp",
            any(move |auth: axum::Extension<AccessTokenContext>| {
                count.fetch_add(1, Ordering::SeqCst);
                echo_subject(auth)
            }),
        )
        .route_layer(BearerGuardLayer::new(validator, metadata))
        .layer(SessionLayer::new(
            Arc::new(MemoryStore::new()),
            b"integration-session-secret",
        ));

    let subjects: Vec<String> = (0..16).map(|i| format!("subject-{}", i)).collect();

    let mut handles = Vec::new();
    for subject in &subjects {
        let router = router.clone();
        let token = valid_token(subject, "mcp:read");
        let subject = subject.clone();
        handles.push(tokio::spawn(async move {
            let req = Request::builder()
                .method("POST")
                .uri("/mcp")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap();
            let resp = router.oneshot(req).await.unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
            let bytes = axum::body::to_bytes(resp.into_body(), 1024).await.unwrap();
            (subject, String::from_utf8(bytes.to_vec()).unwrap())
        }));
    }

    for handle in handles {
        let (expected, observed) = handle.await.unwrap();
        assert_eq!(observed, expected);
    }

    // Each accepted request reached the downstream handler exactly once
    assert_eq!(counter.load(Ordering::SeqCst), subjects.len());
}
