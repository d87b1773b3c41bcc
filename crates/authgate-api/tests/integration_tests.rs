//! Router-level tests: every request goes through the full middleware stack
//! via `tower::ServiceExt::oneshot`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use authgate_api::state::AppState;
use authgate_api::{app, bootstrap, config, shutdown};
use authgate_core::{
    AuthGate, CredentialType, EngineError, Identity, IdentityEngine, RequiredHeaderSet,
};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

// ── Helpers ─────────────────────────────────────────────────────────────────

struct StubEngine;

#[async_trait]
impl IdentityEngine for StubEngine {
    async fn verify(&self, token: &str, _cancel: &CancellationToken) -> Result<Identity, EngineError> {
        match token {
            "tok123" => {
                let claims = json!({"sub": "alice", "aud": "api", "iss": "https://idp.example.com"});
                let Value::Object(claims) = claims else { unreachable!() };
                Ok(Identity::new("alice", CredentialType::Jwt, "jwks")
                    .with_scopes(["read", "write"])
                    .with_claims(claims))
            }
            "bare" => Ok(Identity::new("bob", CredentialType::Opaque, "introspection")),
            _ => Err(EngineError::InvalidToken("signature mismatch for kid k7".into())),
        }
    }
}

struct HangingEngine;

#[async_trait]
impl IdentityEngine for HangingEngine {
    async fn verify(&self, _token: &str, _cancel: &CancellationToken) -> Result<Identity, EngineError> {
        std::future::pending().await
    }
}

fn state_with(engine: Arc<dyn IdentityEngine>, required: &[&str]) -> AppState {
    let gate = AuthGate::new(RequiredHeaderSet::new(required.iter().copied()).unwrap(), engine);
    let state = AppState::new(gate);
    state.readiness.mark_ready();
    state
}

fn test_app(required: &[&str]) -> axum::Router {
    app(state_with(Arc::new(StubEngine), required))
}

fn get(uri: &str, headers: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ── Public health endpoints ───────────────────────────────────────────────────────────

#[tokio::test]
async fn healthz_is_public() {
    let resp = test_app(&["X-Tenant"]).oneshot(get("/healthz", &[])).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));
    assert_eq!(body_json(resp).await, json!({"status": "ok"}));
}

#[tokio::test]
async fn readyz_reflects_readiness() {
    let state = state_with(Arc::new(StubEngine), &[]);
    let resp = app(state.clone()).oneshot(get("/readyz", &[])).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!({"status": "ready"}));

    shutdown::begin(&state);
    let resp = app(state).oneshot(get("/readyz", &[])).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(resp).await, json!({"status": "not ready"}));
}

#[tokio::test]
async fn unknown_route_is_not_gated() {
    let resp = test_app(&[]).oneshot(get("/nope", &[])).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ── Gate ordering and error contract ────────────────────────────────────────

#[tokio::test]
async fn valid_token_reaches_me() {
    let resp = test_app(&["X-Tenant"])
        .oneshot(get(
            "/me",
            &[("X-Tenant", "acme"), ("Authorization", "Bearer tok123")],
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body_json(resp).await,
        json!({
            "sub": "alice",
            "scopes": ["read", "write"],
            "aud": "api",
            "iss": "https://idp.example.com",
            "type": "jwt",
            "source": "jwks",
        })
    );
}

#[tokio::test]
async fn me_reports_null_for_absent_claims() {
    let resp = test_app(&[])
        .oneshot(get("/me", &[("Authorization", "Bearer bare")]))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["sub"], "bob");
    assert_eq!(body["scopes"], json!([]));
    assert_eq!(body["aud"], Value::Null);
    assert_eq!(body["iss"], Value::Null);
    assert_eq!(body["type"], "opaque");
}

#[tokio::test]
async fn missing_required_header_is_400_and_checked_first() {
    let resp = test_app(&["X-Tenant", "X-Trace"])
        .oneshot(get("/me", &[("X-Request-Id", "req-1"), ("X-Trace", "t")]))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(resp).await,
        json!({
            "error": "bad_request",
            "code": "missing_required_header",
            "message": "missing required header: X-Tenant",
            "request_id": "req-1",
        })
    );
}

#[tokio::test]
async fn missing_authorization_is_401() {
    let resp = test_app(&[])
        .oneshot(get("/me", &[("X-Request-Id", "req-2")]))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(resp.headers()["x-request-id"], "req-2");
    assert_eq!(
        body_json(resp).await,
        json!({
            "error": "unauthorized",
            "code": "missing_authorization_header",
            "message": "missing authorization header",
            "request_id": "req-2",
        })
    );
}

#[tokio::test]
async fn non_bearer_scheme_is_invalid_token() {
    let resp = test_app(&[])
        .oneshot(get("/me", &[("Authorization", "Basic xyz")]))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(resp).await;
    assert_eq!(body["code"], "invalid_token");
    assert_eq!(body["message"], "unsupported authorization scheme, expected Bearer");
}

#[tokio::test]
async fn lowercase_bearer_is_rejected() {
    let resp = test_app(&[])
        .oneshot(get("/me", &[("Authorization", "bearer tok123")]))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["code"], "invalid_token");
}

#[tokio::test]
async fn empty_bearer_token_is_invalid_token() {
    for value in ["Bearer ", "Bearer"] {
        let resp = test_app(&[])
            .oneshot(get("/me", &[("Authorization", value)]))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(resp).await;
        assert_eq!(body["code"], "invalid_token");
        assert_eq!(body["message"], "empty bearer token");
    }
}

#[tokio::test]
async fn engine_failure_detail_is_not_leaked() {
    let resp = test_app(&[])
        .oneshot(get("/me", &[("Authorization", "Bearer forged")]))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let generated_id = resp.headers()["x-request-id"].to_str().unwrap().to_string();
    let body = body_json(resp).await;
    assert_eq!(body["code"], "invalid_token");
    assert_eq!(body["message"], "token invalid or expired");
    assert_eq!(body["request_id"], generated_id.as_str());
    assert!(!body.to_string().contains("k7"));
}

// ── Cancellation and timeouts ───────────────────────────────────────────────

#[tokio::test]
async fn shutdown_aborts_in_flight_verification() {
    let state = state_with(Arc::new(HangingEngine), &[]);
    let router = app(state.clone());

    let pending = tokio::spawn(async move {
        router
            .oneshot(get("/me", &[("Authorization", "Bearer tok123")]))
            .await
            .unwrap()
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    shutdown::begin(&state);

    let resp = tokio::time::timeout(Duration::from_secs(5), pending)
        .await
        .expect("request must finish after shutdown")
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["message"], "token invalid or expired");
}

#[tokio::test]
async fn slow_verification_hits_request_timeout() {
    let state = state_with(Arc::new(HangingEngine), &[])
        .with_request_timeout(Duration::from_millis(50));

    let resp = tokio::time::timeout(
        Duration::from_secs(5),
        app(state).oneshot(get("/me", &[("Authorization", "Bearer tok123")])),
    )
    .await
    .expect("timeout layer must answer")
    .unwrap();
    assert_eq!(resp.status(), StatusCode::REQUEST_TIMEOUT);
}

// ── End to end with the OAuth2 engine ───────────────────────────────────────

#[tokio::test]
async fn configured_gateway_introspects_opaque_tokens() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let idp = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/introspect"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "active": true,
            "sub": "carol",
            "scope": "read",
            "aud": "api",
        })))
        .mount(&idp)
        .await;

    let yaml = format!(
        "auth:\n  audience: api\n  introspection_url: {}/introspect\n  required_headers: X-Tenant\n",
        idp.uri()
    );
    let config = config::from_yaml_str_with(&yaml, |_| None).unwrap();
    let router = app(bootstrap::build_state(&config).unwrap());

    let resp = router
        .clone()
        .oneshot(get(
            "/me",
            &[("X-Tenant", "acme"), ("Authorization", "Bearer opaque-abc")],
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["sub"], "carol");
    assert_eq!(body["type"], "opaque");
    assert_eq!(body["source"], "introspection");

    let resp = router
        .oneshot(get("/me", &[("Authorization", "Bearer opaque-abc")]))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ── Connection limits ───────────────────────────────────────────────────────

#[tokio::test]
async fn idle_and_stalled_connections_are_closed() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = config::ServerConfig {
        idle_timeout: Duration::from_millis(100),
        ..config::ServerConfig::default()
    };
    let state = state_with(Arc::new(StubEngine), &[]);
    let stop = CancellationToken::new();
    let stopped = stop.clone();
    let serving = tokio::spawn(async move {
        bootstrap::serve_on(listener, &server, state, async move { stopped.cancelled().await }).await
    });

    // Keep-alive connection: answered, then dropped once idle.
    let mut conn = TcpStream::connect(addr).await.unwrap();
    conn.write_all(b"GET /healthz HTTP/1.1\r\nHost: gw\r\n\r\n")
        .await
        .unwrap();
    let mut reply = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), conn.read_to_end(&mut reply))
        .await
        .expect("idle keep-alive connection must be closed")
        .unwrap();
    assert!(String::from_utf8_lossy(&reply).starts_with("HTTP/1.1 200"));

    // Request head that never completes.
    let mut conn = TcpStream::connect(addr).await.unwrap();
    conn.write_all(b"GET /healthz HTTP/1.1\r\nHost: gw\r\n")
        .await
        .unwrap();
    let mut rest = Vec::new();
    let closed = tokio::time::timeout(Duration::from_secs(5), conn.read_to_end(&mut rest)).await;
    assert!(closed.is_ok(), "stalled request must be cut off");

    stop.cancel();
    serving.await.unwrap().unwrap();
}
