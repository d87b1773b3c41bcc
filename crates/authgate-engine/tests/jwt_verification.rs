//! JWT path tests against a mock JWKS endpoint.
//!
//! Keys are symmetric (`kty: oct`, HS256) so tokens can be minted in-process
//! without key generation.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use authgate_core::{CredentialType, EngineError, IdentityEngine};
use authgate_engine::{AudiencePolicy, EngineSettings, OAuth2Engine, VerificationMode};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SECRET: &[u8] = b"gateway-test-secret-0123456789";
const SECRET_B64: &str = "Z2F0ZXdheS10ZXN0LXNlY3JldC0wMTIzNDU2Nzg5";
const ROTATED_SECRET: &[u8] = b"rotated-test-secret-abcdefghij";
const ROTATED_SECRET_B64: &str = "cm90YXRlZC10ZXN0LXNlY3JldC1hYmNkZWZnaGlq";
const ISSUER: &str = "https://idp.example.com";

fn jwk(kid: &str, k: &str) -> Value {
    json!({"kty": "oct", "kid": kid, "alg": "HS256", "k": k})
}

fn now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs()
}

fn mint(kid: &str, secret: &[u8], claims: Value) -> String {
    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some(kid.to_string());
    encode(&header, &claims, &EncodingKey::from_secret(secret)).unwrap()
}

fn standard_claims() -> Value {
    json!({
        "sub": "u1",
        "iss": ISSUER,
        "aud": "api",
        "exp": now() + 3600,
        "scope": "read write",
    })
}

async fn jwks_server(keys: Value) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jwks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "keys": keys })))
        .mount(&server)
        .await;
    server
}

fn engine(server: &MockServer, audience: &str) -> OAuth2Engine {
    let mut settings = EngineSettings::from_raw(
        ISSUER,
        audience,
        &format!("{}/jwks", server.uri()),
        "",
        "",
        "",
    )
    .unwrap();
    settings.jwks_refresh_cooldown = Duration::ZERO;
    OAuth2Engine::new(settings).unwrap()
}

#[tokio::test]
async fn valid_jwt_yields_identity() {
    let server = jwks_server(json!([jwk("k1", SECRET_B64)])).await;
    let engine = engine(&server, "api");
    assert_eq!(engine.mode(), VerificationMode::JwtOnly);

    let token = mint("k1", SECRET, standard_claims());
    let identity = engine
        .verify(&token, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(identity.subject, "u1");
    assert_eq!(identity.scopes, vec!["read", "write"]);
    assert_eq!(identity.credential_type, CredentialType::Jwt);
    assert_eq!(identity.source, "jwks");
    assert_eq!(identity.claim("iss"), Some(&json!(ISSUER)));
}

#[tokio::test]
async fn wrong_signature_is_rejected() {
    let server = jwks_server(json!([jwk("k1", SECRET_B64)])).await;
    let engine = engine(&server, "*");

    let token = mint("k1", b"some-other-secret-not-in-jwks!", standard_claims());
    let err = engine
        .verify(&token, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidToken(_)), "{err:?}");
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let server = jwks_server(json!([jwk("k1", SECRET_B64)])).await;
    let engine = engine(&server, "*");

    let mut claims = standard_claims();
    claims["exp"] = json!(now() - 3600);
    let err = engine
        .verify(&mint("k1", SECRET, claims), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidToken(_)), "{err:?}");
}

#[tokio::test]
async fn issuer_mismatch_is_rejected() {
    let server = jwks_server(json!([jwk("k1", SECRET_B64)])).await;
    let engine = engine(&server, "*");

    let mut claims = standard_claims();
    claims["iss"] = json!("https://evil.example.com");
    let err = engine
        .verify(&mint("k1", SECRET, claims), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Claims(_)), "{err:?}");
}

#[tokio::test]
async fn audience_policy_is_enforced() {
    let server = jwks_server(json!([jwk("k1", SECRET_B64)])).await;
    let token = mint("k1", SECRET, standard_claims());
    let cancel = CancellationToken::new();

    assert!(engine(&server, "web").verify(&token, &cancel).await.is_err());
    assert!(engine(&server, "web, api").verify(&token, &cancel).await.is_ok());
    assert!(engine(&server, "*").verify(&token, &cancel).await.is_ok());
}

#[tokio::test]
async fn missing_audience_fails_restricted_policy() {
    let server = jwks_server(json!([jwk("k1", SECRET_B64)])).await;
    let mut claims = standard_claims();
    claims.as_object_mut().unwrap().remove("aud");
    let token = mint("k1", SECRET, claims);

    let err = engine(&server, "api")
        .verify(&token, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Claims(_)));
}

#[tokio::test]
async fn jwks_is_cached_between_verifications() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jwks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"keys": [jwk("k1", SECRET_B64)]})))
        .expect(1)
        .mount(&server)
        .await;

    let engine = engine(&server, "*");
    let token = mint("k1", SECRET, standard_claims());
    let cancel = CancellationToken::new();
    for _ in 0..3 {
        engine.verify(&token, &cancel).await.unwrap();
    }
}

#[tokio::test]
async fn unknown_kid_triggers_one_refetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jwks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"keys": [jwk("k1", SECRET_B64)]})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/jwks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "keys": [jwk("k1", SECRET_B64), jwk("k2", ROTATED_SECRET_B64)]
        })))
        .mount(&server)
        .await;

    let engine = engine(&server, "*");
    let cancel = CancellationToken::new();

    engine
        .verify(&mint("k1", SECRET, standard_claims()), &cancel)
        .await
        .unwrap();
    let identity = engine
        .verify(&mint("k2", ROTATED_SECRET, standard_claims()), &cancel)
        .await
        .unwrap();
    assert_eq!(identity.subject, "u1");

    let err = engine
        .verify(&mint("k9", SECRET, standard_claims()), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidToken(_)));
}

#[tokio::test]
async fn jwks_outage_is_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = engine(&server, "*")
        .verify(&mint("k1", SECRET, standard_claims()), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Upstream { ref endpoint, .. } if endpoint == "jwks"));
}

#[tokio::test]
async fn cancellation_interrupts_jwks_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"keys": [jwk("k1", SECRET_B64)]}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let engine = engine(&server, "*");
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let err = engine
        .verify(&mint("k1", SECRET, standard_claims()), &cancel)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::Cancelled);
}

#[test]
fn audience_policy_is_parsed_from_settings() {
    let settings = EngineSettings::from_raw("", "api,web", "http://127.0.0.1:1/jwks", "", "", "").unwrap();
    assert_eq!(
        settings.audience,
        AudiencePolicy::OneOf(vec!["api".into(), "web".into()])
    );
}

#[tokio::test]
async fn key_pinned_to_other_algorithm_is_refused() {
    let pinned = json!({"kty": "oct", "kid": "k1", "alg": "HS384", "k": SECRET_B64});
    let server = jwks_server(json!([pinned])).await;
    let engine = engine(&server, "api");

    let token = mint("k1", SECRET, standard_claims());
    let err = engine
        .verify(&token, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidToken(ref m) if m.contains("does not match key alg")));
}
