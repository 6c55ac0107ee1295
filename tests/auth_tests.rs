//! End-to-end coverage of the account lifecycle and the middleware gate
//! chain: registration, activation, login, then the authenticated /
//! activated / permission checks in order.

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use nitrack::api::{self, AppState};
use nitrack::auth::{password, token};
use nitrack::config::Config;
use nitrack::services::Mailer;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tower::ServiceExt;

/// Captures activation tokens instead of mailing them.
struct ChannelMailer {
    tx: mpsc::UnboundedSender<String>,
}

#[async_trait]
impl Mailer for ChannelMailer {
    async fn send_activation(&self, _recipient: &str, token_plaintext: &str) -> anyhow::Result<()> {
        self.tx.send(token_plaintext.to_string()).ok();
        Ok(())
    }
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.database.url = "sqlite::memory:".to_string();
    config.limiter.enabled = false;
    // Keep password hashing fast in tests
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config
}

async fn spawn_app() -> (Arc<AppState>, Router, mpsc::UnboundedReceiver<String>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let state = api::create_app_state_with_mailer(test_config(), Arc::new(ChannelMailer { tx }))
        .await
        .expect("failed to create app state");
    let router = api::router(state.clone());
    (state, router, rx)
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Seed a user directly through the store and hand back a live bearer
/// token, sidestepping the HTTP registration flow.
async fn seed_user(
    state: &AppState,
    email: &str,
    activated: bool,
    codes: &[&str],
) -> (i64, String) {
    let hash = password::hash_password("pa55word123", Some(&state.config.security)).unwrap();
    let user = state.store().create_user(email, &hash).await.unwrap();

    let user = if activated {
        state
            .store()
            .activate_user(user.id, user.version)
            .await
            .unwrap()
    } else {
        user
    };

    for code in codes {
        let permission = state
            .store()
            .get_permission_by_code(code)
            .await
            .unwrap()
            .unwrap();
        state
            .store()
            .grant_permission(user.id, permission.id)
            .await
            .unwrap();
    }

    let auth_token = token::Token::generate(user.id, 3600, token::SCOPE_AUTHENTICATION);
    let plaintext = auth_token.plaintext.clone();
    state
        .store()
        .insert_token(auth_token.into_model())
        .await
        .unwrap();

    (user.id, plaintext)
}

#[tokio::test]
async fn test_healthcheck_is_public() {
    let (_, app, _) = spawn_app().await;

    let response = app
        .oneshot(get_request("/v1/healthcheck", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], "available");
}

#[tokio::test]
async fn test_register_activate_login_flow() {
    let (_, app, mut rx) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/users",
            json!({"email": "recruit@example.com", "password": "pa55word123"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = body_json(response).await;
    assert_eq!(body["data"]["email"], "recruit@example.com");
    assert_eq!(body["data"]["activated"], false);
    // The hash must never leave the server
    assert!(body["data"].get("password_hash").is_none());

    let activation = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("no activation token was issued")
        .unwrap();
    assert_eq!(activation.len(), 32);

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/v1/users/activated",
            json!({"token": activation}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["activated"], true);

    // Redeeming the same token again must fail: activation dropped it
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/v1/users/activated",
            json!({"token": activation}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = app
        .oneshot(json_request(
            "POST",
            "/v1/tokens/authentication",
            json!({"email": "recruit@example.com", "password": "pa55word123"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["data"]["token"].as_str().unwrap().len(), 32);
    assert!(body["data"]["expiry"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let (state, app, _) = spawn_app().await;
    seed_user(&state, "known@example.com", true, &[]).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/tokens/authentication",
            json!({"email": "known@example.com", "password": "wrong-password"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Unknown email answers identically to a wrong password
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/tokens/authentication",
            json!({"email": "nobody@example.com", "password": "pa55word123"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Plaintext password rules apply at login as well as registration
    let response = app
        .oneshot(json_request(
            "POST",
            "/v1/tokens/authentication",
            json!({"email": "known@example.com", "password": "short"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_anonymous_gets_401_not_403() {
    let (_, app, _) = spawn_app().await;

    let response = app.oneshot(get_request("/v1/officers", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_bearer_tokens_rejected() {
    let (_, app, _) = spawn_app().await;

    // Wrong scheme
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/v1/healthcheck")
                .header(header::AUTHORIZATION, "Token abcdef")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
        "Bearer"
    );

    // Wrong length
    let response = app
        .clone()
        .oneshot(get_request("/v1/healthcheck", Some("tooshort")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Right length, wrong alphabet
    let response = app
        .oneshot(get_request(
            "/v1/healthcheck",
            Some("0123456789ABCDEF0123456789ABCDEF"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_bearer_scheme_is_exact() {
    let (state, app, _) = spawn_app().await;
    let (_, bearer) = seed_user(&state, "exact@example.com", true, &["officers:read"]).await;

    // The token itself is live
    let response = app
        .clone()
        .oneshot(get_request("/v1/officers", Some(&bearer)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Whitespace padding around it is not forgiven
    for sloppy in [format!("Bearer  {bearer}"), format!("Bearer {bearer} ")] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/v1/officers")
                    .header(header::AUTHORIZATION, sloppy)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_activation_token_is_not_an_authentication_credential() {
    let (state, app, _) = spawn_app().await;
    let (user_id, _) = seed_user(&state, "scoped@example.com", true, &["officers:read"]).await;

    // Live, well-formed, but scoped to activation only
    let activation = token::Token::generate(user_id, 3600, token::SCOPE_ACTIVATION);
    let plaintext = activation.plaintext.clone();
    state
        .store()
        .insert_token(activation.into_model())
        .await
        .unwrap();

    let response = app
        .oneshot(get_request("/v1/officers", Some(&plaintext)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[should_panic(expected = "identity middleware")]
async fn test_gate_without_identity_resolution_panics() {
    // A router that skips identity resolution is mis-wired; the gate must
    // fail loudly instead of treating every caller as anonymous.
    let app = Router::new()
        .route("/ping", axum::routing::get(|| async { "pong" }))
        .route_layer(axum::middleware::from_fn(
            nitrack::api::auth::require_authenticated,
        ));

    let _ = app.oneshot(get_request("/ping", None)).await;
}

#[tokio::test]
async fn test_unknown_and_expired_tokens_rejected() {
    let (state, app, _) = spawn_app().await;

    // Well-formed but never issued
    let response = app
        .clone()
        .oneshot(get_request(
            "/v1/officers",
            Some("0123456789abcdef0123456789abcdef"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Issued but already expired
    let (user_id, _) = seed_user(&state, "expired@example.com", true, &["officers:read"]).await;
    let expired = token::Token::generate(user_id, -60, token::SCOPE_AUTHENTICATION);
    let plaintext = expired.plaintext.clone();
    state
        .store()
        .insert_token(expired.into_model())
        .await
        .unwrap();

    let response = app
        .oneshot(get_request("/v1/officers", Some(&plaintext)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unactivated_account_gets_403() {
    let (state, app, _) = spawn_app().await;
    let (_, bearer) = seed_user(&state, "dormant@example.com", false, &[]).await;

    let response = app
        .oneshot(get_request("/v1/officers", Some(&bearer)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_permission_codes_gate_each_route() {
    let (state, app, _) = spawn_app().await;
    let (_, bearer) = seed_user(&state, "reader@example.com", true, &["courses:read"]).await;

    // Holds courses:read
    let response = app
        .clone()
        .oneshot(get_request("/v1/courses", Some(&bearer)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // But not courses:write
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/courses")
                .header(header::AUTHORIZATION, format!("Bearer {bearer}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({"title": "First Aid", "category": "Mandatory", "credit_hours": 8.0})
                        .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // And not officers:read
    let response = app
        .oneshot(get_request("/v1/officers", Some(&bearer)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_grant_permission_is_idempotent() {
    let (state, app, _) = spawn_app().await;
    let (_, admin) = seed_user(&state, "admin@example.com", true, &["permissions:write"]).await;
    let (target_id, _) = seed_user(&state, "target@example.com", true, &[]).await;

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/v1/users/{target_id}/permissions"))
                    .header(header::AUTHORIZATION, format!("Bearer {admin}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(json!({"code": "officers:read"}).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let codes = state
        .store()
        .permission_codes_for_user(target_id)
        .await
        .unwrap();
    assert_eq!(codes, vec!["officers:read".to_string()]);
}

#[tokio::test]
async fn test_grant_unknown_code_fails_validation() {
    let (state, app, _) = spawn_app().await;
    let (_, admin) = seed_user(&state, "admin2@example.com", true, &["permissions:write"]).await;
    let (target_id, _) = seed_user(&state, "target2@example.com", true, &[]).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/v1/users/{target_id}/permissions"))
                .header(header::AUTHORIZATION, format!("Bearer {admin}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({"code": "no:such:code"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert!(body["fields"]["code"].is_string());
}

#[tokio::test]
async fn test_rate_limiter_returns_429() {
    let mut config = test_config();
    config.limiter.enabled = true;
    config.limiter.requests_per_second = 0.001;
    config.limiter.burst = 2;

    let state = api::create_app_state_from_config(config)
        .await
        .expect("failed to create app state");
    let app = api::router(state);

    // Without ConnectInfo every request shares one bucket
    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(get_request("/v1/healthcheck", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .oneshot(get_request("/v1/healthcheck", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}
