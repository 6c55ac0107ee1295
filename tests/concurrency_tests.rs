//! Version-checked updates: stale writers must get an edit conflict, at
//! the store level and over HTTP via X-Expected-Version.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use nitrack::api::{self, AppState};
use nitrack::auth::{password, token};
use nitrack::config::Config;
use nitrack::db::{OfficerInput, StoreError};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

fn test_config() -> Config {
    let mut config = Config::default();
    config.database.url = "sqlite::memory:".to_string();
    config.limiter.enabled = false;
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config
}

async fn spawn_state() -> Arc<AppState> {
    api::create_app_state_from_config(test_config())
        .await
        .expect("failed to create app state")
}

fn officer_input(last_name: &str) -> OfficerInput {
    OfficerInput {
        regulation_number: "RN-100".to_string(),
        first_name: "Esi".to_string(),
        last_name: last_name.to_string(),
        sex: "Female".to_string(),
        rank_id: None,
        formation_id: None,
        posting_id: None,
        is_active: true,
    }
}

#[tokio::test]
async fn test_stale_version_update_conflicts() {
    let state = spawn_state().await;
    let store = state.store();

    let officer = store.create_officer(officer_input("Asante")).await.unwrap();
    assert_eq!(officer.version, 1);

    let updated = store
        .update_officer(officer.id, officer.version, officer_input("Asante-Darko"))
        .await
        .unwrap();
    assert_eq!(updated.version, 2);

    // Second writer still holds version 1
    let result = store
        .update_officer(officer.id, officer.version, officer_input("Mensimah"))
        .await;
    assert!(matches!(result, Err(StoreError::EditConflict)));

    // The losing write left no trace
    let current = store.get_officer(officer.id).await.unwrap().unwrap();
    assert_eq!(current.last_name, "Asante-Darko");
    assert_eq!(current.version, 2);
}

#[tokio::test]
async fn test_concurrent_updates_exactly_one_wins() {
    let state = spawn_state().await;
    let store = state.store();

    let officer = store.create_officer(officer_input("Quartey")).await.unwrap();

    let (a, b) = tokio::join!(
        store.update_officer(officer.id, officer.version, officer_input("Quartey-A")),
        store.update_officer(officer.id, officer.version, officer_input("Quartey-B")),
    );

    let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(successes, 1);

    let current = store.get_officer(officer.id).await.unwrap().unwrap();
    assert_eq!(current.version, 2);
}

#[tokio::test]
async fn test_activation_is_version_checked() {
    let state = spawn_state().await;
    let store = state.store();

    let user = store.create_user("occ@example.com", "not-a-real-hash").await.unwrap();
    let activated = store.activate_user(user.id, user.version).await.unwrap();
    assert!(activated.activated);
    assert_eq!(activated.version, 2);

    // Re-running with the original version must conflict
    let result = store.activate_user(user.id, user.version).await;
    assert!(matches!(result, Err(StoreError::EditConflict)));
}

async fn spawn_app_with_writer() -> (Arc<AppState>, Router, String) {
    let state = spawn_state().await;

    let hash = password::hash_password("pa55word123", Some(&state.config.security)).unwrap();
    let user = state
        .store()
        .create_user("writer@example.com", &hash)
        .await
        .unwrap();
    let user = state
        .store()
        .activate_user(user.id, user.version)
        .await
        .unwrap();

    for code in ["officers:read", "officers:write"] {
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
    let bearer = auth_token.plaintext.clone();
    state
        .store()
        .insert_token(auth_token.into_model())
        .await
        .unwrap();

    let router = api::router(state.clone());
    (state, router, bearer)
}

fn patch_request(
    uri: &str,
    bearer: &str,
    expected_version: Option<i32>,
    body: serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method("PATCH")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {bearer}"))
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(version) = expected_version {
        builder = builder.header("X-Expected-Version", version.to_string());
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn test_expected_version_header() {
    let (state, app, bearer) = spawn_app_with_writer().await;

    let officer = state
        .store()
        .create_officer(officer_input("Tetteh"))
        .await
        .unwrap();
    let uri = format!("/v1/officers/{}", officer.id);

    // Matching precondition succeeds and bumps the version
    let response = app
        .clone()
        .oneshot(patch_request(
            &uri,
            &bearer,
            Some(1),
            json!({"last_name": "Tetteh-Mills"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // A client still expecting version 1 is now stale
    let response = app
        .clone()
        .oneshot(patch_request(
            &uri,
            &bearer,
            Some(1),
            json!({"last_name": "Overwritten"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Garbage precondition is a bad request, not a conflict
    let response = app
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri(&uri)
                .header(header::AUTHORIZATION, format!("Bearer {bearer}"))
                .header(header::CONTENT_TYPE, "application/json")
                .header("X-Expected-Version", "not-a-number")
                .body(Body::from(json!({"last_name": "X"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let current = state
        .store()
        .get_officer(officer.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(current.last_name, "Tetteh-Mills");
    assert_eq!(current.version, 2);
}
