use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use sea_orm::{DatabaseBackend, MockDatabase};

use botaskaf::domain::types::Form;
use botaskaf::infra::cache::{AppCache, MemoryEntityCache};
use botaskaf::router::build_router;
use botaskaf::state::AppState;
use botaskaf::usecase::cache::Cached;
use botaskaf_cipher::decrypt;
use botaskaf_domain::id::UserId;
use botaskaf_domain::user::UserType;
use botaskaf_schema::forms;
use botaskaf_testing::auth::MockAuth;

use crate::helpers::{TEST_SECRET, test_form_record, test_user};

fn state(db: MockDatabase, cache: &MemoryEntityCache) -> AppState {
    AppState {
        db: db.into_connection(),
        cache: AppCache::Memory(cache.clone()),
        cache_ttl: Duration::from_secs(60),
        token_max_age: chrono::Duration::hours(1),
        setup_token: None,
    }
}

/// Seeds the cache with an owner and one of their forms.
async fn seeded_cache() -> (MemoryEntityCache, Form) {
    let cache = MemoryEntityCache::new();
    let cached = Cached::new(AppCache::Memory(cache.clone()), Duration::from_secs(60));
    let owner = test_user(1, UserType::Registered);
    let stranger = test_user(2, UserType::Registered);
    let form = test_form_record(5, Some(owner.id)).into_form(Some(owner.clone()));
    cached.fill_user(&owner).await;
    cached.fill_user(&stranger).await;
    cached.fill_form(&form).await;
    (cache, form)
}

fn empty_db() -> MockDatabase {
    MockDatabase::new(DatabaseBackend::Postgres)
}

#[tokio::test]
async fn should_report_healthy() {
    let server = TestServer::new(build_router(state(empty_db(), &MemoryEntityCache::new()))).unwrap();

    server.get("/healthz").await.assert_status_ok();
}

#[tokio::test]
async fn should_issue_plain_text_token_from_cache() {
    let (cache, form) = seeded_cache().await;
    let server = TestServer::new(build_router(state(empty_db(), &cache))).unwrap();

    let response = server
        .get(&format!("/contactform/{}/token", form.uuid.simple()))
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.header("content-type"),
        "text/plain; charset=utf-8"
    );
    let token = response.text();
    assert!(decrypt(TEST_SECRET, &token).is_ok());
}

#[tokio::test]
async fn should_verify_issued_token() {
    let (cache, form) = seeded_cache().await;
    let server = TestServer::new(build_router(state(empty_db(), &cache))).unwrap();
    let uuid = form.uuid.simple();

    let token = server.get(&format!("/contactform/{uuid}/token")).await.text();
    server
        .post(&format!("/contactform/{uuid}/verify"))
        .text(token)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let response = server
        .post(&format!("/contactform/{uuid}/verify"))
        .text("00:00")
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<serde_json::Value>()["kind"], "INVALID_TOKEN");
}

#[tokio::test]
async fn should_reject_malformed_uuid_as_json() {
    let server = TestServer::new(build_router(state(empty_db(), &MemoryEntityCache::new()))).unwrap();

    let response = server.get("/contactform/not-a-uuid/token").await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["kind"], "INVALID_ID");
    assert_eq!(body["title"], "Bad request");
}

#[tokio::test]
async fn should_return_not_found_for_unknown_form() {
    let db = empty_db().append_query_results([Vec::<forms::Model>::new()]);
    let server = TestServer::new(build_router(state(db, &MemoryEntityCache::new()))).unwrap();

    let response = server
        .get(&format!("/contactform/{}/token", uuid::Uuid::new_v4().simple()))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<serde_json::Value>()["kind"], "NOT_FOUND");
}

#[tokio::test]
async fn should_require_identity_for_forms() {
    let server = TestServer::new(build_router(state(empty_db(), &MemoryEntityCache::new()))).unwrap();

    server
        .get("/forms")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn should_show_form_to_owner_without_secret() {
    let (cache, form) = seeded_cache().await;
    let server = TestServer::new(build_router(state(empty_db(), &cache))).unwrap();
    let auth = MockAuth::new(UserId(1));

    let response = server
        .get(&format!("/forms/{}", form.id))
        .add_header(auth.header_name(), auth.header_value())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["id"], 5);
    assert_eq!(body["uuid"], form.uuid.simple().to_string());
    assert_eq!(body["urls"]["self"], "/forms/5");
    assert!(body.get("secret").is_none());
    assert!(body["owner"].get("password").is_none());
}

#[tokio::test]
async fn should_deny_form_to_other_user() {
    let (cache, form) = seeded_cache().await;
    let server = TestServer::new(build_router(state(empty_db(), &cache))).unwrap();
    let auth = MockAuth::new(UserId(2));

    let response = server
        .get(&format!("/forms/{}", form.id))
        .add_header(auth.header_name(), auth.header_value())
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    let body: serde_json::Value = response.json();
    assert_eq!(body["kind"], "AUTHZ");
    assert_eq!(body["title"], "Access denied");
}

#[tokio::test]
async fn should_reject_non_numeric_form_id() {
    let server = TestServer::new(build_router(state(empty_db(), &MemoryEntityCache::new()))).unwrap();
    let auth = MockAuth::new(UserId(1));

    server
        .get("/forms/abc")
        .add_header(auth.header_name(), auth.header_value())
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn should_disable_setup_without_configured_token() {
    let server = TestServer::new(build_router(state(empty_db(), &MemoryEntityCache::new()))).unwrap();

    server
        .post("/setup")
        .json(&serde_json::json!({
            "email": "root@example.com",
            "display_name": "Root",
            "password": "hunter2",
        }))
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn should_echo_request_id() {
    let server = TestServer::new(build_router(state(empty_db(), &MemoryEntityCache::new()))).unwrap();

    let generated = server.get("/healthz").await;
    assert!(!generated.header("x-request-id").is_empty());

    let echoed = server
        .get("/healthz")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("req-42"),
        )
        .await;
    assert_eq!(echoed.header("x-request-id"), "req-42");
}
