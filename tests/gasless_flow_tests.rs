mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    routing::{get, patch, post},
    Router,
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, Set};
use serde_json::{json, Value};
use tower::ServiceExt;

use tokenforge_backend::entities::prelude::GaslessSponsorships;
use tokenforge_backend::handlers;
use tokenforge_backend::AppState;

use crate::common::{create_test_app_state, unique_email};

fn build_test_router(state: AppState) -> Router {
    Router::new()
        .route("/api/auth/signup", post(handlers::auth::signup))
        .route(
            "/api/tokens",
            post(handlers::token::create_token).get(handlers::token::list_tokens),
        )
        .route(
            "/api/transactions",
            post(handlers::transaction::create_transaction),
        )
        .route(
            "/api/transactions/{id}/status",
            patch(handlers::transaction::update_transaction_status),
        )
        .route("/api/gasless/sponsor", post(handlers::gasless::sponsor))
        .route("/api/gasless/{id}", get(handlers::gasless::get_sponsorship))
        .route(
            "/api/gasless/{id}/execute",
            post(handlers::gasless::execute_sponsorship),
        )
        .route("/api/policies", post(handlers::policy::create_policy))
        .with_state(state)
}

async fn post_json(app: &Router, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let response = app
        .clone()
        .oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn signup(app: &Router, prefix: &str) -> String {
    let (status, body) = post_json(
        app,
        "/api/auth/signup",
        None,
        json!({
            "email": unique_email(prefix),
            "password": "correct-horse",
            "display_name": "Test User",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "signup failed: {}", body);
    body["token"].as_str().unwrap().to_string()
}

async fn get_json(app: &Router, uri: &str, token: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(uri)
                .header("authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn backdate_expiry(db: &DatabaseConnection, sponsorship_id: i32) {
    let row = GaslessSponsorships::find_by_id(sponsorship_id)
        .one(db)
        .await
        .unwrap()
        .unwrap();
    let mut active = row.into_active_model();
    active.expires_at = Set((Utc::now() - Duration::minutes(5)).into());
    active.update(db).await.unwrap();
}

/// End-to-end scenario: create token, mint transaction, sponsor. Expects a
/// sponsorship in `sponsored` status with nonce 1 and a ~30 minute expiry.
#[tokio::test]
async fn sponsor_flow_allocates_nonce_one_with_expiry() {
    let state = create_test_app_state().await;
    let app = build_test_router(state);
    let jwt = signup(&app, "flow").await;

    let (status, token) = post_json(
        &app,
        "/api/tokens",
        Some(jwt.as_str()),
        json!({ "name": "MyToken", "symbol": "MTK", "total_supply": 0 }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "token create failed: {}", token);
    assert_eq!(token["total_supply"], json!("0"));
    assert_eq!(token["decimals"], json!(6));

    let (status, tx) = post_json(
        &app,
        "/api/transactions",
        Some(jwt.as_str()),
        json!({ "token_id": token["id"], "type": "mint", "amount": 1000 }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "transaction create failed: {}", tx);
    assert_eq!(tx["status"], "pending");

    let before = Utc::now();
    let (status, sponsorship) = post_json(
        &app,
        "/api/gasless/sponsor",
        Some(jwt.as_str()),
        json!({ "transaction_id": tx["id"], "estimated_fee": 200000 }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "sponsor failed: {}", sponsorship);
    assert_eq!(sponsorship["status"], "sponsored");
    assert_eq!(sponsorship["nonce"], 1);

    let expires_at: DateTime<Utc> = sponsorship["expires_at"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();
    let expected = before + Duration::minutes(30);
    let drift = (expires_at - expected).num_seconds().abs();
    assert!(drift < 60, "expiry {} not ~30min out", expires_at);
}

/// Nonces are strictly increasing per user.
#[tokio::test]
async fn nonces_increase_per_user() {
    let state = create_test_app_state().await;
    let app = build_test_router(state);
    let jwt = signup(&app, "nonce").await;

    let (_, token) = post_json(
        &app,
        "/api/tokens",
        Some(jwt.as_str()),
        json!({ "name": "NonceCoin", "symbol": "NNC" }),
    )
    .await;

    let mut seen = Vec::new();
    for i in 0..3 {
        let (_, tx) = post_json(
            &app,
            "/api/transactions",
            Some(jwt.as_str()),
            json!({ "token_id": token["id"], "type": "mint", "amount": 10 + i }),
        )
        .await;
        let (status, sponsorship) = post_json(
            &app,
            "/api/gasless/sponsor",
            Some(jwt.as_str()),
            json!({ "transaction_id": tx["id"], "estimated_fee": 1000 }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        seen.push(sponsorship["nonce"].as_i64().unwrap());
    }

    assert_eq!(seen, vec![1, 2, 3]);
}

/// A second sponsor call inside the window of a {1h, max 1} rate-limit
/// policy is denied with a policy error, and no second row is created.
#[tokio::test]
async fn rate_limit_denies_second_sponsor() {
    let state = create_test_app_state().await;
    let app = build_test_router(state);
    let jwt = signup(&app, "ratelimit").await;

    let (_, token) = post_json(
        &app,
        "/api/tokens",
        Some(jwt.as_str()),
        json!({ "name": "Limited", "symbol": "LMT" }),
    )
    .await;

    let (status, _) = post_json(
        &app,
        "/api/policies",
        Some(jwt.as_str()),
        json!({ "config": { "type": "rate_limit", "window_hours": 1, "max_transactions": 1 } }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, tx1) = post_json(
        &app,
        "/api/transactions",
        Some(jwt.as_str()),
        json!({ "token_id": token["id"], "type": "mint", "amount": 100 }),
    )
    .await;
    let (status, _) = post_json(
        &app,
        "/api/gasless/sponsor",
        Some(jwt.as_str()),
        json!({ "transaction_id": tx1["id"], "estimated_fee": 500 }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, tx2) = post_json(
        &app,
        "/api/transactions",
        Some(jwt.as_str()),
        json!({ "token_id": token["id"], "type": "mint", "amount": 100 }),
    )
    .await;
    let (status, body) = post_json(
        &app,
        "/api/gasless/sponsor",
        Some(jwt.as_str()),
        json!({ "transaction_id": tx2["id"], "estimated_fee": 500 }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "expected denial: {}", body);
    assert_eq!(body["error"]["code"], "policy_denied");
}

/// Exactly the amount limit passes; one unit above is denied.
#[tokio::test]
async fn amount_limit_boundary() {
    let state = create_test_app_state().await;
    let app = build_test_router(state);
    let jwt = signup(&app, "amount").await;

    let (_, token) = post_json(
        &app,
        "/api/tokens",
        Some(jwt.as_str()),
        json!({ "name": "Capped", "symbol": "CAP" }),
    )
    .await;

    post_json(
        &app,
        "/api/policies",
        Some(jwt.as_str()),
        json!({ "config": { "type": "amount_limit", "max_amount": "200000" } }),
    )
    .await;

    let (_, tx1) = post_json(
        &app,
        "/api/transactions",
        Some(jwt.as_str()),
        json!({ "token_id": token["id"], "type": "mint", "amount": 1 }),
    )
    .await;
    let (status, body) = post_json(
        &app,
        "/api/gasless/sponsor",
        Some(jwt.as_str()),
        json!({ "transaction_id": tx1["id"], "estimated_fee": 200000 }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "boundary should pass: {}", body);

    let (_, tx2) = post_json(
        &app,
        "/api/transactions",
        Some(jwt.as_str()),
        json!({ "token_id": token["id"], "type": "mint", "amount": 1 }),
    )
    .await;
    let (status, body) = post_json(
        &app,
        "/api/gasless/sponsor",
        Some(jwt.as_str()),
        json!({ "transaction_id": tx2["id"], "estimated_fee": 200001 }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "above limit must deny: {}", body);
    assert_eq!(body["error"]["code"], "policy_denied");
}

/// Sponsoring someone else's transaction reads as not-found, and a second
/// sponsorship for the same transaction conflicts.
#[tokio::test]
async fn ownership_and_duplicate_sponsorship() {
    let state = create_test_app_state().await;
    let app = build_test_router(state);
    let jwt_a = signup(&app, "owner-a").await;
    let jwt_b = signup(&app, "owner-b").await;

    let (_, token) = post_json(
        &app,
        "/api/tokens",
        Some(jwt_a.as_str()),
        json!({ "name": "Private", "symbol": "PRV" }),
    )
    .await;
    let (_, tx) = post_json(
        &app,
        "/api/transactions",
        Some(jwt_a.as_str()),
        json!({ "token_id": token["id"], "type": "mint", "amount": 5 }),
    )
    .await;

    // Another user cannot see it
    let (status, body) = post_json(
        &app,
        "/api/gasless/sponsor",
        Some(jwt_b.as_str()),
        json!({ "transaction_id": tx["id"], "estimated_fee": 10 }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND, "expected not_found: {}", body);
    assert_eq!(body["error"]["code"], "not_found");

    // Owner sponsors once, the second attempt conflicts
    let (status, _) = post_json(
        &app,
        "/api/gasless/sponsor",
        Some(jwt_a.as_str()),
        json!({ "transaction_id": tx["id"], "estimated_fee": 10 }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = post_json(
        &app,
        "/api/gasless/sponsor",
        Some(jwt_a.as_str()),
        json!({ "transaction_id": tx["id"], "estimated_fee": 10 }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "expected conflict: {}", body);
    assert_eq!(body["error"]["code"], "conflict");
}

/// Requests without a bearer token short-circuit before business logic.
#[tokio::test]
async fn missing_token_is_unauthorized() {
    let state = create_test_app_state().await;
    let app = build_test_router(state);

    let (status, body) = post_json(
        &app,
        "/api/tokens",
        None,
        json!({ "name": "NoAuth", "symbol": "NOA" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "unauthorized");
}

/// Executing a live sponsorship moves it to `executed`, and a second
/// execute conflicts.
#[tokio::test]
async fn live_sponsorship_executes_once() {
    let state = create_test_app_state().await;
    let app = build_test_router(state);
    let jwt = signup(&app, "execute").await;

    let (_, token) = post_json(
        &app,
        "/api/tokens",
        Some(jwt.as_str()),
        json!({ "name": "Runner", "symbol": "RUN" }),
    )
    .await;
    let (_, tx) = post_json(
        &app,
        "/api/transactions",
        Some(jwt.as_str()),
        json!({ "token_id": token["id"], "type": "mint", "amount": 50 }),
    )
    .await;
    let (_, sponsorship) = post_json(
        &app,
        "/api/gasless/sponsor",
        Some(jwt.as_str()),
        json!({ "transaction_id": tx["id"], "estimated_fee": 100 }),
    )
    .await;
    let id = sponsorship["id"].as_i64().unwrap();

    let (status, executed) = post_json(
        &app,
        &format!("/api/gasless/{}/execute", id),
        Some(jwt.as_str()),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "execute failed: {}", executed);
    assert_eq!(executed["status"], "executed");

    let (status, body) = post_json(
        &app,
        &format!("/api/gasless/{}/execute", id),
        Some(jwt.as_str()),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "expected conflict: {}", body);
    assert_eq!(body["error"]["code"], "conflict");
}

/// An expired sponsorship reads as `failed`, refuses execution, and the
/// failure is persisted on first touch.
#[tokio::test]
async fn expired_sponsorship_never_executes() {
    let state = create_test_app_state().await;
    let db = state.db.clone();
    let app = build_test_router(state);
    let jwt = signup(&app, "expired").await;

    let (_, token) = post_json(
        &app,
        "/api/tokens",
        Some(jwt.as_str()),
        json!({ "name": "Stale", "symbol": "STL" }),
    )
    .await;
    let (_, tx) = post_json(
        &app,
        "/api/transactions",
        Some(jwt.as_str()),
        json!({ "token_id": token["id"], "type": "mint", "amount": 50 }),
    )
    .await;
    let (status, sponsorship) = post_json(
        &app,
        "/api/gasless/sponsor",
        Some(jwt.as_str()),
        json!({ "transaction_id": tx["id"], "estimated_fee": 100 }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = sponsorship["id"].as_i64().unwrap() as i32;

    backdate_expiry(&db, id).await;

    // Reads apply expiry without waiting for a write
    let (status, body) = get_json(&app, &format!("/api/gasless/{}", id), &jwt).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "failed");

    let (status, body) = post_json(
        &app,
        &format!("/api/gasless/{}/execute", id),
        Some(jwt.as_str()),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "expected conflict: {}", body);
    assert_eq!(body["error"]["code"], "conflict");

    let row = GaslessSponsorships::find_by_id(id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.status, "failed");
}
