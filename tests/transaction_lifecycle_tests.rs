mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    routing::{get, patch, post},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use tokenforge_backend::handlers;
use tokenforge_backend::AppState;

use crate::common::{create_test_app_state, unique_email};

fn build_test_router(state: AppState) -> Router {
    Router::new()
        .route("/api/auth/signup", post(handlers::auth::signup))
        .route("/api/tokens", post(handlers::token::create_token))
        .route("/api/tokens/{id}", get(handlers::token::get_token))
        .route(
            "/api/transactions",
            post(handlers::transaction::create_transaction)
                .get(handlers::transaction::list_transactions),
        )
        .route(
            "/api/transactions/{id}/status",
            patch(handlers::transaction::update_transaction_status),
        )
        .with_state(state)
}

async fn request(
    app: &Router,
    method: Method,
    uri: &str,
    jwt: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", jwt));
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();

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
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/signup")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "email": unique_email(prefix),
                        "password": "correct-horse",
                        "display_name": "Lifecycle Tester",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    body["token"].as_str().unwrap().to_string()
}

async fn create_token(app: &Router, jwt: &str, name: &str, symbol: &str) -> Value {
    let (status, token) = request(
        app,
        Method::POST,
        "/api/tokens",
        jwt,
        Some(json!({ "name": name, "symbol": symbol })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "token create failed: {}", token);
    token
}

/// Confirming a mint applies the amount to the token supply.
#[tokio::test]
async fn confirmed_mint_increases_supply() {
    let state = create_test_app_state().await;
    let app = build_test_router(state);
    let jwt = signup(&app, "mint").await;
    let token = create_token(&app, &jwt, "Supply", "SUP").await;

    let (_, tx) = request(
        &app,
        Method::POST,
        "/api/transactions",
        &jwt,
        Some(json!({ "token_id": token["id"], "type": "mint", "amount": 1000 })),
    )
    .await;

    let uri = format!("/api/transactions/{}/status", tx["id"]);
    let (status, updated) = request(
        &app,
        Method::PATCH,
        &uri,
        &jwt,
        Some(json!({ "status": "confirmed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "confirm failed: {}", updated);
    assert_eq!(updated["status"], "confirmed");

    let (_, refreshed) = request(
        &app,
        Method::GET,
        &format!("/api/tokens/{}", token["id"]),
        &jwt,
        None,
    )
    .await;
    assert_eq!(refreshed["total_supply"], json!("1000"));
}

/// A failed mint leaves the supply untouched.
#[tokio::test]
async fn failed_mint_leaves_supply_alone() {
    let state = create_test_app_state().await;
    let app = build_test_router(state);
    let jwt = signup(&app, "failed-mint").await;
    let token = create_token(&app, &jwt, "Untouched", "UNT").await;

    let (_, tx) = request(
        &app,
        Method::POST,
        "/api/transactions",
        &jwt,
        Some(json!({ "token_id": token["id"], "type": "mint", "amount": 500 })),
    )
    .await;

    let uri = format!("/api/transactions/{}/status", tx["id"]);
    let (status, _) = request(
        &app,
        Method::PATCH,
        &uri,
        &jwt,
        Some(json!({ "status": "failed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, refreshed) = request(
        &app,
        Method::GET,
        &format!("/api/tokens/{}", token["id"]),
        &jwt,
        None,
    )
    .await;
    assert_eq!(refreshed["total_supply"], json!("0"));
}

/// Burning more than the current supply is rejected at confirmation time.
#[tokio::test]
async fn burn_cannot_exceed_supply() {
    let state = create_test_app_state().await;
    let app = build_test_router(state);
    let jwt = signup(&app, "burn").await;
    let token = create_token(&app, &jwt, "Scarce", "SCR").await;

    let (_, tx) = request(
        &app,
        Method::POST,
        "/api/transactions",
        &jwt,
        Some(json!({ "token_id": token["id"], "type": "burn", "amount": 1 })),
    )
    .await;

    let uri = format!("/api/transactions/{}/status", tx["id"]);
    let (status, body) = request(
        &app,
        Method::PATCH,
        &uri,
        &jwt,
        Some(json!({ "status": "confirmed" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "expected rejection: {}", body);
    assert_eq!(body["error"]["code"], "validation_failed");
}

/// A terminal transaction cannot transition again.
#[tokio::test]
async fn terminal_status_is_frozen() {
    let state = create_test_app_state().await;
    let app = build_test_router(state);
    let jwt = signup(&app, "terminal").await;
    let token = create_token(&app, &jwt, "Frozen", "FRZ").await;

    let (_, tx) = request(
        &app,
        Method::POST,
        "/api/transactions",
        &jwt,
        Some(json!({ "token_id": token["id"], "type": "transfer", "amount": 10 })),
    )
    .await;

    let uri = format!("/api/transactions/{}/status", tx["id"]);
    let (status, _) = request(
        &app,
        Method::PATCH,
        &uri,
        &jwt,
        Some(json!({ "status": "failed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = request(
        &app,
        Method::PATCH,
        &uri,
        &jwt,
        Some(json!({ "status": "confirmed" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "expected conflict: {}", body);
    assert_eq!(body["error"]["code"], "conflict");
}

/// Zero and negative amounts are rejected before anything is written.
#[tokio::test]
async fn non_positive_amounts_are_rejected() {
    let state = create_test_app_state().await;
    let app = build_test_router(state);
    let jwt = signup(&app, "amounts").await;
    let token = create_token(&app, &jwt, "Validated", "VLD").await;

    for amount in [json!(0), json!(-5)] {
        let (status, body) = request(
            &app,
            Method::POST,
            "/api/transactions",
            &jwt,
            Some(json!({ "token_id": token["id"], "type": "mint", "amount": amount.clone() })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "amount {}: {}", amount, body);
        assert_eq!(body["error"]["code"], "validation_failed");
    }
}

/// Listing only returns the caller's own transactions.
#[tokio::test]
async fn listing_is_scoped_to_owner() {
    let state = create_test_app_state().await;
    let app = build_test_router(state);
    let jwt_a = signup(&app, "scope-a").await;
    let jwt_b = signup(&app, "scope-b").await;
    let token = create_token(&app, &jwt_a, "Scoped", "SCP").await;

    request(
        &app,
        Method::POST,
        "/api/transactions",
        &jwt_a,
        Some(json!({ "token_id": token["id"], "type": "mint", "amount": 7 })),
    )
    .await;

    let (_, mine) = request(&app, Method::GET, "/api/transactions", &jwt_a, None).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);

    let (_, theirs) = request(&app, Method::GET, "/api/transactions", &jwt_b, None).await;
    assert!(theirs.as_array().unwrap().is_empty());
}

/// Symbol length is measured in characters, so multi-byte symbols within
/// the limit are accepted.
#[tokio::test]
async fn symbol_length_counts_characters() {
    let state = create_test_app_state().await;
    let app = build_test_router(state);
    let jwt = signup(&app, "symbol").await;

    // 7 characters, 14 bytes
    let token = create_token(&app, &jwt, "Nordic", "ÅÄÖÜÉÈÊ").await;
    assert_eq!(token["symbol"], "ÅÄÖÜÉÈÊ");

    let (status, body) = request(
        &app,
        Method::POST,
        "/api/tokens",
        &jwt,
        Some(json!({ "name": "TooLong", "symbol": "ABCDEFGHIJKLM" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "13 chars must fail: {}", body);
    assert_eq!(body["error"]["code"], "validation_failed");
}
