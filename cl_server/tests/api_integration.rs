//! Integration tests for the HTTP API.
//!
//! The router runs over in-memory stores with a scripted outcome source,
//! driven with `oneshot` requests.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use casino_ledger::wager::{Draw, ScriptedOutcome};
use casino_ledger::{LedgerConfig, Stores};
use cl_server::api::{AppState, create_router};
use http_body_util::BodyExt;
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt; // For `oneshot` method

/// Helper to create a test server whose wagers replay `draws`
fn create_test_server(draws: Vec<Draw>) -> Router {
    let state = AppState::new(
        Stores::in_memory(),
        LedgerConfig::default(),
        Arc::new(ScriptedOutcome::new(draws)),
        None,
    );
    create_router(state)
}

/// Send a request and decode the JSON body
async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    user_id: Option<i64>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user_id) = user_id {
        builder = builder.header("x-user-id", user_id.to_string());
    }

    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Provision a wallet through the API
async fn open_account(app: &Router, user_id: i64, amount: &str) {
    let (status, _) = send(
        app,
        "POST",
        "/api/v1/accounts",
        None,
        Some(json!({"user_id": user_id, "starting_amount": amount})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

fn decimal(value: &Value) -> rust_decimal::Decimal {
    value.as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_server(vec![]);
    let (status, body) = send(&app, "GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["storage"], "memory");
}

#[tokio::test]
async fn test_request_id_echoed() {
    let app = create_test_server(vec![]);
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "trace-me")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "trace-me");
}

#[tokio::test]
async fn test_wallet_requires_user_id() {
    let app = create_test_server(vec![]);

    let (status, body) = send(&app, "GET", "/api/v1/wallet", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthorized");

    let request = Request::builder()
        .uri("/api/v1/wallet")
        .header("x-user-id", "not-a-number")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_open_account_defaults_and_duplicates() {
    let app = create_test_server(vec![]);

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/accounts",
        None,
        Some(json!({"user_id": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(decimal(&body["wallet"]["amount"]), dec!(1000));
    assert_eq!(body["wallet"]["version"], 0);

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/accounts",
        None,
        Some(json!({"user_id": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "account_exists");
    assert_eq!(body["retryable"], false);
}

#[tokio::test]
async fn test_unknown_wallet_is_not_found() {
    let app = create_test_server(vec![]);
    let (status, body) = send(&app, "GET", "/api/v1/wallet", Some(9), None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "account_not_found");
    // Client messages never echo user ids
    assert!(!body["error"].as_str().unwrap().contains('9'));
}

#[tokio::test]
async fn test_deposit_and_withdraw() {
    let app = create_test_server(vec![]);
    open_account(&app, 1, "100").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/wallet/deposit",
        Some(1),
        Some(json!({"amount": "25.5"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&body["wallet"]["amount"]), dec!(125.5));

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/wallet/withdraw",
        Some(1),
        Some(json!({"amount": "20"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&body["wallet"]["amount"]), dec!(105.5));

    let (status, body) = send(&app, "GET", "/api/v1/transactions", Some(1), None).await;
    assert_eq!(status, StatusCode::OK);
    let transactions = body["transactions"].as_array().unwrap();
    assert_eq!(transactions.len(), 2);
    assert_eq!(transactions[0]["kind"], "deposit");
    assert_eq!(transactions[1]["kind"], "withdraw");
}

#[tokio::test]
async fn test_withdraw_insufficient_funds() {
    let app = create_test_server(vec![]);
    open_account(&app, 1, "1000").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/wallet/withdraw",
        Some(1),
        Some(json!({"amount": "1500"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "insufficient_funds");
    assert_eq!(body["retryable"], false);

    let (_, body) = send(&app, "GET", "/api/v1/wallet", Some(1), None).await;
    assert_eq!(decimal(&body["wallet"]["amount"]), dec!(1000));

    let (_, body) = send(&app, "GET", "/api/v1/transactions", Some(1), None).await;
    assert!(body["transactions"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_amounts_rejected() {
    let app = create_test_server(vec![]);
    open_account(&app, 1, "100").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/wallet/deposit",
        Some(1),
        Some(json!({"amount": "-10"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_amount");

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/wallet/deposit",
        Some(1),
        Some(json!({"amount": "lots"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "bad_request");

    let (_, body) = send(&app, "GET", "/api/v1/transactions", Some(1), None).await;
    assert!(body["transactions"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_losing_bet() {
    let app = create_test_server(vec![Draw::Lose]);
    open_account(&app, 1, "100").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/games/bet",
        Some(1),
        Some(json!({"game_type": "slots", "bet_amount": "50"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["won"], false);
    assert_eq!(body["message"], "Better luck next time!");
    assert_eq!(decimal(&body["wallet"]["amount"]), dec!(50));
    assert_eq!(decimal(&body["game_result"]["net"]), dec!(-50));
    assert_eq!(body["transaction"]["kind"], "bet");
    assert_eq!(decimal(&body["transaction"]["amount"]), dec!(50));
}

#[tokio::test]
async fn test_winning_bet_and_history() {
    let app = create_test_server(vec![Draw::win(dec!(2.0)).unwrap()]);
    open_account(&app, 1, "100").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/games/bet",
        Some(1),
        Some(json!({"game_type": "slots", "bet_amount": "50"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["won"], true);
    assert_eq!(decimal(&body["wallet"]["amount"]), dec!(150));
    assert_eq!(body["transaction"]["kind"], "win");
    assert_eq!(decimal(&body["transaction"]["amount"]), dec!(50));

    let (status, body) = send(&app, "GET", "/api/v1/games/history", Some(1), None).await;
    assert_eq!(status, StatusCode::OK);
    let history = body["game_history"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["game_type"], "slots");
    assert_eq!(decimal(&history[0]["net"]), dec!(50));
}

#[tokio::test]
async fn test_bet_unknown_game_type() {
    let app = create_test_server(vec![Draw::Lose]);
    open_account(&app, 1, "100").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/games/bet",
        Some(1),
        Some(json!({"game_type": "keno", "bet_amount": "5"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "bad_request");

    let (_, body) = send(&app, "GET", "/api/v1/wallet", Some(1), None).await;
    assert_eq!(decimal(&body["wallet"]["amount"]), dec!(100));
}

#[tokio::test]
async fn test_bet_above_balance() {
    let app = create_test_server(vec![Draw::Lose]);
    open_account(&app, 1, "10").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/games/bet",
        Some(1),
        Some(json!({"game_type": "poker", "bet_amount": "10.01"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "insufficient_funds");

    let (_, body) = send(&app, "GET", "/api/v1/games/history", Some(1), None).await;
    assert!(body["game_history"].as_array().unwrap().is_empty());
}
