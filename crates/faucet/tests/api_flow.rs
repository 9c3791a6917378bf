//! End-to-end tests for the faucet HTTP surface, driven through the
//! router with an in-memory stub backend.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use koin_chain::{BackendKind, ChainConfig, TokenInfo};
use koin_faucet::api::{router, AppState};
use koin_faucet::{Dispatcher, FaucetMetrics, PayoutPolicy, ThrottleStore};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

// A well-formed base58check address (Bitcoin genesis).
const GOOD_ADDRESS: &str = "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa";

fn test_app(stub_balance: u64, k: f64, cap: u64, rate_seconds: u64) -> (Router, TempDir) {
    let dir = TempDir::new().unwrap();
    let db = sled::open(dir.path().join("db")).unwrap();
    let throttle = ThrottleStore::open(&db).unwrap();

    let token = TokenInfo::default();
    let chain = ChainConfig {
        backend: BackendKind::Stub,
        stub_balance,
        wallet_address: "faucet-hot".to_string(),
        ..ChainConfig::default()
    };
    let client = koin_chain::connect(&chain, &token).unwrap();

    let policy = PayoutPolicy::new(k, cap).unwrap();
    let metrics = Arc::new(FaucetMetrics::new().unwrap());
    let dispatcher = Dispatcher::new(
        client,
        throttle,
        policy,
        chain.wallet_address.clone(),
        rate_seconds,
        metrics.clone(),
    );

    let state = Arc::new(AppState {
        dispatcher,
        token,
        metrics,
    });

    (router(state, true), dir)
}

fn post_request(path: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn post_json(app: &Router, path: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(post_request(path, body.to_string()))
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn payout_then_throttle_then_balance() {
    // k of 1e-5 over a 100-token balance pays out 0.001 tokens.
    let (app, _dir) = test_app(10_000_000_000, 0.000_01, 500_000_000, 3600);

    let (status, body) = post_json(
        &app,
        "/request_koin",
        json!({"id": "alice", "address": GOOD_ADDRESS}),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(
        body["message"],
        format!("Transferring 0.00100000 KOIN to address {}.", GOOD_ADDRESS)
    );

    // Same identifier inside the window is refused with a countdown
    // and a Retry-After header carrying the same number.
    let response = app
        .clone()
        .oneshot(post_request(
            "/request_koin",
            json!({"id": "alice", "address": GOOD_ADDRESS}).to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
    let retry_after: u64 = response
        .headers()
        .get(header::RETRY_AFTER)
        .unwrap()
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!((1..=3600).contains(&retry_after));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(
        body["message"],
        format!("Cannot receive funds for {} more seconds.", retry_after)
    );

    // Exactly one debit happened: 100 - 0.001.
    let (status, body) = post_json(&app, "/balance", json!({"address": GOOD_ADDRESS})).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(
        body["message"],
        format!("Balance at address {} is 99.99900000 KOIN.", GOOD_ADDRESS)
    );
}

#[tokio::test]
async fn malformed_bodies_are_input_errors() {
    let (app, _dir) = test_app(10_000_000_000, 0.000_01, 500_000_000, 3600);

    let bad_bodies = [
        "{}".to_string(),
        json!({"id": "alice"}).to_string(),
        json!({"address": GOOD_ADDRESS}).to_string(),
        "not json at all".to_string(),
        String::new(),
    ];

    for bad in bad_bodies {
        let response = app
            .clone()
            .oneshot(post_request("/request_koin", bad.clone()))
            .await
            .unwrap();
        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "body {:?} should be rejected",
            bad
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "Input error.");
    }
}

#[tokio::test]
async fn empty_identifier_is_throttled_like_any_other() {
    let (app, _dir) = test_app(10_000_000_000, 0.000_01, 500_000_000, 3600);

    // Present-but-empty fields are valid input; the empty string is
    // simply one more identifier.
    let (status, _) = post_json(
        &app,
        "/request_koin",
        json!({"id": "", "address": GOOD_ADDRESS}),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (status, _) = post_json(
        &app,
        "/request_koin",
        json!({"id": "", "address": GOOD_ADDRESS}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_ACCEPTABLE);
}

#[tokio::test]
async fn bad_address_does_not_burn_the_window() {
    let (app, _dir) = test_app(10_000_000_000, 0.000_01, 500_000_000, 3600);

    let (status, body) = post_json(
        &app,
        "/request_koin",
        json!({"id": "alice", "address": "definitely-not-base58check"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid address format.");

    // The rejection must not have consumed alice's slot.
    let (status, _) = post_json(
        &app,
        "/request_koin",
        json!({"id": "alice", "address": GOOD_ADDRESS}),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
}

#[tokio::test]
async fn payout_is_clamped_to_the_cap() {
    // k = 1 would drain the wallet; the cap holds it at 2500 minor units.
    let (app, _dir) = test_app(10_000_000_000, 1.0, 2_500, 3600);

    let (status, body) = post_json(
        &app,
        "/request_koin",
        json!({"id": "whale", "address": GOOD_ADDRESS}),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(
        body["message"],
        format!("Transferring 0.00002500 KOIN to address {}.", GOOD_ADDRESS)
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_grant_one_payout_per_window() {
    let (app, _dir) = test_app(10_000_000_000, 0.000_01, 500_000_000, 3600);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            let response = app
                .oneshot(post_request(
                    "/request_koin",
                    json!({"id": "racer", "address": GOOD_ADDRESS}).to_string(),
                ))
                .await
                .unwrap();
            response.status()
        }));
    }

    let mut accepted = 0;
    let mut throttled = 0;
    for handle in handles {
        match handle.await.unwrap() {
            StatusCode::ACCEPTED => accepted += 1,
            StatusCode::NOT_ACCEPTABLE => throttled += 1,
            other => panic!("unexpected status {}", other),
        }
    }

    assert_eq!(accepted, 1);
    assert_eq!(throttled, 7);
}

#[tokio::test]
async fn service_endpoints_respond() {
    let (app, _dir) = test_app(10_000_000_000, 0.000_01, 500_000_000, 3600);

    for path in ["/", "/health", "/status"] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "GET {} failed", path);
    }

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("faucet_payouts_total"));
}

#[tokio::test]
async fn status_reports_the_hot_wallet() {
    let (app, _dir) = test_app(77_700_000_000, 0.000_01, 500_000_000, 3600);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["wallet_address"], "faucet-hot");
    assert_eq!(body["balance"], "777.00000000");
    assert_eq!(body["symbol"], "KOIN");
}
