//! API Integration Tests
//!
//! Drive the assembled router end to end over the in-memory ledger store.

use axum::http::StatusCode;
use rust_decimal_macros::dec;
use serde_json::json;
use tower::util::ServiceExt;

mod common;

use common::{body_json, decimal_field, delete, get, post_json, setup_app};

#[tokio::test]
async fn test_health_needs_no_key() {
    let (app, _store) = setup_app().await;

    let request = axum::http::Request::builder()
        .method("GET")
        .uri("/health")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_missing_or_bad_api_key_is_unauthorized() {
    let (app, _store) = setup_app().await;

    let no_key = axum::http::Request::builder()
        .method("GET")
        .uri("/accounts")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.clone().oneshot(no_key).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let bad_key = axum::http::Request::builder()
        .method("GET")
        .uri("/accounts")
        .header("X-API-Key", "wrong-key")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(bad_key).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_and_get_accounts() {
    let (app, _store) = setup_app().await;

    let response = app.clone().oneshot(get("/accounts")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let response = app.clone().oneshot(get("/accounts/ACC-1001")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["id"], "ACC-1001");
    assert_eq!(body["ownerName"], "Awa Traoré");
    assert_eq!(body["currency"], "EUR");
    assert_eq!(decimal_field(&body, "balance"), dec!(100.00));

    let response = app.oneshot(get("/accounts/ACC-9999")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error_code"], "account_not_found");
}

#[tokio::test]
async fn test_repeated_reads_are_identical() {
    let (app, _store) = setup_app().await;

    let first = body_json(app.clone().oneshot(get("/accounts/ACC-1001")).await.unwrap()).await;
    let second = body_json(app.oneshot(get("/accounts/ACC-1001")).await.unwrap()).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_debit_then_overdraft_scenario() {
    let (app, _store) = setup_app().await;

    // Debit 30.00 from 100.00 -> 70.00
    let response = app
        .clone()
        .oneshot(post_json(
            "/accounts/ACC-1001/transactions",
            json!({"type": "debit", "amount": "30.00", "label": "Courses"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(decimal_field(&body["account"], "balance"), dec!(70.00));
    assert_eq!(decimal_field(&body["transaction"], "balanceAfter"), dec!(70.00));
    assert_eq!(body["transaction"]["type"], "debit");
    assert_eq!(body["transaction"]["label"], "Courses");

    // Debit 100.00 again -> insufficient funds, balance unchanged
    let response = app
        .clone()
        .oneshot(post_json(
            "/accounts/ACC-1001/transactions",
            json!({"type": "debit", "amount": "100.00"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error_code"], "insufficient_funds");

    let body = body_json(app.oneshot(get("/accounts/ACC-1001")).await.unwrap()).await;
    assert_eq!(decimal_field(&body, "balance"), dec!(70.00));
    assert_eq!(body["transactions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_invalid_type_and_amount_rejected() {
    let (app, _store) = setup_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/accounts/ACC-1001/transactions",
            json!({"type": "withdrawal", "amount": "10.00"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error_code"], "invalid_type");

    for bad_amount in ["0", "-5.00", "1.234", "abc"] {
        let response = app
            .clone()
            .oneshot(post_json(
                "/accounts/ACC-1001/transactions",
                json!({"type": "credit", "amount": bad_amount}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "amount {bad_amount}");
        let body = body_json(response).await;
        assert_eq!(body["error_code"], "invalid_amount");
    }

    // Nothing was written.
    let body = body_json(app.oneshot(get("/accounts/ACC-1001")).await.unwrap()).await;
    assert_eq!(decimal_field(&body, "balance"), dec!(100.00));
    assert!(body["transactions"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_credit_transaction() {
    let (app, _store) = setup_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/accounts/ACC-2001/transactions",
            json!({"type": "credit", "amount": "1200.00", "label": "Facturation freelance"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(decimal_field(&body["account"], "balance"), dec!(1220.00));
}

#[tokio::test]
async fn test_transfer_end_to_end() {
    let (app, _store) = setup_app().await;

    // First bring ACC-1001 to 70.00 like the worked scenario.
    let response = app
        .clone()
        .oneshot(post_json(
            "/accounts/ACC-1001/transactions",
            json!({"type": "debit", "amount": "30.00"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // Transfer 50.00 from A (70.00) to B (20.00).
    let response = app
        .clone()
        .oneshot(post_json(
            "/bank/transfers",
            json!({
                "fromAccountId": "ACC-1001",
                "toAccountId": "ACC-2001",
                "amount": "50.00",
                "description": "Loyer",
                "transferType": "instant"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;

    assert_eq!(decimal_field(&body["fromAccount"], "balance"), dec!(20.00));
    assert_eq!(decimal_field(&body["toAccount"], "balance"), dec!(70.00));
    assert_eq!(body["transferType"], "instant");
    assert_eq!(decimal_field(&body, "amount"), dec!(50.00));

    // Both legs share the correlation reference and carry their own snapshot.
    assert_eq!(body["debit"]["reference"], body["credit"]["reference"]);
    assert_eq!(body["debit"]["reference"], body["reference"]);
    assert!(body["reference"].as_str().unwrap().starts_with("TRF-"));
    assert_eq!(decimal_field(&body["debit"], "balanceAfter"), dec!(20.00));
    assert_eq!(decimal_field(&body["credit"], "balanceAfter"), dec!(70.00));
    assert_eq!(body["debit"]["label"], "Loyer");
}

#[tokio::test]
async fn test_transfer_error_taxonomy() {
    let (app, _store) = setup_app().await;

    // Same account.
    let response = app
        .clone()
        .oneshot(post_json(
            "/bank/transfers",
            json!({"fromAccountId": "ACC-1001", "toAccountId": "ACC-1001", "amount": "10.00"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error_code"], "same_account_transfer");

    // Missing destination.
    let response = app
        .clone()
        .oneshot(post_json(
            "/bank/transfers",
            json!({"fromAccountId": "ACC-1001", "toAccountId": "ACC-9999", "amount": "10.00"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Insufficient source funds.
    let response = app
        .clone()
        .oneshot(post_json(
            "/bank/transfers",
            json!({"fromAccountId": "ACC-2001", "toAccountId": "ACC-1001", "amount": "500.00"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error_code"], "insufficient_funds");

    // No partial state from any of the failures.
    let body = body_json(app.oneshot(get("/accounts")).await.unwrap()).await;
    for account in body.as_array().unwrap() {
        assert!(account["transactions"].as_array().unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_mock_generation_and_reset() {
    let (app, _store) = setup_app().await;

    // Generate accounts.
    let response = app
        .clone()
        .oneshot(post_json(
            "/bank/accounts/generate",
            json!({"count": 3, "owner": "Mock User"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    let generated = body.as_array().unwrap();
    assert_eq!(generated.len(), 3);
    let account_id = generated[0]["id"].as_str().unwrap().to_string();
    assert!(account_id.starts_with("FR76"));
    let initial = decimal_field(&generated[0], "balance");

    // Generate transactions against one of them.
    let response = app
        .clone()
        .oneshot(post_json(
            "/bank/transactions/generate",
            json!({"count": 20, "accountId": account_id}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 20);

    // Conservation holds over the generated history.
    let body = body_json(
        app.clone()
            .oneshot(get(&format!("/accounts/{account_id}")))
            .await
            .unwrap(),
    )
    .await;
    let mut expected = initial;
    for txn in body["transactions"].as_array().unwrap() {
        let amount = decimal_field(txn, "amount");
        match txn["type"].as_str().unwrap() {
            "credit" => expected += amount,
            "debit" => expected -= amount,
            other => panic!("unexpected kind {other}"),
        }
    }
    assert_eq!(decimal_field(&body, "balance"), expected);

    // Count bounds are enforced.
    let response = app
        .clone()
        .oneshot(post_json("/bank/accounts/generate", json!({"count": 51})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Reset wipes everything.
    let response = app.clone().oneshot(delete("/bank/reset")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["accountsDeleted"], 5);

    let body = body_json(app.oneshot(get("/accounts")).await.unwrap()).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_bodies_get_error_envelope() {
    let (app, _store) = setup_app().await;

    // Not JSON at all.
    let response = app
        .clone()
        .oneshot(common::post_raw("/accounts/ACC-1001/transactions", "{not json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error_code"], "invalid_request");

    // Wrong field type: amount must be a string.
    let response = app
        .clone()
        .oneshot(post_json(
            "/accounts/ACC-1001/transactions",
            json!({"type": "credit", "amount": 10}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error_code"], "invalid_request");

    let body = body_json(app.oneshot(get("/accounts/ACC-1001")).await.unwrap()).await;
    assert_eq!(decimal_field(&body, "balance"), dec!(100.00));
}

#[tokio::test]
async fn test_cards_create_and_list() {
    let (app, _store) = setup_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/bank/cards",
            json!({"accountId": "ACC-1001", "cardType": "credit"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["accountId"], "ACC-1001");
    assert_eq!(body["type"], "credit");
    assert_eq!(body["cardholderName"], "AWA TRAORÉ");
    assert_eq!(body["cardNumber"].as_str().unwrap().len(), 16);
    assert!(body["cardNumber"].as_str().unwrap().starts_with("4532"));
    assert_eq!(decimal_field(&body, "limit"), dec!(5000));
    assert_eq!(body["status"], "active");

    // Default card type is debit, without a limit.
    let response = app
        .clone()
        .oneshot(post_json("/bank/cards", json!({"accountId": "ACC-1001"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["type"], "debit");
    assert!(body.get("limit").is_none());

    let response = app.clone().oneshot(get("/bank/cards/ACC-1001")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let response = app.oneshot(get("/bank/cards/ACC-9999")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_loans_create_and_list() {
    let (app, _store) = setup_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/bank/loans",
            json!({
                "accountId": "ACC-2001",
                "loanType": "personal",
                "amount": "10000",
                "interestRate": "5",
                "durationMonths": 60
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["type"], "personal");
    assert_eq!(decimal_field(&body, "monthlyPayment"), dec!(188.71));
    assert_eq!(decimal_field(&body, "remainingBalance"), dec!(10000));
    assert_eq!(body["durationMonths"], 60);

    // Creating a loan leaves the ledger balance alone.
    let account = body_json(app.clone().oneshot(get("/accounts/ACC-2001")).await.unwrap()).await;
    assert_eq!(decimal_field(&account, "balance"), dec!(20.00));

    let response = app
        .clone()
        .oneshot(post_json(
            "/bank/loans",
            json!({
                "accountId": "ACC-2001",
                "loanType": "auto",
                "amount": "10000",
                "interestRate": "25",
                "durationMonths": 60
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error_code"], "invalid_request");

    let response = app.oneshot(get("/bank/loans/ACC-2001")).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_history_endpoint_most_recent_first() {
    let (app, _store) = setup_app().await;

    for (kind, amount) in [("credit", "10.00"), ("debit", "5.00"), ("credit", "7.50")] {
        let response = app
            .clone()
            .oneshot(post_json(
                "/accounts/ACC-1001/transactions",
                json!({"type": kind, "amount": amount}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .clone()
        .oneshot(get("/accounts/ACC-1001/transactions"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let history = body.as_array().unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(decimal_field(&history[0], "amount"), dec!(7.50));
    assert_eq!(decimal_field(&history[2], "amount"), dec!(10.00));

    let response = app
        .oneshot(get("/accounts/ACC-9999/transactions"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
