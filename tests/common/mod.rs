//! Common test utilities
//!
//! Every integration test drives the real router over the in-memory ledger
//! store, so no database is required.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use demobank::api::{build_app, AccessGate, AppState};
use demobank::domain::Account;
use demobank::store::{LedgerStore, MemoryLedgerStore};

pub const API_KEY: &str = "test-key-123";

/// Build the app with two seeded accounts:
/// ACC-1001 (Awa Traoré, 100.00 EUR) and ACC-2001 (Rayan Dupuis, 20.00 EUR).
pub async fn setup_app() -> (Router, Arc<MemoryLedgerStore>) {
    let store = Arc::new(MemoryLedgerStore::new());
    seed_account(&store, "ACC-1001", "Awa Traoré", dec!(100.00)).await;
    seed_account(&store, "ACC-2001", "Rayan Dupuis", dec!(20.00)).await;

    let state = AppState {
        store: store.clone(),
        gate: AccessGate::from_keys([API_KEY]),
    };
    (build_app(state), store)
}

pub async fn seed_account(store: &Arc<MemoryLedgerStore>, id: &str, owner: &str, balance: Decimal) {
    store
        .insert_account(Account {
            id: id.to_string(),
            owner_name: owner.to_string(),
            balance,
            currency: "EUR".to_string(),
            created_at: Utc::now(),
            transactions: Vec::new(),
        })
        .await
        .expect("seed account");
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("X-API-Key", API_KEY)
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("X-API-Key", API_KEY)
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// POST an arbitrary body declared as JSON, for exercising malformed input.
pub fn post_raw(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("X-API-Key", API_KEY)
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .header("X-API-Key", API_KEY)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Decimals serialize as strings on the wire; parse them back for assertions.
pub fn decimal_field(value: &Value, field: &str) -> Decimal {
    value[field]
        .as_str()
        .unwrap_or_else(|| panic!("field {field} missing or not a string in {value}"))
        .parse()
        .expect("decimal field")
}
