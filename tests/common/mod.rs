#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, Utc};
use posabit_reorder::{
    config::AppConfig,
    models::{InventoryLevel, LedgerRow, ProductRecord},
    store::InMemoryStore,
    AppState,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tower::ServiceExt;

/// Helper harness running the full router over an in-memory store.
pub struct TestApp {
    router: Router,
    pub store: Arc<InMemoryStore>,
    pub config: AppConfig,
}

impl TestApp {
    pub fn new() -> Self {
        let mut config = AppConfig::new("127.0.0.1".to_string(), 18_080, "test".to_string());
        config.store_backend = "in-memory".to_string();
        Self::with_config(config)
    }

    pub fn with_config(config: AppConfig) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let state = AppState::new(config.clone(), store.clone());
        Self {
            router: posabit_reorder::app(state),
            store,
            config,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Body>,
    ) -> axum::response::Response {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.unwrap_or_else(Body::empty))
            .expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Posts a raw webhook body to `uri`
    pub async fn post_raw(&self, uri: &str, body: impl Into<Body>) -> axum::response::Response {
        self.request(Method::POST, uri, Some(body.into())).await
    }

    pub async fn post_webhook(&self, event: Value) -> (StatusCode, Value) {
        let response = self
            .post_raw("/api/v1/posabit/webhook", event.to_string())
            .await;
        read_json(response).await
    }

    pub async fn get_json(&self, uri: &str) -> (StatusCode, Value) {
        read_json(self.request(Method::GET, uri, None).await).await
    }

    pub async fn seed_sale(&self, sku: &str, qty: Decimal, age: Duration) {
        self.store
            .seed_sales(vec![ledger_row(sku, qty, Utc::now() - age)])
            .await;
    }

    pub async fn seed_inventory(&self, sku: &str, on_hand: Decimal) {
        self.store
            .put_inventory(InventoryLevel::new(sku, on_hand))
            .await;
    }

    pub async fn seed_product(&self, record: ProductRecord) {
        self.store.put_product(record).await;
    }
}

pub async fn read_json(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            json!({ "text": String::from_utf8_lossy(&bytes).into_owned() })
        })
    };
    (status, value)
}

pub fn ledger_row(sku: &str, qty: Decimal, ts: DateTime<Utc>) -> LedgerRow {
    LedgerRow {
        sale_id: "seed".to_string(),
        sku: sku.to_string(),
        qty,
        ts,
        raw: json!({}),
    }
}
