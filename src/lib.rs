//! POSaBIT reorder service library
//!
//! Receives sale events from the POSaBIT point of sale, keeps an append-only
//! sales ledger in a PostgREST store and turns recent demand into ranked
//! reorder recommendations.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware_helpers;
pub mod models;
pub mod openapi;
pub mod services;
pub mod store;
pub mod tracing;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, MethodRouter},
    Router,
};
use std::sync::Arc;

use crate::store::Store;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::AppConfig>,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn new(config: config::AppConfig, store: Arc<dyn Store>) -> Self {
        Self {
            config: Arc::new(config),
            services: handlers::AppServices::new(store),
        }
    }
}

fn webhook_route() -> MethodRouter<AppState> {
    post(handlers::webhooks::posabit_webhook)
        .fallback(handlers::webhooks::method_not_allowed)
}

/// Routes mounted under `/api/v1`
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/posabit/webhook", webhook_route())
        .route(
            "/reports/low-stock",
            get(handlers::reports::low_stock_report),
        )
}

/// Full application router: status routes, the v1 API, the legacy webhook
/// path and Swagger UI, with request ids and HTTP tracing applied.
pub fn app(state: AppState) -> Router {
    let max_body_size = state.config.max_body_size;

    Router::<AppState>::new()
        .route("/", get(|| async { "posabit-reorder up" }))
        .route("/health", get(handlers::health::liveness_check))
        // Path used by existing POSaBIT webhook registrations
        .route("/api/posabit/webhook", webhook_route())
        .nest("/api/v1", api_v1_routes())
        .merge(openapi::swagger_ui())
        .layer(DefaultBodyLimit::max(max_body_size))
        // HTTP tracing layer for consistent request/response telemetry
        .layer(crate::tracing::configure_http_tracing())
        // Ensure every request carries a request id for traceability
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}
