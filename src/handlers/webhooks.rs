use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use serde_json::json;
use tracing::instrument;

use crate::{handlers::AppState, services::ingest::IngestAck};

/// POSaBIT sale webhook.
///
/// Always answers 200 once the body has been read; the acknowledgment's
/// `ok` flag carries the outcome so the POS never retries a delivery.
#[utoipa::path(
    post,
    path = "/api/v1/posabit/webhook",
    request_body(
        content = String,
        content_type = "application/json",
        description = "POSaBIT sale event; any shape is accepted"
    ),
    responses(
        (status = 200, description = "Delivery acknowledged", body = IngestAck,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 405, description = "Any method other than POST"),
        (status = 413, description = "Body exceeds the configured size limit")
    ),
    tag = "posabit"
)]
#[instrument(skip(state, body), fields(bytes = body.len()))]
pub async fn posabit_webhook(State(state): State<AppState>, body: Bytes) -> Json<IngestAck> {
    let outcome = state.services.ingest.ingest(&body).await;
    Json(outcome.ack())
}

/// Answer for non-POST requests on the webhook paths.
pub async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "POST")],
        Json(json!({ "message": "Method not allowed" })),
    )
}
