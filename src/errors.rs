use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

fn current_request_id() -> Option<String> {
    crate::tracing::current_request_id().map(|rid| rid.as_str().to_string())
}

/// Standard error body returned by every failing endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "error": "Internal Server Error",
    "message": "Store read failed: store responded with 503: upstream unavailable",
    "details": null,
    "request_id": "req-abc123xyz",
    "timestamp": "2024-12-09T10:30:00.000Z"
}))]
pub struct ErrorResponse {
    /// HTTP status category (e.g., "Bad Request", "Internal Server Error")
    #[schema(example = "Internal Server Error")]
    pub error: String,
    /// Human-readable error description
    pub message: String,
    /// Additional error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Unique request identifier for support and debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "req-abc123xyz")]
    pub request_id: Option<String>,
    /// ISO 8601 timestamp when error occurred
    pub timestamp: String,
}

/// Failure talking to the persistence collaborator.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store answered with a non-success status; the body is kept verbatim.
    #[error("store responded with {status}: {body}")]
    Request { status: u16, body: String },

    #[error("store transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("store payload could not be decoded: {0}")]
    Decode(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Failures surfaced by the HTTP-facing operations.
///
/// The webhook never returns one of these to its caller; they only reach the
/// wire through the report endpoint.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Store read failed: {0}")]
    StoreRead(#[source] StoreError),

    #[error("Store write failed: {0}")]
    StoreWrite(#[source] StoreError),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl ServiceError {
    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::StoreRead(_) | Self::StoreWrite(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Store failures are surfaced as-is so operators can see what the store said.
    pub fn response_message(&self) -> String {
        self.to_string()
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = self.response_message();

        let err = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: error_message,
            details: None,
            request_id: current_request_id(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(err)).into_response()
    }
}
