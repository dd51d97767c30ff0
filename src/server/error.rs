//! Mapping of failures to HTTP responses

use std::any::Any;

use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::data::UpstreamError;

/// JSON body of every error response
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    /// Upstream HTTP status, when the upstream answered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

/// Errors surfaced by the API handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Quote fetch failed: {0}")]
    Quotes(#[source] UpstreamError),

    #[error("Headline feed fetch failed: {0}")]
    Headlines(#[source] UpstreamError),

    /// Query string that does not fit the endpoint's parameters
    #[error("Malformed query string: {0}")]
    Query(#[from] QueryRejection),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match &self {
            ApiError::Quotes(err) => ErrorBody {
                error: "Quote fetch failed".to_string(),
                status: err.status().map(|s| s.as_u16()),
            },
            ApiError::Headlines(_) => ErrorBody {
                error: "Headline feed fetch failed".to_string(),
                status: None,
            },
            ApiError::Query(rejection) => {
                tracing::error!(error = %rejection, "request rejected");
                return server_error();
            }
        };

        tracing::warn!(error = %self, "upstream failure surfaced to client");
        (StatusCode::BAD_GATEWAY, Json(body)).into_response()
    }
}

/// Response for a handler that panicked
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(detail, "handler panicked");
    server_error()
}

/// `500 {"error":"Server error"}`
fn server_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: "Server error".to_string(),
            status: None,
        }),
    )
        .into_response()
}
