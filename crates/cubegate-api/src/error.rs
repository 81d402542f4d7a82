//! The single point where a [`GatewayError`] becomes an HTTP response body
//! for the admin REST surface.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cubegate_core::GatewayError;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: cubegate_core::ToolError,
}

/// Wraps a [`GatewayError`] so handlers can return it directly from a
/// `Result` and get the right status code and `{error:{code,message,
/// details?}}` body for free.
pub struct ApiError(pub GatewayError);

impl From<GatewayError> for ApiError {
    fn from(e: GatewayError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ErrorBody { error: self.0.as_tool_error() })).into_response()
    }
}
