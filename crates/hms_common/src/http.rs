// --- File: crates/hms_common/src/http.rs ---
//! Axum integration of [`HmsError`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::error::{HmsError, HttpStatusCode};

pub mod client;

/// Renders the error as `{"error": {"message", "code"}}` with its status code.
/// Server errors are logged before they leave the process.
impl IntoResponse for HmsError {
    fn into_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status_code.is_server_error() {
            error!("Request failed: {}", self);
        }

        let body = Json(json!({
            "error": {
                "message": self.to_string(),
                "code": status_code.as_u16(),
            }
        }));

        (status_code, body).into_response()
    }
}
