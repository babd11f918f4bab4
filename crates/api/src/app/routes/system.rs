use axum::{Json, http::StatusCode, response::IntoResponse, response::Response};

use crate::app::errors::json_error;

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "message": "ok" }))
}

/// No route matched the path.
pub async fn not_found() -> Response {
    json_error(StatusCode::NOT_FOUND, "Not Found", None)
}

/// The path matched but the method did not.
pub async fn method_not_allowed() -> Response {
    json_error(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed", None)
}
