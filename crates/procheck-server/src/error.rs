//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every error body carries `success: false` and a human-readable `message`.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use chrono::Utc;
use procheck_core::{rules::Violation, validate::FieldError};
use serde_json::json;
use thiserror::Error;

const HIDDEN_DETAIL: &str = "Internal server error";

#[derive(Debug, Error)]
pub enum ApiError {
  #[error("forbidden")]
  Forbidden,

  /// The body could not be decoded at all.
  #[error("bad request: {0}")]
  BadRequest(String),

  /// Sanitation or schema validation failed.
  #[error("validation failed")]
  Validation(Vec<FieldError>),

  #[error("business validation failed")]
  Business(Vec<Violation>),

  /// Persisting a registration failed. `detail` is already redacted for the
  /// current environment.
  #[error("registration failed: {detail}")]
  Registration { detail: String },

  #[error("failed to fetch guest data")]
  Listing,

  #[error("no route for {method} {path}")]
  RouteNotFound { method: String, path: String },
}

impl ApiError {
  /// Build a [`ApiError::Registration`], keeping the source text only when
  /// `expose` is set.
  pub fn registration(source: &dyn std::error::Error, expose: bool) -> Self {
    let detail = if expose { source.to_string() } else { HIDDEN_DETAIL.to_owned() };
    Self::Registration { detail }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match self {
      ApiError::Forbidden => (
        StatusCode::FORBIDDEN,
        json!({
          "success": false,
          "message": "Forbidden: Invalid or missing admin token",
        }),
      ),
      ApiError::BadRequest(reason) => (
        StatusCode::BAD_REQUEST,
        json!({ "success": false, "message": "Malformed request body", "error": reason }),
      ),
      ApiError::Validation(errors) => (
        StatusCode::BAD_REQUEST,
        json!({ "success": false, "message": "Validation failed", "errors": errors }),
      ),
      ApiError::Business(errors) => (
        StatusCode::BAD_REQUEST,
        json!({ "success": false, "message": "Business validation failed", "errors": errors }),
      ),
      ApiError::Registration { detail } => (
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "success": false, "message": "Registration failed", "error": detail }),
      ),
      ApiError::Listing => (
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "success": false, "message": "Failed to fetch guest data" }),
      ),
      ApiError::RouteNotFound { method, path } => (
        StatusCode::NOT_FOUND,
        json!({
          "success": false,
          "message": "API endpoint not found",
          "path": path,
          "method": method,
          "timestamp": Utc::now().to_rfc3339(),
        }),
      ),
    };
    (status, Json(body)).into_response()
  }
}

/// Body for a fault caught at the outermost layer (a handler panic).
pub fn internal_error_response(detail: Option<String>) -> Response {
  (
    StatusCode::INTERNAL_SERVER_ERROR,
    Json(json!({
      "success": false,
      "message": "Internal server error",
      "error": detail.unwrap_or_else(|| "Something went wrong".to_owned()),
      "timestamp": Utc::now().to_rfc3339(),
    })),
  )
    .into_response()
}
