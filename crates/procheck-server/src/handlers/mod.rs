pub mod guests;
pub mod health;

use std::any::Any;

use axum::{
  extract::OriginalUri,
  http::Method,
  response::Response,
};

use crate::error::{ApiError, internal_error_response};

/// Fallback for `/api/*` paths with no route.
pub async fn api_not_found(method: Method, OriginalUri(uri): OriginalUri) -> ApiError {
  tracing::warn!(%method, %uri, "API route not found");
  ApiError::RouteNotFound {
    method: method.to_string(),
    path:   uri.path().to_owned(),
  }
}

/// Turn a handler panic into a 500. The panic message is only echoed back
/// when `expose` is set.
pub(crate) fn panic_response(payload: Box<dyn Any + Send + 'static>, expose: bool) -> Response {
  let message = payload
    .downcast_ref::<String>()
    .cloned()
    .or_else(|| payload.downcast_ref::<&str>().map(|s| (*s).to_owned()))
    .unwrap_or_else(|| "unknown panic".to_owned());

  tracing::error!(panic = %message, "unhandled application error");
  internal_error_response(expose.then_some(message))
}
