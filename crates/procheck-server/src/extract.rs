//! Request extractors for the registration endpoint.

use std::{convert::Infallible, net::SocketAddr};

use axum::{
  Form, Json,
  extract::{ConnectInfo, FromRequest, FromRequestParts, Request},
  http::{header, request::Parts},
};
use procheck_core::validate::RawGuest;

use crate::error::ApiError;

/// A registration payload decoded from either a JSON or a URL-encoded form
/// body, chosen by `Content-Type`.
pub struct GuestPayload(pub RawGuest);

impl<S> FromRequest<S> for GuestPayload
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
    let is_form = req
      .headers()
      .get(header::CONTENT_TYPE)
      .and_then(|v| v.to_str().ok())
      .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

    let raw = if is_form {
      Form::<RawGuest>::from_request(req, state)
        .await
        .map(|Form(raw)| raw)
        .map_err(|e| ApiError::BadRequest(e.body_text()))
    } else {
      Json::<RawGuest>::from_request(req, state)
        .await
        .map(|Json(raw)| raw)
        .map_err(|e| ApiError::BadRequest(e.body_text()))
    };

    raw.map(GuestPayload).inspect_err(|e| {
      tracing::warn!(error = %e, "registration body rejected");
    })
  }
}

/// The peer address of the connection, or `"unknown"` when the server was
/// not started with connect info (as in router tests).
pub struct ClientAddr(pub String);

impl<S> FromRequestParts<S> for ClientAddr
where
  S: Send + Sync,
{
  type Rejection = Infallible;

  async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
    let addr = parts
      .extensions
      .get::<ConnectInfo<SocketAddr>>()
      .map(|ConnectInfo(addr)| addr.ip().to_string())
      .unwrap_or_else(|| "unknown".to_owned());
    Ok(ClientAddr(addr))
  }
}
