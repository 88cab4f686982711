//! Admin authentication: a pluggable capability plus the axum extractor that
//! enforces it.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, request::Parts},
};
use procheck_core::store::GuestStore;
use sha2::{Digest, Sha256};

use crate::{AppState, error::ApiError};

/// Header carrying the admin shared secret.
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Decides whether a request may use admin endpoints.
pub trait AdminAuthenticator: Send + Sync {
  fn verify(&self, headers: &HeaderMap) -> Result<(), ApiError>;
}

/// Exact match of `X-Admin-Token` against a configured secret.
///
/// Both sides are compared as SHA-256 digests so comparison time does not
/// depend on how many leading bytes match.
pub struct SharedSecret {
  digest: Option<[u8; 32]>,
}

impl SharedSecret {
  /// An empty or missing secret yields an authenticator that denies everyone.
  pub fn new(secret: Option<&str>) -> Self {
    Self {
      digest: secret.filter(|s| !s.is_empty()).map(digest),
    }
  }
}

fn digest(s: &str) -> [u8; 32] { Sha256::digest(s.as_bytes()).into() }

impl AdminAuthenticator for SharedSecret {
  fn verify(&self, headers: &HeaderMap) -> Result<(), ApiError> {
    let expected = self.digest.as_ref().ok_or(ApiError::Forbidden)?;

    let presented = headers
      .get(ADMIN_TOKEN_HEADER)
      .and_then(|v| v.to_str().ok())
      .ok_or(ApiError::Forbidden)?;

    if digest(presented) == *expected {
      Ok(())
    } else {
      Err(ApiError::Forbidden)
    }
  }
}

/// Zero-size marker: present in the handler means the caller is an admin.
pub struct Admin;

impl<S> FromRequestParts<AppState<S>> for Admin
where
  S: GuestStore + Clone + Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    if let Err(e) = state.auth.verify(&parts.headers) {
      tracing::warn!(uri = %parts.uri, "admin request rejected");
      return Err(e);
    }
    Ok(Admin)
  }
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  fn headers(token: Option<&str>) -> HeaderMap {
    let mut h = HeaderMap::new();
    if let Some(t) = token {
      h.insert(ADMIN_TOKEN_HEADER, HeaderValue::from_str(t).unwrap());
    }
    h
  }

  #[test]
  fn correct_token() {
    let auth = SharedSecret::new(Some("s3cret"));
    assert!(auth.verify(&headers(Some("s3cret"))).is_ok());
  }

  #[test]
  fn wrong_token() {
    let auth = SharedSecret::new(Some("s3cret"));
    assert!(matches!(auth.verify(&headers(Some("s3cre"))), Err(ApiError::Forbidden)));
    assert!(matches!(auth.verify(&headers(Some("S3CRET"))), Err(ApiError::Forbidden)));
  }

  #[test]
  fn missing_header() {
    let auth = SharedSecret::new(Some("s3cret"));
    assert!(matches!(auth.verify(&headers(None)), Err(ApiError::Forbidden)));
  }

  #[test]
  fn unconfigured_secret_denies_everyone() {
    for auth in [SharedSecret::new(None), SharedSecret::new(Some(""))] {
      assert!(auth.verify(&headers(Some(""))).is_err());
      assert!(auth.verify(&headers(Some("anything"))).is_err());
    }
  }
}
