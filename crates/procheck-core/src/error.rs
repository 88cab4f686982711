//! Error types for `procheck-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown guest status: {0:?}")]
  UnknownStatus(String),

  #[error("malformed guest id: {0:?}")]
  MalformedGuestId(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
