//! Error type for `procheck-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] procheck_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// An insert collided with a uniqueness constraint, typically a second
  /// registration for the same ID number.
  #[error("constraint violation: {0}")]
  Conflict(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
