//! The `GuestStore` trait, the abstraction over the record store.
//!
//! Implemented by storage backends (e.g. `procheck-store-sqlite`). The HTTP
//! layer and the business rules depend on this trait only, so tests can
//! substitute doubles for the real database.

use std::future::Future;

use crate::guest::GuestRecord;

/// Abstraction over a guest record store.
///
/// Records are insert-only: the trait offers no update or delete.
/// Implementations must enforce uniqueness of
/// [`GuestRecord::id_number`] and reject a second insert carrying an existing
/// value, even when two inserts race.
///
/// All methods return `Send` futures so the trait can be used from axum
/// handlers on a multi-threaded tokio runtime.
pub trait GuestStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a fully-built record.
  fn insert(
    &self,
    record: GuestRecord,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Look up a record by its natural identifier.
  fn find_by_id_number<'a>(
    &'a self,
    id_number: &'a str,
  ) -> impl Future<Output = Result<Option<GuestRecord>, Self::Error>> + Send + 'a;

  /// Every record, oldest registration first. Unbounded.
  fn list(
    &self,
  ) -> impl Future<Output = Result<Vec<GuestRecord>, Self::Error>> + Send + '_;
}
