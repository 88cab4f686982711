//! [`SqliteStore`]: the SQLite implementation of [`GuestStore`].

use std::path::Path;

use procheck_core::{
  guest::GuestRecord,
  store::GuestStore,
};
use rusqlite::OptionalExtension as _;

use crate::{
  Error, Result,
  encode::{GUEST_COLUMNS, RawGuest, encode_date, encode_dt},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A guest store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Close the underlying connection. Other clones of this store fail every
  /// call afterwards.
  pub async fn close(self) -> Result<()> {
    self.conn.close().await?;
    Ok(())
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── GuestStore impl ─────────────────────────────────────────────────────────

impl GuestStore for SqliteStore {
  type Error = Error;

  async fn insert(&self, record: GuestRecord) -> Result<()> {
    let id_str            = record.id.to_string();
    let dob_str           = encode_date(record.date_of_birth);
    let registered_at_str = encode_dt(record.registered_at);
    let status_str        = record.status.to_string();

    let conflict: Option<String> = self
      .conn
      .call(move |conn| {
        let result = conn.execute(
          "INSERT INTO guests (
             id, full_name, date_of_birth, id_number, adm_no,
             registered_at, registered_from, status, version
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            id_str,
            record.full_name,
            dob_str,
            record.id_number,
            record.adm_no,
            registered_at_str,
            record.registered_from,
            status_str,
            record.version,
          ],
        );
        match result {
          Ok(_) => Ok(None),
          Err(rusqlite::Error::SqliteFailure(e, msg))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
          {
            Ok(Some(msg.unwrap_or_else(|| e.to_string())))
          }
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    match conflict {
      Some(msg) => Err(Error::Conflict(msg)),
      None => Ok(()),
    }
  }

  async fn find_by_id_number(&self, id_number: &str) -> Result<Option<GuestRecord>> {
    let id_number = id_number.to_owned();
    let raw: Option<RawGuest> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {GUEST_COLUMNS} FROM guests WHERE id_number = ?1");
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_number], RawGuest::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawGuest::into_record).transpose()
  }

  async fn list(&self) -> Result<Vec<GuestRecord>> {
    let raws: Vec<RawGuest> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {GUEST_COLUMNS} FROM guests ORDER BY registered_at, rowid"
        ))?;
        let rows = stmt
          .query_map([], RawGuest::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawGuest::into_record).collect()
  }
}
