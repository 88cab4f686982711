//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (nanoseconds, `Z`
//! suffix) so that text order matches time order. Calendar dates are stored
//! as `YYYY-MM-DD` and the status as its lowercase name.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use procheck_core::guest::{GuestId, GuestRecord, GuestStatus};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list shared by every `SELECT` so [`RawGuest::from_row`] can rely on
/// positional access.
pub const GUEST_COLUMNS: &str = "id, full_name, date_of_birth, id_number, adm_no, \
                                 registered_at, registered_from, status, version";

/// Raw strings read directly from a `guests` row.
pub struct RawGuest {
  pub id:              String,
  pub full_name:       String,
  pub date_of_birth:   String,
  pub id_number:       String,
  pub adm_no:          String,
  pub registered_at:   String,
  pub registered_from: String,
  pub status:          String,
  pub version:         String,
}

impl RawGuest {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:              row.get(0)?,
      full_name:       row.get(1)?,
      date_of_birth:   row.get(2)?,
      id_number:       row.get(3)?,
      adm_no:          row.get(4)?,
      registered_at:   row.get(5)?,
      registered_from: row.get(6)?,
      status:          row.get(7)?,
      version:         row.get(8)?,
    })
  }

  pub fn into_record(self) -> Result<GuestRecord> {
    Ok(GuestRecord {
      id:              self.id.parse::<GuestId>()?,
      full_name:       self.full_name,
      date_of_birth:   decode_date(&self.date_of_birth)?,
      id_number:       self.id_number,
      adm_no:          self.adm_no,
      registered_at:   decode_dt(&self.registered_at)?,
      registered_from: self.registered_from,
      status:          GuestStatus::from_stored(&self.status)?,
      version:         self.version,
    })
  }
}
