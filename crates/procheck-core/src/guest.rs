//! Guest records, the single entity of the registration store.
//!
//! A guest record is written once, after every validation stage has passed,
//! and is never updated or deleted afterwards.

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, id};

/// Format tag stamped on every record at creation time.
pub const RECORD_VERSION: &str = "1.0.0";

// ─── Identifier ──────────────────────────────────────────────────────────────

/// Server-generated guest identifier, e.g. `PC-M2F9K1QZ-4H7TQ`.
///
/// Never accepted from clients; see [`crate::id::generate`]. Parsing via
/// [`FromStr`] only checks the shape and is meant for values read back from
/// storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuestId(String);

impl GuestId {
  pub(crate) fn new_unchecked(raw: String) -> Self { Self(raw) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl FromStr for GuestId {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    if id::is_well_formed(s) {
      Ok(Self(s.to_owned()))
    } else {
      Err(Error::MalformedGuestId(s.to_owned()))
    }
  }
}

impl fmt::Display for GuestId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

// ─── Status ──────────────────────────────────────────────────────────────────

/// Lifecycle state of a guest. Only `Active` exists today; no transitions are
/// implemented.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GuestStatus {
  #[default]
  Active,
}

impl GuestStatus {
  /// Decode the textual form kept in storage.
  pub fn from_stored(s: &str) -> Result<Self> {
    s.parse().map_err(|_| Error::UnknownStatus(s.to_owned()))
  }
}

/// Mask a natural identifier for logging, keeping only the last four
/// characters: `1234567890` becomes `***7890`.
pub fn redact_id_number(id_number: &str) -> String {
  let tail: String = {
    let chars: Vec<char> = id_number.chars().collect();
    chars[chars.len().saturating_sub(4)..].iter().collect()
  };
  format!("***{tail}")
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// Validated user-supplied fields; input to [`crate::store::GuestStore::insert`]
/// once the server-side fields are attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGuest {
  pub full_name:     String,
  pub date_of_birth: NaiveDate,
  pub id_number:     String,
  pub adm_no:        String,
}

/// A persisted guest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestRecord {
  pub id:              GuestId,
  pub full_name:       String,
  pub date_of_birth:   NaiveDate,
  /// Natural identifier; unique across all records.
  pub id_number:       String,
  pub adm_no:          String,
  pub registered_at:   DateTime<Utc>,
  /// Address of the client that submitted the registration.
  pub registered_from: String,
  pub status:          GuestStatus,
  pub version:         String,
}

impl GuestRecord {
  /// Attach the server-assigned fields to a validated guest.
  pub fn new(
    id: GuestId,
    guest: NewGuest,
    registered_at: DateTime<Utc>,
    registered_from: impl Into<String>,
  ) -> Self {
    Self {
      id,
      full_name: guest.full_name,
      date_of_birth: guest.date_of_birth,
      id_number: guest.id_number,
      adm_no: guest.adm_no,
      registered_at,
      registered_from: registered_from.into(),
      status: GuestStatus::default(),
      version: RECORD_VERSION.to_owned(),
    }
  }
}

/// The public projection served by the admin listing. Identity documents,
/// birth date and origin address are intentionally absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestSummary {
  pub id:            GuestId,
  pub full_name:     String,
  pub registered_at: DateTime<Utc>,
  pub status:        GuestStatus,
}

impl From<GuestRecord> for GuestSummary {
  fn from(r: GuestRecord) -> Self {
    Self {
      id:            r.id,
      full_name:     r.full_name,
      registered_at: r.registered_at,
      status:        r.status,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample() -> GuestRecord {
    GuestRecord::new(
      "PC-ABC-DEF12".parse().unwrap(),
      NewGuest {
        full_name:     "Asha Rao".into(),
        date_of_birth: NaiveDate::from_ymd_opt(2000, 5, 1).unwrap(),
        id_number:     "1234567890".into(),
        adm_no:        "ADM-001".into(),
      },
      Utc::now(),
      "127.0.0.1",
    )
  }

  #[test]
  fn new_record_is_active_and_versioned() {
    let r = sample();
    assert_eq!(r.status, GuestStatus::Active);
    assert_eq!(r.version, RECORD_VERSION);
  }

  #[test]
  fn summary_hides_private_fields() {
    let json = serde_json::to_value(GuestSummary::from(sample())).unwrap();
    let obj = json.as_object().unwrap();
    assert_eq!(obj.len(), 4);
    for key in ["idNumber", "admNo", "dateOfBirth", "registeredFrom"] {
      assert!(!obj.contains_key(key), "{key} leaked");
    }
    assert_eq!(obj["status"], "active");
  }

  #[test]
  fn status_text_roundtrip() {
    assert_eq!(GuestStatus::Active.to_string(), "active");
    assert_eq!(GuestStatus::from_stored("active").unwrap(), GuestStatus::Active);
    assert!(matches!(
      GuestStatus::from_stored("archived"),
      Err(Error::UnknownStatus(_))
    ));
  }

  #[test]
  fn redaction_keeps_last_four() {
    assert_eq!(redact_id_number("1234567890"), "***7890");
    assert_eq!(redact_id_number("12"), "***12");
    assert_eq!(redact_id_number(""), "***");
  }

  #[test]
  fn guest_id_parse_checks_shape() {
    assert!("PC-LOYW3V28-00001".parse::<GuestId>().is_ok());
    assert!(matches!(
      "client-supplied".parse::<GuestId>(),
      Err(Error::MalformedGuestId(_))
    ));
  }
}
