//! Business rules applied after syntactic validation: age bounds and
//! duplicate detection.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  guest::{NewGuest, redact_id_number},
  store::GuestStore,
};

pub const MIN_AGE: i64 = 16;
pub const MAX_AGE: i64 = 120;

const MILLIS_PER_YEAR: f64 = 365.25 * 24.0 * 60.0 * 60.0 * 1000.0;

// ─── Violations ──────────────────────────────────────────────────────────────

/// Stable machine-readable code attached to every business violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationCode {
  MinAgeViolation,
  InvalidAge,
  DuplicateId,
  ValidationError,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
  pub field:   &'static str,
  pub message: &'static str,
  pub code:    ViolationCode,
}

// ─── Duplicate checker ───────────────────────────────────────────────────────

/// Outcome of a duplicate lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateCheck {
  Found,
  NotFound,
  /// The store could not answer; the failure has already been logged.
  Unavailable,
}

/// Asks the store whether a natural identifier is already registered.
///
/// Never fails: store errors are logged and reported as
/// [`DuplicateCheck::Unavailable`], leaving the decision to
/// [`DuplicateCheckPolicy`].
pub struct DuplicateChecker<'a, S> {
  store: &'a S,
}

impl<'a, S: GuestStore> DuplicateChecker<'a, S> {
  pub fn new(store: &'a S) -> Self { Self { store } }

  pub async fn check(&self, id_number: &str) -> DuplicateCheck {
    match self.store.find_by_id_number(id_number).await {
      Ok(Some(_)) => DuplicateCheck::Found,
      Ok(None) => DuplicateCheck::NotFound,
      Err(e) => {
        tracing::error!(
          error = %e,
          id_number = %redact_id_number(id_number),
          "duplicate check failed"
        );
        DuplicateCheck::Unavailable
      }
    }
  }
}

/// What to do when the duplicate check cannot reach the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateCheckPolicy {
  /// Treat the guest as new and let registration continue. The store's
  /// uniqueness constraint still rejects a real duplicate at insert time.
  #[default]
  FailOpen,
  /// Reject the registration with a `VALIDATION_ERROR` violation.
  FailClosed,
}

// ─── Rules ───────────────────────────────────────────────────────────────────

/// Age in whole years using a fixed 365.25-day year.
///
/// This can be off by one within a day or so of a birthday; callers relying
/// on the result near the age limits get the same answer every time for the
/// same instant.
pub fn age_in_years(date_of_birth: NaiveDate, now: DateTime<Utc>) -> i64 {
  let born = date_of_birth.and_time(NaiveTime::MIN).and_utc();
  let elapsed = (now - born).num_milliseconds() as f64;
  (elapsed / MILLIS_PER_YEAR).floor() as i64
}

/// The business rule validator.
#[derive(Debug, Clone, Copy, Default)]
pub struct BusinessRules {
  pub policy: DuplicateCheckPolicy,
}

impl BusinessRules {
  pub fn new(policy: DuplicateCheckPolicy) -> Self { Self { policy } }

  /// Evaluate every rule independently and return all violations in order:
  /// age first, then duplication.
  pub async fn evaluate<S: GuestStore>(
    &self,
    store: &S,
    guest: &NewGuest,
    now: DateTime<Utc>,
  ) -> Vec<Violation> {
    let mut violations = Vec::new();

    let age = age_in_years(guest.date_of_birth, now);
    if age < MIN_AGE {
      violations.push(Violation {
        field:   "dateOfBirth",
        message: "Guest must be at least 16 years old to register",
        code:    ViolationCode::MinAgeViolation,
      });
    }
    if age > MAX_AGE {
      violations.push(Violation {
        field:   "dateOfBirth",
        message: "Please enter a valid date of birth",
        code:    ViolationCode::InvalidAge,
      });
    }

    match DuplicateChecker::new(store).check(&guest.id_number).await {
      DuplicateCheck::Found => violations.push(Violation {
        field:   "idNumber",
        message: "A guest with this ID number is already registered",
        code:    ViolationCode::DuplicateId,
      }),
      DuplicateCheck::NotFound => {}
      DuplicateCheck::Unavailable => match self.policy {
        DuplicateCheckPolicy::FailOpen => {
          tracing::warn!("duplicate check unavailable; continuing registration");
        }
        DuplicateCheckPolicy::FailClosed => violations.push(Violation {
          field:   "general",
          message: "Validation service temporarily unavailable",
          code:    ViolationCode::ValidationError,
        }),
      },
    }

    violations
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use chrono::TimeZone;

  use super::*;
  use crate::guest::GuestRecord;

  // ── Store doubles ──────────────────────────────────────────────────────

  #[derive(Default)]
  struct MemoryStore {
    records: Mutex<Vec<GuestRecord>>,
  }

  #[derive(Debug, thiserror::Error)]
  #[error("store offline")]
  struct Offline;

  impl GuestStore for MemoryStore {
    type Error = Offline;

    async fn insert(&self, record: GuestRecord) -> Result<(), Offline> {
      self.records.lock().unwrap().push(record);
      Ok(())
    }

    async fn find_by_id_number(&self, id_number: &str) -> Result<Option<GuestRecord>, Offline> {
      Ok(
        self
          .records
          .lock()
          .unwrap()
          .iter()
          .find(|r| r.id_number == id_number)
          .cloned(),
      )
    }

    async fn list(&self) -> Result<Vec<GuestRecord>, Offline> {
      Ok(self.records.lock().unwrap().clone())
    }
  }

  struct OfflineStore;

  impl GuestStore for OfflineStore {
    type Error = Offline;

    async fn insert(&self, _: GuestRecord) -> Result<(), Offline> { Err(Offline) }
    async fn find_by_id_number(&self, _: &str) -> Result<Option<GuestRecord>, Offline> { Err(Offline) }
    async fn list(&self) -> Result<Vec<GuestRecord>, Offline> { Err(Offline) }
  }

  // ── Helpers ────────────────────────────────────────────────────────────

  fn now() -> DateTime<Utc> { Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap() }

  fn date(y: i32, m: u32, d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, d).unwrap() }

  fn guest(dob: NaiveDate) -> NewGuest {
    NewGuest {
      full_name:     "Asha Rao".into(),
      date_of_birth: dob,
      id_number:     "1234567890".into(),
      adm_no:        "ADM-001".into(),
    }
  }

  fn codes(v: &[Violation]) -> Vec<ViolationCode> { v.iter().map(|v| v.code).collect() }

  // ── Age ────────────────────────────────────────────────────────────────

  #[test]
  fn age_uses_fixed_year_length() {
    assert_eq!(age_in_years(date(2010, 10, 18), now()), 16);
    assert_eq!(age_in_years(date(2010, 10, 20), now()), 15);
    assert_eq!(age_in_years(date(1906, 10, 18), now()), 120);
    assert_eq!(age_in_years(date(1905, 10, 1), now()), 121);
  }

  #[tokio::test]
  async fn ages_inside_bounds_pass() {
    let rules = BusinessRules::default();
    let store = MemoryStore::default();
    for dob in [date(2010, 10, 18), date(2000, 5, 1), date(1906, 10, 18)] {
      let v = rules.evaluate(&store, &guest(dob), now()).await;
      assert!(v.is_empty(), "{dob}: {v:?}");
    }
  }

  #[tokio::test]
  async fn too_young_is_rejected() {
    let v = BusinessRules::default()
      .evaluate(&MemoryStore::default(), &guest(date(2015, 1, 1)), now())
      .await;
    assert_eq!(codes(&v), [ViolationCode::MinAgeViolation]);
    assert_eq!(v[0].field, "dateOfBirth");
  }

  #[tokio::test]
  async fn too_old_is_rejected() {
    let v = BusinessRules::default()
      .evaluate(&MemoryStore::default(), &guest(date(1900, 1, 1)), now())
      .await;
    assert_eq!(codes(&v), [ViolationCode::InvalidAge]);
  }

  // ── Duplicates ─────────────────────────────────────────────────────────

  #[tokio::test]
  async fn duplicate_id_number_is_reported() {
    let store = MemoryStore::default();
    let g = guest(date(2000, 5, 1));
    let record = GuestRecord::new(crate::id::generate(now()), g.clone(), now(), "127.0.0.1");
    store.insert(record).await.unwrap();

    assert_eq!(
      DuplicateChecker::new(&store).check("1234567890").await,
      DuplicateCheck::Found
    );
    let v = BusinessRules::default().evaluate(&store, &g, now()).await;
    assert_eq!(codes(&v), [ViolationCode::DuplicateId]);
    assert_eq!(v[0].field, "idNumber");
  }

  #[tokio::test]
  async fn rules_are_not_short_circuited() {
    let store = MemoryStore::default();
    let young = guest(date(2015, 1, 1));
    let record = GuestRecord::new(crate::id::generate(now()), young.clone(), now(), "::1");
    store.insert(record).await.unwrap();

    let v = BusinessRules::default().evaluate(&store, &young, now()).await;
    assert_eq!(codes(&v), [ViolationCode::MinAgeViolation, ViolationCode::DuplicateId]);
  }

  #[tokio::test]
  async fn unavailable_store_fails_open_by_default() {
    assert_eq!(
      DuplicateChecker::new(&OfflineStore).check("1234567890").await,
      DuplicateCheck::Unavailable
    );
    let v = BusinessRules::default()
      .evaluate(&OfflineStore, &guest(date(2000, 5, 1)), now())
      .await;
    assert!(v.is_empty());
  }

  #[tokio::test]
  async fn unavailable_store_can_fail_closed() {
    let v = BusinessRules::new(DuplicateCheckPolicy::FailClosed)
      .evaluate(&OfflineStore, &guest(date(2000, 5, 1)), now())
      .await;
    assert_eq!(codes(&v), [ViolationCode::ValidationError]);
    assert_eq!(v[0].field, "general");
  }

  #[test]
  fn codes_serialise_screaming_snake() {
    let json = serde_json::to_value(ViolationCode::MinAgeViolation).unwrap();
    assert_eq!(json, "MIN_AGE_VIOLATION");
    let json = serde_json::to_value(ViolationCode::DuplicateId).unwrap();
    assert_eq!(json, "DUPLICATE_ID");
  }
}
