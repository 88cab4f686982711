//! Syntactic validation of a registration payload.
//!
//! Two stages run before any business rule:
//!
//! 1. [`sanitize`] trims every field, escapes markup-significant characters
//!    and performs coarse shape checks (presence, ISO-8601 date, length
//!    windows on the identifiers).
//! 2. [`validate_schema`] applies the full field constraints and reports
//!    every violation, not just the first.
//!
//! The stages are encoded in the types: only a [`Sanitized`] payload can be
//! schema-checked, and only a schema-checked payload becomes a [`NewGuest`].

use std::ops::RangeInclusive;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::guest::NewGuest;

pub const FULL_NAME: &str = "fullName";
pub const DATE_OF_BIRTH: &str = "dateOfBirth";
pub const ID_NUMBER: &str = "idNumber";
pub const ADM_NO: &str = "admNo";

const FULL_NAME_LEN: RangeInclusive<usize> = 2..=100;
const ID_NUMBER_LEN: RangeInclusive<usize> = 10..=16;
const ADM_NO_LEN: RangeInclusive<usize> = 3..=20;

const INVALID_VALUE: &str = "Invalid value";

// ─── Input ───────────────────────────────────────────────────────────────────

/// A registration payload exactly as submitted. Unknown fields are dropped
/// during deserialisation; scalar values are coerced to text.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGuest {
  #[serde(default, deserialize_with = "lenient_text")]
  pub full_name:     Option<String>,
  #[serde(default, deserialize_with = "lenient_text")]
  pub date_of_birth: Option<String>,
  #[serde(default, deserialize_with = "lenient_text")]
  pub id_number:     Option<String>,
  #[serde(default, deserialize_with = "lenient_text")]
  pub adm_no:        Option<String>,
}

/// Accept any JSON scalar as text; `null` counts as absent.
fn lenient_text<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  use serde_json::Value;

  Ok(match Value::deserialize(de)? {
    Value::Null => None,
    Value::String(s) => Some(s),
    other => Some(other.to_string()),
  })
}

// ─── Errors ──────────────────────────────────────────────────────────────────

/// One failing field, as reported to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
  pub field:   &'static str,
  pub message: String,
  /// The rejected value, when one was submitted.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub value:   Option<String>,
}

impl FieldError {
  fn new(field: &'static str, message: &str, value: Option<&str>) -> Self {
    Self {
      field,
      message: message.to_owned(),
      value: value.map(str::to_owned),
    }
  }
}

// ─── Stage 1: sanitation ─────────────────────────────────────────────────────

/// A payload that passed [`sanitize`]; every field is present and trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sanitized {
  full_name:     String,
  date_of_birth: NaiveDate,
  id_number:     String,
  adm_no:        String,
}

/// Trim, escape and shape-check the raw payload, collecting one error per
/// failing field.
pub fn sanitize(raw: &RawGuest) -> Result<Sanitized, Vec<FieldError>> {
  let mut errors = Vec::new();

  let full_name = raw.full_name.as_deref().map(|s| escape_markup(s.trim()));
  let dob_text = raw.date_of_birth.as_deref().map(str::trim);
  let id_number = raw.id_number.as_deref().map(|s| escape_markup(s.trim()));
  let adm_no = raw.adm_no.as_deref().map(|s| escape_markup(s.trim()));

  match full_name.as_deref() {
    None => errors.push(FieldError::new(FULL_NAME, "Full name is required", None)),
    Some("") => errors.push(FieldError::new(FULL_NAME, INVALID_VALUE, Some(""))),
    Some(_) => {}
  }

  let date_of_birth = match dob_text {
    None => {
      errors.push(FieldError::new(DATE_OF_BIRTH, "Date of birth is required", None));
      None
    }
    Some(text) => {
      let parsed = parse_iso8601_date(text);
      if parsed.is_none() {
        errors.push(FieldError::new(DATE_OF_BIRTH, INVALID_VALUE, Some(text)));
      }
      parsed
    }
  };

  check_length(&mut errors, ID_NUMBER, "ID number is required", id_number.as_deref(), ID_NUMBER_LEN);
  check_length(&mut errors, ADM_NO, "Admission number is required", adm_no.as_deref(), ADM_NO_LEN);

  match (full_name, date_of_birth, id_number, adm_no) {
    (Some(full_name), Some(date_of_birth), Some(id_number), Some(adm_no))
      if errors.is_empty() =>
    {
      Ok(Sanitized { full_name, date_of_birth, id_number, adm_no })
    }
    _ => Err(errors),
  }
}

fn check_length(
  errors: &mut Vec<FieldError>,
  field: &'static str,
  required: &str,
  value: Option<&str>,
  window: RangeInclusive<usize>,
) {
  match value {
    None => errors.push(FieldError::new(field, required, None)),
    Some(v) if !window.contains(&v.chars().count()) => {
      errors.push(FieldError::new(field, INVALID_VALUE, Some(v)))
    }
    Some(_) => {}
  }
}

/// Replace characters that are significant in HTML markup with entities.
///
/// Apostrophes and slashes are legal in names and admission numbers and are
/// left alone.
pub fn escape_markup(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for c in s.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      c => out.push(c),
    }
  }
  out
}

/// Parse a calendar date (`2000-05-01`), a local date-time
/// (`2000-05-01T10:00:00`) or an RFC 3339 timestamp. Timestamps contribute
/// their UTC date.
pub fn parse_iso8601_date(s: &str) -> Option<NaiveDate> {
  if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
    return Some(d);
  }
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.with_timezone(&Utc).date_naive());
  }
  NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
    .ok()
    .map(|dt| dt.date())
}

// ─── Stage 2: schema ─────────────────────────────────────────────────────────

/// Earliest accepted date of birth.
pub fn earliest_birth_date() -> NaiveDate {
  NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Check every field constraint, collecting all violations in field order.
pub fn validate_schema(
  input: Sanitized,
  now: DateTime<Utc>,
) -> Result<NewGuest, Vec<FieldError>> {
  let mut errors = Vec::new();

  check_text(
    &mut errors,
    FULL_NAME,
    &input.full_name,
    FULL_NAME_LEN,
    is_name_char,
    TextMessages {
      too_short: "Name must be at least 2 characters long",
      too_long:  "Name cannot exceed 100 characters",
      pattern:   "Name can only contain letters, spaces, hyphens, apostrophes, and Hindi characters",
    },
  );

  let dob = input.date_of_birth;
  let dob_text = dob.to_string();
  if dob > now.date_naive() {
    errors.push(FieldError::new(
      DATE_OF_BIRTH,
      "Date of birth cannot be in the future",
      Some(&dob_text),
    ));
  }
  if dob < earliest_birth_date() {
    errors.push(FieldError::new(
      DATE_OF_BIRTH,
      "Please enter a valid date of birth",
      Some(&dob_text),
    ));
  }

  check_text(
    &mut errors,
    ID_NUMBER,
    &input.id_number,
    ID_NUMBER_LEN,
    |c| c.is_ascii_digit(),
    TextMessages {
      too_short: "ID number must be at least 10 digits long",
      too_long:  "ID number cannot exceed 16 digits",
      pattern:   "ID number can only contain digits",
    },
  );

  check_text(
    &mut errors,
    ADM_NO,
    &input.adm_no,
    ADM_NO_LEN,
    |c| c.is_ascii_alphanumeric() || c == '-' || c == '/',
    TextMessages {
      too_short: "Admission number must be at least 3 characters long",
      too_long:  "Admission number cannot exceed 20 characters",
      pattern:   "Admission number can only contain letters, numbers, hyphens, and slashes",
    },
  );

  if !errors.is_empty() {
    return Err(errors);
  }

  Ok(NewGuest {
    full_name:     input.full_name,
    date_of_birth: dob,
    id_number:     input.id_number,
    adm_no:        input.adm_no,
  })
}

struct TextMessages {
  too_short: &'static str,
  too_long:  &'static str,
  pattern:   &'static str,
}

fn check_text(
  errors: &mut Vec<FieldError>,
  field: &'static str,
  value: &str,
  window: RangeInclusive<usize>,
  allowed: impl Fn(char) -> bool,
  messages: TextMessages,
) {
  let len = value.chars().count();
  if len < *window.start() {
    errors.push(FieldError::new(field, messages.too_short, Some(value)));
  }
  if len > *window.end() {
    errors.push(FieldError::new(field, messages.too_long, Some(value)));
  }
  if !value.chars().all(allowed) {
    errors.push(FieldError::new(field, messages.pattern, Some(value)));
  }
}

/// Latin letters, whitespace, hyphen, apostrophe and the Devanagari block.
fn is_name_char(c: char) -> bool {
  c.is_ascii_alphabetic()
    || c.is_whitespace()
    || c == '-'
    || c == '\''
    || ('\u{0900}'..='\u{097F}').contains(&c)
}
