//! Guest identifier generation.
//!
//! Identifiers look like `PC-<millis>-<random>`, both parts upper-case
//! base-36. The millisecond component keeps IDs roughly time-ordered; the five
//! random characters separate registrations landing in the same millisecond.

use chrono::{DateTime, Utc};
use rand_core::{OsRng, RngCore};

use crate::guest::GuestId;

const PREFIX: &str = "PC";
const RANDOM_LEN: u32 = 5;
const ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Generate a fresh identifier from the OS random source.
pub fn generate(now: DateTime<Utc>) -> GuestId { generate_with(now, &mut OsRng) }

/// Generate an identifier using the supplied random source.
fn generate_with(now: DateTime<Utc>, rng: &mut impl RngCore) -> GuestId {
  let millis = u64::try_from(now.timestamp_millis()).unwrap_or(0);
  let random = rng.next_u64() % 36u64.pow(RANDOM_LEN);

  let mut suffix = to_base36(random);
  while suffix.len() < RANDOM_LEN as usize {
    suffix.insert(0, '0');
  }

  GuestId::new_unchecked(format!("{PREFIX}-{}-{suffix}", to_base36(millis)))
}

/// Whether `s` has the `PC-<base36>-<base36>` shape.
pub fn is_well_formed(s: &str) -> bool {
  let mut parts = s.split('-');
  let (Some(prefix), Some(time), Some(random), None) =
    (parts.next(), parts.next(), parts.next(), parts.next())
  else {
    return false;
  };
  prefix == PREFIX && is_base36(time) && is_base36(random)
}

fn is_base36(s: &str) -> bool {
  !s.is_empty() && s.bytes().all(|b| ALPHABET.contains(&b))
}

fn to_base36(mut n: u64) -> String {
  if n == 0 {
    return "0".to_owned();
  }
  let mut digits = Vec::new();
  while n > 0 {
    digits.push(ALPHABET[(n % 36) as usize]);
    n /= 36;
  }
  digits.reverse();
  // ALPHABET is pure ASCII.
  String::from_utf8(digits).unwrap_or_default()
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  /// Deterministic source for shape tests.
  struct Fixed(u64);

  impl RngCore for Fixed {
    fn next_u32(&mut self) -> u32 { self.0 as u32 }
    fn next_u64(&mut self) -> u64 { self.0 }
    fn fill_bytes(&mut self, dest: &mut [u8]) { dest.fill(0) }
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
      dest.fill(0);
      Ok(())
    }
  }

  #[test]
  fn base36_encoding() {
    assert_eq!(to_base36(0), "0");
    assert_eq!(to_base36(35), "Z");
    assert_eq!(to_base36(36), "10");
    assert_eq!(to_base36(1_700_000_000_000), "LOYW3V28");
  }

  #[test]
  fn generated_id_has_expected_shape() {
    let now = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
    let id = generate_with(now, &mut Fixed(1));
    assert_eq!(id.as_str(), "PC-LOYW3V28-00001");
    assert!(is_well_formed(id.as_str()));
  }

  #[test]
  fn random_part_is_always_five_chars() {
    let now = Utc::now();
    for seed in [0, 35, u64::MAX] {
      let id = generate_with(now, &mut Fixed(seed));
      let random = id.as_str().rsplit('-').next().unwrap();
      assert_eq!(random.len(), 5, "{id}");
    }
  }

  #[test]
  fn os_generated_ids_differ() {
    let now = Utc::now();
    assert_ne!(generate(now), generate(now));
  }

  #[test]
  fn rejects_malformed_ids() {
    for bad in ["", "PC", "PC--ABC", "XX-ABC-DEF", "PC-abc-DEF", "PC-A-B-C"] {
      assert!(!is_well_formed(bad), "{bad:?}");
    }
  }
}
