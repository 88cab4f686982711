//! Runtime configuration.
//!
//! Values come from built-in defaults, then an optional TOML file, then
//! `PROCHECK_*` environment variables (e.g. `PROCHECK_PORT=8080`,
//! `PROCHECK_ALLOWED_ORIGINS=https://a.example,https://b.example`).

use std::{
  fmt,
  path::{Path, PathBuf},
  time::Duration,
};

use procheck_core::rules::DuplicateCheckPolicy;
use serde::Deserialize;

/// Deployment environment. Only `Development` exposes internal error text in
/// responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
  #[default]
  Development,
  Production,
  Test,
}

impl Environment {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Development => "development",
      Self::Production => "production",
      Self::Test => "test",
    }
  }

  pub fn exposes_errors(self) -> bool { self == Self::Development }
}

impl fmt::Display for Environment {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Runtime server configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:                   String,
  pub port:                   u16,
  pub environment:            Environment,
  /// Origins permitted by CORS. Accepts a list or one comma-separated string.
  #[serde(deserialize_with = "comma_list")]
  pub allowed_origins:        Vec<String>,
  /// `sqlite://path/to/file.db`, a bare path, or `:memory:`.
  pub database_url:           String,
  /// Shared secret for the admin listing. Unset denies every admin request.
  #[serde(default)]
  pub admin_token:            Option<String>,
  /// Root of the single-page application's static assets.
  pub public_dir:             PathBuf,
  pub shutdown_grace_secs:    u64,
  pub duplicate_check_policy: DuplicateCheckPolicy,
}

/// Where the guest store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
  Memory,
  File(PathBuf),
}

impl ServerConfig {
  /// Layer defaults, the optional file at `path`, and the process
  /// environment.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    Self::load_with_env(path, None)
  }

  /// As [`ServerConfig::load`], reading `PROCHECK_*` variables from `env`
  /// instead of the process environment when given.
  ///
  /// Variables are taken as text. Numeric fields are converted during
  /// deserialisation, so string fields such as `admin_token` keep their exact
  /// bytes.
  pub fn load_with_env(
    path: &Path,
    env: Option<config::Map<String, String>>,
  ) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .set_default("host", "0.0.0.0")?
      .set_default("port", 3000i64)?
      .set_default("environment", "development")?
      .set_default(
        "allowed_origins",
        vec!["http://localhost:3000", "http://127.0.0.1:3000"],
      )?
      .set_default("database_url", "sqlite://data/guests.db")?
      .set_default("public_dir", "public")?
      .set_default("shutdown_grace_secs", 10i64)?
      .set_default("duplicate_check_policy", "fail_open")?
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("PROCHECK").source(env))
      .build()?
      .try_deserialize()
  }

  pub fn store_location(&self) -> StoreLocation {
    let raw = self
      .database_url
      .strip_prefix("sqlite://")
      .unwrap_or(&self.database_url);
    if raw == ":memory:" {
      StoreLocation::Memory
    } else {
      StoreLocation::File(PathBuf::from(raw))
    }
  }

  pub fn shutdown_grace(&self) -> Duration { Duration::from_secs(self.shutdown_grace_secs) }

  /// Origins with surrounding whitespace removed and blanks dropped.
  pub fn origins(&self) -> impl Iterator<Item = &str> {
    self
      .allowed_origins
      .iter()
      .map(|o| o.trim())
      .filter(|o| !o.is_empty())
  }
}

/// A list given either as a sequence or as one comma-separated string.
fn comma_list<'de, D>(de: D) -> Result<Vec<String>, D::Error>
where
  D: serde::Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum OneOrMany {
    One(String),
    Many(Vec<String>),
  }

  Ok(match OneOrMany::deserialize(de)? {
    OneOrMany::One(joined) => joined.split(',').map(str::to_owned).collect(),
    OneOrMany::Many(items) => items,
  })
}
