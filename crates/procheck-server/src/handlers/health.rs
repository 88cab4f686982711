//! `GET /api/health`: liveness plus a small process snapshot.

use axum::{Json, extract::State};
use chrono::Utc;
use procheck_core::store::GuestStore;
use serde_json::{Value, json};

use crate::AppState;

pub async fn handler<S>(State(state): State<AppState<S>>) -> Json<Value>
where
  S: GuestStore + Clone + Send + Sync + 'static,
{
  let memory = tokio::task::spawn_blocking(process_memory_mb)
    .await
    .ok()
    .flatten()
    .map(|(used, total)| json!({ "used": format!("{used} MB"), "total": format!("{total} MB") }));

  let health = json!({
    "status": "healthy",
    "timestamp": Utc::now().to_rfc3339(),
    "uptime": state.started_at.elapsed().as_secs(),
    "version": env!("CARGO_PKG_VERSION"),
    "environment": state.config.environment.as_str(),
    "memory": memory,
    "system": {
      "platform": std::env::consts::OS,
      "arch": std::env::consts::ARCH,
    },
  });

  tracing::debug!(%health, "health check requested");
  Json(health)
}

/// Resident and virtual size of this process in MiB, from `/proc/self/status`.
/// `None` where procfs is unavailable.
fn process_memory_mb() -> Option<(u64, u64)> {
  let status = std::fs::read_to_string("/proc/self/status").ok()?;
  let field_kb = |name: &str| -> Option<u64> {
    status
      .lines()
      .find_map(|l| l.strip_prefix(name))
      .and_then(|rest| rest.split_whitespace().next())
      .and_then(|kb| kb.parse().ok())
  };
  Some((field_kb("VmRSS:")? / 1024, field_kb("VmSize:")? / 1024))
}
