//! Handlers for `/api/guests`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/api/guests` | JSON or form body; 201 + `{guestId, registeredAt, processingTime}` |
//! | `GET`  | `/api/guests` | Requires `X-Admin-Token`; public projection only |

use std::time::Instant;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use procheck_core::{
  guest::{GuestRecord, GuestSummary, redact_id_number},
  id,
  store::GuestStore,
  validate,
};
use serde_json::{Value, json};

use crate::{
  AppState,
  auth::Admin,
  error::ApiError,
  extract::{ClientAddr, GuestPayload},
};

// ─── Register ─────────────────────────────────────────────────────────────────

/// `POST /api/guests`
///
/// Sanitation, schema validation, business rules and persistence run in that
/// order; the first failing stage decides the response.
pub async fn register<S>(
  State(state): State<AppState<S>>,
  ClientAddr(client): ClientAddr,
  GuestPayload(raw): GuestPayload,
) -> Result<impl IntoResponse, ApiError>
where
  S: GuestStore + Clone + Send + Sync + 'static,
{
  let started = Instant::now();

  tracing::info!(
    ip = %client,
    id_number = %raw.id_number.as_deref().map(redact_id_number).unwrap_or_default(),
    "guest registration attempt"
  );

  let sanitized = validate::sanitize(&raw).map_err(|errors| {
    tracing::warn!(?errors, "sanitation failed");
    ApiError::Validation(errors)
  })?;

  let now = Utc::now();
  let guest = validate::validate_schema(sanitized, now).map_err(|errors| {
    tracing::warn!(?errors, "schema validation failed");
    ApiError::Validation(errors)
  })?;

  let violations = state.rules.evaluate(state.store.as_ref(), &guest, now).await;
  if !violations.is_empty() {
    tracing::warn!(?violations, "business validation failed");
    return Err(ApiError::Business(violations));
  }

  let record = GuestRecord::new(id::generate(now), guest, now, client);
  let guest_id = record.id.clone();
  let registered_at = record.registered_at;
  let full_name = record.full_name.clone();

  if let Err(e) = state.store.insert(record).await {
    tracing::error!(
      error = %e,
      processing_ms = started.elapsed().as_millis() as u64,
      "guest registration failed"
    );
    return Err(ApiError::registration(&e, state.config.environment.exposes_errors()));
  }

  let processing_ms = started.elapsed().as_millis();
  tracing::info!(%guest_id, name = %full_name, processing_ms = processing_ms as u64, "guest registered");

  Ok((
    StatusCode::CREATED,
    Json(json!({
      "success": true,
      "message": "Guest registered successfully",
      "data": {
        "guestId": guest_id,
        "registeredAt": registered_at.to_rfc3339(),
        "processingTime": format!("{processing_ms}ms"),
      },
    })),
  ))
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /api/guests`, admin only.
pub async fn list<S>(
  State(state): State<AppState<S>>,
  _admin: Admin,
) -> Result<Json<Value>, ApiError>
where
  S: GuestStore + Clone + Send + Sync + 'static,
{
  let records = state.store.list().await.map_err(|e| {
    tracing::error!(error = %e, "failed to fetch guests");
    ApiError::Listing
  })?;

  let guests: Vec<GuestSummary> = records.into_iter().map(GuestSummary::from).collect();

  Ok(Json(json!({
    "success": true,
    "count": guests.len(),
    "data": guests,
    "timestamp": Utc::now().to_rfc3339(),
  })))
}
