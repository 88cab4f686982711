//! HTTP layer for the ProCheck guest registration service.
//!
//! Exposes an axum [`Router`] backed by any [`GuestStore`]:
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/api/health` | Liveness and process snapshot |
//! | `POST` | `/api/guests` | Register a guest |
//! | `GET`  | `/api/guests` | Admin listing (`X-Admin-Token`) |
//! | any    | `/api/*` | 404 JSON |
//! | `GET`  | everything else | Static assets, falling back to `index.html` |

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod shutdown;

pub use config::{Environment, ServerConfig};
pub use error::ApiError;

use std::{sync::Arc, time::Instant};

use axum::{
  Router,
  extract::DefaultBodyLimit,
  http::{HeaderName, HeaderValue, Method, header},
  routing::get,
};
use procheck_core::{rules::BusinessRules, store::GuestStore};
use tower_http::{
  catch_panic::CatchPanicLayer,
  compression::CompressionLayer,
  cors::{AllowOrigin, CorsLayer},
  services::{ServeDir, ServeFile},
  set_header::SetResponseHeaderLayer,
  trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use auth::{ADMIN_TOKEN_HEADER, AdminAuthenticator};
use handlers::{api_not_found, guests, health, panic_response};

/// Largest accepted request body.
pub const BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Content security policy for the bundled front-end. The OCR worker needs
/// `unsafe-eval` for WASM and fetches its models from unpkg and tessdata.
const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; \
  script-src 'self' 'unsafe-eval' https://unpkg.com https://tessdata.projectnaptha.com; \
  connect-src 'self' data: https://unpkg.com https://tessdata.projectnaptha.com; \
  img-src 'self' data: blob:; \
  style-src 'self' 'unsafe-inline' https://fonts.googleapis.com; \
  font-src 'self' https://fonts.gstatic.com; \
  worker-src 'self' blob:; \
  base-uri 'self'; form-action 'self'; frame-ancestors 'self'; \
  object-src 'none'; script-src-attr 'none'; upgrade-insecure-requests";

/// Hardening headers added to every response unless a handler set them.
const SECURITY_HEADERS: &[(&str, &str)] = &[
  ("content-security-policy", CONTENT_SECURITY_POLICY),
  ("cross-origin-opener-policy", "same-origin"),
  ("cross-origin-resource-policy", "same-origin"),
  ("origin-agent-cluster", "?1"),
  ("referrer-policy", "no-referrer"),
  ("strict-transport-security", "max-age=15552000; includeSubDomains"),
  ("x-content-type-options", "nosniff"),
  ("x-dns-prefetch-control", "off"),
  ("x-frame-options", "SAMEORIGIN"),
  ("x-permitted-cross-domain-policies", "none"),
  ("x-xss-protection", "0"),
];

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: GuestStore> {
  pub store:      Arc<S>,
  pub config:     Arc<ServerConfig>,
  pub auth:       Arc<dyn AdminAuthenticator>,
  pub rules:      BusinessRules,
  pub started_at: Instant,
}

impl<S: GuestStore> AppState<S> {
  pub fn new(store: S, config: ServerConfig, auth: Arc<dyn AdminAuthenticator>) -> Self {
    Self {
      store: Arc::new(store),
      rules: BusinessRules::new(config.duplicate_check_policy),
      config: Arc::new(config),
      auth,
      started_at: Instant::now(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router: API routes, SPA fallback and the
/// middleware stack.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: GuestStore + Clone + Send + Sync + 'static,
{
  let api = Router::new()
    .route("/health", get(health::handler::<S>))
    .route("/guests", get(guests::list::<S>).post(guests::register::<S>))
    .fallback(api_not_found);

  let public_dir = &state.config.public_dir;
  let spa = ServeDir::new(public_dir).fallback(ServeFile::new(public_dir.join("index.html")));

  let expose = state.config.environment.exposes_errors();
  let cors = cors_layer(&state.config);

  let trace = TraceLayer::new_for_http()
    .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
    .on_response(DefaultOnResponse::new().level(Level::INFO));

  let mut app = Router::new()
    .nest("/api", api)
    .fallback_service(spa)
    .layer(DefaultBodyLimit::max(BODY_LIMIT))
    .layer(CompressionLayer::new());

  for &(name, value) in SECURITY_HEADERS {
    app = app.layer(SetResponseHeaderLayer::if_not_present(
      HeaderName::from_static(name),
      HeaderValue::from_static(value),
    ));
  }

  app
    .layer(trace)
    .layer(cors)
    .layer(CatchPanicLayer::custom(move |payload| panic_response(payload, expose)))
    .with_state(state)
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
  let origins: Vec<HeaderValue> = config
    .origins()
    .filter_map(|o| match o.parse() {
      Ok(v) => Some(v),
      Err(_) => {
        tracing::warn!(origin = o, "ignoring unparseable CORS origin");
        None
      }
    })
    .collect();

  CorsLayer::new()
    .allow_origin(AllowOrigin::list(origins))
    .allow_methods([
      Method::GET,
      Method::POST,
      Method::PUT,
      Method::DELETE,
      Method::OPTIONS,
    ])
    .allow_headers([
      header::CONTENT_TYPE,
      header::AUTHORIZATION,
      HeaderName::from_static("x-requested-with"),
      HeaderName::from_static(ADMIN_TOKEN_HEADER),
    ])
    .allow_credentials(true)
}

// ─── Integration tests ────────────────────────────────────────────────────────
