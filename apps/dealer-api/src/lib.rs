//! # Dealer Books API
//!
//! JSON over HTTP for the dealership web app.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         dealer-api                                      │
//! │                                                                         │
//! │  SPA ──► gateway (auth, sets x-user-id) ──► axum Router                │
//! │                                                 │                       │
//! │            TraceLayer ─► CorsLayer ─► [attach_error_detail (dev)]       │
//! │                                                 │                       │
//! │                       routes::{stock, invoices, purchases, reports}    │
//! │                                                 │                       │
//! │                      UserContext + AppState { Database, ApiConfig }    │
//! │                                                 │                       │
//! │                                                 ▼                       │
//! │                          dealer-db Coordinator / repositories          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Startup Sequence
//! 1. Initialize tracing (logging)
//! 2. Load [`ApiConfig`] from the environment
//! 3. Connect to the database & run migrations
//! 4. Build the router around [`AppState`]
//! 5. Serve until Ctrl+C / SIGTERM

pub mod config;
pub mod context;
pub mod error;
pub mod routes;
pub mod state;

use axum::middleware::from_fn;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

pub use config::{ApiConfig, ConfigError, Environment};
pub use context::UserContext;
pub use error::{ApiError, ErrorCode};
pub use state::AppState;

/// Builds the full application router.
pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        .merge(routes::health::router())
        .merge(routes::stock::router())
        .merge(routes::invoices::router())
        .merge(routes::purchases::router())
        .merge(routes::reports::router());

    if state.config.environment.is_development() {
        router = router.layer(from_fn(error::attach_error_detail));
    }

    router
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    user_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}

/// Initializes the tracing subscriber.
///
/// ## Log Levels
/// - `RUST_LOG` wins when set
/// - Otherwise: info everywhere, debug for our crates, warn for sqlx
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,dealer_api=debug,dealer_db=debug,dealer_core=debug,sqlx=warn")
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
