//! Liveness endpoint for load balancers and the desktop shell.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub database: bool,
    pub schema_current: bool,
    pub version: &'static str,
}

/// 200 when the database answers and every migration is applied, 503
/// otherwise. No caller identity needed.
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let database = state.db.health_check().await;
    let schema_current = match state.db.migration_status().await {
        Ok((embedded, applied)) => applied >= embedded,
        Err(err) => {
            tracing::warn!(error = %err, "Migration status unavailable");
            false
        }
    };

    let (code, status) = if database && schema_current {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        code,
        Json(HealthStatus {
            status,
            database,
            schema_current,
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}
