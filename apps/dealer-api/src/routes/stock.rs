//! # Stock Routes
//!
//! ```text
//! GET  /api/stock?q=activa&limit=50   → Vec<StockUnit>
//! POST /api/stock                     → 201 StockUnit   (manual entry)
//! GET  /api/stock/:chassis            → StockUnit
//! ```

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::debug;

use dealer_core::validation::{validate_chassis_no, validate_search_query};
use dealer_core::{CoreError, StockEntry, StockUnit};

use crate::context::UserContext;
use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 200;
const MAX_LIMIT: i64 = 1000;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/stock", get(list_stock).post(add_stock))
        .route("/api/stock/:chassis", get(get_stock_unit))
}

#[derive(Debug, Deserialize)]
pub struct StockQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
}

async fn list_stock(
    State(state): State<AppState>,
    user: UserContext,
    query: Result<Query<StockQuery>, QueryRejection>,
) -> Result<Json<Vec<StockUnit>>, ApiError> {
    let Query(query) = query?;
    let search = validate_search_query(query.q.as_deref().unwrap_or(""))?;
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let units = state.db.stock().list(&user.user_id, &search, limit).await?;
    debug!(user_id = %user.user_id, results = units.len(), "Stock listed");

    Ok(Json(units))
}

async fn add_stock(
    State(state): State<AppState>,
    user: UserContext,
    payload: Result<Json<StockEntry>, JsonRejection>,
) -> Result<(StatusCode, Json<StockUnit>), ApiError> {
    let Json(entry) = payload?;
    let unit = state.coordinator().add_stock_unit(&user.user_id, &entry).await?;
    Ok((StatusCode::CREATED, Json(unit)))
}

async fn get_stock_unit(
    State(state): State<AppState>,
    user: UserContext,
    Path(chassis): Path<String>,
) -> Result<Json<StockUnit>, ApiError> {
    let chassis = validate_chassis_no(&chassis)?;

    state
        .db
        .stock()
        .get(&user.user_id, &chassis)
        .await?
        .map(Json)
        .ok_or_else(|| CoreError::StockUnitNotFound(chassis).into())
}
