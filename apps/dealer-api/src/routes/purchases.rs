//! # Purchase Routes
//!
//! ```text
//! GET    /api/purchases?fy=2024-25             → Vec<Purchase>
//! POST   /api/purchases                        → 201 PurchaseWithItems
//! GET    /api/purchases/next-number?date=...   → NumberPreview
//! GET    /api/purchases/:id                    → PurchaseWithItems
//! PUT    /api/purchases/:id                    → PurchaseWithItems
//! DELETE /api/purchases/:id                    → 204, or 409 if a vehicle was sold
//! ```

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use dealer_core::validation::validate_uuid;
use dealer_core::{
    CoreError, DocumentType, NumberPreview, Purchase, PurchaseDraft, PurchaseWithItems,
};

use super::{financial_year_filter, FinancialYearQuery, PreviewQuery};
use crate::context::UserContext;
use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/purchases", get(list_purchases).post(create_purchase))
        .route("/api/purchases/next-number", get(next_purchase_number))
        .route(
            "/api/purchases/:id",
            get(get_purchase).put(update_purchase).delete(delete_purchase),
        )
}

async fn list_purchases(
    State(state): State<AppState>,
    user: UserContext,
    query: Result<Query<FinancialYearQuery>, QueryRejection>,
) -> Result<Json<Vec<Purchase>>, ApiError> {
    let Query(query) = query?;
    let fy = financial_year_filter(&state, query.fy.as_deref())?;

    let purchases = state.db.purchases().list(&user.user_id, fy.as_deref()).await?;
    Ok(Json(purchases))
}

async fn create_purchase(
    State(state): State<AppState>,
    user: UserContext,
    payload: Result<Json<PurchaseDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<PurchaseWithItems>), ApiError> {
    let Json(draft) = payload?;
    let saved = state.coordinator().save_purchase(&user.user_id, &draft).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

async fn next_purchase_number(
    State(state): State<AppState>,
    user: UserContext,
    query: Result<Query<PreviewQuery>, QueryRejection>,
) -> Result<Json<NumberPreview>, ApiError> {
    let Query(query) = query?;
    let preview = state
        .coordinator()
        .preview_number(&user.user_id, DocumentType::Purchase, query.date_or_today())
        .await?;
    Ok(Json(preview))
}

async fn get_purchase(
    State(state): State<AppState>,
    user: UserContext,
    Path(id): Path<String>,
) -> Result<Json<PurchaseWithItems>, ApiError> {
    validate_uuid(&id)?;

    state
        .db
        .purchases()
        .get_with_items(&user.user_id, &id)
        .await?
        .map(Json)
        .ok_or_else(|| CoreError::PurchaseNotFound(id).into())
}

async fn update_purchase(
    State(state): State<AppState>,
    user: UserContext,
    Path(id): Path<String>,
    payload: Result<Json<PurchaseDraft>, JsonRejection>,
) -> Result<Json<PurchaseWithItems>, ApiError> {
    validate_uuid(&id)?;
    let Json(draft) = payload?;

    let updated = state.coordinator().update_purchase(&user.user_id, &id, &draft).await?;
    Ok(Json(updated))
}

async fn delete_purchase(
    State(state): State<AppState>,
    user: UserContext,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    validate_uuid(&id)?;
    state.coordinator().delete_purchase(&user.user_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
