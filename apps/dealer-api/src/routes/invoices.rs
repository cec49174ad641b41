//! # Sales Invoice Routes
//!
//! ```text
//! GET    /api/invoices?fy=2024-25              → Vec<Invoice>
//! POST   /api/invoices                         → 201 InvoiceWithItems
//! GET    /api/invoices/next-number?date=...    → NumberPreview
//! GET    /api/invoices/:id                     → InvoiceWithItems
//! PUT    /api/invoices/:id                     → InvoiceWithItems
//! DELETE /api/invoices/:id                     → 204
//! ```
//!
//! The number in a saved invoice comes from the save itself; the preview is
//! only what the form shows while the user is typing.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use dealer_core::validation::validate_uuid;
use dealer_core::{CoreError, DocumentType, Invoice, InvoiceDraft, InvoiceWithItems, NumberPreview};

use super::{financial_year_filter, FinancialYearQuery, PreviewQuery};
use crate::context::UserContext;
use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/invoices", get(list_invoices).post(create_invoice))
        .route("/api/invoices/next-number", get(next_invoice_number))
        .route(
            "/api/invoices/:id",
            get(get_invoice).put(update_invoice).delete(delete_invoice),
        )
}

async fn list_invoices(
    State(state): State<AppState>,
    user: UserContext,
    query: Result<Query<FinancialYearQuery>, QueryRejection>,
) -> Result<Json<Vec<Invoice>>, ApiError> {
    let Query(query) = query?;
    let fy = financial_year_filter(&state, query.fy.as_deref())?;

    let invoices = state.db.invoices().list(&user.user_id, fy.as_deref()).await?;
    Ok(Json(invoices))
}

async fn create_invoice(
    State(state): State<AppState>,
    user: UserContext,
    payload: Result<Json<InvoiceDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<InvoiceWithItems>), ApiError> {
    let Json(draft) = payload?;
    let saved = state.coordinator().save_invoice(&user.user_id, &draft).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

async fn next_invoice_number(
    State(state): State<AppState>,
    user: UserContext,
    query: Result<Query<PreviewQuery>, QueryRejection>,
) -> Result<Json<NumberPreview>, ApiError> {
    let Query(query) = query?;
    let preview = state
        .coordinator()
        .preview_number(&user.user_id, DocumentType::SalesInvoice, query.date_or_today())
        .await?;
    Ok(Json(preview))
}

async fn get_invoice(
    State(state): State<AppState>,
    user: UserContext,
    Path(id): Path<String>,
) -> Result<Json<InvoiceWithItems>, ApiError> {
    validate_uuid(&id)?;

    state
        .db
        .invoices()
        .get_with_items(&user.user_id, &id)
        .await?
        .map(Json)
        .ok_or_else(|| CoreError::InvoiceNotFound(id).into())
}

async fn update_invoice(
    State(state): State<AppState>,
    user: UserContext,
    Path(id): Path<String>,
    payload: Result<Json<InvoiceDraft>, JsonRejection>,
) -> Result<Json<InvoiceWithItems>, ApiError> {
    validate_uuid(&id)?;
    let Json(draft) = payload?;

    let updated = state.coordinator().update_invoice(&user.user_id, &id, &draft).await?;
    Ok(Json(updated))
}

async fn delete_invoice(
    State(state): State<AppState>,
    user: UserContext,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    validate_uuid(&id)?;
    state.coordinator().delete_invoice(&user.user_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
