//! # Report Routes
//!
//! ```text
//! GET /api/reports/stock-summary       → Vec<StockSummaryRow>
//! GET /api/reports/sales?fy=2024-25    → SalesSummary (current year if omitted)
//! ```

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Local;

use dealer_core::{SalesSummary, StockSummaryRow};

use super::{financial_year_filter, FinancialYearQuery};
use crate::context::UserContext;
use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/reports/stock-summary", get(stock_summary))
        .route("/api/reports/sales", get(sales_summary))
}

async fn stock_summary(
    State(state): State<AppState>,
    user: UserContext,
) -> Result<Json<Vec<StockSummaryRow>>, ApiError> {
    let rows = state.db.reports().stock_summary(&user.user_id).await?;
    Ok(Json(rows))
}

async fn sales_summary(
    State(state): State<AppState>,
    user: UserContext,
    query: Result<Query<FinancialYearQuery>, QueryRejection>,
) -> Result<Json<SalesSummary>, ApiError> {
    let Query(query) = query?;
    let fy = match financial_year_filter(&state, query.fy.as_deref())? {
        Some(fy) => fy,
        None => state
            .policy()
            .financial_year(Local::now().date_naive())?
            .label(),
    };

    let summary = state.db.reports().sales_summary(&user.user_id, &fy).await?;
    Ok(Json(summary))
}
