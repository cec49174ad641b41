//! # HTTP Routes
//!
//! One module per resource; each exposes `router()` and they are merged in
//! [`crate::build_router`].
//!
//! | Module        | Paths                          |
//! |---------------|--------------------------------|
//! | [`health`]    | `/health`                      |
//! | [`stock`]     | `/api/stock…`                  |
//! | [`invoices`]  | `/api/invoices…`               |
//! | [`purchases`] | `/api/purchases…`              |
//! | [`reports`]   | `/api/reports…`                |

use chrono::{Local, NaiveDate};
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;

pub mod health;
pub mod invoices;
pub mod purchases;
pub mod reports;
pub mod stock;

/// `?fy=2024-25` on list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct FinancialYearQuery {
    #[serde(default)]
    pub fy: Option<String>,
}

/// `?date=2024-06-01` on next-number endpoints; defaults to today.
#[derive(Debug, Default, Deserialize)]
pub struct PreviewQuery {
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl PreviewQuery {
    pub fn date_or_today(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| Local::now().date_naive())
    }
}

/// Normalizes an optional `fy` filter to its canonical label.
fn financial_year_filter(state: &AppState, fy: Option<&str>) -> Result<Option<String>, ApiError> {
    match fy.map(str::trim).filter(|s| !s.is_empty()) {
        Some(label) => Ok(Some(state.policy().parse_financial_year(label)?.label())),
        None => Ok(None),
    }
}
