//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Dealer Books                           │
//! │                                                                         │
//! │  Handler: Result<Json<T>, ApiError>                                    │
//! │         │                                                               │
//! │         ├── DbError::Domain(CoreError) ── real message ──┐             │
//! │         │     UnitAlreadySold → 409 STOCK_CONFLICT        │             │
//! │         │     Validation      → 400 VALIDATION_ERROR      │             │
//! │         │                                                 ▼             │
//! │         ├── DbError::QueryFailed(..) ── error! logged ── ApiError ────► │
//! │         │     → 500 DATABASE_ERROR, generic message       ▲             │
//! │         │       (+ `detail` in development)               │             │
//! │         │                                                 │             │
//! │         └── JSON / query string rejections ───────────────┘             │
//! │                                                                         │
//! │  fetch('/api/invoices', { method: 'POST', ... })                        │
//! │    → 409 { "code": "STOCK_CONFLICT",                                    │
//! │            "message": "Vehicle ME4JF50... is already sold on invoice    │
//! │                        INV/2024-25/0003" }                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Development Detail
//! The response body never includes internal error text on its own. The
//! rendered response carries the [`ApiError`] as an extension; in development
//! [`attach_error_detail`] re-renders the body with `detail` filled in.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use dealer_core::{CoreError, ValidationError};
use dealer_db::DbError;

/// API error returned from handlers.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Invoice not found: 3f2c..."
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,

    /// Internal error text; only serialized by the development layer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Error codes for API responses.
///
/// ## Usage in Frontend
/// ```typescript
/// switch (body.code) {
///   case 'STOCK_CONFLICT':
///     highlightChassis(body.message);
///     break;
///   case 'VALIDATION_ERROR':
///     showForm(body.message);
///     break;
///   default:
///     showError('An error occurred');
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Missing or malformed caller identity (401)
    Unauthorized,

    /// Vehicle is not where the operation needs it to be (409)
    StockConflict,

    /// Business rule refused the change (422)
    BusinessLogic,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::StockConflict => StatusCode::CONFLICT,
            ErrorCode::BusinessLogic => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            detail: None,
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    fn render(&self, include_detail: bool) -> Response {
        let body = if include_detail {
            Json(self.clone())
        } else {
            Json(ApiError {
                detail: None,
                ..self.clone()
            })
        };
        let mut response = (self.code.status(), body).into_response();
        response.extensions_mut().insert(self.clone());
        response
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.render(false)
    }
}

/// Re-renders error responses with their `detail`. Layered only in development.
pub async fn attach_error_detail(request: Request, next: Next) -> Response {
    let response = next.run(request).await;

    match response.extensions().get::<ApiError>() {
        Some(err) if err.detail.is_some() => err.render(true),
        _ => response,
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Domain(err) => err.into(),
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::StockConflict,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference").with_detail(message)
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed").with_detail(e)
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed").with_detail(e)
            }
            DbError::QueryFailed(e) => {
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed").with_detail(e)
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
                    .with_detail(e)
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database is busy, try again")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed").with_detail(e)
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            _ if err.is_stock_conflict() => ErrorCode::StockConflict,
            CoreError::InvoiceNotFound(_)
            | CoreError::PurchaseNotFound(_)
            | CoreError::StockUnitNotFound(_) => ErrorCode::NotFound,
            CoreError::FinancialYearChanged { .. } => ErrorCode::BusinessLogic,
            _ => ErrorCode::ValidationError,
        };

        let message = match err {
            CoreError::Validation(e) => e.to_string(),
            other => other.to_string(),
        };

        ApiError::new(code, message)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_conflicts_map_to_409() {
        let err: ApiError = DbError::Domain(CoreError::UnitAlreadySold {
            chassis_no: "ME4JF509000001".to_string(),
            invoice_number: "INV/2024-25/0003".to_string(),
        })
        .into();

        assert_eq!(err.code, ErrorCode::StockConflict);
        assert_eq!(err.code.status(), StatusCode::CONFLICT);
        assert!(err.message.contains("INV/2024-25/0003"));
    }

    #[test]
    fn test_error_codes_by_rejection() {
        let cases = [
            (
                CoreError::UnitNotInStock {
                    chassis_no: "CH1".to_string(),
                },
                ErrorCode::StockConflict,
            ),
            (
                CoreError::PurchaseHasSoldUnits {
                    purchase_number: "PUR/2024-25/0001".to_string(),
                    chassis_numbers: vec!["CH1".to_string()],
                },
                ErrorCode::StockConflict,
            ),
            (
                CoreError::InvoiceNotFound("x".to_string()),
                ErrorCode::NotFound,
            ),
            (
                CoreError::EmptyDocument {
                    document: "Invoice".to_string(),
                },
                ErrorCode::ValidationError,
            ),
        ];

        for (err, code) in cases {
            assert_eq!(ApiError::from(err).code, code);
        }
    }

    #[test]
    fn test_validation_message_is_unwrapped() {
        let err: ApiError = CoreError::Validation(ValidationError::Required {
            field: "customer_name".to_string(),
        })
        .into();

        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "customer_name is required");
    }

    #[test]
    fn test_database_errors_hide_internal_text() {
        let err: ApiError = DbError::QueryFailed("no such table: invoices".to_string()).into();

        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert_eq!(err.message, "Database operation failed");
        assert_eq!(err.detail.as_deref(), Some("no such table: invoices"));

        let json = serde_json::to_value(ApiError { detail: None, ..err }).unwrap();
        assert_eq!(json["code"], "DATABASE_ERROR");
        assert!(json.get("detail").is_none());
    }
}
