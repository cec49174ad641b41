//! # Caller Context
//!
//! Every `/api/*` request acts on behalf of one dealer account. The
//! authenticating gateway in front of this service puts the account id in the
//! `x-user-id` header; handlers receive it as a [`UserContext`] and pass it
//! explicitly to every repository and coordinator call.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::ApiError;

/// Header carrying the caller's account id.
pub const USER_ID_HEADER: &str = "x-user-id";

const MAX_USER_ID_LEN: usize = 128;

/// The account a request acts for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserContext {
    pub user_id: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for UserContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::unauthorized("Missing x-user-id header"))?;

        if user_id.len() > MAX_USER_ID_LEN {
            return Err(ApiError::unauthorized("Malformed x-user-id header"));
        }

        tracing::Span::current().record("user_id", user_id);

        Ok(UserContext {
            user_id: user_id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(header: Option<&str>) -> Result<UserContext, ApiError> {
        let mut builder = Request::builder().uri("/api/stock");
        if let Some(value) = header {
            builder = builder.header(USER_ID_HEADER, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        UserContext::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_reads_and_trims_header() {
        let ctx = extract(Some("  dealer-42 ")).await.unwrap();
        assert_eq!(ctx.user_id, "dealer-42");
    }

    #[tokio::test]
    async fn test_rejects_missing_or_blank_header() {
        assert!(extract(None).await.is_err());
        assert!(extract(Some("   ")).await.is_err());
        let oversized = "x".repeat(200);
        assert!(extract(Some(&oversized)).await.is_err());
    }
}
