//! Resolved-user middleware for wallet and game endpoints.
//!
//! Session handling lives upstream of this server. The upstream layer
//! forwards the already resolved user id in the `x-user-id` header; this
//! middleware parses it and injects it into request extensions for
//! downstream handlers.
//!
//! # Extracting User ID
//!
//! ```rust,no_run
//! use axum::extract::Extension;
//! use casino_ledger::UserId;
//!
//! async fn protected_handler(Extension(user_id): Extension<UserId>) -> String {
//!     format!("Acting for user {}", user_id)
//! }
//! # let _ = protected_handler;
//! ```

use axum::{extract::Request, http::HeaderMap, middleware::Next, response::Response};
use casino_ledger::UserId;

use super::errors::ApiError;

/// Header carrying the resolved user id
pub const USER_ID_HEADER: &str = "x-user-id";

/// Parse the resolved user id, if present and well formed
fn user_id_from_headers(headers: &HeaderMap) -> Option<UserId> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

/// Middleware that requires a resolved user id and injects it.
///
/// # Behavior
///
/// - **Success**: Header parses as a user id → Injects `UserId` into request extensions → Calls next handler
/// - **Missing or malformed header**: Returns `401 Unauthorized`
pub async fn user_id_middleware(mut request: Request, next: Next) -> Result<Response, ApiError> {
    let user_id = user_id_from_headers(request.headers()).ok_or(ApiError::Unauthorized)?;
    request.extensions_mut().insert(user_id);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_user_id_present() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static(" 42 "));
        assert_eq!(user_id_from_headers(&headers), Some(42));
    }

    #[test]
    fn test_user_id_missing_or_malformed() {
        let mut headers = HeaderMap::new();
        assert_eq!(user_id_from_headers(&headers), None);

        headers.insert(USER_ID_HEADER, HeaderValue::from_static("alice"));
        assert_eq!(user_id_from_headers(&headers), None);
    }
}
