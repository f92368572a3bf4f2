//! API error type and its HTTP mapping.
//!
//! Every failure is rendered as `{"error", "code", "retryable"}` so callers
//! can decide whether to retry without parsing messages.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use casino_ledger::{ErrorCategory, LedgerError, LedgerResult};
use serde::Serialize;
use thiserror::Error;

use crate::{logging, metrics};

/// Error body returned by every endpoint
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    pub retryable: bool,
}

/// Errors surfaced by the HTTP layer
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Malformed request body or parameter
    #[error("{0}")]
    BadRequest(String),

    /// Missing or malformed resolved user id
    #[error("Missing or invalid user id")]
    Unauthorized,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Ledger(err) => status_for(err),
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Ledger(LedgerError::Unrecorded { .. }) => "reconciliation_required",
            ApiError::Ledger(err) => err.category().code(),
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Unauthorized => "unauthorized",
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// HTTP status for a ledger failure
pub fn status_for(err: &LedgerError) -> StatusCode {
    if err.requires_reconciliation() {
        return StatusCode::INTERNAL_SERVER_ERROR;
    }

    match err.category() {
        ErrorCategory::InvalidAmount | ErrorCategory::InsufficientFunds => StatusCode::BAD_REQUEST,
        ErrorCategory::AccountNotFound => StatusCode::NOT_FOUND,
        ErrorCategory::AccountExists => StatusCode::CONFLICT,
        ErrorCategory::Contention | ErrorCategory::StorageUnavailable => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (error, retryable) = match &self {
            ApiError::Ledger(err) => {
                if let LedgerError::Unrecorded {
                    user_id,
                    balance_version,
                    stage,
                    source,
                } = err
                {
                    logging::log_reconciliation_required(
                        *user_id,
                        *balance_version,
                        &stage.to_string(),
                        &source.to_string(),
                    );
                    metrics::reconciliation_required_total();
                } else if matches!(err, LedgerError::StorageUnavailable(_)) {
                    tracing::error!("Storage failure: {}", err);
                }
                (err.client_message(), err.is_retryable())
            }
            other => (other.to_string(), false),
        };

        let body = ErrorResponse {
            error,
            code: self.code(),
            retryable,
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Count a ledger operation by its outcome, passing the result through
pub fn track<T>(operation: &'static str, result: LedgerResult<T>) -> Result<T, ApiError> {
    let outcome = match &result {
        Ok(_) => "ok",
        Err(LedgerError::Unrecorded { .. }) => "reconciliation_required",
        Err(err) => err.category().code(),
    };
    metrics::ledger_operations_total(operation, outcome);
    result.map_err(ApiError::from)
}
