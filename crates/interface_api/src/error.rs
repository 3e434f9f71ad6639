//! API error handling
//!
//! Every failure maps to a distinct machine-checkable kind plus a readable
//! message; nothing is reported as a bare internal error when a more specific
//! kind applies.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use domain_claims::ClaimError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error(transparent)]
    Claim(#[from] ClaimError),
}

impl ApiError {
    /// Boundary validation failure, same kind as the domain's validation errors
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Claim(ClaimError::Validation(message.into()))
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ApiError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "unauthorized"),
            ApiError::Claim(e) => {
                let status = match e {
                    ClaimError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    ClaimError::NotFound(_) => StatusCode::NOT_FOUND,
                    ClaimError::InvalidStateTransition { .. } => StatusCode::CONFLICT,
                    ClaimError::Unauthorized { .. } => StatusCode::FORBIDDEN,
                    ClaimError::Ledger(_) => StatusCode::BAD_GATEWAY,
                    ClaimError::LedgerTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                    ClaimError::Reconciliation(_) | ClaimError::Store(_) => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, e.kind())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();
        let body = ErrorResponse {
            error: kind.to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
