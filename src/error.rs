//! API error taxonomy.
//!
//! Every client-facing error carries a stable code and a human-readable
//! message. Upstream failures (database, payment gateway) are logged and
//! surfaced as `internal_error`; outside production the response also
//! carries the underlying detail.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::OnceLock;

use crate::config::Environment;

static PRODUCTION: OnceLock<bool> = OnceLock::new();

/// Record the runtime environment once at startup. Until set, error
/// responses include diagnostic detail (the development behavior).
pub fn init_environment(environment: Environment) {
    let _ = PRODUCTION.set(environment.is_production());
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("denied by {policy_type} policy: {reason}")]
    PolicyDenied { policy_type: String, reason: String },
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Auth(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("database error")]
    Database(#[from] sea_orm::DbErr),
    #[error("payment gateway error")]
    Gateway(#[from] reqwest::Error),
    #[error("{0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_failed",
            ApiError::NotFound(_) => "not_found",
            ApiError::PolicyDenied { .. } => "policy_denied",
            ApiError::Conflict(_) => "conflict",
            ApiError::Auth(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::Database(_) | ApiError::Gateway(_) | ApiError::Internal(_) => {
                "internal_error"
            }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::PolicyDenied { .. } => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Database(_) | ApiError::Gateway(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Diagnostic detail for non-production responses.
    fn diagnostic(&self) -> Option<String> {
        match self {
            ApiError::Database(e) => Some(e.to_string()),
            ApiError::Gateway(e) => Some(e.to_string()),
            ApiError::Internal(msg) => Some(msg.clone()),
            _ => None,
        }
    }

    fn is_internal(&self) -> bool {
        matches!(
            self,
            ApiError::Database(_) | ApiError::Gateway(_) | ApiError::Internal(_)
        )
    }

    fn body(&self, include_detail: bool) -> ErrorBody {
        let message = if self.is_internal() {
            "internal error".to_string()
        } else {
            self.to_string()
        };
        ErrorBody {
            error: ErrorDetail {
                code: self.code(),
                message,
                detail: if include_detail { self.diagnostic() } else { None },
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.is_internal() {
            tracing::error!("internal error: {:?}", self);
        }

        let include_detail = !PRODUCTION.get().copied().unwrap_or(false);
        let body = self.body(include_detail);
        (self.status_code(), Json(body)).into_response()
    }
}
