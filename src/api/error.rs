use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::collections::BTreeMap;
use std::fmt;

use super::ErrorResponse;
use crate::services::{AuthError, SearchError, UserDrugError};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    DatabaseError(String),

    ExternalApiError { service: String, message: String },

    ValidationError(String),

    FieldValidation(BTreeMap<String, Vec<String>>),

    RateLimited { retry_after: u64 },

    /// Duplicate entries are answered with 400, not 409.
    Conflict(String),

    InternalError(String),

    Unauthorized(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::ExternalApiError { service, message } => {
                write!(f, "{service} error: {message}")
            }
            Self::ValidationError(msg) => write!(f, "Validation error: {msg}"),
            Self::FieldValidation(errors) => {
                write!(f, "Validation error on {} field(s)", errors.len())
            }
            Self::RateLimited { retry_after } => {
                write!(f, "Rate limited, retry after {retry_after}s")
            }
            Self::Conflict(msg) => write!(f, "Conflict: {msg}"),
            Self::InternalError(msg) => write!(f, "Internal error: {msg}"),
            Self::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorResponse::new(msg)),
            Self::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("A database error occurred"),
                )
            }
            Self::ExternalApiError { service, message } => {
                tracing::warn!("{} API error: {}", service, message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("Unable to fetch drug data"),
                )
            }
            Self::ValidationError(msg) => (StatusCode::BAD_REQUEST, ErrorResponse::new(msg)),
            Self::FieldValidation(errors) => {
                let mut body = ErrorResponse::new("Validation Errors");
                body.errors = Some(errors);
                (StatusCode::BAD_REQUEST, body)
            }
            Self::RateLimited { retry_after } => {
                let mut body = ErrorResponse::new("Too many requests. Please try again later.");
                body.retry_after = Some(retry_after);
                (StatusCode::BAD_REQUEST, body)
            }
            Self::Conflict(msg) => (StatusCode::BAD_REQUEST, ErrorResponse::new(msg)),
            Self::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("An internal error occurred"),
                )
            }
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, ErrorResponse::new(msg)),
        };

        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalError(err.to_string())
    }
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Validation(msg) => {
                let mut errors = BTreeMap::new();
                errors.insert("drug_name".to_string(), vec![msg]);
                Self::FieldValidation(errors)
            }
            SearchError::RateLimited { retry_after } => Self::RateLimited { retry_after },
            SearchError::Upstream(e) => Self::rxnav_error(e.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => Self::Unauthorized(err.to_string()),
            AuthError::EmailTaken => {
                let mut errors = BTreeMap::new();
                errors.insert("email".to_string(), vec![err.to_string()]);
                Self::FieldValidation(errors)
            }
            AuthError::Validation(msg) => Self::ValidationError(msg),
            AuthError::Database(msg) => Self::DatabaseError(msg),
            AuthError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<UserDrugError> for ApiError {
    fn from(err: UserDrugError) -> Self {
        match err {
            UserDrugError::InvalidRxcui => Self::ValidationError(err.to_string()),
            UserDrugError::Duplicate => Self::Conflict(err.to_string()),
            UserDrugError::NotFound => Self::NotFound(err.to_string()),
            UserDrugError::Upstream(e) => Self::rxnav_error(e.to_string()),
            UserDrugError::Database(msg) => Self::DatabaseError(msg),
        }
    }
}

impl ApiError {
    pub fn rxnav_error(msg: impl Into<String>) -> Self {
        Self::ExternalApiError {
            service: "RxNav".to_string(),
            message: msg.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn unauthorized() -> Self {
        Self::Unauthorized("Unauthenticated.".to_string())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }
}
