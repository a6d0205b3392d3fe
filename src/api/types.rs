use serde::Serialize;
use std::collections::BTreeMap;

use crate::services::{AuthGrant, Medication};

/// Success envelope. `data` is flattened so payload fields sit beside `status`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            status: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            status: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: true,
            message: Some(message.into()),
            data: None,
        }
    }
}

/// Failure envelope written by [`ApiError`](super::ApiError).
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: false,
            message: message.into(),
            errors: None,
            retry_after: None,
        }
    }
}

/// `{"data": {"user": ..., "token": ...}}` as returned by register and login.
#[derive(Debug, Serialize)]
pub struct AuthData {
    pub data: AuthGrant,
}

#[derive(Debug, Serialize)]
pub struct MedicationList {
    pub medications: Vec<Medication>,
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub database: &'static str,
    pub uptime: u64,
    pub version: &'static str,
    pub related_cache_entries: u64,
}
