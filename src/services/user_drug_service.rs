//! Domain service for a user's personal medication list.
//!
//! Drugs are validated against RxNav before they are stored, and the list is
//! returned enriched with the same cached ingredient/dosage form data the
//! search uses.

use serde::Serialize;
use thiserror::Error;

use crate::clients::rxnav::UpstreamError;

#[derive(Debug, Error)]
pub enum UserDrugError {
    #[error("Invalid RXCUI provided")]
    InvalidRxcui,

    #[error("Drug already exists in your list")]
    Duplicate,

    #[error("Drug not found in your list")]
    NotFound,

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for UserDrugError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// A stored drug with its enrichment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Medication {
    pub rxcui: String,
    pub drug_name: String,
    pub ingredient_base_names: Vec<String>,
    pub dosage_forms: Vec<String>,
}

#[async_trait::async_trait]
pub trait UserDrugService: Send + Sync {
    /// Adds `rxcui` to the user's list under the name RxNav reports for it.
    ///
    /// # Errors
    ///
    /// [`UserDrugError::InvalidRxcui`] if RxNav does not know the identifier,
    /// [`UserDrugError::Duplicate`] if the user already has it.
    async fn add_drug(&self, user_id: i32, rxcui: &str) -> Result<(), UserDrugError>;

    /// # Errors
    ///
    /// [`UserDrugError::NotFound`] if the user does not have `rxcui`.
    async fn delete_drug(&self, user_id: i32, rxcui: &str) -> Result<(), UserDrugError>;

    /// The user's drugs in insertion order.
    async fn list_drugs(&self, user_id: i32) -> Result<Vec<Medication>, UserDrugError>;
}
