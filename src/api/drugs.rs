use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::ClientKey;
use super::validation::validate_drug_name;
use super::{ApiError, ApiResponse, AppState};
use crate::services::SearchResponse;

#[derive(Debug, Deserialize)]
pub struct SearchDrugQuery {
    pub drug_name: Option<String>,
}

/// GET /api/search-drug?drug_name=
///
/// Branded drugs matching the name, each with its ingredients and dosage forms.
pub async fn search_drug(
    State(state): State<Arc<AppState>>,
    ClientKey(client_key): ClientKey,
    query: Result<Query<SearchDrugQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<SearchResponse>>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::validation(e.body_text()))?;
    let drug_name = validate_drug_name(query.drug_name.as_deref())?;

    let response = state
        .drug_search()
        .search(drug_name, &client_key)
        .await?;

    Ok(Json(ApiResponse::success(response)))
}
