use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::validate_rxcui;
use super::{ApiError, ApiResponse, AppState, MedicationList};
use crate::services::UserInfo;

#[derive(Debug, Deserialize)]
pub struct AddDrugRequest {
    pub rxcui: Option<String>,
}

/// POST /api/user/drugs
pub async fn add_drug(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<UserInfo>,
    payload: Result<Json<AddDrugRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::validation(e.body_text()))?;
    let rxcui = validate_rxcui(payload.rxcui.as_deref())?;

    state.user_drug_service().add_drug(user.id, rxcui).await?;

    Ok(Json(ApiResponse::message("Drug added successfully")))
}

/// DELETE /api/user/drugs/{rxcui}
pub async fn delete_drug(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<UserInfo>,
    Path(rxcui): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.user_drug_service().delete_drug(user.id, &rxcui).await?;

    Ok(Json(ApiResponse::message("Drug deleted successfully")))
}

/// GET /api/user/drugs
///
/// The user's drugs in the order they were added, enriched like search results.
pub async fn list_drugs(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<UserInfo>,
) -> Result<Json<ApiResponse<MedicationList>>, ApiError> {
    let medications = state.user_drug_service().list_drugs(user.id).await?;

    Ok(Json(ApiResponse::success(MedicationList { medications })))
}
