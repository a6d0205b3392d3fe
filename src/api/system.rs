use axum::{Json, extract::State, http::StatusCode};
use std::sync::Arc;

use super::{ApiResponse, AppState, ErrorResponse, HealthStatus};

/// GET /api/health
///
/// Liveness plus a database round trip. Answers 500 when the database is
/// unreachable.
pub async fn health(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<HealthStatus>>, (StatusCode, Json<ErrorResponse>)> {
    if let Err(e) = state.store().ping().await {
        tracing::error!(error = %e, "Health check failed");
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("Database unavailable")),
        ));
    }

    Ok(Json(ApiResponse::success(HealthStatus {
        database: "ok",
        uptime: state.start_time.elapsed().as_secs(),
        version: env!("CARGO_PKG_VERSION"),
        related_cache_entries: state.shared.search.related_cache.entry_count(),
    })))
}
