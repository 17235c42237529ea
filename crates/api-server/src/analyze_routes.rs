//! Analysis API Routes
//!
//! The single natural-language analysis endpoint.

use analysis_core::{AnalysisRequest, AnalysisResponse};
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Extension, Json, Router,
};

use crate::{AppError, AppState, RequestId};

pub fn analyze_routes() -> Router<AppState> {
    Router::new().route("/analyze", post(analyze_financial_data))
}

#[utoipa::path(
    post,
    path = "/analyze",
    request_body = AnalysisRequest,
    responses(
        (status = 200, description = "Chart data, statistics and narrative", body = AnalysisResponse),
        (status = 400, description = "Query could not be interpreted, fetched or analyzed", body = crate::ErrorBody)
    ),
    tag = "Analysis"
)]
pub(crate) async fn analyze_financial_data(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
    payload: Result<Json<AnalysisRequest>, JsonRejection>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let Json(request) = payload.map_err(|rejection| {
        AppError::with_status(rejection.status(), "invalid_request", rejection.body_text())
    })?;

    let request_id = request_id.map(|Extension(id)| id.as_str().to_string()).unwrap_or_default();

    match state.orchestrator.analyze(&request).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            tracing::warn!(request_id = %request_id, kind = e.kind().as_str(), "Analysis request failed: {}", e);
            Err(AppError::from(e))
        }
    }
}
