//! Cross-DAO aggregate endpoint
//!
//! GET /v1/delegated-percentage: mean delegation percentage per day
//! across every registered per-DAO backend.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;

use crate::models::common::ErrorResponse;
use crate::models::delegation::{DelegationPercentageQuery, DelegationPercentageResponse};
use crate::services::cross_dao::AggregationError;
use crate::AppState;

pub async fn delegated_percentage(
    State(state): State<AppState>,
    Query(params): Query<DelegationPercentageQuery>,
) -> Result<Json<DelegationPercentageResponse>, (StatusCode, Json<ErrorResponse>)> {
    let response = state
        .aggregation
        .delegated_percentage(&params)
        .await
        .map_err(|e| match e {
            AggregationError::Validation(message) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: message }))
            }
        })?;

    Ok(Json(response))
}
