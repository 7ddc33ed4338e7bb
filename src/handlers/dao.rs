//! Per-DAO operational endpoints
//!
//! GET /daos/{daoId}/params (cached derived parameters) and
//! POST /daos/{daoId}/day-buckets/rebuild (on-demand bucket rebuild).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use tracing::info;

use crate::models::common::ErrorResponse;
use crate::models::dao::{DaoParamsResponse, DaoSummary, DaosResponse, RebuildBucketsResponse};
use crate::AppState;

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn not_found(message: String) -> HandlerError {
    (StatusCode::NOT_FOUND, Json(ErrorResponse { error: message }))
}

pub async fn list_daos(State(state): State<AppState>) -> Json<DaosResponse> {
    let items: Vec<DaoSummary> = state
        .daos
        .iter()
        .map(|dao| DaoSummary {
            dao_id: dao.dao_id.clone(),
            token_id: dao.token_id.clone(),
            token_symbol: dao.token_symbol.clone(),
            token_decimals: dao.token_decimals,
            family: dao.family.as_str().to_string(),
        })
        .collect();
    let total_count = items.len() as u64;

    Json(DaosResponse { items, total_count })
}

pub async fn get_dao_params(
    State(state): State<AppState>,
    Path(dao_id): Path<String>,
) -> Result<Json<DaoParamsResponse>, HandlerError> {
    let config = state
        .daos
        .iter()
        .find(|dao| dao.dao_id == dao_id)
        .ok_or_else(|| not_found(format!("Unknown DAO '{}'", dao_id)))?;
    let params = state
        .dao_params
        .params_for(&dao_id)
        .ok_or_else(|| not_found(format!("Unknown DAO '{}'", dao_id)))?;

    Ok(Json(DaoParamsResponse {
        dao_id: config.dao_id.clone(),
        family: config.family.as_str().to_string(),
        quorum: params.quorum.to_string(),
        voting_delay: params.voting_delay,
        voting_period: params.voting_period,
        proposal_threshold: params.proposal_threshold.to_string(),
        timelock_delay: params.timelock_delay,
    }))
}

pub async fn rebuild_day_buckets(
    State(state): State<AppState>,
    Path(dao_id): Path<String>,
) -> Result<Json<RebuildBucketsResponse>, HandlerError> {
    let config = state
        .daos
        .iter()
        .find(|dao| dao.dao_id == dao_id)
        .ok_or_else(|| not_found(format!("Unknown DAO '{}'", dao_id)))?;

    let today = Utc::now().date_naive();
    let stats = state
        .day_buckets
        .rebuild_dao(&config.dao_id, &config.token_id, today)
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Rebuild failed: {}", e),
                }),
            )
        })?;

    info!(dao_id = %dao_id, written = stats.buckets_written, "On-demand bucket rebuild");

    Ok(Json(RebuildBucketsResponse {
        dao_id,
        buckets_written: stats.buckets_written,
        buckets_deleted: stats.buckets_deleted,
    }))
}
