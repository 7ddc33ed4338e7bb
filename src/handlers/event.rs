//! Event ingestion endpoint
//!
//! POST /daos/{daoId}/events: batch of raw chain events from the
//! subscription collaborator, applied in (block, logIndex) order.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::error;

use crate::models::common::ErrorResponse;
use crate::models::event::RawChainEvent;
use crate::services::ingest::{IngestError, IngestStats};
use crate::AppState;

pub async fn ingest_events(
    State(state): State<AppState>,
    Path(dao_id): Path<String>,
    Json(events): Json<Vec<RawChainEvent>>,
) -> Result<Json<IngestStats>, (StatusCode, Json<ErrorResponse>)> {
    let stats = state
        .ingest
        .ingest_batch(&dao_id, events)
        .await
        .map_err(|e| match e {
            IngestError::UnknownDao(dao_id) => (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: format!("Unknown DAO '{}'", dao_id),
                }),
            ),
            IngestError::Ledger(ledger_error) => {
                // Consistency violations halt the stream; surface them to
                // the operator instead of absorbing them.
                error!(dao_id = %dao_id, error = %ledger_error, "Ingestion halted");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: format!("Ingestion halted: {}", ledger_error),
                    }),
                )
            }
        })?;

    Ok(Json(stats))
}
