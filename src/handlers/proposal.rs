//! Proposal read endpoints
//!
//! GET /proposals, GET /proposals/{proposalId} and
//! GET /proposals/{proposalId}/votes

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};

use crate::entities::{prelude::*, proposals, votes_onchain};
use crate::models::common::ErrorResponse;
use crate::models::proposal::{
    ProposalDetail, ProposalListQuery, ProposalStatus, ProposalSummary, ProposalsResponse,
    VoteEntry, VotesResponse,
};
use crate::AppState;

const DEFAULT_PAGE_SIZE: u64 = 50;
const MAX_PAGE_SIZE: u64 = 500;

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn bad_request(message: String) -> HandlerError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: message }))
}

fn not_found(message: String) -> HandlerError {
    (StatusCode::NOT_FOUND, Json(ErrorResponse { error: message }))
}

fn db_error(e: impl std::fmt::Display) -> HandlerError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: format!("Database error: {}", e),
        }),
    )
}

pub async fn list_proposals(
    State(state): State<AppState>,
    Query(params): Query<ProposalListQuery>,
) -> Result<Json<ProposalsResponse>, HandlerError> {
    let mut query = Proposals::find();
    if let Some(dao_id) = &params.dao_id {
        query = query.filter(proposals::Column::DaoId.eq(dao_id));
    }
    if let Some(status) = &params.status {
        let status = ProposalStatus::from_str_opt(status)
            .ok_or_else(|| bad_request(format!("Invalid status '{}'", status)))?;
        query = query.filter(proposals::Column::Status.eq(status.as_str()));
    }

    let total_count = query.clone().count(&state.db).await.map_err(db_error)?;

    let direction = params.order_direction.unwrap_or_default();
    let rows = query
        .order_by(proposals::Column::Timestamp, direction.to_order())
        .offset(params.skip.unwrap_or(0))
        .limit(params.limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE))
        .all(&state.db)
        .await
        .map_err(db_error)?;

    let items = rows
        .into_iter()
        .map(|row| ProposalSummary {
            proposal_id: row.proposal_id,
            dao_id: row.dao_id,
            proposer_account_id: row.proposer_account_id,
            status: row.status,
            start_block: row.start_block,
            end_block: row.end_block,
            timestamp: row.timestamp.to_utc(),
            for_votes: row.for_votes,
            against_votes: row.against_votes,
            abstain_votes: row.abstain_votes,
        })
        .collect();

    Ok(Json(ProposalsResponse { items, total_count }))
}

pub async fn get_proposal(
    State(state): State<AppState>,
    Path(proposal_id): Path<String>,
) -> Result<Json<ProposalDetail>, HandlerError> {
    let row = Proposals::find()
        .filter(proposals::Column::ProposalId.eq(&proposal_id))
        .one(&state.db)
        .await
        .map_err(db_error)?
        .ok_or_else(|| not_found(format!("Proposal {} not found", proposal_id)))?;

    Ok(Json(ProposalDetail {
        proposal_id: row.proposal_id,
        dao_id: row.dao_id,
        proposer_account_id: row.proposer_account_id,
        targets: row.targets,
        values: row.values,
        calldatas: row.calldatas,
        start_block: row.start_block,
        end_block: row.end_block,
        description: row.description,
        timestamp: row.timestamp.to_utc(),
        status: row.status,
        for_votes: row.for_votes,
        against_votes: row.against_votes,
        abstain_votes: row.abstain_votes,
    }))
}

pub async fn get_proposal_votes(
    State(state): State<AppState>,
    Path(proposal_id): Path<String>,
) -> Result<Json<VotesResponse>, HandlerError> {
    let rows = VotesOnchain::find()
        .filter(votes_onchain::Column::ProposalId.eq(&proposal_id))
        .order_by(votes_onchain::Column::Timestamp, sea_orm::Order::Asc)
        .all(&state.db)
        .await
        .map_err(db_error)?;

    let total_count = rows.len() as u64;
    let items = rows
        .into_iter()
        .map(|row| VoteEntry {
            voter: row.voter_account_id,
            proposal_id: row.proposal_id,
            support: row.support,
            voting_power: row.voting_power,
            reason: row.reason,
            timestamp: row.timestamp.to_utc(),
        })
        .collect();

    Ok(Json(VotesResponse { items, total_count }))
}
