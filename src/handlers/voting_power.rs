//! Voting power history endpoint
//!
//! GET /voting-powers/{account}. The optional fromAddresses/toAddresses
//! filters join each history row back to its originating transfer or
//! delegation through the shared (tx_hash, log_index) stamp.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};
use std::collections::{HashMap, HashSet};
use tracing::info;

use crate::entities::{delegations, prelude::*, transfers, voting_power_history};
use crate::models::common::ErrorResponse;
use crate::models::voting_power::{VotingPowerEntry, VotingPowerQuery, VotingPowersResponse};
use crate::AppState;

use super::balance::normalize_account;

const DEFAULT_PAGE_SIZE: u64 = 100;
const MAX_PAGE_SIZE: u64 = 1000;

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn bad_request(message: String) -> HandlerError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: message }))
}

fn db_error(e: impl std::fmt::Display) -> HandlerError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: format!("Database error: {}", e),
        }),
    )
}

fn parse_address_list(raw: &Option<String>) -> Result<Option<HashSet<String>>, HandlerError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let mut addresses = HashSet::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        addresses.insert(normalize_account(part)?);
    }
    Ok(Some(addresses))
}

pub async fn voting_powers(
    State(state): State<AppState>,
    Path(account): Path<String>,
    Query(params): Query<VotingPowerQuery>,
) -> Result<Json<VotingPowersResponse>, HandlerError> {
    let account = normalize_account(&account)?;
    let from_filter = parse_address_list(&params.from_addresses)?;
    let to_filter = parse_address_list(&params.to_addresses)?;

    let order_by = match params.order_by.as_deref() {
        None | Some("timestamp") => voting_power_history::Column::Timestamp,
        Some("delta") => voting_power_history::Column::Delta,
        Some(other) => {
            return Err(bad_request(format!(
                "Invalid orderBy '{}'. Use timestamp or delta",
                other
            )));
        }
    };
    let direction = params.order_direction.unwrap_or_default();

    let mut query = VotingPowerHistory::find()
        .filter(voting_power_history::Column::AccountId.eq(&account));
    if let Some(min_delta) = params.min_delta {
        query = query.filter(voting_power_history::Column::Delta.gte(min_delta));
    }
    if let Some(max_delta) = params.max_delta {
        query = query.filter(voting_power_history::Column::Delta.lte(max_delta));
    }
    let query = query
        .order_by(order_by, direction.to_order())
        .order_by(voting_power_history::Column::LogIndex, direction.to_order());

    let skip = params.skip.unwrap_or(0);
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE);

    // Without address filters pagination stays in the database; with
    // them the rows are joined and filtered here before slicing.
    let (rows, total_count) = if from_filter.is_none() && to_filter.is_none() {
        let total = query.clone().count(&state.db).await.map_err(db_error)?;
        let rows = query
            .offset(skip)
            .limit(limit)
            .all(&state.db)
            .await
            .map_err(db_error)?;
        (rows, total)
    } else {
        let all_rows = query.all(&state.db).await.map_err(db_error)?;

        let tx_hashes: Vec<String> = all_rows.iter().map(|r| r.tx_hash.clone()).collect();
        let (transfer_rows, delegation_rows) = if tx_hashes.is_empty() {
            (vec![], vec![])
        } else {
            let transfer_rows = Transfers::find()
                .filter(transfers::Column::TxHash.is_in(tx_hashes.clone()))
                .all(&state.db)
                .await
                .map_err(db_error)?;
            let delegation_rows = Delegations::find()
                .filter(delegations::Column::TxHash.is_in(tx_hashes))
                .all(&state.db)
                .await
                .map_err(db_error)?;
            (transfer_rows, delegation_rows)
        };

        // (tx_hash, log_index) -> (from side, to side) of the source event
        let mut sources: HashMap<(String, i32), (String, String)> = HashMap::new();
        for t in &transfer_rows {
            sources.insert(
                (t.tx_hash.clone(), t.log_index),
                (t.from_address.clone(), t.to_address.clone()),
            );
        }
        for d in &delegation_rows {
            sources.insert(
                (d.tx_hash.clone(), d.log_index),
                (d.delegator_account_id.clone(), d.delegate_account_id.clone()),
            );
        }

        let filtered: Vec<voting_power_history::Model> = all_rows
            .into_iter()
            .filter(|row| {
                let Some((from, to)) = sources.get(&(row.tx_hash.clone(), row.log_index))
                else {
                    return false;
                };
                if let Some(ref wanted) = from_filter {
                    if !wanted.contains(from) {
                        return false;
                    }
                }
                if let Some(ref wanted) = to_filter {
                    if !wanted.contains(to) {
                        return false;
                    }
                }
                true
            })
            .collect();

        let total = filtered.len() as u64;
        let rows = filtered
            .into_iter()
            .skip(skip as usize)
            .take(limit as usize)
            .collect();
        (rows, total)
    };

    let items: Vec<VotingPowerEntry> = rows
        .into_iter()
        .map(|row| VotingPowerEntry {
            tx_hash: row.tx_hash,
            log_index: row.log_index,
            dao_id: row.dao_id,
            account_id: row.account_id,
            voting_power: row.voting_power,
            delta: row.delta,
            timestamp: row.timestamp.to_utc(),
        })
        .collect();

    info!(account = %account, items = items.len(), total = total_count, "Voting powers served");

    Ok(Json(VotingPowersResponse { items, total_count }))
}
