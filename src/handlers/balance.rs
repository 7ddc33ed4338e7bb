//! Historical balance endpoints
//!
//! GET /accounts/{address}/balances/historical and
//! GET /account-balance/interactions

use alloy::primitives::Address;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::info;

use crate::entities::{balance_history, prelude::*, transfers};
use crate::models::balance::{
    AccountInteraction, HistoricalBalance, HistoricalBalanceQuery, HistoricalBalancesResponse,
    InteractionsQuery, InteractionsResponse, TransferContext,
};
use crate::models::common::{ErrorResponse, OrderDirection, parse_date_param};
use crate::services::normalizer::ZERO_ADDRESS;
use crate::AppState;

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

pub(crate) fn normalize_account(address: &str) -> Result<String, HandlerError> {
    let parsed = Address::from_str(address)
        .map_err(|_| bad_request(format!("Invalid address '{}'", address)))?;
    Ok(format!("0x{}", hex::encode(parsed)))
}

fn parse_date(value: &Option<String>, name: &str) -> Result<Option<NaiveDate>, HandlerError> {
    value
        .as_deref()
        .map(|v| parse_date_param(v, name).map_err(bad_request))
        .transpose()
}

pub async fn historical_balances(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Query(params): Query<HistoricalBalanceQuery>,
) -> Result<Json<HistoricalBalancesResponse>, HandlerError> {
    let account = normalize_account(&address)?;
    let from_date = parse_date(&params.from_date, "fromDate")?;
    let to_date = parse_date(&params.to_date, "toDate")?;

    let order_by = match params.order_by.as_deref() {
        None | Some("timestamp") => balance_history::Column::Timestamp,
        Some("delta") => balance_history::Column::Delta,
        Some(other) => {
            return Err(bad_request(format!(
                "Invalid orderBy '{}'. Use timestamp or delta",
                other
            )));
        }
    };
    let direction = params.order_direction.unwrap_or_default();

    let mut query = BalanceHistory::find()
        .filter(balance_history::Column::AccountId.eq(&account));
    if let Some(from_value) = params.from_value {
        query = query.filter(balance_history::Column::Balance.gte(from_value));
    }
    if let Some(to_value) = params.to_value {
        query = query.filter(balance_history::Column::Balance.lte(to_value));
    }
    if let Some(from_date) = from_date {
        let start = from_date.and_hms_opt(0, 0, 0).unwrap().and_utc();
        query = query.filter(balance_history::Column::Timestamp.gte(start.fixed_offset()));
    }
    if let Some(to_date) = to_date {
        let end = (to_date + Duration::days(1)).and_hms_opt(0, 0, 0).unwrap().and_utc();
        query = query.filter(balance_history::Column::Timestamp.lt(end.fixed_offset()));
    }

    let total_count = query
        .clone()
        .count(&state.db)
        .await
        .map_err(db_error)?;

    let rows = query
        .order_by(order_by, direction.to_order())
        .order_by(balance_history::Column::LogIndex, direction.to_order())
        .offset(params.skip.unwrap_or(0))
        .limit(params.limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE))
        .all(&state.db)
        .await
        .map_err(db_error)?;

    // Join the originating transfers back on via (tx_hash, log_index)
    let tx_hashes: Vec<String> = rows.iter().map(|r| r.tx_hash.clone()).collect();
    let transfer_rows = if tx_hashes.is_empty() {
        vec![]
    } else {
        Transfers::find()
            .filter(transfers::Column::TxHash.is_in(tx_hashes))
            .all(&state.db)
            .await
            .map_err(db_error)?
    };
    let transfer_map: HashMap<(String, i32), &transfers::Model> = transfer_rows
        .iter()
        .map(|t| ((t.tx_hash.clone(), t.log_index), t))
        .collect();

    let items: Vec<HistoricalBalance> = rows
        .into_iter()
        .map(|row| {
            let transfer = transfer_map
                .get(&(row.tx_hash.clone(), row.log_index))
                .map(|t| TransferContext {
                    from: t.from_address.clone(),
                    to: t.to_address.clone(),
                    amount: t.amount,
                });
            HistoricalBalance {
                tx_hash: row.tx_hash,
                log_index: row.log_index,
                dao_id: row.dao_id,
                account_id: row.account_id,
                balance: row.balance,
                delta: row.delta,
                timestamp: row.timestamp.to_utc(),
                transfer,
            }
        })
        .collect();

    info!(account = %account, items = items.len(), total = total_count, "Historical balances served");

    Ok(Json(HistoricalBalancesResponse { items, total_count }))
}

/// Net sign-encoded transfer amounts between the queried account and
/// each counterparty over the lookback window. Positive values are net
/// outflow from the queried account.
pub async fn account_interactions(
    State(state): State<AppState>,
    Query(params): Query<InteractionsQuery>,
) -> Result<Json<InteractionsResponse>, HandlerError> {
    let account = normalize_account(&params.account_id)?;
    let days = params.days.unwrap_or(30);
    if days <= 0 {
        return Err(bad_request("days must be positive".to_string()));
    }
    let cutoff = Utc::now() - Duration::days(days);

    let rows = Transfers::find()
        .filter(
            Condition::any()
                .add(transfers::Column::FromAddress.eq(&account))
                .add(transfers::Column::ToAddress.eq(&account)),
        )
        .filter(transfers::Column::Timestamp.gte(cutoff.fixed_offset()))
        .all(&state.db)
        .await
        .map_err(db_error)?;

    let mut net: HashMap<String, (Decimal, u64)> = HashMap::new();
    for row in rows {
        let (counterparty, signed_amount) = if row.from_address == account {
            (row.to_address.clone(), row.amount)
        } else {
            (row.from_address.clone(), -row.amount)
        };
        if counterparty == ZERO_ADDRESS || counterparty == account {
            continue;
        }
        let entry = net.entry(counterparty).or_insert((Decimal::ZERO, 0));
        entry.0 += signed_amount;
        entry.1 += 1;
    }

    let total_count = net.len() as u64;
    let mut items: Vec<AccountInteraction> = net
        .into_iter()
        .map(|(account, (net_amount, transfer_count))| AccountInteraction {
            account,
            net_amount,
            transfer_count,
        })
        .collect();

    match params.order_direction.unwrap_or(OrderDirection::Desc) {
        OrderDirection::Asc => items.sort_by(|a, b| a.net_amount.cmp(&b.net_amount)),
        OrderDirection::Desc => items.sort_by(|a, b| b.net_amount.cmp(&a.net_amount)),
    }

    let skip = params.skip.unwrap_or(0);
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE as usize);
    let items: Vec<AccountInteraction> = items.into_iter().skip(skip).take(limit).collect();

    Ok(Json(InteractionsResponse { items, total_count }))
}
