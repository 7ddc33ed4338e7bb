//! Per-DAO delegation percentage series
//!
//! GET /delegation-percentage (also served on the fan-out path
//! /delegation-percentage-by-day). Ratio of delegated supply to total
//! supply per day, forward-filled across days without ledger activity,
//! cursor-paginated by day key.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Order};
use std::collections::BTreeMap;
use tracing::info;

use crate::entities::{dao_metrics_day_bucket, prelude::*};
use crate::models::common::{
    ErrorResponse, OrderDirection, PageInfo, cursor_from_date, date_from_cursor,
    parse_date_param,
};
use crate::models::day_bucket::MetricType;
use crate::models::delegation::{
    DelegationPercentagePoint, DelegationPercentageQuery, DelegationPercentageResponse,
};
use crate::services::day_bucket::forward_fill;
use crate::AppState;

const DEFAULT_LIMIT: usize = 365;

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

/// Query accepted by the per-DAO series endpoint: the common series
/// parameters plus DAO selection for multi-DAO deployments. A
/// deployment tracking exactly one DAO may omit daoId.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerDaoQuery {
    pub dao_id: Option<String>,
    pub after: Option<String>,
    pub before: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub order_direction: Option<OrderDirection>,
    pub limit: Option<usize>,
}

impl PerDaoQuery {
    fn series(&self) -> DelegationPercentageQuery {
        DelegationPercentageQuery {
            after: self.after.clone(),
            before: self.before.clone(),
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            order_direction: self.order_direction,
            limit: self.limit,
        }
    }
}

pub async fn delegation_percentage(
    State(state): State<AppState>,
    Query(params): Query<PerDaoQuery>,
) -> Result<Json<DelegationPercentageResponse>, HandlerError> {
    let query = params.series();
    let dao_id = match params.dao_id {
        Some(dao_id) => dao_id,
        None => {
            let mut ids = state.ingest.dao_ids();
            if ids.len() == 1 {
                ids.remove(0)
            } else {
                return Err(bad_request(
                    "daoId is required when more than one DAO is tracked".to_string(),
                ));
            }
        }
    };
    let start_date = query
        .start_date
        .as_deref()
        .map(|v| parse_date_param(v, "startDate").map_err(bad_request))
        .transpose()?;
    let end_date = query
        .end_date
        .as_deref()
        .map(|v| parse_date_param(v, "endDate").map_err(bad_request))
        .transpose()?;
    if let (Some(start), Some(end)) = (start_date, end_date) {
        if start > end {
            return Err(bad_request(
                "startDate must not be after endDate".to_string(),
            ));
        }
    }
    let after = query
        .after
        .as_deref()
        .map(|c| date_from_cursor(c).map_err(bad_request))
        .transpose()?;
    let before = query
        .before
        .as_deref()
        .map(|c| date_from_cursor(c).map_err(bad_request))
        .transpose()?;

    let today = Utc::now().date_naive();

    let delegated = load_close_series(&state, &dao_id, MetricType::DelegatedSupply).await?;
    let total = load_close_series(&state, &dao_id, MetricType::TotalSupply).await?;

    // Densify both series over their full history up to today, then cut
    // the requested window out of the dense ratio series. Filling before
    // cutting keeps a window that starts inside a gap seeded with the
    // most recent pre-window value.
    let delegated = forward_fill(&delegated, None, today, None);
    let total = forward_fill(&total, None, today, None);

    let mut ratio: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    for (day, delegated_value) in &delegated {
        let Some(total_value) = total.get(day) else {
            continue;
        };
        if total_value.is_zero() {
            continue;
        }
        ratio.insert(*day, delegated_value / total_value);
    }

    // Window bounds: explicit dates intersected with the cursors, which
    // are exclusive on their side
    let mut days: Vec<(NaiveDate, Decimal)> = ratio
        .into_iter()
        .filter(|(day, _)| {
            start_date.is_none_or(|start| *day >= start)
                && end_date.is_none_or(|end| *day <= end)
                && after.is_none_or(|after| *day > after)
                && before.is_none_or(|before| *day < before)
        })
        .collect();

    let direction = query.order_direction.unwrap_or_default();
    if direction == OrderDirection::Desc {
        days.reverse();
    }

    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    let has_next_page = days.len() > limit;
    let has_previous_page = query.after.is_some() || query.before.is_some();
    days.truncate(limit);

    let items: Vec<DelegationPercentagePoint> = days
        .into_iter()
        .map(|(date, value)| DelegationPercentagePoint { date, value })
        .collect();

    let page_info = PageInfo {
        has_next_page,
        has_previous_page,
        start_cursor: items.first().map(|p| cursor_from_date(p.date)),
        end_cursor: items.last().map(|p| cursor_from_date(p.date)),
    };

    info!(dao_id = %dao_id, points = items.len(), "Delegation percentage series served");

    Ok(Json(DelegationPercentageResponse { items, page_info }))
}

/// Close values of one metric's buckets as a sparse day series
async fn load_close_series(
    state: &AppState,
    dao_id: &str,
    metric: MetricType,
) -> Result<BTreeMap<NaiveDate, Decimal>, HandlerError> {
    let rows = DaoMetricsDayBucket::find()
        .filter(dao_metrics_day_bucket::Column::DaoId.eq(dao_id))
        .filter(dao_metrics_day_bucket::Column::MetricType.eq(metric.as_str()))
        .order_by(dao_metrics_day_bucket::Column::Date, Order::Asc)
        .all(&state.db)
        .await
        .map_err(db_error)?;

    Ok(rows.into_iter().map(|row| (row.date, row.close)).collect())
}
