//! Derived day-bucket read endpoint
//!
//! GET /dao-metrics-day-buckets

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use sea_orm::{ColumnTrait, EntityTrait, Order, QueryFilter, QueryOrder};

use crate::entities::{dao_metrics_day_bucket, prelude::*};
use crate::models::common::{ErrorResponse, parse_date_param};
use crate::models::day_bucket::{DayBucketEntry, DayBucketQuery, DayBucketsResponse, MetricType};
use crate::AppState;

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn bad_request(message: String) -> HandlerError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: message }))
}

pub async fn day_buckets(
    State(state): State<AppState>,
    Query(params): Query<DayBucketQuery>,
) -> Result<Json<DayBucketsResponse>, HandlerError> {
    let metric = MetricType::from_str_opt(&params.metric_type)
        .ok_or_else(|| bad_request(format!("Invalid metricType '{}'", params.metric_type)))?;

    let mut query = DaoMetricsDayBucket::find()
        .filter(dao_metrics_day_bucket::Column::DaoId.eq(&params.dao_id))
        .filter(dao_metrics_day_bucket::Column::MetricType.eq(metric.as_str()));
    if let Some(from) = &params.from_date {
        let from = parse_date_param(from, "fromDate").map_err(bad_request)?;
        query = query.filter(dao_metrics_day_bucket::Column::Date.gte(from));
    }
    if let Some(to) = &params.to_date {
        let to = parse_date_param(to, "toDate").map_err(bad_request)?;
        query = query.filter(dao_metrics_day_bucket::Column::Date.lte(to));
    }

    let rows = query
        .order_by(dao_metrics_day_bucket::Column::Date, Order::Asc)
        .all(&state.db)
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Database error: {}", e),
                }),
            )
        })?;

    let total_count = rows.len() as u64;
    let items = rows
        .into_iter()
        .map(|row| DayBucketEntry {
            date: row.date,
            dao_id: row.dao_id,
            token_id: row.token_id,
            metric_type: row.metric_type,
            open: row.open,
            close: row.close,
            low: row.low,
            high: row.high,
            average: row.average,
            volume: row.volume,
            count: row.count,
        })
        .collect();

    Ok(Json(DayBucketsResponse { items, total_count }))
}
