mod common;

use axum::http::StatusCode;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use govlens_backend::models::common::PageInfo;
use govlens_backend::models::delegation::{
    DelegationPercentagePoint, DelegationPercentageQuery, DelegationPercentageResponse,
};
use govlens_backend::services::cross_dao::{CrossDaoAggregationService, DaoBackend};

use crate::common::{UpstreamBehavior, spawn_upstream};

fn day(n: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 5, n).unwrap()
}

fn point(n: u32, value: Decimal) -> DelegationPercentagePoint {
    DelegationPercentagePoint {
        date: day(n),
        value,
    }
}

fn series(points: Vec<DelegationPercentagePoint>, has_next: bool) -> DelegationPercentageResponse {
    DelegationPercentageResponse {
        items: points,
        page_info: PageInfo {
            has_next_page: has_next,
            ..Default::default()
        },
    }
}

fn backend(dao_id: &str, base_url: &str) -> DaoBackend {
    DaoBackend {
        dao_id: dao_id.to_string(),
        base_url: base_url.to_string(),
    }
}

/// Two DAOs with different coverage: the mean for each day runs over the
/// DAOs that have that day, never over the whole registry.
#[tokio::test]
async fn test_aggregate_mean_aligns_by_date() {
    let dao_a = spawn_upstream(UpstreamBehavior::Ok(series(
        vec![point(1, dec!(10)), point(2, dec!(20))],
        false,
    )))
    .await;
    let dao_b =
        spawn_upstream(UpstreamBehavior::Ok(series(vec![point(1, dec!(30))], false))).await;

    let service = CrossDaoAggregationService::over_http(vec![
        backend("dao-a", &dao_a.base_url),
        backend("dao-b", &dao_b.base_url),
    ]);

    let result = service
        .delegated_percentage(&DelegationPercentageQuery::default())
        .await
        .unwrap();

    assert_eq!(result.items, vec![point(1, dec!(20)), point(2, dec!(20))]);
    assert!(!result.page_info.has_next_page);
    assert_eq!(dao_a.hit_count(), 1);
    assert_eq!(dao_b.hit_count(), 1);
}

/// A DAO that always answers 500 is retried to exhaustion and then
/// excluded; the healthy DAO's data and pagination survive untouched.
#[tokio::test]
async fn test_partial_failure_is_isolated() {
    let healthy = spawn_upstream(UpstreamBehavior::Ok(series(
        vec![point(1, dec!(10)), point(2, dec!(12))],
        true,
    )))
    .await;
    let broken = spawn_upstream(UpstreamBehavior::Fail(StatusCode::INTERNAL_SERVER_ERROR)).await;

    let service = CrossDaoAggregationService::over_http(vec![
        backend("healthy", &healthy.base_url),
        backend("broken", &broken.base_url),
    ]);

    let result = service
        .delegated_percentage(&DelegationPercentageQuery::default())
        .await
        .unwrap();

    assert_eq!(result.items, vec![point(1, dec!(10)), point(2, dec!(12))]);
    // pagination is driven by the surviving source
    assert!(result.page_info.has_next_page);
    // first attempt plus two retries
    assert_eq!(broken.hit_count(), 3);
}

/// Transient failures are absorbed by the retry budget
#[tokio::test]
async fn test_transient_failure_recovers_within_retry_budget() {
    let flaky = spawn_upstream(UpstreamBehavior::FailFirst(
        2,
        series(vec![point(3, dec!(50))], false),
    ))
    .await;

    let service =
        CrossDaoAggregationService::over_http(vec![backend("flaky", &flaky.base_url)]);

    let result = service
        .delegated_percentage(&DelegationPercentageQuery::default())
        .await
        .unwrap();

    assert_eq!(result.items, vec![point(3, dec!(50))]);
    assert_eq!(flaky.hit_count(), 3);
}

/// startDate == endDate is a valid single-day window; an inverted range
/// is rejected before any upstream call is made.
#[tokio::test]
async fn test_validation_boundary() {
    let upstream = spawn_upstream(UpstreamBehavior::Ok(series(
        vec![point(3, dec!(50))],
        false,
    )))
    .await;
    let service =
        CrossDaoAggregationService::over_http(vec![backend("dao-a", &upstream.base_url)]);

    let equal_bounds = DelegationPercentageQuery {
        start_date: Some("2026-05-03".to_string()),
        end_date: Some("2026-05-03".to_string()),
        ..Default::default()
    };
    assert!(service.delegated_percentage(&equal_bounds).await.is_ok());
    assert_eq!(upstream.hit_count(), 1);

    let inverted = DelegationPercentageQuery {
        start_date: Some("2026-05-04".to_string()),
        end_date: Some("2026-05-03".to_string()),
        ..Default::default()
    };
    assert!(service.delegated_percentage(&inverted).await.is_err());
    // rejected before fan-out: no further upstream hits
    assert_eq!(upstream.hit_count(), 1);
}

/// Zero registered DAOs is an empty aggregate, not an error
#[tokio::test]
async fn test_empty_registry() {
    let service = CrossDaoAggregationService::over_http(vec![]);
    let result = service
        .delegated_percentage(&DelegationPercentageQuery::default())
        .await
        .unwrap();

    assert!(result.items.is_empty());
    assert!(!result.page_info.has_next_page);
}

/// All DAOs failing degrades to an empty aggregate, not an error
#[tokio::test]
async fn test_total_failure_degrades_to_empty() {
    let broken_a = spawn_upstream(UpstreamBehavior::Fail(StatusCode::BAD_GATEWAY)).await;
    let broken_b = spawn_upstream(UpstreamBehavior::Fail(StatusCode::SERVICE_UNAVAILABLE)).await;

    let service = CrossDaoAggregationService::over_http(vec![
        backend("a", &broken_a.base_url),
        backend("b", &broken_b.base_url),
    ]);

    let result = service
        .delegated_percentage(&DelegationPercentageQuery::default())
        .await
        .unwrap();

    assert!(result.items.is_empty());
    assert!(!result.page_info.has_next_page);
}
