//! Cross-DAO aggregation
//!
//! Fans out the delegation-percentage query to every registered per-DAO
//! backend, retries transient failures with exponential backoff, aligns
//! the returned series by date key and averages across the DAOs that
//! have a value for each day. Owns no persisted state: every call
//! recomputes from live upstream responses.

use async_trait::async_trait;
use chrono::NaiveDate;
use futures_util::future::join_all;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::models::common::{OrderDirection, PageInfo, cursor_from_date, parse_date_param};
use crate::models::delegation::{
    DelegationPercentagePoint, DelegationPercentageQuery, DelegationPercentageResponse,
};

/// Path each per-DAO backend serves its day series on
pub const UPSTREAM_PATH: &str = "/delegation-percentage-by-day";

/// Extra attempts after the first failure
const RETRY_ATTEMPTS: u32 = 2;
/// First backoff wait; doubles per attempt
const RETRY_BASE_DELAY: Duration = Duration::from_millis(200);
/// Per-request timeout towards one upstream
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

const DEFAULT_LIMIT: usize = 365;

#[derive(Debug, Clone)]
pub struct DaoBackend {
    pub dao_id: String,
    pub base_url: String,
}

/// Parse the backend registry env string: `daoId=baseUrl,...`
pub fn parse_backend_registry(raw: &str) -> Result<Vec<DaoBackend>, String> {
    let mut backends = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (dao_id, base_url) = part.split_once('=').ok_or_else(|| {
            format!("Invalid backend registry entry '{}'. Expected daoId=baseUrl", part)
        })?;
        backends.push(DaoBackend {
            dao_id: dao_id.trim().to_string(),
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        });
    }
    Ok(backends)
}

#[derive(Debug)]
pub enum SourceError {
    Http(String),
    Status(u16),
    Decode(String),
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::Http(msg) => write!(f, "HTTP error: {}", msg),
            SourceError::Status(code) => write!(f, "Upstream returned status {}", code),
            SourceError::Decode(msg) => write!(f, "Failed to decode upstream body: {}", msg),
        }
    }
}

impl std::error::Error for SourceError {}

/// Seam between the aggregation logic and the outbound HTTP call
#[async_trait]
pub trait SeriesSource: Send + Sync {
    async fn fetch(
        &self,
        base_url: &str,
        query: &DelegationPercentageQuery,
    ) -> Result<DelegationPercentageResponse, SourceError>;
}

pub struct HttpSeriesSource {
    client: reqwest::Client,
}

impl HttpSeriesSource {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(UPSTREAM_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }
}

impl Default for HttpSeriesSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SeriesSource for HttpSeriesSource {
    async fn fetch(
        &self,
        base_url: &str,
        query: &DelegationPercentageQuery,
    ) -> Result<DelegationPercentageResponse, SourceError> {
        let url = format!("{}{}", base_url, UPSTREAM_PATH);

        // Forward the caller's parameters verbatim
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(after) = &query.after {
            params.push(("after", after.clone()));
        }
        if let Some(before) = &query.before {
            params.push(("before", before.clone()));
        }
        if let Some(start_date) = &query.start_date {
            params.push(("startDate", start_date.clone()));
        }
        if let Some(end_date) = &query.end_date {
            params.push(("endDate", end_date.clone()));
        }
        if let Some(direction) = query.order_direction {
            let value = match direction {
                OrderDirection::Asc => "asc",
                OrderDirection::Desc => "desc",
            };
            params.push(("orderDirection", value.to_string()));
        }
        if let Some(limit) = query.limit {
            params.push(("limit", limit.to_string()));
        }

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| SourceError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SourceError::Status(response.status().as_u16()));
        }

        response
            .json::<DelegationPercentageResponse>()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))
    }
}

#[derive(Debug)]
pub enum AggregationError {
    Validation(String),
}

impl std::fmt::Display for AggregationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregationError::Validation(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for AggregationError {}

pub struct CrossDaoAggregationService {
    backends: Vec<DaoBackend>,
    source: Arc<dyn SeriesSource>,
}

impl CrossDaoAggregationService {
    pub fn new(backends: Vec<DaoBackend>, source: Arc<dyn SeriesSource>) -> Self {
        Self { backends, source }
    }

    pub fn over_http(backends: Vec<DaoBackend>) -> Self {
        Self::new(backends, Arc::new(HttpSeriesSource::new()))
    }

    pub fn backend_count(&self) -> usize {
        self.backends.len()
    }

    /// Cross-DAO mean delegation percentage per day.
    ///
    /// Validation runs before any outbound call. Each backend gets its
    /// own bounded retry loop; a DAO that exhausts its retries is
    /// excluded from the aggregate rather than failing it. An aggregate
    /// over nothing is empty, not an error.
    pub async fn delegated_percentage(
        &self,
        query: &DelegationPercentageQuery,
    ) -> Result<DelegationPercentageResponse, AggregationError> {
        validate_date_range(query)?;

        if self.backends.is_empty() {
            return Ok(DelegationPercentageResponse::default());
        }

        let fetches = self.backends.iter().map(|backend| {
            let source = Arc::clone(&self.source);
            async move {
                let outcome = fetch_with_retry(source.as_ref(), backend, query).await;
                (backend.dao_id.clone(), outcome)
            }
        });

        let mut series: Vec<(String, DelegationPercentageResponse)> = Vec::new();
        for (dao_id, outcome) in join_all(fetches).await {
            match outcome {
                Ok(response) => {
                    debug!(dao_id = %dao_id, points = response.items.len(), "Upstream series fetched");
                    series.push((dao_id, response));
                }
                Err(e) => {
                    warn!(dao_id = %dao_id, error = %e, "Excluding DAO from aggregate");
                }
            }
        }

        let direction = query.order_direction.unwrap_or_default();
        let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
        Ok(align_and_average(&series, direction, limit))
    }
}

async fn fetch_with_retry(
    source: &dyn SeriesSource,
    backend: &DaoBackend,
    query: &DelegationPercentageQuery,
) -> Result<DelegationPercentageResponse, SourceError> {
    let mut delay = RETRY_BASE_DELAY;
    let mut attempt = 0;
    loop {
        match source.fetch(&backend.base_url, query).await {
            Ok(response) => return Ok(response),
            Err(e) if attempt < RETRY_ATTEMPTS => {
                warn!(
                    dao_id = %backend.dao_id,
                    attempt = attempt + 1,
                    error = %e,
                    "Upstream fetch failed, retrying"
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Union the date keys of all successful series, average across the DAOs
/// that have a value per day, and pass pagination through: the aggregate
/// has a next page while any source still does.
fn align_and_average(
    series: &[(String, DelegationPercentageResponse)],
    direction: OrderDirection,
    limit: usize,
) -> DelegationPercentageResponse {
    let mut by_date: BTreeMap<NaiveDate, Vec<Decimal>> = BTreeMap::new();
    let mut has_next_page = false;
    let mut has_previous_page = false;

    for (_, response) in series {
        has_next_page |= response.page_info.has_next_page;
        has_previous_page |= response.page_info.has_previous_page;
        for point in &response.items {
            by_date.entry(point.date).or_default().push(point.value);
        }
    }

    let mut items: Vec<DelegationPercentagePoint> = by_date
        .into_iter()
        .map(|(date, values)| {
            let sum: Decimal = values.iter().copied().sum();
            DelegationPercentagePoint {
                date,
                value: sum / Decimal::from(values.len()),
            }
        })
        .collect();

    if direction == OrderDirection::Desc {
        items.reverse();
    }
    items.truncate(limit);

    let page_info = PageInfo {
        has_next_page,
        has_previous_page,
        start_cursor: items.first().map(|p| cursor_from_date(p.date)),
        end_cursor: items.last().map(|p| cursor_from_date(p.date)),
    };

    DelegationPercentageResponse { items, page_info }
}

/// Reject an inverted date range before any fan-out happens. Equal
/// bounds are a valid single-day window.
fn validate_date_range(query: &DelegationPercentageQuery) -> Result<(), AggregationError> {
    let start = query
        .start_date
        .as_deref()
        .map(|s| parse_date_param(s, "startDate"))
        .transpose()
        .map_err(AggregationError::Validation)?;
    let end = query
        .end_date
        .as_deref()
        .map(|s| parse_date_param(s, "endDate"))
        .transpose()
        .map_err(AggregationError::Validation)?;

    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(AggregationError::Validation(
                "startDate must not be after endDate".to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use rust_decimal_macros::dec;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, n).unwrap()
    }

    fn point(n: u32, value: Decimal) -> DelegationPercentagePoint {
        DelegationPercentagePoint {
            date: day(n),
            value,
        }
    }

    fn response(points: Vec<DelegationPercentagePoint>, has_next: bool) -> DelegationPercentageResponse {
        DelegationPercentageResponse {
            items: points,
            page_info: PageInfo {
                has_next_page: has_next,
                ..Default::default()
            },
        }
    }

    /// Source that serves canned responses per base URL and counts calls
    struct FakeSource {
        responses: Mutex<std::collections::HashMap<String, Result<DelegationPercentageResponse, u16>>>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeSource {
        fn new() -> Self {
            Self {
                responses: Mutex::new(std::collections::HashMap::new()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn set(&self, base_url: &str, outcome: Result<DelegationPercentageResponse, u16>) {
            self.responses.lock().insert(base_url.to_string(), outcome);
        }

        fn call_count(&self) -> usize {
            self.calls.lock().len()
        }
    }

    #[async_trait]
    impl SeriesSource for FakeSource {
        async fn fetch(
            &self,
            base_url: &str,
            _query: &DelegationPercentageQuery,
        ) -> Result<DelegationPercentageResponse, SourceError> {
            self.calls.lock().push(base_url.to_string());
            match self.responses.lock().get(base_url) {
                Some(Ok(response)) => Ok(response.clone()),
                Some(Err(status)) => Err(SourceError::Status(*status)),
                None => Err(SourceError::Http("unregistered".to_string())),
            }
        }
    }

    fn backends(ids: &[&str]) -> Vec<DaoBackend> {
        ids.iter()
            .map(|id| DaoBackend {
                dao_id: id.to_string(),
                base_url: format!("http://{}", id),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_mean_over_daos_with_data_per_day() {
        let source = Arc::new(FakeSource::new());
        source.set(
            "http://a",
            Ok(response(vec![point(1, dec!(10)), point(2, dec!(20))], false)),
        );
        source.set("http://b", Ok(response(vec![point(1, dec!(30))], false)));

        let service =
            CrossDaoAggregationService::new(backends(&["a", "b"]), source.clone());
        let result = service
            .delegated_percentage(&DelegationPercentageQuery::default())
            .await
            .unwrap();

        // day 1 averages both DAOs; day 2 only the DAO that has it
        assert_eq!(result.items, vec![point(1, dec!(20)), point(2, dec!(20))]);
        assert!(!result.page_info.has_next_page);
    }

    #[tokio::test]
    async fn test_failed_dao_is_excluded_not_fatal() {
        let source = Arc::new(FakeSource::new());
        source.set(
            "http://a",
            Ok(response(vec![point(1, dec!(10))], true)),
        );
        source.set("http://b", Err(500));

        let service =
            CrossDaoAggregationService::new(backends(&["a", "b"]), source.clone());
        let result = service
            .delegated_percentage(&DelegationPercentageQuery::default())
            .await
            .unwrap();

        assert_eq!(result.items, vec![point(1, dec!(10))]);
        // pagination reflects the surviving DAO only
        assert!(result.page_info.has_next_page);
        // the failing DAO was retried to exhaustion: 1 + 2 retries,
        // plus one call for the healthy DAO
        assert_eq!(source.call_count(), 4);
    }

    #[tokio::test]
    async fn test_empty_registry_yields_empty_result() {
        let source = Arc::new(FakeSource::new());
        let service = CrossDaoAggregationService::new(vec![], source.clone());
        let result = service
            .delegated_percentage(&DelegationPercentageQuery::default())
            .await
            .unwrap();

        assert!(result.items.is_empty());
        assert!(!result.page_info.has_next_page);
        assert_eq!(source.call_count(), 0);
    }

    #[tokio::test]
    async fn test_inverted_range_rejected_before_fanout() {
        let source = Arc::new(FakeSource::new());
        let service = CrossDaoAggregationService::new(backends(&["a"]), source.clone());

        let query = DelegationPercentageQuery {
            start_date: Some("2026-04-05".to_string()),
            end_date: Some("2026-04-01".to_string()),
            ..Default::default()
        };
        assert!(service.delegated_percentage(&query).await.is_err());
        assert_eq!(source.call_count(), 0);
    }

    #[tokio::test]
    async fn test_equal_bounds_are_a_valid_window() {
        let source = Arc::new(FakeSource::new());
        source.set("http://a", Ok(response(vec![point(3, dec!(5))], false)));
        let service = CrossDaoAggregationService::new(backends(&["a"]), source);

        let query = DelegationPercentageQuery {
            start_date: Some("2026-04-03".to_string()),
            end_date: Some("2026-04-03".to_string()),
            ..Default::default()
        };
        let result = service.delegated_percentage(&query).await.unwrap();
        assert_eq!(result.items.len(), 1);
    }

    #[tokio::test]
    async fn test_descending_order_and_limit() {
        let source = Arc::new(FakeSource::new());
        source.set(
            "http://a",
            Ok(response(
                vec![point(1, dec!(1)), point(2, dec!(2)), point(3, dec!(3))],
                false,
            )),
        );
        let service = CrossDaoAggregationService::new(backends(&["a"]), source);

        let query = DelegationPercentageQuery {
            order_direction: Some(OrderDirection::Desc),
            limit: Some(2),
            ..Default::default()
        };
        let result = service.delegated_percentage(&query).await.unwrap();
        assert_eq!(result.items, vec![point(3, dec!(3)), point(2, dec!(2))]);
    }

    #[test]
    fn test_parse_backend_registry() {
        let backends =
            parse_backend_registry("uniswap=http://u.internal/, ens=http://e.internal").unwrap();
        assert_eq!(backends.len(), 2);
        assert_eq!(backends[0].base_url, "http://u.internal");
        assert!(parse_backend_registry("missing-equals").is_err());
    }
}
