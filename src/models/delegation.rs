use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::common::{OrderDirection, PageInfo};

/// Query accepted by both the per-DAO series endpoint and the cross-DAO
/// aggregate endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegationPercentageQuery {
    /// Opaque cursor: return days strictly after this one
    pub after: Option<String>,
    /// Opaque cursor: return days strictly before this one
    pub before: Option<String>,
    /// YYYY-MM-DD, inclusive
    pub start_date: Option<String>,
    /// YYYY-MM-DD, inclusive
    pub end_date: Option<String>,
    pub order_direction: Option<OrderDirection>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegationPercentagePoint {
    pub date: NaiveDate,
    /// Delegated supply over total supply, 0..=1
    pub value: Decimal,
}

/// Computed, non-persisted series view; also the wire shape the cross-DAO
/// aggregator consumes from each per-DAO backend
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegationPercentageResponse {
    pub items: Vec<DelegationPercentagePoint>,
    pub page_info: PageInfo,
}
