use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::common::OrderDirection;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotingPowerQuery {
    pub skip: Option<u64>,
    pub limit: Option<u64>,
    pub order_direction: Option<OrderDirection>,
    /// timestamp (default) or delta
    pub order_by: Option<String>,
    pub min_delta: Option<Decimal>,
    pub max_delta: Option<Decimal>,
    /// Comma-separated address lists; filter by the counterparties of the
    /// originating transfer or delegation
    pub from_addresses: Option<String>,
    pub to_addresses: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotingPowerEntry {
    pub tx_hash: String,
    pub log_index: i32,
    pub dao_id: String,
    pub account_id: String,
    pub voting_power: Decimal,
    pub delta: Decimal,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotingPowersResponse {
    pub items: Vec<VotingPowerEntry>,
    pub total_count: u64,
}
