use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::common::OrderDirection;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalBalanceQuery {
    pub skip: Option<u64>,
    pub limit: Option<u64>,
    pub order_direction: Option<OrderDirection>,
    /// timestamp (default) or delta
    pub order_by: Option<String>,
    pub from_value: Option<Decimal>,
    pub to_value: Option<Decimal>,
    /// YYYY-MM-DD
    pub from_date: Option<String>,
    pub to_date: Option<String>,
}

/// Transfer context joined back onto a balance row via (txHash, logIndex)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferContext {
    pub from: String,
    pub to: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalBalance {
    pub tx_hash: String,
    pub log_index: i32,
    pub dao_id: String,
    pub account_id: String,
    pub balance: Decimal,
    pub delta: Decimal,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer: Option<TransferContext>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalBalancesResponse {
    pub items: Vec<HistoricalBalance>,
    pub total_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionsQuery {
    pub account_id: String,
    /// Lookback window in days (default 30)
    pub days: Option<i64>,
    pub limit: Option<usize>,
    pub skip: Option<usize>,
    pub order_direction: Option<OrderDirection>,
}

/// Net transfer amount between the queried account and one counterparty.
/// Positive = net outflow from the queried account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInteraction {
    pub account: String,
    pub net_amount: Decimal,
    pub transfer_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionsResponse {
    pub items: Vec<AccountInteraction>,
    pub total_count: u64,
}
