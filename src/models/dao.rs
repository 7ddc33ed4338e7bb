use serde::{Deserialize, Serialize};

/// One tracked DAO and its registered governance token
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaoSummary {
    pub dao_id: String,
    pub token_id: String,
    pub token_symbol: String,
    pub token_decimals: u8,
    pub family: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaosResponse {
    pub items: Vec<DaoSummary>,
    pub total_count: u64,
}

/// Derived governance parameters for one DAO. Big integers travel as
/// decimal strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaoParamsResponse {
    pub dao_id: String,
    pub family: String,
    pub quorum: String,
    pub voting_delay: u64,
    pub voting_period: u64,
    pub proposal_threshold: String,
    pub timelock_delay: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebuildBucketsResponse {
    pub dao_id: String,
    pub buckets_written: usize,
    pub buckets_deleted: u64,
}
