use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::common::OrderDirection;

/// Proposal lifecycle state.
///
/// EXECUTED, CANCELED and DEFEATED are terminal; QUEUED sits between
/// SUCCEEDED and EXECUTED for timelocked governors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProposalStatus {
    Pending,
    Active,
    Defeated,
    Succeeded,
    Queued,
    Executed,
    Canceled,
}

impl ProposalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProposalStatus::Pending => "PENDING",
            ProposalStatus::Active => "ACTIVE",
            ProposalStatus::Defeated => "DEFEATED",
            ProposalStatus::Succeeded => "SUCCEEDED",
            ProposalStatus::Queued => "QUEUED",
            ProposalStatus::Executed => "EXECUTED",
            ProposalStatus::Canceled => "CANCELED",
        }
    }

    pub fn from_str_opt(value: &str) -> Option<Self> {
        match value {
            "PENDING" => Some(ProposalStatus::Pending),
            "ACTIVE" => Some(ProposalStatus::Active),
            "DEFEATED" => Some(ProposalStatus::Defeated),
            "SUCCEEDED" => Some(ProposalStatus::Succeeded),
            "QUEUED" => Some(ProposalStatus::Queued),
            "EXECUTED" => Some(ProposalStatus::Executed),
            "CANCELED" => Some(ProposalStatus::Canceled),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ProposalStatus::Executed | ProposalStatus::Canceled | ProposalStatus::Defeated
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalListQuery {
    pub dao_id: Option<String>,
    pub status: Option<String>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
    pub order_direction: Option<OrderDirection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalSummary {
    pub proposal_id: String,
    pub dao_id: String,
    pub proposer_account_id: String,
    pub status: String,
    pub start_block: i64,
    pub end_block: i64,
    pub timestamp: DateTime<Utc>,
    pub for_votes: Decimal,
    pub against_votes: Decimal,
    pub abstain_votes: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalsResponse {
    pub items: Vec<ProposalSummary>,
    pub total_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalDetail {
    pub proposal_id: String,
    pub dao_id: String,
    pub proposer_account_id: String,
    pub targets: serde_json::Value,
    pub values: serde_json::Value,
    pub calldatas: serde_json::Value,
    pub start_block: i64,
    pub end_block: i64,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub status: String,
    pub for_votes: Decimal,
    pub against_votes: Decimal,
    pub abstain_votes: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteEntry {
    pub voter: String,
    pub proposal_id: String,
    pub support: i16,
    pub voting_power: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotesResponse {
    pub items: Vec<VoteEntry>,
    pub total_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            ProposalStatus::Pending,
            ProposalStatus::Active,
            ProposalStatus::Defeated,
            ProposalStatus::Succeeded,
            ProposalStatus::Queued,
            ProposalStatus::Executed,
            ProposalStatus::Canceled,
        ] {
            assert_eq!(ProposalStatus::from_str_opt(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(ProposalStatus::Executed.is_terminal());
        assert!(ProposalStatus::Canceled.is_terminal());
        assert!(ProposalStatus::Defeated.is_terminal());
        assert!(!ProposalStatus::Queued.is_terminal());
        assert!(!ProposalStatus::Active.is_terminal());
    }
}
