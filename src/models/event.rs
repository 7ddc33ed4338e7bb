//! Raw chain event envelope and the canonical event set
//!
//! The subscription collaborator delivers `RawChainEvent`s exactly once in
//! increasing (blockNumber, logIndex) order. The normalizer maps them into
//! `CanonicalEvent`s; everything downstream of the normalizer only ever
//! sees canonical shapes.

use alloy::primitives::U256;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawChainEvent {
    /// Emitted event name, e.g. "Transfer" or "VoteCast"
    pub name: String,
    /// Decoded arguments per the contract ABI
    pub args: serde_json::Value,
    pub block: RawBlock,
    pub transaction: RawTransaction,
    pub log: RawLog,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBlock {
    pub number: i64,
    /// Unix seconds
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    pub hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLog {
    pub log_index: i32,
    pub address: String,
}

/// Event fields shared by every canonical shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventMeta {
    pub tx_hash: String,
    pub log_index: i32,
    pub timestamp: DateTime<Utc>,
    pub block_number: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalEvent {
    TokenTransfer(TokenTransfer),
    DelegateChanged(DelegateChanged),
    DelegateVotesChanged(DelegateVotesChanged),
    VoteCast(VoteCast),
    ProposalCreated(ProposalCreated),
    ProposalStatusChanged(ProposalStatusChanged),
}

impl CanonicalEvent {
    pub fn meta(&self) -> &EventMeta {
        match self {
            CanonicalEvent::TokenTransfer(e) => &e.meta,
            CanonicalEvent::DelegateChanged(e) => &e.meta,
            CanonicalEvent::DelegateVotesChanged(e) => &e.meta,
            CanonicalEvent::VoteCast(e) => &e.meta,
            CanonicalEvent::ProposalCreated(e) => &e.meta,
            CanonicalEvent::ProposalStatusChanged(e) => &e.meta,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenTransfer {
    pub meta: EventMeta,
    pub dao_id: String,
    pub token_id: String,
    /// Lowercased; zero address for mints
    pub from: String,
    /// Lowercased; zero address for burns
    pub to: String,
    pub amount: U256,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DelegateChanged {
    pub meta: EventMeta,
    pub dao_id: String,
    pub delegator: String,
    pub from_delegate: String,
    pub to_delegate: String,
    pub delegated_value: U256,
}

/// Voting power movement between delegates.
///
/// On-chain governors emit one single-sided event per affected delegate;
/// the normalizer maps those to a zero address on the unchanged side. A
/// two-sided event moves `amount` from `old_delegate` to `new_delegate`.
#[derive(Debug, Clone, PartialEq)]
pub struct DelegateVotesChanged {
    pub meta: EventMeta,
    pub dao_id: String,
    pub old_delegate: String,
    pub new_delegate: String,
    pub amount: U256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteSupport {
    Against,
    For,
    Abstain,
}

impl VoteSupport {
    pub fn as_i16(self) -> i16 {
        match self {
            VoteSupport::Against => 0,
            VoteSupport::For => 1,
            VoteSupport::Abstain => 2,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(VoteSupport::Against),
            1 => Some(VoteSupport::For),
            2 => Some(VoteSupport::Abstain),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VoteCast {
    pub meta: EventMeta,
    pub dao_id: String,
    pub voter: String,
    pub proposal_id: String,
    pub support: VoteSupport,
    pub voting_power: U256,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProposalCreated {
    pub meta: EventMeta,
    pub dao_id: String,
    pub proposal_id: String,
    pub proposer: String,
    pub targets: Vec<String>,
    pub values: Vec<U256>,
    pub calldatas: Vec<String>,
    pub start_block: i64,
    pub end_block: i64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProposalStatusChanged {
    pub meta: EventMeta,
    pub dao_id: String,
    pub proposal_id: String,
    pub status: LifecycleStatus,
    /// New end block for deadline extensions, absent otherwise
    pub extended_end_block: Option<i64>,
}

/// Status carried by a lifecycle event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleStatus {
    Queued,
    Executed,
    Canceled,
    Defeated,
    Succeeded,
    /// ACTIVE → ACTIVE with an extended end block
    Extended,
}
