//! Event normalizer
//!
//! Translates the per-family shapes of governor/token contract events
//! into the canonical event set consumed by the ledgers. Pure mapping
//! layer: a malformed event is rejected whole, never partially mapped.

use alloy::primitives::{Address, U256};
use chrono::DateTime;
use serde_json::Value;
use std::str::FromStr;

use crate::models::event::{
    CanonicalEvent, DelegateChanged, DelegateVotesChanged, EventMeta, LifecycleStatus,
    ProposalCreated, ProposalStatusChanged, RawChainEvent, TokenTransfer, VoteCast, VoteSupport,
};
use crate::services::governor::{Governor, GovernorFamily};

pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

#[derive(Debug, PartialEq, Eq)]
pub enum NormalizeError {
    MissingField { event: String, field: String },
    InvalidField { event: String, field: String },
    UnsupportedEvent(String),
}

impl std::fmt::Display for NormalizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NormalizeError::MissingField { event, field } => {
                write!(f, "Event {} is missing field '{}'", event, field)
            }
            NormalizeError::InvalidField { event, field } => {
                write!(f, "Event {} has an invalid value for field '{}'", event, field)
            }
            NormalizeError::UnsupportedEvent(name) => {
                write!(f, "Unsupported event '{}'", name)
            }
        }
    }
}

impl std::error::Error for NormalizeError {}

pub struct EventNormalizer {
    dao_id: String,
    token_id: String,
    governor: Governor,
}

impl EventNormalizer {
    pub fn new(dao_id: String, token_id: String, governor: Governor) -> Self {
        Self {
            dao_id,
            token_id,
            governor,
        }
    }

    pub fn governor(&self) -> &Governor {
        &self.governor
    }

    pub fn normalize(&self, raw: &RawChainEvent) -> Result<CanonicalEvent, NormalizeError> {
        let meta = EventMeta {
            tx_hash: raw.transaction.hash.to_lowercase(),
            log_index: raw.log.log_index,
            timestamp: DateTime::from_timestamp(raw.block.timestamp, 0).ok_or_else(|| {
                NormalizeError::InvalidField {
                    event: raw.name.clone(),
                    field: "block.timestamp".to_string(),
                }
            })?,
            block_number: raw.block.number,
        };

        match raw.name.as_str() {
            "Transfer" => self.transfer(raw, meta),
            "DelegateChanged" => self.delegate_changed(raw, meta),
            "DelegateVotesChanged" => self.delegate_votes_changed(raw, meta),
            "VoteCast" | "VoteCastWithParams" => self.vote_cast(raw, meta),
            "ProposalCreated" => self.proposal_created(raw, meta),
            "ProposalQueued" => self.lifecycle(raw, meta, LifecycleStatus::Queued),
            "ProposalExecuted" => self.lifecycle(raw, meta, LifecycleStatus::Executed),
            "ProposalCanceled" => self.lifecycle(raw, meta, LifecycleStatus::Canceled),
            "ProposalDefeated" => self.lifecycle(raw, meta, LifecycleStatus::Defeated),
            "ProposalSucceeded" => self.lifecycle(raw, meta, LifecycleStatus::Succeeded),
            "ProposalExtended" => self.proposal_extended(raw, meta),
            other => Err(NormalizeError::UnsupportedEvent(other.to_string())),
        }
    }

    fn transfer(
        &self,
        raw: &RawChainEvent,
        meta: EventMeta,
    ) -> Result<CanonicalEvent, NormalizeError> {
        let from = address_field(raw, &["from", "sender"])?;
        let to = address_field(raw, &["to", "recipient"])?;
        let amount = u256_field(raw, &["value", "amount"])?;

        Ok(CanonicalEvent::TokenTransfer(TokenTransfer {
            meta,
            dao_id: self.dao_id.clone(),
            token_id: self.token_id.clone(),
            from,
            to,
            amount,
        }))
    }

    fn delegate_changed(
        &self,
        raw: &RawChainEvent,
        meta: EventMeta,
    ) -> Result<CanonicalEvent, NormalizeError> {
        let delegator = address_field(raw, &["delegator"])?;
        let from_delegate = address_field(raw, &["fromDelegate", "previousDelegate"])?;
        let to_delegate = address_field(raw, &["toDelegate", "newDelegate"])?;
        // Not emitted by every family; the delegator's weight at the time
        // of the change when present.
        let delegated_value = match field(raw, &["delegatedValue", "weight"]) {
            Some(_) => u256_field(raw, &["delegatedValue", "weight"])?,
            None => U256::ZERO,
        };

        Ok(CanonicalEvent::DelegateChanged(DelegateChanged {
            meta,
            dao_id: self.dao_id.clone(),
            delegator,
            from_delegate,
            to_delegate,
            delegated_value,
        }))
    }

    /// On-chain families emit one single-sided event per affected
    /// delegate: the side that did not change maps to the zero address.
    fn delegate_votes_changed(
        &self,
        raw: &RawChainEvent,
        meta: EventMeta,
    ) -> Result<CanonicalEvent, NormalizeError> {
        let delegate = address_field(raw, &["delegate"])?;
        let previous = match self.governor.family() {
            GovernorFamily::Nouns => u256_field(raw, &["previousBalance", "previousVotes"])?,
            _ => u256_field(raw, &["previousVotes", "previousBalance", "oldVotes"])?,
        };
        let new = match self.governor.family() {
            GovernorFamily::Nouns => u256_field(raw, &["newBalance", "newVotes"])?,
            _ => u256_field(raw, &["newVotes", "newBalance"])?,
        };

        let (old_delegate, new_delegate, amount) = if new >= previous {
            (ZERO_ADDRESS.to_string(), delegate, new - previous)
        } else {
            (delegate, ZERO_ADDRESS.to_string(), previous - new)
        };

        Ok(CanonicalEvent::DelegateVotesChanged(DelegateVotesChanged {
            meta,
            dao_id: self.dao_id.clone(),
            old_delegate,
            new_delegate,
            amount,
        }))
    }

    fn vote_cast(
        &self,
        raw: &RawChainEvent,
        meta: EventMeta,
    ) -> Result<CanonicalEvent, NormalizeError> {
        let voter = address_field(raw, &["voter"])?;
        let proposal_id = proposal_id_field(raw, &["proposalId", "id", "proposal"])?;
        let support = self.vote_support(raw)?;
        let voting_power = u256_field(raw, &["weight", "votes", "vp", "votingPower"])?;
        let reason = field(raw, &["reason"])
            .and_then(Value::as_str)
            .filter(|r| !r.is_empty())
            .map(str::to_string);

        Ok(CanonicalEvent::VoteCast(VoteCast {
            meta,
            dao_id: self.dao_id.clone(),
            voter,
            proposal_id,
            support,
            voting_power,
            reason,
        }))
    }

    fn vote_support(&self, raw: &RawChainEvent) -> Result<VoteSupport, NormalizeError> {
        let value = field(raw, &["support", "voteType", "choice"]).ok_or_else(|| {
            NormalizeError::MissingField {
                event: raw.name.clone(),
                field: "support".to_string(),
            }
        })?;
        let invalid = || NormalizeError::InvalidField {
            event: raw.name.clone(),
            field: "support".to_string(),
        };

        match self.governor.family() {
            // Boolean support: true is a vote for, false against
            GovernorFamily::Azorius => match value.as_bool() {
                Some(true) => Ok(VoteSupport::For),
                Some(false) => Ok(VoteSupport::Against),
                None => Err(invalid()),
            },
            // Named choices
            GovernorFamily::Offchain => match value.as_str() {
                Some(s) => match s.to_lowercase().as_str() {
                    "for" => Ok(VoteSupport::For),
                    "against" => Ok(VoteSupport::Against),
                    "abstain" => Ok(VoteSupport::Abstain),
                    _ => Err(invalid()),
                },
                None => Err(invalid()),
            },
            // Integer support per GovernorCountingSimple
            GovernorFamily::Standard | GovernorFamily::Nouns => value
                .as_u64()
                .and_then(|v| u8::try_from(v).ok())
                .and_then(VoteSupport::from_u8)
                .ok_or_else(invalid),
        }
    }

    fn proposal_created(
        &self,
        raw: &RawChainEvent,
        meta: EventMeta,
    ) -> Result<CanonicalEvent, NormalizeError> {
        let proposal_id = proposal_id_field(raw, &["proposalId", "id"])?;
        let proposer = address_field(raw, &["proposer"])?;
        let description = field(raw, &["description", "title"])
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let (start_block, end_block) = match self.governor.family() {
            GovernorFamily::Standard => (
                i64_field(raw, &["voteStart"])?,
                i64_field(raw, &["voteEnd"])?,
            ),
            GovernorFamily::Nouns | GovernorFamily::Azorius => (
                i64_field(raw, &["startBlock"])?,
                i64_field(raw, &["endBlock"])?,
            ),
            // Offchain voting windows are ISO-8601 timestamps; carry the
            // unix seconds in the block fields so downstream ordering
            // still works.
            GovernorFamily::Offchain => (
                iso_timestamp_field(raw, &["start"])?,
                iso_timestamp_field(raw, &["end"])?,
            ),
        };

        let targets = string_array_field(raw, "targets")?
            .iter()
            .map(|t| normalize_address(t, raw, "targets"))
            .collect::<Result<Vec<_>, _>>()?;
        let values = match field(raw, &["values"]) {
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| json_u256(v, raw, "values"))
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => {
                return Err(NormalizeError::InvalidField {
                    event: raw.name.clone(),
                    field: "values".to_string(),
                });
            }
            None => Vec::new(),
        };
        let calldatas = match field(raw, &["calldatas"]) {
            Some(_) => string_array_field(raw, "calldatas")?,
            None => Vec::new(),
        };

        Ok(CanonicalEvent::ProposalCreated(ProposalCreated {
            meta,
            dao_id: self.dao_id.clone(),
            proposal_id,
            proposer,
            targets,
            values,
            calldatas,
            start_block,
            end_block,
            description,
        }))
    }

    fn lifecycle(
        &self,
        raw: &RawChainEvent,
        meta: EventMeta,
        status: LifecycleStatus,
    ) -> Result<CanonicalEvent, NormalizeError> {
        let proposal_id = proposal_id_field(raw, &["proposalId", "id", "proposal"])?;

        Ok(CanonicalEvent::ProposalStatusChanged(ProposalStatusChanged {
            meta,
            dao_id: self.dao_id.clone(),
            proposal_id,
            status,
            extended_end_block: None,
        }))
    }

    fn proposal_extended(
        &self,
        raw: &RawChainEvent,
        meta: EventMeta,
    ) -> Result<CanonicalEvent, NormalizeError> {
        let proposal_id = proposal_id_field(raw, &["proposalId", "id"])?;
        let extended = i64_field(raw, &["extendedDeadline", "newEndBlock", "endBlock"])?;

        Ok(CanonicalEvent::ProposalStatusChanged(ProposalStatusChanged {
            meta,
            dao_id: self.dao_id.clone(),
            proposal_id,
            status: LifecycleStatus::Extended,
            extended_end_block: Some(extended),
        }))
    }
}

/// First present argument among the accepted per-family names
fn field<'a>(raw: &'a RawChainEvent, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|n| raw.args.get(n))
}

fn required<'a>(raw: &'a RawChainEvent, names: &[&str]) -> Result<&'a Value, NormalizeError> {
    field(raw, names).ok_or_else(|| NormalizeError::MissingField {
        event: raw.name.clone(),
        field: names[0].to_string(),
    })
}

pub fn normalize_address(
    value: &str,
    raw: &RawChainEvent,
    name: &str,
) -> Result<String, NormalizeError> {
    let address = Address::from_str(value).map_err(|_| NormalizeError::InvalidField {
        event: raw.name.clone(),
        field: name.to_string(),
    })?;
    Ok(format!("0x{}", hex::encode(address)))
}

fn address_field(raw: &RawChainEvent, names: &[&str]) -> Result<String, NormalizeError> {
    let value = required(raw, names)?;
    let text = value.as_str().ok_or_else(|| NormalizeError::InvalidField {
        event: raw.name.clone(),
        field: names[0].to_string(),
    })?;
    normalize_address(text, raw, names[0])
}

fn json_u256(value: &Value, raw: &RawChainEvent, name: &str) -> Result<U256, NormalizeError> {
    let invalid = || NormalizeError::InvalidField {
        event: raw.name.clone(),
        field: name.to_string(),
    };
    match value {
        Value::String(s) => U256::from_str(s).map_err(|_| invalid()),
        Value::Number(n) => n.as_u64().map(U256::from).ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

fn u256_field(raw: &RawChainEvent, names: &[&str]) -> Result<U256, NormalizeError> {
    json_u256(required(raw, names)?, raw, names[0])
}

fn i64_field(raw: &RawChainEvent, names: &[&str]) -> Result<i64, NormalizeError> {
    let value = required(raw, names)?;
    let invalid = || NormalizeError::InvalidField {
        event: raw.name.clone(),
        field: names[0].to_string(),
    };
    match value {
        Value::Number(n) => n.as_i64().ok_or_else(invalid),
        Value::String(s) => s.parse::<i64>().map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

fn iso_timestamp_field(raw: &RawChainEvent, names: &[&str]) -> Result<i64, NormalizeError> {
    let value = required(raw, names)?;
    let invalid = || NormalizeError::InvalidField {
        event: raw.name.clone(),
        field: names[0].to_string(),
    };
    let text = value.as_str().ok_or_else(invalid)?;
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.timestamp())
        .map_err(|_| invalid())
}

fn string_array_field(raw: &RawChainEvent, name: &str) -> Result<Vec<String>, NormalizeError> {
    let value = required(raw, &[name])?;
    let invalid = || NormalizeError::InvalidField {
        event: raw.name.clone(),
        field: name.to_string(),
    };
    let items = value.as_array().ok_or_else(invalid)?;
    items
        .iter()
        .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
        .collect()
}

/// Proposal ids are uint256; normalize to a decimal string key
fn proposal_id_field(raw: &RawChainEvent, names: &[&str]) -> Result<String, NormalizeError> {
    let id = json_u256(required(raw, names)?, raw, names[0])?;
    Ok(id.to_string())
}
