//! Event ingestion
//!
//! Owns the per-DAO event streams: one normalizer plus one set of
//! ledgers per DAO, driven strictly in (block, log index) order. The
//! dispatch table maps each canonical event type to its single handler;
//! the driving loop owns the ordering guarantee. DAO streams are
//! independent and may ingest in parallel with each other, but a single
//! stream only ever has one writer.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, Order,
    QueryFilter, QueryOrder, Set,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::entities::{
    balance_history, delegations, prelude::*, proposals, transfers, votes_onchain,
    voting_power_history,
};
use crate::models::event::{CanonicalEvent, RawChainEvent, TokenTransfer, VoteSupport};
use crate::models::proposal::ProposalStatus;
use crate::services::balance_ledger::BalanceLedger;
use crate::services::governor::{DaoConfig, Governor};
use crate::services::ledger::{
    HistoryEntry, LedgerError, ReplayRow, decimal_from_i256, decimal_from_u256,
    i256_from_decimal, u256_from_decimal,
};
use crate::services::normalizer::{EventNormalizer, NormalizeError};
use crate::services::proposal_tracker::{
    ProposalRecord, ProposalTracker, TrackerEffect, VoteRecord,
};
use crate::services::voting_power_ledger::{DelegationRecord, VotingPowerLedger};

/// What one dispatched event asks the persistence layer to write
#[derive(Debug)]
pub enum StreamEffect {
    Transfer {
        event: TokenTransfer,
        rows: Vec<HistoryEntry>,
    },
    VotingPower(Vec<HistoryEntry>),
    Delegation(DelegationRecord),
    Proposal(TrackerEffect),
}

/// One DAO's single-writer stream state
pub struct DaoStream {
    pub dao_id: String,
    pub token_id: String,
    normalizer: EventNormalizer,
    balances: BalanceLedger,
    voting_power: VotingPowerLedger,
    proposals: ProposalTracker,
}

impl DaoStream {
    pub fn new(config: &DaoConfig) -> Self {
        let governor = Governor::with_default_params(config.family);
        let allows_vote_change = governor.allows_vote_change();
        Self {
            dao_id: config.dao_id.clone(),
            token_id: config.token_id.clone(),
            normalizer: EventNormalizer::new(
                config.dao_id.clone(),
                config.token_id.clone(),
                governor,
            ),
            balances: BalanceLedger::new(config.dao_id.clone()),
            voting_power: VotingPowerLedger::new(config.dao_id.clone()),
            proposals: ProposalTracker::new(config.dao_id.clone(), allows_vote_change),
        }
    }

    pub fn normalize(&self, raw: &RawChainEvent) -> Result<CanonicalEvent, NormalizeError> {
        self.normalizer.normalize(raw)
    }

    /// Dispatch table: one handler per canonical event type
    pub fn dispatch(&mut self, event: &CanonicalEvent) -> Result<StreamEffect, LedgerError> {
        match event {
            CanonicalEvent::TokenTransfer(transfer) => {
                let rows = self.balances.apply_transfer(transfer)?;
                Ok(StreamEffect::Transfer {
                    event: transfer.clone(),
                    rows,
                })
            }
            CanonicalEvent::DelegateVotesChanged(change) => Ok(StreamEffect::VotingPower(
                self.voting_power.apply_votes_changed(change)?,
            )),
            CanonicalEvent::DelegateChanged(change) => Ok(StreamEffect::Delegation(
                self.voting_power.apply_delegate_changed(change)?,
            )),
            CanonicalEvent::ProposalCreated(created) => Ok(StreamEffect::Proposal(
                self.proposals.on_proposal_created(created)?,
            )),
            CanonicalEvent::ProposalStatusChanged(changed) => Ok(StreamEffect::Proposal(
                self.proposals.on_status_changed(changed)?,
            )),
            CanonicalEvent::VoteCast(vote) => {
                Ok(StreamEffect::Proposal(self.proposals.on_vote_cast(vote)?))
            }
        }
    }
}

#[derive(Debug)]
pub enum IngestError {
    UnknownDao(String),
    Ledger(LedgerError),
}

impl std::fmt::Display for IngestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestError::UnknownDao(dao_id) => write!(f, "Unknown DAO '{}'", dao_id),
            IngestError::Ledger(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for IngestError {}

impl From<LedgerError> for IngestError {
    fn from(e: LedgerError) -> Self {
        IngestError::Ledger(e)
    }
}

#[derive(Debug, Default, serde::Serialize)]
pub struct IngestStats {
    pub processed: usize,
    pub skipped: usize,
}

pub struct IngestService {
    db: DatabaseConnection,
    streams: HashMap<String, Arc<Mutex<DaoStream>>>,
}

impl IngestService {
    pub fn new(db: DatabaseConnection, configs: &[DaoConfig]) -> Self {
        let streams = configs
            .iter()
            .map(|config| {
                (
                    config.dao_id.clone(),
                    Arc::new(Mutex::new(DaoStream::new(config))),
                )
            })
            .collect();
        Self { db, streams }
    }

    pub fn dao_ids(&self) -> Vec<String> {
        self.streams.keys().cloned().collect()
    }

    pub fn tracks(&self, dao_id: &str) -> bool {
        self.streams.contains_key(dao_id)
    }

    /// Rebuild every stream's running state from the persisted ledgers.
    /// Run once at startup before any ingestion.
    pub async fn rehydrate_all(&self) -> Result<(), LedgerError> {
        for (dao_id, stream) in &self.streams {
            self.rehydrate_dao(dao_id, stream).await?;
        }
        Ok(())
    }

    async fn rehydrate_dao(
        &self,
        dao_id: &str,
        stream: &Arc<Mutex<DaoStream>>,
    ) -> Result<(), LedgerError> {
        let mut guard = stream.lock().await;

        let balance_rows = BalanceHistory::find()
            .filter(balance_history::Column::DaoId.eq(dao_id))
            .order_by(balance_history::Column::Timestamp, Order::Asc)
            .order_by(balance_history::Column::LogIndex, Order::Asc)
            .all(&self.db)
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        let replay: Vec<ReplayRow> = balance_rows
            .iter()
            .map(|row| {
                Ok(ReplayRow {
                    tx_hash: row.tx_hash.clone(),
                    log_index: row.log_index,
                    account_id: row.account_id.clone(),
                    value: u256_from_decimal(&row.balance)?,
                    delta: i256_from_decimal(&row.delta)?,
                })
            })
            .collect::<Result<_, LedgerError>>()?;
        guard.balances = BalanceLedger::rebuild(dao_id.to_string(), &replay)?;

        let power_rows = VotingPowerHistory::find()
            .filter(voting_power_history::Column::DaoId.eq(dao_id))
            .order_by(voting_power_history::Column::Timestamp, Order::Asc)
            .order_by(voting_power_history::Column::LogIndex, Order::Asc)
            .all(&self.db)
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        let replay: Vec<ReplayRow> = power_rows
            .iter()
            .map(|row| {
                Ok(ReplayRow {
                    tx_hash: row.tx_hash.clone(),
                    log_index: row.log_index,
                    account_id: row.account_id.clone(),
                    value: u256_from_decimal(&row.voting_power)?,
                    delta: i256_from_decimal(&row.delta)?,
                })
            })
            .collect::<Result<_, LedgerError>>()?;
        guard.voting_power = VotingPowerLedger::rebuild(dao_id.to_string(), &replay)?;

        let proposal_rows = Proposals::find()
            .filter(proposals::Column::DaoId.eq(dao_id))
            .all(&self.db)
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        let proposal_records = proposal_rows
            .into_iter()
            .map(proposal_record_from_row)
            .collect::<Result<Vec<_>, LedgerError>>()?;

        let vote_rows = VotesOnchain::find()
            .filter(votes_onchain::Column::DaoId.eq(dao_id))
            .all(&self.db)
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        let vote_records = vote_rows
            .into_iter()
            .map(vote_record_from_row)
            .collect::<Result<Vec<_>, LedgerError>>()?;

        let allows_vote_change = guard.normalizer.governor().allows_vote_change();
        guard.proposals = ProposalTracker::rebuild(
            dao_id.to_string(),
            allows_vote_change,
            proposal_records,
            vote_records,
        );

        info!(
            dao_id = %dao_id,
            balance_rows = balance_rows.len(),
            power_rows = power_rows.len(),
            "Stream rehydrated from ledgers"
        );
        Ok(())
    }

    /// Apply a batch of raw events to one DAO's stream.
    ///
    /// Malformed events are logged and skipped without touching the
    /// ledgers; a consistency violation is fatal and halts the batch.
    /// If persistence fails mid-batch the stream state is rebuilt from
    /// the rows on the next startup.
    pub async fn ingest_batch(
        &self,
        dao_id: &str,
        mut events: Vec<RawChainEvent>,
    ) -> Result<IngestStats, IngestError> {
        let stream = self
            .streams
            .get(dao_id)
            .ok_or_else(|| IngestError::UnknownDao(dao_id.to_string()))?;

        // The driving loop owns ordering: block number, then log index
        events.sort_by_key(|e| (e.block.number, e.log.log_index));

        let mut guard = stream.lock().await;
        let mut stats = IngestStats::default();

        for raw in &events {
            let canonical = match guard.normalize(raw) {
                Ok(canonical) => canonical,
                Err(e) => {
                    warn!(dao_id = %dao_id, event = %raw.name, error = %e, "Skipping malformed event");
                    stats.skipped += 1;
                    continue;
                }
            };

            let effect = guard.dispatch(&canonical)?;
            self.persist(&effect).await?;
            stats.processed += 1;
        }

        info!(
            dao_id = %dao_id,
            processed = stats.processed,
            skipped = stats.skipped,
            "Batch ingested"
        );
        Ok(stats)
    }

    async fn persist(&self, effect: &StreamEffect) -> Result<(), LedgerError> {
        match effect {
            StreamEffect::Transfer { event, rows } => {
                let transfer = transfers::ActiveModel {
                    tx_hash: Set(event.meta.tx_hash.clone()),
                    log_index: Set(event.meta.log_index),
                    dao_id: Set(event.dao_id.clone()),
                    token_id: Set(event.token_id.clone()),
                    from_address: Set(event.from.clone()),
                    to_address: Set(event.to.clone()),
                    amount: Set(decimal_from_u256(event.amount)?),
                    timestamp: Set(event.meta.timestamp.fixed_offset()),
                    ..Default::default()
                };
                transfer
                    .insert(&self.db)
                    .await
                    .map_err(|e| LedgerError::Database(e.to_string()))?;

                for row in rows {
                    let entry = balance_history::ActiveModel {
                        tx_hash: Set(row.tx_hash.clone()),
                        log_index: Set(row.log_index),
                        dao_id: Set(row.dao_id.clone()),
                        account_id: Set(row.account_id.clone()),
                        balance: Set(decimal_from_u256(row.value)?),
                        delta: Set(decimal_from_i256(row.delta)?),
                        timestamp: Set(row.timestamp.fixed_offset()),
                        ..Default::default()
                    };
                    entry
                        .insert(&self.db)
                        .await
                        .map_err(|e| LedgerError::Database(e.to_string()))?;
                }
            }
            StreamEffect::VotingPower(rows) => {
                for row in rows {
                    let entry = voting_power_history::ActiveModel {
                        tx_hash: Set(row.tx_hash.clone()),
                        log_index: Set(row.log_index),
                        dao_id: Set(row.dao_id.clone()),
                        account_id: Set(row.account_id.clone()),
                        voting_power: Set(decimal_from_u256(row.value)?),
                        delta: Set(decimal_from_i256(row.delta)?),
                        timestamp: Set(row.timestamp.fixed_offset()),
                        ..Default::default()
                    };
                    entry
                        .insert(&self.db)
                        .await
                        .map_err(|e| LedgerError::Database(e.to_string()))?;
                }
            }
            StreamEffect::Delegation(record) => {
                let entry = delegations::ActiveModel {
                    dao_id: Set(record.dao_id.clone()),
                    delegator_account_id: Set(record.delegator_account_id.clone()),
                    delegate_account_id: Set(record.delegate_account_id.clone()),
                    delegated_value: Set(decimal_from_u256(record.delegated_value)?),
                    tx_hash: Set(record.tx_hash.clone()),
                    log_index: Set(record.log_index),
                    timestamp: Set(record.timestamp.fixed_offset()),
                    ..Default::default()
                };
                entry
                    .insert(&self.db)
                    .await
                    .map_err(|e| LedgerError::Database(e.to_string()))?;
            }
            StreamEffect::Proposal(TrackerEffect::Created(record)) => {
                let entry = proposals::ActiveModel {
                    proposal_id: Set(record.proposal_id.clone()),
                    dao_id: Set(record.dao_id.clone()),
                    proposer_account_id: Set(record.proposer_account_id.clone()),
                    targets: Set(serde_json::json!(record.targets)),
                    values: Set(serde_json::json!(
                        record.values.iter().map(|v| v.to_string()).collect::<Vec<_>>()
                    )),
                    calldatas: Set(serde_json::json!(record.calldatas)),
                    start_block: Set(record.start_block),
                    end_block: Set(record.end_block),
                    description: Set(record.description.clone()),
                    timestamp: Set(record.timestamp.fixed_offset()),
                    status: Set(record.status.as_str().to_string()),
                    for_votes: Set(decimal_from_u256(record.for_votes)?),
                    against_votes: Set(decimal_from_u256(record.against_votes)?),
                    abstain_votes: Set(decimal_from_u256(record.abstain_votes)?),
                    ..Default::default()
                };
                entry
                    .insert(&self.db)
                    .await
                    .map_err(|e| LedgerError::Database(e.to_string()))?;
            }
            StreamEffect::Proposal(TrackerEffect::Updated(record)) => {
                let mut active = self.find_proposal_row(record).await?.into_active_model();
                active.status = Set(record.status.as_str().to_string());
                active.end_block = Set(record.end_block);
                active
                    .update(&self.db)
                    .await
                    .map_err(|e| LedgerError::Database(e.to_string()))?;
            }
            StreamEffect::Proposal(TrackerEffect::VoteRecorded {
                proposal,
                vote,
                replaced,
            }) => {
                if *replaced {
                    let existing = VotesOnchain::find()
                        .filter(votes_onchain::Column::DaoId.eq(&proposal.dao_id))
                        .filter(votes_onchain::Column::ProposalId.eq(&vote.proposal_id))
                        .filter(
                            votes_onchain::Column::VoterAccountId.eq(&vote.voter_account_id),
                        )
                        .one(&self.db)
                        .await
                        .map_err(|e| LedgerError::Database(e.to_string()))?
                        .ok_or_else(|| {
                            LedgerError::Database(format!(
                                "Vote row missing for replaced vote on proposal {}",
                                vote.proposal_id
                            ))
                        })?;
                    let mut active = existing.into_active_model();
                    active.support = Set(vote.support.as_i16());
                    active.voting_power = Set(decimal_from_u256(vote.voting_power)?);
                    active.reason = Set(vote.reason.clone());
                    active.tx_hash = Set(vote.tx_hash.clone());
                    active.log_index = Set(vote.log_index);
                    active.timestamp = Set(vote.timestamp.fixed_offset());
                    active
                        .update(&self.db)
                        .await
                        .map_err(|e| LedgerError::Database(e.to_string()))?;
                } else {
                    let entry = votes_onchain::ActiveModel {
                        dao_id: Set(proposal.dao_id.clone()),
                        voter_account_id: Set(vote.voter_account_id.clone()),
                        proposal_id: Set(vote.proposal_id.clone()),
                        support: Set(vote.support.as_i16()),
                        voting_power: Set(decimal_from_u256(vote.voting_power)?),
                        reason: Set(vote.reason.clone()),
                        tx_hash: Set(vote.tx_hash.clone()),
                        log_index: Set(vote.log_index),
                        timestamp: Set(vote.timestamp.fixed_offset()),
                        ..Default::default()
                    };
                    entry
                        .insert(&self.db)
                        .await
                        .map_err(|e| LedgerError::Database(e.to_string()))?;
                }

                let mut active = self.find_proposal_row(proposal).await?.into_active_model();
                active.for_votes = Set(decimal_from_u256(proposal.for_votes)?);
                active.against_votes = Set(decimal_from_u256(proposal.against_votes)?);
                active.abstain_votes = Set(decimal_from_u256(proposal.abstain_votes)?);
                active
                    .update(&self.db)
                    .await
                    .map_err(|e| LedgerError::Database(e.to_string()))?;
            }
        }
        Ok(())
    }

    async fn find_proposal_row(
        &self,
        record: &ProposalRecord,
    ) -> Result<proposals::Model, LedgerError> {
        Proposals::find()
            .filter(proposals::Column::DaoId.eq(&record.dao_id))
            .filter(proposals::Column::ProposalId.eq(&record.proposal_id))
            .one(&self.db)
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?
            .ok_or_else(|| {
                LedgerError::Database(format!(
                    "Proposal row missing for {} in {}",
                    record.proposal_id, record.dao_id
                ))
            })
    }
}

fn proposal_record_from_row(row: proposals::Model) -> Result<ProposalRecord, LedgerError> {
    let status = ProposalStatus::from_str_opt(&row.status).ok_or_else(|| {
        LedgerError::Database(format!("Unknown proposal status '{}'", row.status))
    })?;
    let targets: Vec<String> = serde_json::from_value(row.targets.clone())
        .map_err(|e| LedgerError::Database(format!("Bad targets json: {}", e)))?;
    let value_strings: Vec<String> = serde_json::from_value(row.values.clone())
        .map_err(|e| LedgerError::Database(format!("Bad values json: {}", e)))?;
    let values = value_strings
        .iter()
        .map(|v| {
            v.parse()
                .map_err(|_| LedgerError::ValueOutOfRange(v.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let calldatas: Vec<String> = serde_json::from_value(row.calldatas.clone())
        .map_err(|e| LedgerError::Database(format!("Bad calldatas json: {}", e)))?;

    Ok(ProposalRecord {
        proposal_id: row.proposal_id,
        dao_id: row.dao_id,
        proposer_account_id: row.proposer_account_id,
        targets,
        values,
        calldatas,
        start_block: row.start_block,
        end_block: row.end_block,
        description: row.description,
        timestamp: row.timestamp.to_utc(),
        status,
        for_votes: u256_from_decimal(&row.for_votes)?,
        against_votes: u256_from_decimal(&row.against_votes)?,
        abstain_votes: u256_from_decimal(&row.abstain_votes)?,
    })
}

fn vote_record_from_row(row: votes_onchain::Model) -> Result<VoteRecord, LedgerError> {
    let support = u8::try_from(row.support)
        .ok()
        .and_then(VoteSupport::from_u8)
        .ok_or_else(|| {
            LedgerError::Database(format!("Unknown vote support '{}'", row.support))
        })?;
    Ok(VoteRecord {
        voter_account_id: row.voter_account_id,
        proposal_id: row.proposal_id,
        support,
        voting_power: u256_from_decimal(&row.voting_power)?,
        reason: row.reason,
        tx_hash: row.tx_hash,
        log_index: row.log_index,
        timestamp: row.timestamp.to_utc(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::{RawBlock, RawLog, RawTransaction};
    use crate::services::governor::GovernorFamily;
    use serde_json::json;

    fn config() -> DaoConfig {
        DaoConfig {
            dao_id: "testdao".to_string(),
            token_id: "0x00000000000000000000000000000000000000aa".to_string(),
            family: GovernorFamily::Standard,
            token_symbol: "TEST".to_string(),
            token_decimals: 18,
        }
    }

    fn raw_transfer(tx: &str, block: i64, log_index: i32, from: &str, to: &str, value: u64) -> RawChainEvent {
        RawChainEvent {
            name: "Transfer".to_string(),
            args: json!({"from": from, "to": to, "value": value.to_string()}),
            block: RawBlock {
                number: block,
                timestamp: 1_750_000_000 + block,
            },
            transaction: RawTransaction {
                hash: tx.to_string(),
            },
            log: RawLog {
                log_index,
                address: "0x00000000000000000000000000000000000000aa".to_string(),
            },
        }
    }

    const ALICE: &str = "0x1111111111111111111111111111111111111111";
    const ZERO: &str = "0x0000000000000000000000000000000000000000";

    #[test]
    fn test_stream_dispatch_routes_transfers_to_balance_ledger() {
        let mut stream = DaoStream::new(&config());
        let canonical = stream
            .normalize(&raw_transfer("0xaaa1", 1, 0, ZERO, ALICE, 500))
            .unwrap();
        match stream.dispatch(&canonical).unwrap() {
            StreamEffect::Transfer { rows, .. } => {
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0].account_id, ALICE);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_stream_rejects_out_of_order_duplicates() {
        let mut stream = DaoStream::new(&config());
        let canonical = stream
            .normalize(&raw_transfer("0xaaa1", 1, 0, ZERO, ALICE, 500))
            .unwrap();
        stream.dispatch(&canonical).unwrap();
        assert!(matches!(
            stream.dispatch(&canonical),
            Err(LedgerError::DuplicateEvent { .. })
        ));
    }
}
