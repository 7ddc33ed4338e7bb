//! Voting power ledger
//!
//! Consumes canonical delegate-votes changes and delegation events.
//! Same cumulative/append-only shape as the balance ledger, with the
//! running quantity being delegated voting power per account.

use alloy::primitives::{Sign, U256};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

use crate::models::event::{DelegateChanged, DelegateVotesChanged};
use crate::services::ledger::{HistoryEntry, LedgerError, ReplayRow, signed};
use crate::services::normalizer::ZERO_ADDRESS;

/// Delegator → delegate mapping row produced by a DelegateChanged event
#[derive(Debug, Clone, PartialEq)]
pub struct DelegationRecord {
    pub dao_id: String,
    pub delegator_account_id: String,
    pub delegate_account_id: String,
    pub delegated_value: U256,
    pub tx_hash: String,
    pub log_index: i32,
    pub timestamp: DateTime<Utc>,
}

pub struct VotingPowerLedger {
    dao_id: String,
    powers: HashMap<String, U256>,
    seen: HashSet<(String, i32)>,
}

impl VotingPowerLedger {
    pub fn new(dao_id: String) -> Self {
        Self {
            dao_id,
            powers: HashMap::new(),
            seen: HashSet::new(),
        }
    }

    pub fn voting_power_of(&self, account: &str) -> U256 {
        self.powers.get(account).copied().unwrap_or(U256::ZERO)
    }

    pub fn has_seen(&self, tx_hash: &str, log_index: i32) -> bool {
        self.seen.contains(&(tx_hash.to_string(), log_index))
    }

    /// Apply one voting power movement: negative delta for the old
    /// delegate, positive for the new one, one row per non-zero side.
    pub fn apply_votes_changed(
        &mut self,
        event: &DelegateVotesChanged,
    ) -> Result<Vec<HistoryEntry>, LedgerError> {
        let key = (event.meta.tx_hash.clone(), event.meta.log_index);
        if self.seen.contains(&key) {
            return Err(LedgerError::DuplicateEvent {
                tx_hash: event.meta.tx_hash.clone(),
                log_index: event.meta.log_index,
            });
        }

        let mut staged: HashMap<String, U256> = HashMap::new();
        let mut entries = Vec::with_capacity(2);

        if event.old_delegate != ZERO_ADDRESS {
            let previous = self.voting_power_of(&event.old_delegate);
            let next = previous.checked_sub(event.amount).ok_or_else(|| {
                LedgerError::NegativeBalance {
                    account: event.old_delegate.clone(),
                    tx_hash: event.meta.tx_hash.clone(),
                }
            })?;
            staged.insert(event.old_delegate.clone(), next);
            entries.push(HistoryEntry {
                tx_hash: event.meta.tx_hash.clone(),
                log_index: event.meta.log_index,
                dao_id: self.dao_id.clone(),
                account_id: event.old_delegate.clone(),
                value: next,
                delta: signed(Sign::Negative, event.amount)?,
                timestamp: event.meta.timestamp,
            });
        }

        if event.new_delegate != ZERO_ADDRESS {
            let previous = staged
                .get(&event.new_delegate)
                .copied()
                .unwrap_or_else(|| self.voting_power_of(&event.new_delegate));
            let next = previous
                .checked_add(event.amount)
                .ok_or_else(|| LedgerError::ValueOutOfRange(event.amount.to_string()))?;
            staged.insert(event.new_delegate.clone(), next);
            entries.push(HistoryEntry {
                tx_hash: event.meta.tx_hash.clone(),
                log_index: event.meta.log_index,
                dao_id: self.dao_id.clone(),
                account_id: event.new_delegate.clone(),
                value: next,
                delta: signed(Sign::Positive, event.amount)?,
                timestamp: event.meta.timestamp,
            });
        }

        for (account, value) in staged {
            self.powers.insert(account, value);
        }
        self.seen.insert(key);
        Ok(entries)
    }

    /// Record who delegates to whom. Shares the stream's (tx_hash,
    /// log_index) uniqueness space with the history entries.
    pub fn apply_delegate_changed(
        &mut self,
        event: &DelegateChanged,
    ) -> Result<DelegationRecord, LedgerError> {
        let key = (event.meta.tx_hash.clone(), event.meta.log_index);
        if self.seen.contains(&key) {
            return Err(LedgerError::DuplicateEvent {
                tx_hash: event.meta.tx_hash.clone(),
                log_index: event.meta.log_index,
            });
        }
        self.seen.insert(key);

        Ok(DelegationRecord {
            dao_id: self.dao_id.clone(),
            delegator_account_id: event.delegator.clone(),
            delegate_account_id: event.to_delegate.clone(),
            delegated_value: event.delegated_value,
            tx_hash: event.meta.tx_hash.clone(),
            log_index: event.meta.log_index,
            timestamp: event.meta.timestamp,
        })
    }

    /// Reconstruct running state from persisted rows, verifying the
    /// cumulative invariant.
    pub fn rebuild(dao_id: String, rows: &[ReplayRow]) -> Result<Self, LedgerError> {
        let mut ledger = Self::new(dao_id);
        for row in rows {
            let previous = ledger.voting_power_of(&row.account_id);
            let magnitude = row.delta.unsigned_abs();
            let expected = if row.delta.is_negative() {
                previous.checked_sub(magnitude)
            } else {
                previous.checked_add(magnitude)
            }
            .ok_or_else(|| LedgerError::NegativeBalance {
                account: row.account_id.clone(),
                tx_hash: row.tx_hash.clone(),
            })?;
            if expected != row.value {
                return Err(LedgerError::CumulativeMismatch {
                    account: row.account_id.clone(),
                    tx_hash: row.tx_hash.clone(),
                });
            }
            ledger.powers.insert(row.account_id.clone(), expected);
            ledger.seen.insert((row.tx_hash.clone(), row.log_index));
        }
        Ok(ledger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::EventMeta;
    use chrono::TimeZone;

    const CAROL: &str = "0x00000000000000000000000000000000000000c3";
    const DAVE: &str = "0x00000000000000000000000000000000000000d4";

    fn meta(tx: &str, log_index: i32) -> EventMeta {
        EventMeta {
            tx_hash: tx.to_string(),
            log_index,
            timestamp: Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap(),
            block_number: 2,
        }
    }

    fn votes_changed(tx: &str, log_index: i32, old: &str, new: &str, amount: u64) -> DelegateVotesChanged {
        DelegateVotesChanged {
            meta: meta(tx, log_index),
            dao_id: "testdao".to_string(),
            old_delegate: old.to_string(),
            new_delegate: new.to_string(),
            amount: U256::from(amount),
        }
    }

    #[test]
    fn test_two_sided_change_moves_power() {
        let mut ledger = VotingPowerLedger::new("testdao".to_string());
        ledger
            .apply_votes_changed(&votes_changed("0xv1", 0, ZERO_ADDRESS, CAROL, 100))
            .unwrap();
        let entries = ledger
            .apply_votes_changed(&votes_changed("0xv2", 0, CAROL, DAVE, 60))
            .unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].delta.to_string(), "-60");
        assert_eq!(entries[1].delta.to_string(), "60");
        assert_eq!(ledger.voting_power_of(CAROL), U256::from(40u64));
        assert_eq!(ledger.voting_power_of(DAVE), U256::from(60u64));
    }

    #[test]
    fn test_power_underflow_is_fatal() {
        let mut ledger = VotingPowerLedger::new("testdao".to_string());
        ledger
            .apply_votes_changed(&votes_changed("0xv1", 0, ZERO_ADDRESS, CAROL, 10))
            .unwrap();
        assert!(matches!(
            ledger.apply_votes_changed(&votes_changed("0xv2", 0, CAROL, ZERO_ADDRESS, 11)),
            Err(LedgerError::NegativeBalance { .. })
        ));
        assert_eq!(ledger.voting_power_of(CAROL), U256::from(10u64));
    }

    #[test]
    fn test_delegate_changed_produces_record() {
        let mut ledger = VotingPowerLedger::new("testdao".to_string());
        let record = ledger
            .apply_delegate_changed(&DelegateChanged {
                meta: meta("0xd1", 4),
                dao_id: "testdao".to_string(),
                delegator: CAROL.to_string(),
                from_delegate: ZERO_ADDRESS.to_string(),
                to_delegate: DAVE.to_string(),
                delegated_value: U256::from(77u64),
            })
            .unwrap();
        assert_eq!(record.delegate_account_id, DAVE);
        assert_eq!(record.delegated_value, U256::from(77u64));
        // the same (tx, log) cannot be applied twice
        assert!(ledger.has_seen("0xd1", 4));
    }

    #[test]
    fn test_replay_is_idempotent() {
        let events = vec![
            votes_changed("0xv1", 0, ZERO_ADDRESS, CAROL, 100),
            votes_changed("0xv2", 0, CAROL, DAVE, 25),
            votes_changed("0xv3", 0, DAVE, ZERO_ADDRESS, 5),
        ];

        let mut first = VotingPowerLedger::new("testdao".to_string());
        let mut second = VotingPowerLedger::new("testdao".to_string());
        let rows_first: Vec<_> = events
            .iter()
            .flat_map(|e| first.apply_votes_changed(e).unwrap())
            .collect();
        let rows_second: Vec<_> = events
            .iter()
            .flat_map(|e| second.apply_votes_changed(e).unwrap())
            .collect();

        assert_eq!(rows_first, rows_second);
        assert_eq!(first.voting_power_of(CAROL), U256::from(75u64));
        assert_eq!(first.voting_power_of(DAVE), U256::from(20u64));
    }

    #[test]
    fn test_rebuild_restores_state() {
        let mut ledger = VotingPowerLedger::new("testdao".to_string());
        let rows: Vec<ReplayRow> = [
            votes_changed("0xv1", 0, ZERO_ADDRESS, CAROL, 100),
            votes_changed("0xv2", 0, CAROL, DAVE, 25),
        ]
        .iter()
        .flat_map(|e| ledger.apply_votes_changed(e).unwrap())
        .map(|entry| ReplayRow {
            tx_hash: entry.tx_hash,
            log_index: entry.log_index,
            account_id: entry.account_id,
            value: entry.value,
            delta: entry.delta,
        })
        .collect();

        let rebuilt = VotingPowerLedger::rebuild("testdao".to_string(), &rows).unwrap();
        assert_eq!(rebuilt.voting_power_of(CAROL), U256::from(75u64));
        assert_eq!(rebuilt.voting_power_of(DAVE), U256::from(25u64));
    }
}
