//! Balance ledger
//!
//! Consumes canonical token transfers and maintains per-account running
//! balances plus the append-only history entries behind them. Single
//! writer per DAO stream; events must arrive in (timestamp, log_index)
//! order for replay determinism.

use alloy::primitives::{Sign, U256};
use std::collections::{HashMap, HashSet};

use crate::models::event::TokenTransfer;
use crate::services::ledger::{HistoryEntry, LedgerError, ReplayRow, signed};
use crate::services::normalizer::ZERO_ADDRESS;

pub struct BalanceLedger {
    dao_id: String,
    balances: HashMap<String, U256>,
    seen: HashSet<(String, i32)>,
}

impl BalanceLedger {
    pub fn new(dao_id: String) -> Self {
        Self {
            dao_id,
            balances: HashMap::new(),
            seen: HashSet::new(),
        }
    }

    pub fn balance_of(&self, account: &str) -> U256 {
        self.balances.get(account).copied().unwrap_or(U256::ZERO)
    }

    pub fn account_count(&self) -> usize {
        self.balances.len()
    }

    pub fn has_seen(&self, tx_hash: &str, log_index: i32) -> bool {
        self.seen.contains(&(tx_hash.to_string(), log_index))
    }

    /// Apply one transfer, yielding one history entry per non-zero side.
    /// The decreasing side comes first. Nothing is committed if any side
    /// fails.
    pub fn apply_transfer(
        &mut self,
        event: &TokenTransfer,
    ) -> Result<Vec<HistoryEntry>, LedgerError> {
        let key = (event.meta.tx_hash.clone(), event.meta.log_index);
        if self.seen.contains(&key) {
            return Err(LedgerError::DuplicateEvent {
                tx_hash: event.meta.tx_hash.clone(),
                log_index: event.meta.log_index,
            });
        }

        // Stage both sides before touching the running map, so a failing
        // event leaves no partial state behind. A self-transfer reads the
        // staged value for its second side.
        let mut staged: HashMap<String, U256> = HashMap::new();
        let mut entries = Vec::with_capacity(2);

        if event.from != ZERO_ADDRESS {
            let previous = self.balance_of(&event.from);
            let next = previous
                .checked_sub(event.amount)
                .ok_or_else(|| LedgerError::NegativeBalance {
                    account: event.from.clone(),
                    tx_hash: event.meta.tx_hash.clone(),
                })?;
            staged.insert(event.from.clone(), next);
            entries.push(HistoryEntry {
                tx_hash: event.meta.tx_hash.clone(),
                log_index: event.meta.log_index,
                dao_id: self.dao_id.clone(),
                account_id: event.from.clone(),
                value: next,
                delta: signed(Sign::Negative, event.amount)?,
                timestamp: event.meta.timestamp,
            });
        }

        if event.to != ZERO_ADDRESS {
            let previous = staged
                .get(&event.to)
                .copied()
                .unwrap_or_else(|| self.balance_of(&event.to));
            let next = previous
                .checked_add(event.amount)
                .ok_or_else(|| LedgerError::ValueOutOfRange(event.amount.to_string()))?;
            staged.insert(event.to.clone(), next);
            entries.push(HistoryEntry {
                tx_hash: event.meta.tx_hash.clone(),
                log_index: event.meta.log_index,
                dao_id: self.dao_id.clone(),
                account_id: event.to.clone(),
                value: next,
                delta: signed(Sign::Positive, event.amount)?,
                timestamp: event.meta.timestamp,
            });
        }

        for (account, value) in staged {
            self.balances.insert(account, value);
        }
        self.seen.insert(key);
        Ok(entries)
    }

    /// Reconstruct running state from persisted rows in (timestamp,
    /// log_index) order, verifying the cumulative invariant as it goes.
    pub fn rebuild(dao_id: String, rows: &[ReplayRow]) -> Result<Self, LedgerError> {
        let mut ledger = Self::new(dao_id);
        for row in rows {
            let previous = ledger.balance_of(&row.account_id);
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
            ledger.balances.insert(row.account_id.clone(), expected);
            ledger.seen.insert((row.tx_hash.clone(), row.log_index));
        }
        Ok(ledger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::EventMeta;
    use chrono::{TimeZone, Utc};

    fn transfer(tx: &str, log_index: i32, from: &str, to: &str, amount: u64) -> TokenTransfer {
        TokenTransfer {
            meta: EventMeta {
                tx_hash: tx.to_string(),
                log_index,
                timestamp: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
                block_number: 1,
            },
            dao_id: "testdao".to_string(),
            token_id: "0xtoken".to_string(),
            from: from.to_string(),
            to: to.to_string(),
            amount: U256::from(amount),
        }
    }

    const ALICE: &str = "0x00000000000000000000000000000000000000a1";
    const BOB: &str = "0x00000000000000000000000000000000000000b2";

    #[test]
    fn test_mint_produces_single_row() {
        let mut ledger = BalanceLedger::new("testdao".to_string());
        let entries = ledger
            .apply_transfer(&transfer("0xt1", 0, ZERO_ADDRESS, ALICE, 100))
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].account_id, ALICE);
        assert_eq!(entries[0].value, U256::from(100u64));
        assert_eq!(entries[0].delta.to_string(), "100");
        assert_eq!(ledger.balance_of(ALICE), U256::from(100u64));
    }

    #[test]
    fn test_transfer_produces_two_rows_sharing_event_key() {
        let mut ledger = BalanceLedger::new("testdao".to_string());
        ledger
            .apply_transfer(&transfer("0xt1", 0, ZERO_ADDRESS, ALICE, 100))
            .unwrap();
        let entries = ledger
            .apply_transfer(&transfer("0xt2", 3, ALICE, BOB, 40))
            .unwrap();
        assert_eq!(entries.len(), 2);
        // decreasing side first
        assert_eq!(entries[0].account_id, ALICE);
        assert_eq!(entries[0].delta.to_string(), "-40");
        assert_eq!(entries[0].value, U256::from(60u64));
        assert_eq!(entries[1].account_id, BOB);
        assert_eq!(entries[1].delta.to_string(), "40");
        // both rows carry the originating event key
        assert_eq!(entries[0].tx_hash, entries[1].tx_hash);
        assert_eq!(entries[0].log_index, entries[1].log_index);
    }

    #[test]
    fn test_cumulative_invariant_over_a_stream() {
        let mut ledger = BalanceLedger::new("testdao".to_string());
        let events = vec![
            transfer("0xt1", 0, ZERO_ADDRESS, ALICE, 100),
            transfer("0xt2", 0, ALICE, BOB, 30),
            transfer("0xt2", 1, ALICE, BOB, 20),
            transfer("0xt3", 0, BOB, ALICE, 5),
        ];
        let mut rows = Vec::new();
        for event in &events {
            rows.extend(ledger.apply_transfer(event).unwrap());
        }

        let mut running: HashMap<String, i128> = HashMap::new();
        for row in &rows {
            let delta: i128 = row.delta.to_string().parse().unwrap();
            let balance = running.entry(row.account_id.clone()).or_insert(0);
            *balance += delta;
            assert_eq!(balance.to_string(), row.value.to_string());
            assert!(*balance >= 0);
        }
        assert_eq!(ledger.balance_of(ALICE), U256::from(55u64));
        assert_eq!(ledger.balance_of(BOB), U256::from(45u64));
    }

    #[test]
    fn test_underflow_is_fatal_and_uncommitted() {
        let mut ledger = BalanceLedger::new("testdao".to_string());
        ledger
            .apply_transfer(&transfer("0xt1", 0, ZERO_ADDRESS, ALICE, 10))
            .unwrap();
        let err = ledger
            .apply_transfer(&transfer("0xt2", 0, ALICE, BOB, 11))
            .unwrap_err();
        assert!(matches!(err, LedgerError::NegativeBalance { .. }));
        // nothing from the failed event was applied
        assert_eq!(ledger.balance_of(ALICE), U256::from(10u64));
        assert_eq!(ledger.balance_of(BOB), U256::ZERO);
        assert!(!ledger.has_seen("0xt2", 0));
    }

    #[test]
    fn test_duplicate_event_is_fatal() {
        let mut ledger = BalanceLedger::new("testdao".to_string());
        let event = transfer("0xt1", 0, ZERO_ADDRESS, ALICE, 10);
        ledger.apply_transfer(&event).unwrap();
        assert_eq!(
            ledger.apply_transfer(&event).unwrap_err(),
            LedgerError::DuplicateEvent {
                tx_hash: "0xt1".to_string(),
                log_index: 0
            }
        );
    }

    #[test]
    fn test_replay_is_idempotent() {
        let events = vec![
            transfer("0xt1", 0, ZERO_ADDRESS, ALICE, 100),
            transfer("0xt2", 0, ALICE, BOB, 30),
            transfer("0xt3", 0, BOB, ZERO_ADDRESS, 10),
        ];

        let mut first = BalanceLedger::new("testdao".to_string());
        let mut second = BalanceLedger::new("testdao".to_string());
        let rows_first: Vec<_> = events
            .iter()
            .flat_map(|e| first.apply_transfer(e).unwrap())
            .collect();
        let rows_second: Vec<_> = events
            .iter()
            .flat_map(|e| second.apply_transfer(e).unwrap())
            .collect();

        assert_eq!(rows_first, rows_second);
        assert_eq!(first.balance_of(ALICE), second.balance_of(ALICE));
        assert_eq!(first.balance_of(BOB), second.balance_of(BOB));
    }

    #[test]
    fn test_rebuild_from_rows_restores_state() {
        let mut ledger = BalanceLedger::new("testdao".to_string());
        let events = vec![
            transfer("0xt1", 0, ZERO_ADDRESS, ALICE, 100),
            transfer("0xt2", 0, ALICE, BOB, 30),
        ];
        let rows: Vec<ReplayRow> = events
            .iter()
            .flat_map(|e| ledger.apply_transfer(e).unwrap())
            .map(|entry| ReplayRow {
                tx_hash: entry.tx_hash,
                log_index: entry.log_index,
                account_id: entry.account_id,
                value: entry.value,
                delta: entry.delta,
            })
            .collect();

        let rebuilt = BalanceLedger::rebuild("testdao".to_string(), &rows).unwrap();
        assert_eq!(rebuilt.balance_of(ALICE), U256::from(70u64));
        assert_eq!(rebuilt.balance_of(BOB), U256::from(30u64));
        assert!(rebuilt.has_seen("0xt1", 0));
    }

    #[test]
    fn test_rebuild_detects_tampered_rows() {
        let rows = vec![ReplayRow {
            tx_hash: "0xt1".to_string(),
            log_index: 0,
            account_id: ALICE.to_string(),
            value: U256::from(999u64),
            delta: signed(Sign::Positive, U256::from(100u64)).unwrap(),
        }];
        assert!(matches!(
            BalanceLedger::rebuild("testdao".to_string(), &rows),
            Err(LedgerError::CumulativeMismatch { .. })
        ));
    }

    #[test]
    fn test_self_transfer_nets_to_zero() {
        let mut ledger = BalanceLedger::new("testdao".to_string());
        ledger
            .apply_transfer(&transfer("0xt1", 0, ZERO_ADDRESS, ALICE, 50))
            .unwrap();
        let entries = ledger
            .apply_transfer(&transfer("0xt2", 0, ALICE, ALICE, 20))
            .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(ledger.balance_of(ALICE), U256::from(50u64));
        assert_eq!(entries[1].value, U256::from(50u64));
    }
}
