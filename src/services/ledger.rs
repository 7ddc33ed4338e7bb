//! Shared ledger types
//!
//! Running totals are kept in uint256 (token smallest-unit, no floating
//! point); persisted columns are Decimal(78, 0). Conversions that do not
//! fit surface as errors rather than truncating.

use alloy::primitives::{I256, Sign, U256};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;

#[derive(Debug, PartialEq, Eq)]
pub enum LedgerError {
    DuplicateEvent { tx_hash: String, log_index: i32 },
    NegativeBalance { account: String, tx_hash: String },
    CumulativeMismatch { account: String, tx_hash: String },
    ValueOutOfRange(String),
    DuplicateProposal { proposal_id: String },
    UnknownProposal { proposal_id: String },
    DuplicateVote { proposal_id: String, voter: String },
    Database(String),
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerError::DuplicateEvent { tx_hash, log_index } => {
                write!(f, "Duplicate event ({}, {})", tx_hash, log_index)
            }
            LedgerError::NegativeBalance { account, tx_hash } => {
                write!(
                    f,
                    "Delta would drive balance of {} negative at {}",
                    account, tx_hash
                )
            }
            LedgerError::CumulativeMismatch { account, tx_hash } => {
                write!(
                    f,
                    "Stored balance of {} does not match replayed deltas at {}",
                    account, tx_hash
                )
            }
            LedgerError::ValueOutOfRange(msg) => write!(f, "Value out of range: {}", msg),
            LedgerError::DuplicateProposal { proposal_id } => {
                write!(f, "Proposal {} already exists", proposal_id)
            }
            LedgerError::UnknownProposal { proposal_id } => {
                write!(f, "Lifecycle event for unknown proposal {}", proposal_id)
            }
            LedgerError::DuplicateVote { proposal_id, voter } => {
                write!(f, "Duplicate vote by {} on proposal {}", voter, proposal_id)
            }
            LedgerError::Database(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for LedgerError {}

/// One side of an applied event: the account's running value after the
/// signed delta, stamped with the originating (tx_hash, log_index).
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub tx_hash: String,
    pub log_index: i32,
    pub dao_id: String,
    pub account_id: String,
    pub value: U256,
    pub delta: I256,
    pub timestamp: DateTime<Utc>,
}

/// Persisted row fed back into a ledger rebuild, in (timestamp,
/// log_index) order.
#[derive(Debug, Clone)]
pub struct ReplayRow {
    pub tx_hash: String,
    pub log_index: i32,
    pub account_id: String,
    pub value: U256,
    pub delta: I256,
}

pub fn signed(sign: Sign, magnitude: U256) -> Result<I256, LedgerError> {
    I256::checked_from_sign_and_abs(sign, magnitude)
        .ok_or_else(|| LedgerError::ValueOutOfRange(magnitude.to_string()))
}

pub fn decimal_from_u256(value: U256) -> Result<Decimal, LedgerError> {
    Decimal::from_str(&value.to_string())
        .map_err(|_| LedgerError::ValueOutOfRange(value.to_string()))
}

pub fn decimal_from_i256(value: I256) -> Result<Decimal, LedgerError> {
    Decimal::from_str(&value.to_string())
        .map_err(|_| LedgerError::ValueOutOfRange(value.to_string()))
}

pub fn u256_from_decimal(value: &Decimal) -> Result<U256, LedgerError> {
    U256::from_str(&value.normalize().to_string())
        .map_err(|_| LedgerError::ValueOutOfRange(value.to_string()))
}

pub fn i256_from_decimal(value: &Decimal) -> Result<I256, LedgerError> {
    I256::from_dec_str(&value.normalize().to_string())
        .map_err(|_| LedgerError::ValueOutOfRange(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_conversions_round_trip() {
        let value = U256::from(123_456_789_000u64);
        let decimal = decimal_from_u256(value).unwrap();
        assert_eq!(u256_from_decimal(&decimal).unwrap(), value);

        let negative = signed(Sign::Negative, U256::from(42u64)).unwrap();
        let decimal = decimal_from_i256(negative).unwrap();
        assert_eq!(decimal.to_string(), "-42");
        assert_eq!(i256_from_decimal(&decimal).unwrap(), negative);
    }

    #[test]
    fn test_negative_decimal_does_not_convert_to_u256() {
        let negative = Decimal::from_str("-1").unwrap();
        assert!(u256_from_decimal(&negative).is_err());
    }
}
