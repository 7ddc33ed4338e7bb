//! Proposal state machine
//!
//! Tracks proposal lifecycle status and incremental vote tallies. The
//! machine trusts the emitting contract's event sequence: lifecycle
//! events apply last-write-wins, and an event for a proposal that was
//! never created is a consistency violation, not an implicit create.

use alloy::primitives::U256;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::models::event::{
    LifecycleStatus, ProposalCreated, ProposalStatusChanged, VoteCast, VoteSupport,
};
use crate::models::proposal::ProposalStatus;
use crate::services::ledger::LedgerError;

#[derive(Debug, Clone, PartialEq)]
pub struct ProposalRecord {
    pub proposal_id: String,
    pub dao_id: String,
    pub proposer_account_id: String,
    pub targets: Vec<String>,
    pub values: Vec<U256>,
    pub calldatas: Vec<String>,
    pub start_block: i64,
    pub end_block: i64,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub status: ProposalStatus,
    pub for_votes: U256,
    pub against_votes: U256,
    pub abstain_votes: U256,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VoteRecord {
    pub voter_account_id: String,
    pub proposal_id: String,
    pub support: VoteSupport,
    pub voting_power: U256,
    pub reason: Option<String>,
    pub tx_hash: String,
    pub log_index: i32,
    pub timestamp: DateTime<Utc>,
}

/// What the persistence layer has to do after one applied event
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerEffect {
    Created(ProposalRecord),
    Updated(ProposalRecord),
    VoteRecorded {
        proposal: ProposalRecord,
        vote: VoteRecord,
        /// True when an earlier vote by the same voter was overwritten
        replaced: bool,
    },
}

pub struct ProposalTracker {
    dao_id: String,
    allows_vote_change: bool,
    proposals: HashMap<String, ProposalRecord>,
    votes: HashMap<(String, String), VoteRecord>,
}

impl ProposalTracker {
    pub fn new(dao_id: String, allows_vote_change: bool) -> Self {
        Self {
            dao_id,
            allows_vote_change,
            proposals: HashMap::new(),
            votes: HashMap::new(),
        }
    }

    pub fn proposal(&self, proposal_id: &str) -> Option<&ProposalRecord> {
        self.proposals.get(proposal_id)
    }

    pub fn vote(&self, proposal_id: &str, voter: &str) -> Option<&VoteRecord> {
        self.votes
            .get(&(proposal_id.to_string(), voter.to_string()))
    }

    /// Voting windows are block-gated by the emitting contract, so a
    /// freshly created proposal starts ACTIVE.
    pub fn on_proposal_created(
        &mut self,
        event: &ProposalCreated,
    ) -> Result<TrackerEffect, LedgerError> {
        if self.proposals.contains_key(&event.proposal_id) {
            return Err(LedgerError::DuplicateProposal {
                proposal_id: event.proposal_id.clone(),
            });
        }

        let record = ProposalRecord {
            proposal_id: event.proposal_id.clone(),
            dao_id: self.dao_id.clone(),
            proposer_account_id: event.proposer.clone(),
            targets: event.targets.clone(),
            values: event.values.clone(),
            calldatas: event.calldatas.clone(),
            start_block: event.start_block,
            end_block: event.end_block,
            description: event.description.clone(),
            timestamp: event.meta.timestamp,
            status: ProposalStatus::Active,
            for_votes: U256::ZERO,
            against_votes: U256::ZERO,
            abstain_votes: U256::ZERO,
        };
        self.proposals
            .insert(event.proposal_id.clone(), record.clone());
        Ok(TrackerEffect::Created(record))
    }

    /// Lifecycle events win unconditionally; governors guarantee a valid
    /// on-chain sequence.
    pub fn on_status_changed(
        &mut self,
        event: &ProposalStatusChanged,
    ) -> Result<TrackerEffect, LedgerError> {
        let record = self.proposals.get_mut(&event.proposal_id).ok_or_else(|| {
            LedgerError::UnknownProposal {
                proposal_id: event.proposal_id.clone(),
            }
        })?;

        match event.status {
            LifecycleStatus::Extended => {
                // ACTIVE → ACTIVE with a pushed-out deadline
                record.status = ProposalStatus::Active;
                if let Some(end_block) = event.extended_end_block {
                    record.end_block = end_block;
                }
            }
            LifecycleStatus::Queued => record.status = ProposalStatus::Queued,
            LifecycleStatus::Executed => record.status = ProposalStatus::Executed,
            LifecycleStatus::Canceled => record.status = ProposalStatus::Canceled,
            LifecycleStatus::Defeated => record.status = ProposalStatus::Defeated,
            LifecycleStatus::Succeeded => record.status = ProposalStatus::Succeeded,
        }
        Ok(TrackerEffect::Updated(record.clone()))
    }

    pub fn on_vote_cast(&mut self, event: &VoteCast) -> Result<TrackerEffect, LedgerError> {
        let key = (event.proposal_id.clone(), event.voter.clone());
        let previous = self.votes.get(&key).cloned();

        if previous.is_some() && !self.allows_vote_change {
            return Err(LedgerError::DuplicateVote {
                proposal_id: event.proposal_id.clone(),
                voter: event.voter.clone(),
            });
        }

        let record = self.proposals.get_mut(&event.proposal_id).ok_or_else(|| {
            LedgerError::UnknownProposal {
                proposal_id: event.proposal_id.clone(),
            }
        })?;

        // A changed vote replaces the earlier contribution instead of
        // double counting it.
        if let Some(ref old) = previous {
            let tally = tally_for(record, old.support);
            *tally = tally.checked_sub(old.voting_power).ok_or_else(|| {
                LedgerError::ValueOutOfRange(format!(
                    "tally underflow on proposal {}",
                    event.proposal_id
                ))
            })?;
        }
        let tally = tally_for(record, event.support);
        *tally = tally.checked_add(event.voting_power).ok_or_else(|| {
            LedgerError::ValueOutOfRange(format!(
                "tally overflow on proposal {}",
                event.proposal_id
            ))
        })?;

        let vote = VoteRecord {
            voter_account_id: event.voter.clone(),
            proposal_id: event.proposal_id.clone(),
            support: event.support,
            voting_power: event.voting_power,
            reason: event.reason.clone(),
            tx_hash: event.meta.tx_hash.clone(),
            log_index: event.meta.log_index,
            timestamp: event.meta.timestamp,
        };
        self.votes.insert(key, vote.clone());

        Ok(TrackerEffect::VoteRecorded {
            proposal: record.clone(),
            vote,
            replaced: previous.is_some(),
        })
    }

    /// Restore state from persisted proposals and votes
    pub fn rebuild(
        dao_id: String,
        allows_vote_change: bool,
        proposals: Vec<ProposalRecord>,
        votes: Vec<VoteRecord>,
    ) -> Self {
        let mut tracker = Self::new(dao_id, allows_vote_change);
        for proposal in proposals {
            tracker
                .proposals
                .insert(proposal.proposal_id.clone(), proposal);
        }
        for vote in votes {
            tracker.votes.insert(
                (vote.proposal_id.clone(), vote.voter_account_id.clone()),
                vote,
            );
        }
        tracker
    }
}

fn tally_for(record: &mut ProposalRecord, support: VoteSupport) -> &mut U256 {
    match support {
        VoteSupport::For => &mut record.for_votes,
        VoteSupport::Against => &mut record.against_votes,
        VoteSupport::Abstain => &mut record.abstain_votes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::EventMeta;
    use chrono::TimeZone;

    const PROPOSER: &str = "0x00000000000000000000000000000000000000e5";
    const VOTER: &str = "0x00000000000000000000000000000000000000f6";

    fn meta(tx: &str, log_index: i32) -> EventMeta {
        EventMeta {
            tx_hash: tx.to_string(),
            log_index,
            timestamp: Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap(),
            block_number: 3,
        }
    }

    fn created(id: &str) -> ProposalCreated {
        ProposalCreated {
            meta: meta("0xp1", 0),
            dao_id: "testdao".to_string(),
            proposal_id: id.to_string(),
            proposer: PROPOSER.to_string(),
            targets: vec![],
            values: vec![],
            calldatas: vec![],
            start_block: 100,
            end_block: 200,
            description: "test proposal".to_string(),
        }
    }

    fn status(id: &str, status: LifecycleStatus, end: Option<i64>) -> ProposalStatusChanged {
        ProposalStatusChanged {
            meta: meta("0xp2", 0),
            dao_id: "testdao".to_string(),
            proposal_id: id.to_string(),
            status,
            extended_end_block: end,
        }
    }

    fn vote(id: &str, tx: &str, support: VoteSupport, power: u64) -> VoteCast {
        VoteCast {
            meta: meta(tx, 0),
            dao_id: "testdao".to_string(),
            voter: VOTER.to_string(),
            proposal_id: id.to_string(),
            support,
            voting_power: U256::from(power),
            reason: None,
        }
    }

    #[test]
    fn test_created_proposal_starts_active() {
        let mut tracker = ProposalTracker::new("testdao".to_string(), false);
        tracker.on_proposal_created(&created("1")).unwrap();
        assert_eq!(
            tracker.proposal("1").unwrap().status,
            ProposalStatus::Active
        );
    }

    #[test]
    fn test_lifecycle_last_write_wins() {
        let mut tracker = ProposalTracker::new("testdao".to_string(), false);
        tracker.on_proposal_created(&created("1")).unwrap();
        tracker
            .on_status_changed(&status("1", LifecycleStatus::Queued, None))
            .unwrap();
        assert_eq!(tracker.proposal("1").unwrap().status, ProposalStatus::Queued);
        tracker
            .on_status_changed(&status("1", LifecycleStatus::Executed, None))
            .unwrap();
        assert_eq!(
            tracker.proposal("1").unwrap().status,
            ProposalStatus::Executed
        );
    }

    #[test]
    fn test_extension_keeps_active_and_moves_deadline() {
        let mut tracker = ProposalTracker::new("testdao".to_string(), false);
        tracker.on_proposal_created(&created("1")).unwrap();
        tracker
            .on_status_changed(&status("1", LifecycleStatus::Extended, Some(260)))
            .unwrap();
        let record = tracker.proposal("1").unwrap();
        assert_eq!(record.status, ProposalStatus::Active);
        assert_eq!(record.end_block, 260);
    }

    #[test]
    fn test_lifecycle_for_unknown_proposal_is_a_violation() {
        let mut tracker = ProposalTracker::new("testdao".to_string(), false);
        assert_eq!(
            tracker
                .on_status_changed(&status("9", LifecycleStatus::Executed, None))
                .unwrap_err(),
            LedgerError::UnknownProposal {
                proposal_id: "9".to_string()
            }
        );
    }

    #[test]
    fn test_votes_accumulate_per_support_bucket() {
        let mut tracker = ProposalTracker::new("testdao".to_string(), false);
        tracker.on_proposal_created(&created("1")).unwrap();
        tracker
            .on_vote_cast(&vote("1", "0xv1", VoteSupport::For, 100))
            .unwrap();

        let mut other = vote("1", "0xv2", VoteSupport::Against, 30);
        other.voter = PROPOSER.to_string();
        tracker.on_vote_cast(&other).unwrap();

        let record = tracker.proposal("1").unwrap();
        assert_eq!(record.for_votes, U256::from(100u64));
        assert_eq!(record.against_votes, U256::from(30u64));
        assert_eq!(record.abstain_votes, U256::ZERO);
    }

    #[test]
    fn test_duplicate_vote_rejected_when_changes_disallowed() {
        let mut tracker = ProposalTracker::new("testdao".to_string(), false);
        tracker.on_proposal_created(&created("1")).unwrap();
        tracker
            .on_vote_cast(&vote("1", "0xv1", VoteSupport::For, 100))
            .unwrap();
        assert!(matches!(
            tracker.on_vote_cast(&vote("1", "0xv2", VoteSupport::Against, 100)),
            Err(LedgerError::DuplicateVote { .. })
        ));
    }

    #[test]
    fn test_vote_change_overwrites_prior_contribution() {
        let mut tracker = ProposalTracker::new("testdao".to_string(), true);
        tracker.on_proposal_created(&created("1")).unwrap();
        tracker
            .on_vote_cast(&vote("1", "0xv1", VoteSupport::For, 100))
            .unwrap();
        let effect = tracker
            .on_vote_cast(&vote("1", "0xv2", VoteSupport::Against, 40))
            .unwrap();

        match effect {
            TrackerEffect::VoteRecorded {
                proposal, replaced, ..
            } => {
                assert!(replaced);
                assert_eq!(proposal.for_votes, U256::ZERO);
                assert_eq!(proposal.against_votes, U256::from(40u64));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_vote_for_unknown_proposal_is_a_violation() {
        let mut tracker = ProposalTracker::new("testdao".to_string(), false);
        assert!(matches!(
            tracker.on_vote_cast(&vote("404", "0xv1", VoteSupport::For, 1)),
            Err(LedgerError::UnknownProposal { .. })
        ));
    }

    #[test]
    fn test_duplicate_proposal_is_a_violation() {
        let mut tracker = ProposalTracker::new("testdao".to_string(), false);
        tracker.on_proposal_created(&created("1")).unwrap();
        assert!(matches!(
            tracker.on_proposal_created(&created("1")),
            Err(LedgerError::DuplicateProposal { .. })
        ));
    }
}
