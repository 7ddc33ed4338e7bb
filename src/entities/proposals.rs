//! SeaORM Entity for governance proposals
//!
//! Mutated in place by lifecycle events and vote tallies; never deleted.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "proposals")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// On-chain proposal id (uint256, stored as decimal string)
    pub proposal_id: String,
    pub dao_id: String,
    pub proposer_account_id: String,
    /// Call targets as a JSON array of addresses
    pub targets: Json,
    /// Call values as a JSON array of decimal strings
    pub values: Json,
    /// Calldata blobs as a JSON array of hex strings
    pub calldatas: Json,
    pub start_block: i64,
    pub end_block: i64,
    pub description: String,
    pub timestamp: DateTimeWithTimeZone,
    /// PENDING | ACTIVE | DEFEATED | SUCCEEDED | QUEUED | EXECUTED | CANCELED
    pub status: String,
    #[sea_orm(column_type = "Decimal(Some((78, 0)))")]
    pub for_votes: Decimal,
    #[sea_orm(column_type = "Decimal(Some((78, 0)))")]
    pub against_votes: Decimal,
    #[sea_orm(column_type = "Decimal(Some((78, 0)))")]
    pub abstain_votes: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
