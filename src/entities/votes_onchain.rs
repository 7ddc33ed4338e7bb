//! SeaORM Entity for cast votes
//!
//! One row per (dao, proposal, voter). A re-vote where the governor
//! allows it overwrites the row rather than adding a second one.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "votes_onchain")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub dao_id: String,
    pub voter_account_id: String,
    pub proposal_id: String,
    /// 0 = against, 1 = for, 2 = abstain
    pub support: i16,
    #[sea_orm(column_type = "Decimal(Some((78, 0)))")]
    pub voting_power: Decimal,
    #[sea_orm(nullable)]
    pub reason: Option<String>,
    pub tx_hash: String,
    pub log_index: i32,
    pub timestamp: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
