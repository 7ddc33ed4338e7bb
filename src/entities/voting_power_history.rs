//! SeaORM Entity for per-account historical voting power records
//!
//! Same cumulative shape as balance_history, driven by delegate vote
//! changes instead of transfers.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "voting_power_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub tx_hash: String,
    pub log_index: i32,
    pub dao_id: String,
    pub account_id: String,
    /// Running voting power after applying `delta`
    #[sea_orm(column_type = "Decimal(Some((78, 0)))")]
    pub voting_power: Decimal,
    #[sea_orm(column_type = "Decimal(Some((78, 0)))")]
    pub delta: Decimal,
    pub timestamp: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
