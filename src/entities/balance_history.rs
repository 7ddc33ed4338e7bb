//! SeaORM Entity for per-account historical balance records
//!
//! One row per account side of each transfer. `balance` is the running
//! total after applying `delta`; rows ordered by (timestamp, log_index)
//! form a strictly cumulative sequence per account.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "balance_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Originating transfer, shared by both sides of the same event
    pub tx_hash: String,
    pub log_index: i32,
    pub dao_id: String,
    pub account_id: String,
    /// Running balance after applying `delta`
    #[sea_orm(column_type = "Decimal(Some((78, 0)))")]
    pub balance: Decimal,
    /// Signed change applied by this row
    #[sea_orm(column_type = "Decimal(Some((78, 0)))")]
    pub delta: Decimal,
    pub timestamp: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
