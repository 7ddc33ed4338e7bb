//! SeaORM Entity for delegator → delegate mappings

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "delegations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub dao_id: String,
    pub delegator_account_id: String,
    pub delegate_account_id: String,
    #[sea_orm(column_type = "Decimal(Some((78, 0)))")]
    pub delegated_value: Decimal,
    pub tx_hash: String,
    pub log_index: i32,
    pub timestamp: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
