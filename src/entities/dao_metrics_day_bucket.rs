//! SeaORM Entity for derived daily metric buckets
//!
//! Keyed by (date, dao_id, metric_type). Fully rebuildable from the
//! ledgers; a rebuild deletes and reinserts the affected keys.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "dao_metrics_day_bucket")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub date: Date,
    pub dao_id: String,
    pub token_id: String,
    /// TOTAL_SUPPLY | DELEGATED_SUPPLY | TRANSFER_VOLUME | TREASURY
    pub metric_type: String,
    #[sea_orm(column_type = "Decimal(Some((78, 18)))")]
    pub open: Decimal,
    #[sea_orm(column_type = "Decimal(Some((78, 18)))")]
    pub close: Decimal,
    #[sea_orm(column_type = "Decimal(Some((78, 18)))")]
    pub low: Decimal,
    #[sea_orm(column_type = "Decimal(Some((78, 18)))")]
    pub high: Decimal,
    #[sea_orm(column_type = "Decimal(Some((78, 18)))")]
    pub average: Decimal,
    #[sea_orm(column_type = "Decimal(Some((78, 18)))")]
    pub volume: Decimal,
    pub count: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
