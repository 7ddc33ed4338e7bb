pub use sea_orm_migration::prelude::*;

mod m20260612_000001_create_transfers;
mod m20260612_000002_create_balance_history;
mod m20260612_000003_create_delegations;
mod m20260612_000004_create_voting_power_history;
mod m20260613_000001_create_proposals;
mod m20260613_000002_create_votes_onchain;
mod m20260615_000001_create_dao_metrics_day_bucket;
mod m20260618_000001_add_history_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260612_000001_create_transfers::Migration),
            Box::new(m20260612_000002_create_balance_history::Migration),
            Box::new(m20260612_000003_create_delegations::Migration),
            Box::new(m20260612_000004_create_voting_power_history::Migration),
            Box::new(m20260613_000001_create_proposals::Migration),
            Box::new(m20260613_000002_create_votes_onchain::Migration),
            Box::new(m20260615_000001_create_dao_metrics_day_bucket::Migration),
            Box::new(m20260618_000001_add_history_indexes::Migration),
        ]
    }
}
