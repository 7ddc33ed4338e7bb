// src/lib.rs

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use services::cross_dao::CrossDaoAggregationService;
use services::dao_params::DaoParamsService;
use services::day_bucket::DayBucketAggregator;
use services::governor::DaoConfig;
use services::ingest::IngestService;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub daos: Arc<Vec<DaoConfig>>,
    pub ingest: Arc<IngestService>,
    pub aggregation: Arc<CrossDaoAggregationService>,
    pub dao_params: DaoParamsService,
    pub day_buckets: Arc<DayBucketAggregator>,
}

pub mod entities {
    pub mod prelude;

    pub mod balance_history;
    pub mod dao_metrics_day_bucket;
    pub mod delegations;
    pub mod proposals;
    pub mod transfers;
    pub mod votes_onchain;
    pub mod voting_power_history;
}

pub mod services {
    pub mod balance_ledger;
    pub mod cross_dao;
    pub mod dao_params;
    pub mod day_bucket;
    pub mod governor;
    pub mod ingest;
    pub mod ledger;
    pub mod normalizer;
    pub mod proposal_tracker;
    pub mod voting_power_ledger;
}

pub mod models;
pub mod handlers;
pub mod jobs;
