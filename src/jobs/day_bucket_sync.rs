use chrono::Utc;
use std::sync::Arc;
use tokio::time::{Duration, interval};

use crate::services::day_bucket::DayBucketAggregator;
use crate::services::governor::DaoConfig;

pub async fn start_day_bucket_sync_job(
    aggregator: Arc<DayBucketAggregator>,
    daos: Vec<DaoConfig>,
) {
    tokio::spawn(async move {
        let mut interval = interval(Duration::from_secs(3600)); // Every hour

        // Run immediately on startup
        tracing::info!("Running initial day bucket rebuild");
        rebuild_all(&aggregator, &daos).await;

        loop {
            interval.tick().await;
            tracing::info!("Starting scheduled day bucket rebuild");
            rebuild_all(&aggregator, &daos).await;
        }
    });
}

async fn rebuild_all(aggregator: &DayBucketAggregator, daos: &[DaoConfig]) {
    let today = Utc::now().date_naive();
    for dao in daos {
        match aggregator.rebuild_dao(&dao.dao_id, &dao.token_id, today).await {
            Ok(stats) => {
                tracing::info!(
                    dao_id = %dao.dao_id,
                    written = stats.buckets_written,
                    "Day bucket rebuild complete"
                );
            }
            Err(e) => {
                tracing::error!(dao_id = %dao.dao_id, "Failed to rebuild day buckets: {}", e);
            }
        }
    }
}
