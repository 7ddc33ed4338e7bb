//! One-shot full rebuild of the derived day buckets for every tracked
//! DAO. Safe to rerun: the rebuild deletes and reinserts the affected
//! keys.
//!
//! Usage: cargo run --bin rebuild_day_buckets

use chrono::Utc;
use sea_orm::Database;
use std::env;

use govlens_backend::services::day_bucket::DayBucketAggregator;
use govlens_backend::services::governor::parse_dao_registry;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    dotenvy::dotenv().ok();

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let db = Database::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    let dao_registry = env::var("DAO_REGISTRY").unwrap_or_default();
    let daos = parse_dao_registry(&dao_registry).expect("Invalid DAO_REGISTRY");
    if daos.is_empty() {
        eprintln!("DAO_REGISTRY is empty, nothing to rebuild");
        return;
    }

    let aggregator = DayBucketAggregator::new(db);
    let today = Utc::now().date_naive();

    for dao in &daos {
        println!("Rebuilding day buckets for {}...", dao.dao_id);
        match aggregator.rebuild_dao(&dao.dao_id, &dao.token_id, today).await {
            Ok(stats) => {
                println!(
                    "  {} buckets written ({} stale rows deleted)",
                    stats.buckets_written, stats.buckets_deleted
                );
            }
            Err(e) => {
                eprintln!("  Failed: {}", e);
                std::process::exit(1);
            }
        }
    }

    println!("Done.");
}
