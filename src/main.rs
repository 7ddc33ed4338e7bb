use axum::{Router, routing::get, routing::post};
use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use govlens_backend::handlers;
use govlens_backend::services::cross_dao::{CrossDaoAggregationService, parse_backend_registry};
use govlens_backend::services::dao_params::{DaoParamsService, TtlPolicy};
use govlens_backend::services::day_bucket::DayBucketAggregator;
use govlens_backend::services::governor::{Governor, parse_dao_registry};
use govlens_backend::services::ingest::IngestService;
use govlens_backend::AppState;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,govlens_backend=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    // Connect to database
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    tracing::info!("Connecting to database...");
    let db = Database::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    // Run migrations
    tracing::info!("Running migrations...");
    migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    // Tracked DAOs: daoId:tokenAddress:family,...
    let dao_registry = env::var("DAO_REGISTRY").unwrap_or_default();
    let daos = parse_dao_registry(&dao_registry).expect("Invalid DAO_REGISTRY");
    tracing::info!("Tracking {} DAO(s)", daos.len());

    // Per-DAO backends the aggregate endpoint fans out to: daoId=baseUrl,...
    let backend_registry = env::var("DAO_BACKENDS").unwrap_or_default();
    let backends = parse_backend_registry(&backend_registry).expect("Invalid DAO_BACKENDS");
    tracing::info!("Aggregating over {} per-DAO backend(s)", backends.len());

    let ingest = Arc::new(IngestService::new(db.clone(), &daos));
    tracing::info!("Rehydrating ledger streams...");
    ingest
        .rehydrate_all()
        .await
        .expect("Failed to rehydrate ledger streams");

    let params_ttl_minutes = env::var("DAO_PARAMS_TTL_MINUTES")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(10);
    let governors: HashMap<String, Governor> = daos
        .iter()
        .map(|dao| {
            (
                dao.dao_id.clone(),
                Governor::with_default_params(dao.family),
            )
        })
        .collect();
    let dao_params = DaoParamsService::new(governors, TtlPolicy::minutes(params_ttl_minutes));

    let day_buckets = Arc::new(DayBucketAggregator::new(db.clone()));
    let aggregation = Arc::new(CrossDaoAggregationService::over_http(backends));

    // Periodic bucket rebuilds
    govlens_backend::jobs::day_bucket_sync::start_day_bucket_sync_job(
        day_buckets.clone(),
        daos.clone(),
    )
    .await;

    let state = AppState {
        db,
        daos: Arc::new(daos),
        ingest,
        aggregation,
        dao_params,
        day_buckets,
    };

    // Build router
    let app = Router::new()
        .route("/", get(hello_govlens))
        .route("/daos", get(handlers::dao::list_daos))
        .route("/daos/{dao_id}/events", post(handlers::event::ingest_events))
        .route("/daos/{dao_id}/params", get(handlers::dao::get_dao_params))
        .route(
            "/daos/{dao_id}/day-buckets/rebuild",
            post(handlers::dao::rebuild_day_buckets),
        )
        .route(
            "/accounts/{address}/balances/historical",
            get(handlers::balance::historical_balances),
        )
        .route(
            "/account-balance/interactions",
            get(handlers::balance::account_interactions),
        )
        .route(
            "/voting-powers/{account}",
            get(handlers::voting_power::voting_powers),
        )
        .route(
            "/delegation-percentage",
            get(handlers::delegation::delegation_percentage),
        )
        .route(
            "/delegation-percentage-by-day",
            get(handlers::delegation::delegation_percentage),
        )
        .route(
            "/v1/delegated-percentage",
            get(handlers::aggregate::delegated_percentage),
        )
        .route("/proposals", get(handlers::proposal::list_proposals))
        .route(
            "/proposals/{proposal_id}",
            get(handlers::proposal::get_proposal),
        )
        .route(
            "/proposals/{proposal_id}/votes",
            get(handlers::proposal::get_proposal_votes),
        )
        .route(
            "/dao-metrics-day-buckets",
            get(handlers::day_bucket::day_buckets),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    // Start server
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .unwrap();

    tracing::info!("Server listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}

async fn hello_govlens() -> &'static str {
    "govlens backend up"
}
