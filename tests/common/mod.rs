//! Shared test helpers: in-process mock per-DAO backends for the
//! cross-DAO aggregation suite.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use govlens_backend::models::delegation::DelegationPercentageResponse;
use govlens_backend::services::cross_dao::UPSTREAM_PATH;

/// How a mock upstream answers
#[derive(Clone)]
pub enum UpstreamBehavior {
    /// Always answer 200 with this body
    Ok(DelegationPercentageResponse),
    /// Always answer this status with an empty body
    Fail(StatusCode),
    /// Fail the first `n` requests with 500, then answer 200
    FailFirst(usize, DelegationPercentageResponse),
}

pub struct MockUpstream {
    pub base_url: String,
    hits: Arc<AtomicUsize>,
}

impl MockUpstream {
    pub fn hit_count(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

struct MockState {
    behavior: UpstreamBehavior,
    hits: Arc<AtomicUsize>,
}

async fn serve_series(State(state): State<Arc<MockState>>) -> axum::response::Response {
    let hit = state.hits.fetch_add(1, Ordering::SeqCst);
    match &state.behavior {
        UpstreamBehavior::Ok(response) => Json(response.clone()).into_response(),
        UpstreamBehavior::Fail(status) => (*status).into_response(),
        UpstreamBehavior::FailFirst(n, response) => {
            if hit < *n {
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            } else {
                Json(response.clone()).into_response()
            }
        }
    }
}

/// Bind a mock per-DAO backend on an ephemeral local port
pub async fn spawn_upstream(behavior: UpstreamBehavior) -> MockUpstream {
    let hits = Arc::new(AtomicUsize::new(0));
    let state = Arc::new(MockState {
        behavior,
        hits: hits.clone(),
    });

    let app = Router::new()
        .route(UPSTREAM_PATH, get(serve_series))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock upstream");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockUpstream {
        base_url: format!("http://{}", addr),
        hits,
    }
}
