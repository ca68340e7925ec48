use anyhow::Result;
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::api::{boosts, error::not_found, frens, health, user};
use crate::db::PlayerStore;
use crate::player_service::PlayerStateService;
use crate::referrals::ReferralRanking;

/// Shared handler state. All durable state lives behind `store`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PlayerStore>,
    pub players: PlayerStateService,
    pub referrals: ReferralRanking,
}

impl AppState {
    pub fn new(store: Arc<dyn PlayerStore>) -> Self {
        Self {
            players: PlayerStateService::new(store.clone()),
            referrals: ReferralRanking::new(store.clone()),
            store,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Unsupported methods on known paths answer 404, same as unknown paths
    Router::new()
        .route("/health", get(health::health_check).fallback(not_found))
        .route("/api/health", get(health::health_check_json).fallback(not_found))
        .route(
            "/api/user",
            get(user::get_user).post(user::save_user).fallback(not_found),
        )
        .route("/api/frens/list", get(frens::list_frens).fallback(not_found))
        .route("/api/boosts/buy", post(boosts::buy_boost).fallback(not_found))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind `addr` and serve until `cancellation_token` is cancelled
pub async fn run_http_server(
    addr: &str,
    state: AppState,
    cancellation_token: CancellationToken,
) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    run_http_server_with_listener(listener, state, cancellation_token).await
}

pub async fn run_http_server_with_listener(
    listener: TcpListener,
    state: AppState,
    cancellation_token: CancellationToken,
) -> Result<()> {
    let app = build_router(state);
    info!("HTTP server listening on {}", listener.local_addr()?);

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            cancellation_token.cancelled().await;
            info!("HTTP server received shutdown signal");
        })
        .await
        .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))
}
