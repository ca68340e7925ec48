use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use clicker_server::config::{ServerConfig, StoreBackend};
use clicker_server::db::PlayerStore;
use clicker_server::db::memory::MemoryPlayerStore;
use clicker_server::db::postgres::PgPlayerStore;
use clicker_server::http_server::{AppState, run_http_server};

mod migrations {
    use refinery::embed_migrations;
    embed_migrations!("./migrations");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if exists
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env()?;

    let store: Arc<dyn PlayerStore> = match &config.store {
        StoreBackend::Postgres(db_config) => {
            // Run migrations
            let mut refinery_config = db_config.refinery_config();
            migrations::migrations::runner()
                .run_async(&mut refinery_config)
                .await
                .context("Failed to run database migrations")?;
            info!("Database migrations completed");

            let db_pool = PgPoolOptions::new()
                .max_connections(db_config.max_connections)
                .connect(&db_config.url())
                .await
                .context("Failed to create PostgreSQL connection pool")?;

            Arc::new(PgPlayerStore::new(db_pool))
        }
        StoreBackend::Memory => {
            info!("Using in-memory player store; state is lost on restart");
            Arc::new(MemoryPlayerStore::new())
        }
    };

    let cancellation_token = CancellationToken::new();
    let server = tokio::spawn(run_http_server_task(
        config.http_addr.clone(),
        AppState::new(store),
        cancellation_token.clone(),
    ));

    // Wait for shutdown signal
    info!("Server started on {}. Waiting for shutdown signal (Ctrl+C)...", config.http_addr);
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for shutdown signal")?;
            info!("Received shutdown signal. Shutting down gracefully...");
            cancellation_token.cancel();
        }
        _ = cancellation_token.cancelled() => {}
    }

    server.await.context("HTTP server task panicked")??;
    info!("Server shut down successfully");
    Ok(())
}

async fn run_http_server_task(
    addr: String,
    state: AppState,
    cancellation_token: CancellationToken,
) -> Result<()> {
    let result = run_http_server(&addr, state, cancellation_token.clone()).await;
    // Unblock main if the server exits on its own
    cancellation_token.cancel();
    result
}
