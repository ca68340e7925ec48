use anyhow::{Context, Result};
use sqlx::{Executor, PgPool, postgres::PgPoolOptions};
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::info;

use clicker_server::config::DbConfig;

/// Manages test database creation and cleanup
pub struct TestDatabase {
    /// Name of the test database
    pub name: String,
    /// Pool connected to the test database
    pub pool: PgPool,
    /// Connection to postgres database for cleanup
    admin_pool: PgPool,
}

// Global counter for unique database names
static DB_COUNTER: AtomicU32 = AtomicU32::new(0);

impl TestDatabase {
    /// Admin connection string, or `None` when the Postgres tests should be skipped
    pub fn admin_url() -> Option<String> {
        std::env::var("TEST_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .ok()
    }

    /// Create a new migrated test database with a unique name
    pub async fn new(admin_url: &str) -> Result<Self> {
        let counter = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let timestamp = chrono::Utc::now().timestamp_millis();
        let name = format!("clicker_test_{}_{}", timestamp, counter);

        info!("Creating test database: {}", name);

        let admin_pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(admin_url)
            .await
            .context("Failed to connect to postgres database")?;

        let create_query = format!("CREATE DATABASE \"{}\"", name);
        admin_pool
            .execute(create_query.as_str())
            .await
            .context("Failed to create test database")?;

        let mut db_config = DbConfig::from_url(admin_url)?;
        db_config.name = name.clone();

        // Run migrations
        mod migrations {
            use refinery::embed_migrations;
            embed_migrations!("./migrations");
        }
        migrations::migrations::runner()
            .run_async(&mut db_config.refinery_config())
            .await
            .context("Failed to run migrations")?;

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(&db_config.url())
            .await
            .context("Failed to connect to test database")?;

        Ok(Self { name, pool, admin_pool })
    }

    /// Drop the test database
    pub async fn cleanup(self) -> Result<()> {
        info!("Cleaning up test database: {}", self.name);

        self.pool.close().await;

        let drop_query = format!("DROP DATABASE \"{}\" WITH (FORCE)", self.name);
        self.admin_pool
            .execute(drop_query.as_str())
            .await
            .context("Failed to drop test database")?;

        self.admin_pool.close().await;
        Ok(())
    }
}
