use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;

use super::PlayerStore;
use super::models::*;

const PLAYER_COLUMNS: &str = "id, score, current_energy, multi_level, turbo_count, \
     energy_full_count, last_boost_reset, inviter_id";

pub struct PgPlayerStore {
    pool: PgPool,
}

impl PgPlayerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlayerStore for PgPlayerStore {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Database ping failed")?;
        Ok(())
    }

    async fn get_player(&self, id: &str) -> Result<Option<PlayerRecord>> {
        let query = format!("SELECT {} FROM players WHERE id = $1", PLAYER_COLUMNS);
        sqlx::query_as::<_, PlayerRecord>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to fetch player {}", id))
    }

    async fn insert_player(&self, id: &str) -> Result<PlayerRecord> {
        // A concurrent first visit may have created the row already
        let query = format!(
            "INSERT INTO players (id) VALUES ($1) \
             ON CONFLICT (id) DO UPDATE SET id = EXCLUDED.id \
             RETURNING {}",
            PLAYER_COLUMNS
        );
        let player = sqlx::query_as::<_, PlayerRecord>(&query)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("Failed to create player {}", id))?;

        debug!("Created player {}", id);
        Ok(player)
    }

    async fn reset_daily_boosts(
        &self,
        id: &str,
        turbo_count: i32,
        energy_full_count: i32,
        previous: Option<DateTime<Utc>>,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE players SET turbo_count = $2, energy_full_count = $3, last_boost_reset = $4 \
             WHERE id = $1 AND last_boost_reset IS NOT DISTINCT FROM $5",
        )
        .bind(id)
        .bind(turbo_count)
        .bind(energy_full_count)
        .bind(at)
        .bind(previous)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to reset daily boosts for player {}", id))?;
        Ok(result.rows_affected() == 1)
    }

    async fn save_progress(&self, id: &str, update: &ProgressUpdate) -> Result<()> {
        let result = sqlx::query(
            "UPDATE players SET score = $2, current_energy = $3, \
             turbo_count = COALESCE($4, turbo_count), \
             energy_full_count = COALESCE($5, energy_full_count) \
             WHERE id = $1",
        )
        .bind(id)
        .bind(update.score)
        .bind(update.current_energy)
        .bind(update.turbo_count)
        .bind(update.energy_full_count)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to save progress for player {}", id))?;

        debug!("Saved progress for player {} ({} rows)", id, result.rows_affected());
        Ok(())
    }

    async fn consume_boost(&self, id: &str, counter: BoostCounter) -> Result<Option<i32>> {
        // Column name comes from a closed enum, never from the request
        let column = counter.column();
        let query = format!(
            "UPDATE players SET {col} = {col} - 1 WHERE id = $1 AND {col} >= 1 RETURNING {col}",
            col = column
        );
        sqlx::query_scalar::<_, i32>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to decrement {} for player {}", column, id))
    }

    async fn purchase_multi_click(&self, id: &str, price: i64) -> Result<Option<(i64, i32)>> {
        sqlx::query_as::<_, (i64, i32)>(
            "UPDATE players SET score = score - $2, multi_level = multi_level + 1 \
             WHERE id = $1 AND score >= $2 \
             RETURNING score, multi_level",
        )
        .bind(id)
        .bind(price)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Failed to purchase multiClick for player {}", id))
    }

    async fn list_by_inviter(&self, inviter_id: &str) -> Result<Vec<PlayerRecord>> {
        let query = format!(
            "SELECT {} FROM players WHERE inviter_id = $1 ORDER BY score DESC, id ASC",
            PLAYER_COLUMNS
        );
        sqlx::query_as::<_, PlayerRecord>(&query)
            .bind(inviter_id)
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("Failed to list players invited by {}", inviter_id))
    }
}
