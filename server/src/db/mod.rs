pub mod memory;
pub mod models;
pub mod postgres;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use models::*;

/// Durable player state. Implementations must apply `consume_boost` and
/// `purchase_multi_click` as single conditional updates so concurrent requests
/// for the same player cannot both pass the precondition.
#[async_trait]
pub trait PlayerStore: Send + Sync {
    async fn ping(&self) -> Result<()>;

    // Player rows
    async fn get_player(&self, id: &str) -> Result<Option<PlayerRecord>>;
    async fn insert_player(&self, id: &str) -> Result<PlayerRecord>;
    /// Applies the reset only if `last_boost_reset` still equals `previous`.
    /// Returns false when another request reset the row first.
    async fn reset_daily_boosts(
        &self,
        id: &str,
        turbo_count: i32,
        energy_full_count: i32,
        previous: Option<DateTime<Utc>>,
        at: DateTime<Utc>,
    ) -> Result<bool>;
    async fn save_progress(&self, id: &str, update: &ProgressUpdate) -> Result<()>;

    // Conditional updates; `None` means no row satisfied the predicate
    async fn consume_boost(&self, id: &str, counter: BoostCounter) -> Result<Option<i32>>; // Returns remaining count
    async fn purchase_multi_click(&self, id: &str, price: i64) -> Result<Option<(i64, i32)>>; // Returns (score, multi_level)

    // Referrals, ordered by score descending then id ascending
    async fn list_by_inviter(&self, inviter_id: &str) -> Result<Vec<PlayerRecord>>;
}
