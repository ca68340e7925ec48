use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use super::PlayerStore;
use super::models::*;

/// In-process store for local runs and tests. Every operation holds the map
/// lock for its whole read-check-write, which makes the conditional updates
/// atomic in the same way a single SQL `UPDATE ... WHERE` is.
#[derive(Clone, Default)]
pub struct MemoryPlayerStore {
    players: Arc<Mutex<HashMap<String, PlayerRecord>>>,
}

impl MemoryPlayerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a full row, bypassing service rules.
    pub async fn put_player(&self, player: PlayerRecord) {
        self.players.lock().await.insert(player.id.clone(), player);
    }

    pub async fn player_count(&self) -> usize {
        self.players.lock().await.len()
    }
}

fn check_non_negative(column: &str, value: i64) -> Result<()> {
    if value < 0 {
        bail!("check constraint violated: {} must be non-negative, got {}", column, value);
    }
    Ok(())
}

#[async_trait]
impl PlayerStore for MemoryPlayerStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn get_player(&self, id: &str) -> Result<Option<PlayerRecord>> {
        Ok(self.players.lock().await.get(id).cloned())
    }

    async fn insert_player(&self, id: &str) -> Result<PlayerRecord> {
        let mut players = self.players.lock().await;
        let player = players
            .entry(id.to_string())
            .or_insert_with(|| {
                debug!("Created player {}", id);
                PlayerRecord::with_defaults(id)
            })
            .clone();
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
        check_non_negative("turbo_count", turbo_count.into())?;
        check_non_negative("energy_full_count", energy_full_count.into())?;

        let mut players = self.players.lock().await;
        match players.get_mut(id) {
            Some(player) if player.last_boost_reset == previous => {
                player.turbo_count = turbo_count;
                player.energy_full_count = energy_full_count;
                player.last_boost_reset = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn save_progress(&self, id: &str, update: &ProgressUpdate) -> Result<()> {
        check_non_negative("score", update.score)?;
        if let Some(turbo) = update.turbo_count {
            check_non_negative("turbo_count", turbo.into())?;
        }
        if let Some(energy_full) = update.energy_full_count {
            check_non_negative("energy_full_count", energy_full.into())?;
        }

        // Unknown ids match no row, same as an UPDATE with zero affected rows
        if let Some(player) = self.players.lock().await.get_mut(id) {
            player.score = update.score;
            player.current_energy = update.current_energy;
            if let Some(turbo) = update.turbo_count {
                player.turbo_count = turbo;
            }
            if let Some(energy_full) = update.energy_full_count {
                player.energy_full_count = energy_full;
            }
        }
        Ok(())
    }

    async fn consume_boost(&self, id: &str, counter: BoostCounter) -> Result<Option<i32>> {
        let mut players = self.players.lock().await;
        let Some(player) = players.get_mut(id) else {
            return Ok(None);
        };

        let slot = match counter {
            BoostCounter::Turbo => &mut player.turbo_count,
            BoostCounter::EnergyFull => &mut player.energy_full_count,
        };
        if *slot < 1 {
            return Ok(None);
        }
        *slot -= 1;
        Ok(Some(*slot))
    }

    async fn purchase_multi_click(&self, id: &str, price: i64) -> Result<Option<(i64, i32)>> {
        let mut players = self.players.lock().await;
        let Some(player) = players.get_mut(id) else {
            return Ok(None);
        };

        if player.score < price {
            return Ok(None);
        }
        let level = player
            .multi_level
            .checked_add(1)
            .ok_or_else(|| anyhow!("multi_level overflow for player {}", id))?;
        player.score -= price;
        player.multi_level = level;
        Ok(Some((player.score, player.multi_level)))
    }

    async fn list_by_inviter(&self, inviter_id: &str) -> Result<Vec<PlayerRecord>> {
        let players = self.players.lock().await;
        let mut invited: Vec<PlayerRecord> = players
            .values()
            .filter(|p| p.inviter_id.as_deref() == Some(inviter_id))
            .cloned()
            .collect();
        invited.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        Ok(invited)
    }
}
