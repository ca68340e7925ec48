use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::db::PlayerStore;
use crate::db::models::{
    BoostCounter, DAILY_ENERGY_FULL_COUNT, DAILY_TURBO_COUNT, MAX_ENERGY, PlayerRecord,
    ProgressUpdate,
};

/// The only boost bought with score rather than drawn from a daily counter.
pub const MULTI_CLICK_ITEM: &str = "multiClick";

/// Business-rule refusals of a boost request. Each maps to its own client message
/// so callers can tell "wait for tomorrow" apart from "never valid".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BoostRejection {
    #[error("Daily limit reached")]
    LimitReached,
    #[error("Insufficient score")]
    InsufficientScore,
    #[error("Invalid boost")]
    InvalidBoost,
    #[error("Invalid item to buy")]
    InvalidItem,
    #[error("Invalid price")]
    InvalidPrice,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(&'static str),
    #[error(transparent)]
    Rejected(#[from] BoostRejection),
    #[error("store error: {0:#}")]
    Store(#[from] anyhow::Error),
}

/// Player state as returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub score: i64,
    pub current_energy: i32,
    pub multi_click_level: i32,
    pub turbo_count: i32,
    pub energy_full_count: i32,
    pub max_energy: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoostOutcome {
    /// A daily counter was decremented; `remaining` is its new value.
    Consumed { remaining: i32 },
    /// A permanent upgrade was bought.
    Upgraded { new_score: i64, new_level: i32 },
}

/// True when the last reset happened on an earlier (or later) local calendar day.
/// A player that was never reset is always due.
pub fn needs_daily_reset(last_reset: Option<DateTime<Utc>>, now: DateTime<Local>) -> bool {
    match last_reset {
        Some(last) => last.with_timezone(&Local).date_naive() != now.date_naive(),
        None => true,
    }
}

#[derive(Clone)]
pub struct PlayerStateService {
    store: Arc<dyn PlayerStore>,
}

impl PlayerStateService {
    pub fn new(store: Arc<dyn PlayerStore>) -> Self {
        Self { store }
    }

    pub async fn get_or_create_player(&self, id: &str) -> Result<PlayerSnapshot, ServiceError> {
        self.get_or_create_player_at(id, Local::now()).await
    }

    /// Fetches the player, creating the row on first sight, and replenishes the
    /// daily boosts when `now` falls on a new calendar day.
    pub async fn get_or_create_player_at(
        &self,
        id: &str,
        now: DateTime<Local>,
    ) -> Result<PlayerSnapshot, ServiceError> {
        require_id(id)?;

        let mut player = match self.store.get_player(id).await? {
            Some(player) => player,
            None => {
                info!("Creating new player {}", id);
                self.store.insert_player(id).await?
            }
        };

        if needs_daily_reset(player.last_boost_reset, now) {
            let at = now.with_timezone(&Utc);
            let reset = self
                .store
                .reset_daily_boosts(
                    id,
                    DAILY_TURBO_COUNT,
                    DAILY_ENERGY_FULL_COUNT,
                    player.last_boost_reset,
                    at,
                )
                .await;

            match reset {
                Ok(true) => apply_daily_reset(&mut player, at),
                Ok(false) => {
                    // A concurrent request reset first and its boosts may already be spent
                    debug!("Daily reset for player {} already applied, re-reading", id);
                    match self.store.get_player(id).await {
                        Ok(Some(current)) => player = current,
                        Ok(None) => apply_daily_reset(&mut player, at),
                        Err(e) => {
                            error!("Failed to re-read player {} after daily reset: {:?}", id, e);
                            apply_daily_reset(&mut player, at);
                        }
                    }
                }
                // Gameplay continues on the in-memory values even if the write fails
                Err(e) => {
                    error!("Failed to persist daily boost reset for player {}: {:?}", id, e);
                    apply_daily_reset(&mut player, at);
                }
            }
        }

        Ok(PlayerSnapshot {
            score: player.score,
            current_energy: player.current_energy,
            multi_click_level: player.multi_level,
            turbo_count: player.turbo_count,
            energy_full_count: player.energy_full_count,
            max_energy: MAX_ENERGY,
        })
    }

    /// Overwrites the client-reported progress verbatim. No range checks are
    /// applied beyond the store's own constraints.
    pub async fn save_progress(&self, id: &str, update: ProgressUpdate) -> Result<(), ServiceError> {
        require_id(id)?;
        self.store.save_progress(id, &update).await?;
        Ok(())
    }

    /// Price 0 spends one daily boost; a positive price buys an upgrade with score.
    pub async fn apply_boost_transaction(
        &self,
        id: &str,
        item_name: &str,
        price: Option<i64>,
    ) -> Result<BoostOutcome, ServiceError> {
        require_id(id)?;
        if item_name.is_empty() {
            return Err(ServiceError::Validation("Missing required fields"));
        }

        match price {
            Some(0) => {
                let counter =
                    BoostCounter::from_item_name(item_name).ok_or(BoostRejection::InvalidBoost)?;
                match self.store.consume_boost(id, counter).await? {
                    Some(remaining) => {
                        info!("Player {} used {} ({} left)", id, item_name, remaining);
                        Ok(BoostOutcome::Consumed { remaining })
                    }
                    None => {
                        warn!("Player {} has no {} left", id, item_name);
                        Err(BoostRejection::LimitReached.into())
                    }
                }
            }
            Some(price) if price > 0 => {
                if item_name != MULTI_CLICK_ITEM {
                    return Err(BoostRejection::InvalidItem.into());
                }
                match self.store.purchase_multi_click(id, price).await? {
                    Some((new_score, new_level)) => {
                        info!("Player {} bought {} level {} for {}", id, item_name, new_level, price);
                        Ok(BoostOutcome::Upgraded { new_score, new_level })
                    }
                    None => {
                        warn!("Player {} cannot afford {} at {}", id, item_name, price);
                        Err(BoostRejection::InsufficientScore.into())
                    }
                }
            }
            _ => Err(BoostRejection::InvalidPrice.into()),
        }
    }
}

fn apply_daily_reset(player: &mut PlayerRecord, at: DateTime<Utc>) {
    player.turbo_count = DAILY_TURBO_COUNT;
    player.energy_full_count = DAILY_ENERGY_FULL_COUNT;
    player.last_boost_reset = Some(at);
}

fn require_id(id: &str) -> Result<(), ServiceError> {
    if id.trim().is_empty() {
        return Err(ServiceError::Validation("User ID required"));
    }
    Ok(())
}
