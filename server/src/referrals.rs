use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::db::PlayerStore;
use crate::player_service::ServiceError;

const NAME_PREFIX_LEN: usize = 6;
const GOLD_RANKS: usize = 10;
const SILVER_RANKS: usize = 50;
/// Inviters earn 10% of each referred player's score.
const COMMISSION_DIVISOR: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RankTier {
    Gold,
    Silver,
    Bronze,
}

impl RankTier {
    /// Tier for a zero-based position in the score-ordered list.
    pub fn for_position(position: usize) -> Self {
        match position {
            p if p < GOLD_RANKS => RankTier::Gold,
            p if p < SILVER_RANKS => RankTier::Silver,
            _ => RankTier::Bronze,
        }
    }
}

/// One referred player as shown in the inviter's friends list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrenEntry {
    pub name: String,
    pub score: i64,
    pub rank: RankTier,
    pub commission: i64,
}

pub fn display_name(player_id: &str) -> String {
    let prefix: String = player_id.chars().take(NAME_PREFIX_LEN).collect();
    format!("User_{}", prefix)
}

pub fn commission(score: i64) -> i64 {
    score.div_euclid(COMMISSION_DIVISOR)
}

/// Read-only leaderboard of the players an inviter brought in.
#[derive(Clone)]
pub struct ReferralRanking {
    store: Arc<dyn PlayerStore>,
}

impl ReferralRanking {
    pub fn new(store: Arc<dyn PlayerStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, inviter_id: &str) -> Result<Vec<FrenEntry>, ServiceError> {
        if inviter_id.trim().is_empty() {
            return Err(ServiceError::Validation("Inviter ID required"));
        }

        let invited = self.store.list_by_inviter(inviter_id).await?;
        debug!("Inviter {} has {} referred players", inviter_id, invited.len());

        Ok(invited
            .into_iter()
            .enumerate()
            .map(|(position, player)| FrenEntry {
                name: display_name(&player.id),
                score: player.score,
                rank: RankTier::for_position(position),
                commission: commission(player.score),
            })
            .collect())
    }
}
