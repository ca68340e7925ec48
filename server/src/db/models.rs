use chrono::{DateTime, Utc};

/// Energy cap reported to clients. The server does not enforce it on save.
pub const MAX_ENERGY: i32 = 1000;

/// Daily allowance restored by the boost reset.
pub const DAILY_TURBO_COUNT: i32 = 6;
pub const DAILY_ENERGY_FULL_COUNT: i32 = 12;

/// Column defaults applied when a player row is created with only its id.
pub const DEFAULT_CURRENT_ENERGY: i32 = MAX_ENERGY;
pub const DEFAULT_MULTI_LEVEL: i32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct PlayerRecord {
    pub id: String,
    pub score: i64,
    pub current_energy: i32,
    pub multi_level: i32,
    pub turbo_count: i32,
    pub energy_full_count: i32,
    pub last_boost_reset: Option<DateTime<Utc>>,
    pub inviter_id: Option<String>,
}

impl PlayerRecord {
    /// A fresh row carrying the store's column defaults.
    pub fn with_defaults(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            score: 0,
            current_energy: DEFAULT_CURRENT_ENERGY,
            multi_level: DEFAULT_MULTI_LEVEL,
            turbo_count: DAILY_TURBO_COUNT,
            energy_full_count: DAILY_ENERGY_FULL_COUNT,
            last_boost_reset: None,
            inviter_id: None,
        }
    }
}

/// Daily consumable counters that a zero-priced boost decrements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoostCounter {
    Turbo,
    EnergyFull,
}

impl BoostCounter {
    /// Maps the client-facing boost name. `multiClick` is a purchase, not a counter.
    pub fn from_item_name(name: &str) -> Option<Self> {
        match name {
            "turbo" => Some(BoostCounter::Turbo),
            "energyFull" => Some(BoostCounter::EnergyFull),
            _ => None,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            BoostCounter::Turbo => "turbo_count",
            BoostCounter::EnergyFull => "energy_full_count",
        }
    }
}

/// Client-reported progress. Counters left as `None` keep their stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub score: i64,
    pub current_energy: i32,
    pub turbo_count: Option<i32>,
    pub energy_full_count: Option<i32>,
}
