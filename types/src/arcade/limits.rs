use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{
    GameId, BALLOON_DAILY_ROUNDS, NEON_HOCKEY_DAILY_ROUNDS, TRIUMPH_DAILY_SECONDS,
    TRUE_WAR_DAILY_ROUNDS,
};

/// Daily budget applied to a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LimitPolicy {
    Unlimited,
    /// Maximum rounds started per calendar day.
    Rounds(u32),
    /// Maximum seconds of play per calendar day.
    Seconds(u32),
}

impl LimitPolicy {
    /// Default policy shipped with the arcade.
    pub fn default_for(game: GameId) -> Self {
        match game {
            GameId::Balloon => LimitPolicy::Rounds(BALLOON_DAILY_ROUNDS),
            GameId::TrueWar => LimitPolicy::Rounds(TRUE_WAR_DAILY_ROUNDS),
            GameId::NeonHockey => LimitPolicy::Rounds(NEON_HOCKEY_DAILY_ROUNDS),
            GameId::Triumph => LimitPolicy::Seconds(TRIUMPH_DAILY_SECONDS),
            GameId::Rocket | GameId::Mines | GameId::TradeBoss => LimitPolicy::Unlimited,
        }
    }
}

/// Per-day usage counters, persisted under [`super::LIMITS_KEY`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameLimits {
    pub date: NaiveDate,
    #[serde(default)]
    pub per_game_counters: BTreeMap<GameId, u32>,
    #[serde(default)]
    pub per_game_seconds: BTreeMap<GameId, u32>,
}

impl GameLimits {
    pub fn fresh(today: NaiveDate) -> Self {
        Self {
            date: today,
            per_game_counters: BTreeMap::new(),
            per_game_seconds: BTreeMap::new(),
        }
    }

    pub fn is_current(&self, today: NaiveDate) -> bool {
        self.date == today
    }

    /// Reset all counters if `today` differs from the stored date.
    ///
    /// Returns true when a reset happened.
    pub fn roll_over(&mut self, today: NaiveDate) -> bool {
        if self.is_current(today) {
            return false;
        }
        *self = Self::fresh(today);
        true
    }

    pub fn rounds_played(&self, game: GameId) -> u32 {
        self.per_game_counters.get(&game).copied().unwrap_or(0)
    }

    pub fn seconds_used(&self, game: GameId) -> u32 {
        self.per_game_seconds.get(&game).copied().unwrap_or(0)
    }

    pub fn increment_rounds(&mut self, game: GameId) -> u32 {
        let count = self.per_game_counters.entry(game).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    pub fn add_seconds(&mut self, game: GameId, seconds: u32) -> u32 {
        let used = self.per_game_seconds.entry(game).or_insert(0);
        *used = used.saturating_add(seconds);
        *used
    }
}
