//! Game registry: configuration and metadata for every arcade game.
//!
//! The registry provides:
//! - Centralized listing of the arcade's games
//! - Per-game configuration for the engine-backed games, with defaults
//! - Active/inactive game filtering
//! - Metadata for UI display (names, descriptions, categories, daily limits)
//!
//! # Example
//! ```rust,ignore
//! use arcade_execution::games::registry::{GameRegistry, GameCategory};
//! use arcade_types::GameId;
//!
//! let registry = GameRegistry::default();
//! assert!(registry.is_active(GameId::Rocket));
//! assert_eq!(GameRegistry::get_info(GameId::Rocket).category, GameCategory::Crash);
//! ```

use super::GameError;
use arcade_types::{arcade::*, GameId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-game configuration values for the engine-backed games.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "game", rename_all = "camelCase")]
pub enum GameConfig {
    Balloon(BalloonConfig),
    Rocket(RocketConfig),
    Mines(MinesConfig),
    TradeBoss(LeverageConfig),
}

impl GameConfig {
    /// Default configuration, or `None` for games without a round engine.
    pub fn default_for(game: GameId) -> Option<Self> {
        match game {
            GameId::Balloon => Some(Self::Balloon(BalloonConfig::default())),
            GameId::Rocket => Some(Self::Rocket(RocketConfig::default())),
            GameId::Mines => Some(Self::Mines(MinesConfig::default())),
            GameId::TradeBoss => Some(Self::TradeBoss(LeverageConfig::default())),
            GameId::TrueWar | GameId::NeonHockey | GameId::Triumph => None,
        }
    }

    pub fn game(&self) -> GameId {
        match self {
            Self::Balloon(_) => GameId::Balloon,
            Self::Rocket(_) => GameId::Rocket,
            Self::Mines(_) => GameId::Mines,
            Self::TradeBoss(_) => GameId::TradeBoss,
        }
    }

    pub fn validate(&self) -> Result<(), GameError> {
        match self {
            Self::Balloon(c) => c.validate(),
            Self::Rocket(c) => c.validate(),
            Self::Mines(c) => c.validate(),
            Self::TradeBoss(c) => c.validate(),
        }
    }
}

// ============================================================================
// Per-game configuration structs
// ============================================================================

/// Balloon: profit-only crash curve `base_value * growth_rate^seconds`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BalloonConfig {
    pub base_value: f64,
    pub growth_rate: f64,
    pub min_crash_ms: u64,
    pub max_crash_ms: u64,
    pub tick_ms: u64,
    pub cooldown_ms: u64,
}

impl Default for BalloonConfig {
    fn default() -> Self {
        Self {
            base_value: BALLOON_BASE_VALUE,
            growth_rate: BALLOON_GROWTH_RATE,
            min_crash_ms: BALLOON_MIN_CRASH_MS,
            max_crash_ms: BALLOON_MAX_CRASH_MS,
            tick_ms: FRAME_TICK_MS,
            cooldown_ms: BALLOON_COOLDOWN_MS,
        }
    }
}

impl BalloonConfig {
    pub fn validate(&self) -> Result<(), GameError> {
        if !(self.base_value > 0.0) {
            return Err(GameError::InvalidConfig("balloon base value must be positive"));
        }
        if !(self.growth_rate > 1.0) {
            return Err(GameError::InvalidConfig("balloon growth rate must exceed 1"));
        }
        if self.min_crash_ms > self.max_crash_ms {
            return Err(GameError::InvalidConfig("balloon crash window is empty"));
        }
        if self.tick_ms == 0 {
            return Err(GameError::InvalidConfig("balloon tick must be non-zero"));
        }
        Ok(())
    }
}

/// Rocket: staked crash curve `exp(growth_k * seconds)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RocketConfig {
    pub growth_k: f64,
    pub target_rtp: f64,
    pub max_crash_multiplier: f64,
    pub min_crash_ms: u64,
    pub tick_ms: u64,
    pub win_cooldown_ms: u64,
    pub loss_cooldown_ms: u64,
}

impl Default for RocketConfig {
    fn default() -> Self {
        Self {
            growth_k: ROCKET_GROWTH_K,
            target_rtp: ROCKET_TARGET_RTP,
            max_crash_multiplier: ROCKET_MAX_CRASH_MULTIPLIER,
            min_crash_ms: ROCKET_MIN_CRASH_MS,
            tick_ms: FRAME_TICK_MS,
            win_cooldown_ms: ROCKET_WIN_COOLDOWN_MS,
            loss_cooldown_ms: ROCKET_LOSS_COOLDOWN_MS,
        }
    }
}

impl RocketConfig {
    pub fn validate(&self) -> Result<(), GameError> {
        if !(self.growth_k > 0.0) {
            return Err(GameError::InvalidConfig("rocket growth constant must be positive"));
        }
        if !(self.target_rtp > 0.0 && self.target_rtp <= 1.0) {
            return Err(GameError::InvalidConfig("rocket target rtp must be in (0, 1]"));
        }
        if !(self.max_crash_multiplier > 1.0) {
            return Err(GameError::InvalidConfig("rocket max crash multiplier must exceed 1"));
        }
        if self.tick_ms == 0 {
            return Err(GameError::InvalidConfig("rocket tick must be non-zero"));
        }
        Ok(())
    }
}

/// Mines: one failure cell per row, multiplier `growth_factor^(row + 1)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MinesConfig {
    pub columns: u8,
    pub growth_factor: f64,
    pub initial_rows: usize,
    pub refill_rows: usize,
    pub refill_margin: usize,
}

impl Default for MinesConfig {
    fn default() -> Self {
        Self {
            columns: MINES_COLUMNS,
            growth_factor: MINES_GROWTH_FACTOR,
            initial_rows: MINES_INITIAL_ROWS,
            refill_rows: MINES_REFILL_ROWS,
            refill_margin: MINES_REFILL_MARGIN,
        }
    }
}

impl MinesConfig {
    pub fn validate(&self) -> Result<(), GameError> {
        if self.columns < 2 {
            return Err(GameError::InvalidConfig("mines needs at least two columns"));
        }
        if !(self.growth_factor > 1.0) {
            return Err(GameError::InvalidConfig("mines growth factor must exceed 1"));
        }
        if self.initial_rows == 0 || self.refill_rows == 0 {
            return Err(GameError::InvalidConfig("mines row counts must be non-zero"));
        }
        if self.refill_margin == 0 {
            return Err(GameError::InvalidConfig("mines refill margin must be non-zero"));
        }
        Ok(())
    }
}

/// Trade Boss: leveraged position on a random-walk price.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LeverageConfig {
    pub initial_price: f64,
    pub tick_ms: u64,
    pub volatility: f64,
    pub trend_amplitude: f64,
    pub trend_period_ms: f64,
    pub min_price: f64,
    pub leverage: f64,
    pub history_len: usize,
}

impl Default for LeverageConfig {
    fn default() -> Self {
        Self {
            initial_price: LEVERAGE_INITIAL_PRICE,
            tick_ms: LEVERAGE_TICK_MS,
            volatility: LEVERAGE_VOLATILITY,
            trend_amplitude: LEVERAGE_TREND_AMPLITUDE,
            trend_period_ms: LEVERAGE_TREND_PERIOD_MS,
            min_price: LEVERAGE_MIN_PRICE,
            leverage: LEVERAGE_FACTOR,
            history_len: LEVERAGE_HISTORY_LEN,
        }
    }
}

impl LeverageConfig {
    pub fn validate(&self) -> Result<(), GameError> {
        if !(self.min_price > 0.0) || self.initial_price < self.min_price {
            return Err(GameError::InvalidConfig("leverage prices must be positive"));
        }
        if !(self.trend_period_ms > 0.0) {
            return Err(GameError::InvalidConfig("leverage trend period must be positive"));
        }
        if !(self.leverage > 0.0) {
            return Err(GameError::InvalidConfig("leverage factor must be positive"));
        }
        if self.tick_ms == 0 || self.history_len == 0 {
            return Err(GameError::InvalidConfig("leverage tick and history must be non-zero"));
        }
        Ok(())
    }
}

// ============================================================================
// Game metadata
// ============================================================================

/// Game category for UI organization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameCategory {
    /// Continuous-time crash curves (Balloon, Rocket).
    Crash,
    /// Discrete ladders (Mines).
    Ladder,
    /// Price-tracking games (Trade Boss).
    Trading,
    /// Skill games without a round engine, gated by daily limits only.
    Skill,
}

/// Metadata about a game for UI display.
#[derive(Clone, Debug)]
pub struct GameInfo {
    pub game: GameId,
    pub name: &'static str,
    pub description: &'static str,
    pub category: GameCategory,
    /// Minimum stake (zero for games without an up-front stake).
    pub min_stake: u64,
    pub max_stake: u64,
    pub limit: LimitPolicy,
    pub active: bool,
}

impl GameInfo {
    const fn new(
        game: GameId,
        name: &'static str,
        description: &'static str,
        category: GameCategory,
        min_stake: u64,
        max_stake: u64,
        limit: LimitPolicy,
    ) -> Self {
        Self {
            game,
            name,
            description,
            category,
            min_stake,
            max_stake,
            limit,
            active: true,
        }
    }

    pub fn accepts_stake(&self, stake: u64) -> bool {
        (self.min_stake..=self.max_stake).contains(&stake)
    }
}

// ============================================================================
// Game registry
// ============================================================================

/// Registry of arcade games and their configurations.
#[derive(Clone, Debug)]
pub struct GameRegistry {
    configs: HashMap<GameId, GameConfig>,
    active: HashMap<GameId, bool>,
}

impl Default for GameRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl GameRegistry {
    /// Create a registry with every game active and default configurations.
    pub fn new() -> Self {
        let mut configs = HashMap::new();
        let mut active = HashMap::new();

        for &game in Self::all_games() {
            if let Some(config) = GameConfig::default_for(game) {
                configs.insert(game, config);
            }
            active.insert(game, true);
        }

        Self { configs, active }
    }

    pub fn all_games() -> &'static [GameId] {
        &GameId::ALL
    }

    /// Static metadata for a game.
    pub fn get_info(game: GameId) -> GameInfo {
        match game {
            GameId::Balloon => GameInfo::new(
                GameId::Balloon,
                "Balloon",
                "Pump the balloon and bank the profit before it pops.",
                GameCategory::Crash,
                0,
                0,
                LimitPolicy::default_for(GameId::Balloon),
            ),
            GameId::Rocket => GameInfo::new(
                GameId::Rocket,
                "Lucky Jet",
                "Ride the multiplier and cash out before the crash.",
                GameCategory::Crash,
                1,
                100_000,
                LimitPolicy::default_for(GameId::Rocket),
            ),
            GameId::Mines => GameInfo::new(
                GameId::Mines,
                "Minesweeper",
                "Climb row by row, one hidden mine per row.",
                GameCategory::Ladder,
                1,
                100_000,
                LimitPolicy::default_for(GameId::Mines),
            ),
            GameId::TradeBoss => GameInfo::new(
                GameId::TradeBoss,
                "Trade Boss",
                "Go long or short on a live price with 100x leverage.",
                GameCategory::Trading,
                1,
                100_000,
                LimitPolicy::default_for(GameId::TradeBoss),
            ),
            GameId::TrueWar => GameInfo::new(
                GameId::TrueWar,
                "True War",
                "One battle per day.",
                GameCategory::Skill,
                0,
                0,
                LimitPolicy::default_for(GameId::TrueWar),
            ),
            GameId::NeonHockey => GameInfo::new(
                GameId::NeonHockey,
                "Neon Hockey",
                "Air hockey against the machine.",
                GameCategory::Skill,
                0,
                0,
                LimitPolicy::default_for(GameId::NeonHockey),
            ),
            GameId::Triumph => GameInfo::new(
                GameId::Triumph,
                "Triumph",
                "A minute of play per day.",
                GameCategory::Skill,
                0,
                0,
                LimitPolicy::default_for(GameId::Triumph),
            ),
        }
    }

    pub fn is_active(&self, game: GameId) -> bool {
        self.active.get(&game).copied().unwrap_or(false)
    }

    pub fn set_active(&mut self, game: GameId, active: bool) {
        self.active.insert(game, active);
    }

    /// Fail with [`GameError::InactiveGame`] unless `game` is active.
    pub fn ensure_active(&self, game: GameId) -> Result<(), GameError> {
        if self.is_active(game) {
            Ok(())
        } else {
            Err(GameError::InactiveGame { game })
        }
    }

    pub fn active_games(&self) -> Vec<GameId> {
        Self::all_games()
            .iter()
            .copied()
            .filter(|game| self.is_active(*game))
            .collect()
    }

    pub fn get_config(&self, game: GameId) -> Option<&GameConfig> {
        self.configs.get(&game)
    }

    /// Replace a game's configuration after validating it.
    pub fn set_config(&mut self, config: GameConfig) -> Result<(), GameError> {
        config.validate()?;
        self.configs.insert(config.game(), config);
        Ok(())
    }

    pub fn balloon_config(&self) -> BalloonConfig {
        match self.configs.get(&GameId::Balloon) {
            Some(GameConfig::Balloon(c)) => c.clone(),
            _ => BalloonConfig::default(),
        }
    }

    pub fn rocket_config(&self) -> RocketConfig {
        match self.configs.get(&GameId::Rocket) {
            Some(GameConfig::Rocket(c)) => c.clone(),
            _ => RocketConfig::default(),
        }
    }

    pub fn mines_config(&self) -> MinesConfig {
        match self.configs.get(&GameId::Mines) {
            Some(GameConfig::Mines(c)) => c.clone(),
            _ => MinesConfig::default(),
        }
    }

    pub fn leverage_config(&self) -> LeverageConfig {
        match self.configs.get(&GameId::TradeBoss) {
            Some(GameConfig::TradeBoss(c)) => c.clone(),
            _ => LeverageConfig::default(),
        }
    }

    /// All game info with current active status.
    pub fn all_games_info(&self) -> Vec<GameInfo> {
        Self::all_games()
            .iter()
            .map(|&game| {
                let mut info = Self::get_info(game);
                info.active = self.is_active(game);
                info
            })
            .collect()
    }

    pub fn games_by_category(&self, category: GameCategory) -> Vec<GameId> {
        Self::all_games()
            .iter()
            .copied()
            .filter(|&game| Self::get_info(game).category == category)
            .collect()
    }
}
