use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Mini-games offered by the arcade.
///
/// Only `Balloon`, `Rocket`, `Mines` and `TradeBoss` are backed by a round engine;
/// the remaining skill games are tracked for daily limits only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[repr(u8)]
pub enum GameId {
    Balloon = 0,
    Rocket = 1,
    Mines = 2,
    TradeBoss = 3,
    TrueWar = 4,
    NeonHockey = 5,
    Triumph = 6,
}

impl GameId {
    pub const ALL: [GameId; 7] = [
        GameId::Balloon,
        GameId::Rocket,
        GameId::Mines,
        GameId::TradeBoss,
        GameId::TrueWar,
        GameId::NeonHockey,
        GameId::Triumph,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameId::Balloon => "balloon",
            GameId::Rocket => "rocket",
            GameId::Mines => "mines",
            GameId::TradeBoss => "tradeboss",
            GameId::TrueWar => "truewar",
            GameId::NeonHockey => "neonhockey",
            GameId::Triumph => "triumph",
        }
    }

    /// Whether a round engine drives this game.
    pub fn has_engine(&self) -> bool {
        matches!(
            self,
            GameId::Balloon | GameId::Rocket | GameId::Mines | GameId::TradeBoss
        )
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown game: {0}")]
pub struct ParseGameIdError(pub String);

impl FromStr for GameId {
    type Err = ParseGameIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', '_', ' '], "");
        match normalized.as_str() {
            "balloon" => Ok(GameId::Balloon),
            "rocket" | "luckyjet" => Ok(GameId::Rocket),
            "mines" | "minesweeper" => Ok(GameId::Mines),
            "tradeboss" | "trade" => Ok(GameId::TradeBoss),
            "truewar" => Ok(GameId::TrueWar),
            "neonhockey" => Ok(GameId::NeonHockey),
            "triumph" => Ok(GameId::Triumph),
            _ => Err(ParseGameIdError(s.to_string())),
        }
    }
}

impl TryFrom<u8> for GameId {
    type Error = ParseGameIdError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        GameId::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| ParseGameIdError(value.to_string()))
    }
}

/// Identifier of a single round, unique per settlement ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoundId(pub u64);

impl fmt::Display for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a round ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Outcome {
    Win,
    Loss,
    /// Closed with exactly zero profit.
    Push,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Win => "WIN",
            Outcome::Loss => "LOSS",
            Outcome::Push => "PUSH",
        }
    }

    /// Classify a net result.
    pub fn from_net(net: i64) -> Self {
        match net {
            n if n > 0 => Outcome::Win,
            0 => Outcome::Push,
            _ => Outcome::Loss,
        }
    }
}

/// Round lifecycle: `Idle -> Active -> Resolved(_)`, never backward within a round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RoundStatus {
    #[default]
    Idle,
    Active,
    Resolved(Outcome),
}

impl RoundStatus {
    pub fn is_idle(&self) -> bool {
        matches!(self, RoundStatus::Idle)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, RoundStatus::Active)
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, RoundStatus::Resolved(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RoundStatus::Idle => "idle",
            RoundStatus::Active => "active",
            RoundStatus::Resolved(Outcome::Win) => "resolved-win",
            RoundStatus::Resolved(Outcome::Loss) => "resolved-loss",
            RoundStatus::Resolved(Outcome::Push) => "resolved-push",
        }
    }
}

impl fmt::Display for RoundStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Side of a leveraged position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// `+1.0` for long, `-1.0` for short.
    pub fn sign(&self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "LONG",
            Direction::Short => "SHORT",
        }
    }
}

/// Wallet movement attributable to a round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Leg {
    /// Up-front stake debit at round start.
    Stake,
    /// Credit or debit applied at resolution.
    Payout,
}

impl fmt::Display for Leg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Leg::Stake => f.write_str("stake"),
            Leg::Payout => f.write_str("payout"),
        }
    }
}

/// Terminal record of a round, computed once and never rewritten.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub round: RoundId,
    pub game: GameId,
    pub outcome: Outcome,
    /// Stake committed at start (zero when the game has no up-front stake).
    pub stake: u64,
    /// Signed amount applied to the wallet at resolution.
    pub wallet_delta: i64,
    /// Net effect of the whole round, including any up-front stake debit.
    pub net: i64,
    /// Reward value the round resolved at (multiplier, profit or step count).
    pub reward: f64,
    pub resolved_at_ms: u64,
}
