//! Round engines.
//!
//! Three engine families share one discipline: a hidden failure parameter is
//! drawn when a round starts, a reward grows while the round is active, and
//! the round resolves exactly once, either by the failure condition or by the
//! player locking in, whichever is recorded first.
//!
//! - [`crash`]: continuous-time crash curve (Balloon, Rocket)
//! - [`mines`]: discrete row ladder with one failure cell per row
//! - [`leverage`]: leveraged position on a random-walk price (Trade Boss)

pub mod crash;
pub mod leverage;
pub mod logging;
pub mod mines;
pub mod registry;


use crate::scheduler::{TickHandle, TickScheduler};
use crate::settlement::{Settlement, Wallet};
use arcade_types::{GameId, Leg, Outcome, Resolution, RoundId, RoundStatus};
use thiserror::Error;
use tracing::warn;

pub use crash::{BalloonEngine, CrashCurve, CrashEngine, CrashSnapshot, RocketEngine};
pub use leverage::{LeverageEngine, PositionView, PriceFeed, PricePoint};
pub use mines::{CellOutcome, MinesEngine, RowView};
pub use registry::{
    BalloonConfig, GameCategory, GameConfig, GameInfo, GameRegistry, LeverageConfig,
    MinesConfig, RocketConfig,
};

/// Errors surfaced by engines, settlement and the daily limiter.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GameError {
    #[error("{game}: cannot {action} while {status}")]
    InvalidTransition {
        game: GameId,
        status: RoundStatus,
        action: &'static str,
    },
    #[error("insufficient balance (stake={stake}, balance={balance})")]
    InsufficientStake { stake: u64, balance: u64 },
    #[error("daily limit reached for {game}")]
    LimitExhausted { game: GameId },
    #[error("invalid stake {stake} for {game}")]
    InvalidStake { game: GameId, stake: u64 },
    #[error("auto cash-out target {target} must exceed the starting reward {floor}")]
    InvalidAutoTarget { target: f64, floor: f64 },
    #[error("column {column} out of range (columns={columns})")]
    InvalidCell { column: u8, columns: u8 },
    #[error("round {round} {leg} already settled")]
    AlreadySettled { round: RoundId, leg: Leg },
    #[error("{game} is not active")]
    InactiveGame { game: GameId },
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

/// Engines that advance on scheduled ticks.
pub trait TickDriven {
    /// Handle a tick previously scheduled by this engine.
    ///
    /// Ticks whose handle is not the engine's pending handle are ignored.
    fn on_tick<W: Wallet, S: TickScheduler>(
        &mut self,
        fired: TickHandle,
        now_ms: u64,
        settlement: &mut Settlement<W>,
        scheduler: &mut S,
    ) -> Option<Resolution>;

    /// Cancel any pending tick when the owning screen goes away.
    ///
    /// A round still in play does not survive its screen: it resolves at
    /// `now_ms` and the resolution is returned.
    fn teardown<W: Wallet, S: TickScheduler>(
        &mut self,
        now_ms: u64,
        settlement: &mut Settlement<W>,
        scheduler: &mut S,
    ) -> Option<Resolution>;
}

/// Fields every round carries, whatever the game.
#[derive(Clone, Debug)]
pub(crate) struct RoundHeader {
    pub id: RoundId,
    pub game: GameId,
    pub stake: u64,
    pub started_at_ms: u64,
    resolution: Option<Resolution>,
}

impl RoundHeader {
    pub fn new(id: RoundId, game: GameId, stake: u64, started_at_ms: u64) -> Self {
        Self {
            id,
            game,
            stake,
            started_at_ms,
            resolution: None,
        }
    }

    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.started_at_ms)
    }

    pub fn resolution(&self) -> Option<&Resolution> {
        self.resolution.as_ref()
    }

    /// Write the terminal result. Returns `None` if the round was already resolved.
    pub fn resolve(
        &mut self,
        outcome: Outcome,
        wallet_delta: i64,
        net: i64,
        reward: f64,
        now_ms: u64,
    ) -> Option<Resolution> {
        if self.resolution.is_some() {
            return None;
        }
        let resolution = Resolution {
            round: self.id,
            game: self.game,
            outcome,
            stake: self.stake,
            wallet_delta,
            net,
            reward,
            resolved_at_ms: now_ms,
        };
        self.resolution = Some(resolution.clone());
        Some(resolution)
    }
}

/// Apply a fresh resolution's wallet delta, logging (not failing) on duplicates.
pub(crate) fn settle<W: Wallet>(settlement: &mut Settlement<W>, resolution: &Resolution) {
    if let Err(err) = settlement.settle(resolution) {
        warn!(round = %resolution.round, game = %resolution.game, ?err, "settlement rejected");
    }
}
