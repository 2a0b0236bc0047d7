//! Arcade execution layer.
//!
//! This crate contains the round engines and everything they settle through:
//!
//! - [`games`]: crash (Balloon, Rocket), mines and leverage engines, the game
//!   registry and log formatting
//! - [`settlement`]: at-most-once wallet ledger keyed by round and leg
//! - [`limits`]: per-game daily limits with calendar roll-over
//! - [`clock`] and [`scheduler`]: time source and tick deadline queue
//! - [`store`]: local key-value persistence of the profile and limits
//! - [`arcade`]: the facade an app shell drives
//!
//! ## Engine requirements
//! - Engines never read the wall clock; time is passed in as `now_ms`.
//! - Hidden failure parameters are drawn from a per-engine [`GameRng`] and
//!   revealed only after the round resolves.
//! - A round resolves at most once and its wallet delta is applied at most once.
//!
//! ## Minimal round (example)
//! ```rust,ignore
//! use arcade_execution::{GameRng, LocalWallet, RocketConfig, RocketEngine, Settlement, TimerQueue};
//!
//! let mut timers = TimerQueue::new();
//! let mut settlement = Settlement::new(LocalWallet::new(1_000));
//! let mut rocket = RocketEngine::new(RocketConfig::default(), GameRng::new(7));
//! rocket.start(100, Some(2.0), 0, &mut settlement, &mut timers)?;
//! // Feed due ticks back into the engine until it resolves.
//! ```

pub mod arcade;
pub mod clock;
pub mod games;
pub mod limits;
pub mod rng;
pub mod scheduler;
pub mod settlement;
pub mod store;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;


pub use arcade::Arcade;
pub use clock::{Clock, ManualClock, SystemClock};
pub use games::{
    BalloonConfig, BalloonEngine, CellOutcome, CrashCurve, CrashEngine, CrashSnapshot,
    GameCategory, GameConfig, GameError, GameInfo, GameRegistry, LeverageConfig,
    LeverageEngine, MinesConfig, MinesEngine, PositionView, PriceFeed, PricePoint,
    RocketConfig, RocketEngine, RowView, TickDriven,
};
pub use limits::DailyLimiter;
pub use rng::GameRng;
pub use scheduler::{ScheduledTick, TickHandle, TickScheduler, TimerQueue};
pub use settlement::{LocalWallet, Settlement, Wallet};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
