//! App-shell facade.
//!
//! [`Arcade`] owns one engine per engine-backed game together with the clock,
//! the timer queue, the settlement ledger, the daily limiter and the game
//! registry. Player intents are applied synchronously; scheduled ticks run
//! only when the host calls [`Arcade::pump`]. An intent issued before a pump
//! is therefore always observed before any tick that pump would fire.
//!
//! ```rust,ignore
//! let mut arcade = Arcade::load(SystemClock::new(), &store, GameRegistry::new(), GameRng::from_entropy())?;
//! arcade.start_rocket(100, Some(2.0))?;
//! loop {
//!     for resolution in arcade.pump() {
//!         println!("{}", resolution.net);
//!     }
//! }
//! ```

use crate::{
    clock::Clock,
    games::{
        logging::resolution_log, BalloonEngine, CellOutcome, CrashSnapshot, GameError,
        GameRegistry, LeverageEngine, MinesEngine, RocketEngine, TickDriven,
    },
    limits::DailyLimiter,
    rng::GameRng,
    scheduler::TimerQueue,
    settlement::{Settlement, Wallet},
    store::{load_limits, load_profile, save_limits, save_profile, KeyValueStore, StoreError},
};
use arcade_types::{
    Direction, GameId, GameLimits, Profile, ProfileInvariantError, Resolution, RoundId,
};
use tracing::{debug, info};

pub struct Arcade<C: Clock, W: Wallet = Profile> {
    clock: C,
    timers: TimerQueue,
    settlement: Settlement<W>,
    limiter: DailyLimiter,
    registry: GameRegistry,
    balloon: BalloonEngine,
    rocket: RocketEngine,
    mines: MinesEngine,
    trade: LeverageEngine,
}

impl<C: Clock, W: Wallet> Arcade<C, W> {
    pub fn new(
        clock: C,
        wallet: W,
        registry: GameRegistry,
        limits: GameLimits,
        mut rng: GameRng,
    ) -> Self {
        let today = clock.today();
        Self {
            balloon: BalloonEngine::new(registry.balloon_config(), rng.fork(1)),
            rocket: RocketEngine::new(registry.rocket_config(), rng.fork(2)),
            mines: MinesEngine::new(registry.mines_config(), rng.fork(3)),
            trade: LeverageEngine::new(registry.leverage_config(), rng.fork(4)),
            limiter: DailyLimiter::from_limits(limits, today),
            settlement: Settlement::new(wallet),
            timers: TimerQueue::new(),
            registry,
            clock,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn balance(&self) -> u64 {
        self.settlement.balance()
    }

    pub fn wallet(&self) -> &W {
        self.settlement.wallet()
    }

    pub fn registry(&self) -> &GameRegistry {
        &self.registry
    }

    pub fn limiter(&self) -> &DailyLimiter {
        &self.limiter
    }

    pub fn balloon(&self) -> &BalloonEngine {
        &self.balloon
    }

    pub fn rocket(&self) -> &RocketEngine {
        &self.rocket
    }

    pub fn mines(&self) -> &MinesEngine {
        &self.mines
    }

    pub fn trade(&self) -> &LeverageEngine {
        &self.trade
    }

    pub fn pending_ticks(&self) -> usize {
        self.timers.len()
    }

    /// Snapshot of a crash game; `None` for other games.
    pub fn crash_snapshot(&self, game: GameId) -> Option<CrashSnapshot> {
        let now_ms = self.clock.now_ms();
        match game {
            GameId::Balloon => Some(self.balloon.snapshot(now_ms)),
            GameId::Rocket => Some(self.rocket.snapshot(now_ms)),
            _ => None,
        }
    }

    /// Rounds or seconds left today; `None` for unlimited games.
    pub fn remaining(&mut self, game: GameId) -> Option<u32> {
        self.limiter.remaining(game, self.clock.today())
    }

    fn admit(&mut self, game: GameId, stake: u64) -> Result<(), GameError> {
        self.registry.ensure_active(game)?;
        if !GameRegistry::get_info(game).accepts_stake(stake) {
            return Err(GameError::InvalidStake { game, stake });
        }
        self.limiter.check(game, self.clock.today())
    }

    fn record_start(&mut self, game: GameId) {
        let played = self.limiter.record_round_start(game, self.clock.today());
        debug!(%game, played, "round counted");
    }

    pub fn start_balloon(&mut self, auto_lock: Option<f64>) -> Result<RoundId, GameError> {
        self.admit(GameId::Balloon, 0)?;
        let id = self.balloon.start(
            0,
            auto_lock,
            self.clock.now_ms(),
            &mut self.settlement,
            &mut self.timers,
        )?;
        self.record_start(GameId::Balloon);
        Ok(id)
    }

    pub fn start_rocket(&mut self, stake: u64, auto_lock: Option<f64>) -> Result<RoundId, GameError> {
        self.admit(GameId::Rocket, stake)?;
        let id = self.rocket.start(
            stake,
            auto_lock,
            self.clock.now_ms(),
            &mut self.settlement,
            &mut self.timers,
        )?;
        self.record_start(GameId::Rocket);
        Ok(id)
    }

    /// Lock in the active crash round of `game`. A no-op for other games.
    pub fn lock_in(&mut self, game: GameId) -> Option<Resolution> {
        let now_ms = self.clock.now_ms();
        match game {
            GameId::Balloon => self
                .balloon
                .lock_in(now_ms, &mut self.settlement, &mut self.timers),
            GameId::Rocket => self
                .rocket
                .lock_in(now_ms, &mut self.settlement, &mut self.timers),
            _ => None,
        }
    }

    pub fn start_mines(&mut self, stake: u64) -> Result<RoundId, GameError> {
        self.admit(GameId::Mines, stake)?;
        let id = self
            .mines
            .start(stake, self.clock.now_ms(), &mut self.settlement)?;
        self.record_start(GameId::Mines);
        Ok(id)
    }

    pub fn select_cell(&mut self, row: usize, column: u8) -> Result<CellOutcome, GameError> {
        self.mines
            .select_cell(row, column, self.clock.now_ms(), &mut self.settlement)
    }

    pub fn cash_out(&mut self) -> Option<Resolution> {
        self.mines
            .cash_out(self.clock.now_ms(), &mut self.settlement)
    }

    /// Start streaming prices for the trading screen.
    pub fn enter_trading(&mut self) {
        self.trade.start_feed(self.clock.now_ms(), &mut self.timers);
    }

    pub fn open_position(&mut self, direction: Direction, stake: u64) -> Result<RoundId, GameError> {
        self.admit(GameId::TradeBoss, stake)?;
        let id = self
            .trade
            .open(direction, stake, self.clock.now_ms(), &mut self.settlement)?;
        self.record_start(GameId::TradeBoss);
        Ok(id)
    }

    pub fn close_position(&mut self) -> Option<Resolution> {
        self.trade
            .close(self.clock.now_ms(), &mut self.settlement)
    }

    /// Cancel a game's pending ticks when its screen goes away. A crash round
    /// in flight is forfeited and an open position is closed.
    pub fn leave(&mut self, game: GameId) -> Option<Resolution> {
        let now_ms = self.clock.now_ms();
        let resolution = match game {
            GameId::Balloon => {
                self.balloon
                    .teardown(now_ms, &mut self.settlement, &mut self.timers)
            }
            GameId::Rocket => {
                self.rocket
                    .teardown(now_ms, &mut self.settlement, &mut self.timers)
            }
            GameId::TradeBoss => {
                self.trade
                    .teardown(now_ms, &mut self.settlement, &mut self.timers)
            }
            _ => None,
        };
        debug!(%game, resolved = resolution.is_some(), "left game");
        resolution
    }

    /// Count a round of a game played outside the arcade's engines.
    pub fn play_round(&mut self, game: GameId) -> Result<u32, GameError> {
        self.admit(game, 0)?;
        Ok(self.limiter.record_round_start(game, self.clock.today()))
    }

    /// Add seconds of play for a time-budgeted game.
    pub fn record_play_time(&mut self, game: GameId, seconds: u32) -> Result<u32, GameError> {
        self.registry.ensure_active(game)?;
        Ok(self
            .limiter
            .record_play_time(game, seconds, self.clock.today()))
    }

    /// Fire every due tick and return the rounds they resolved.
    pub fn pump(&mut self) -> Vec<Resolution> {
        let now_ms = self.clock.now_ms();
        let mut resolved = Vec::new();
        for tick in self.timers.drain_due(now_ms) {
            let resolution = match tick.game {
                GameId::Balloon => self.balloon.on_tick(
                    tick.handle,
                    now_ms,
                    &mut self.settlement,
                    &mut self.timers,
                ),
                GameId::Rocket => self.rocket.on_tick(
                    tick.handle,
                    now_ms,
                    &mut self.settlement,
                    &mut self.timers,
                ),
                GameId::TradeBoss => self.trade.on_tick(
                    tick.handle,
                    now_ms,
                    &mut self.settlement,
                    &mut self.timers,
                ),
                game => {
                    debug!(%game, "tick without an engine dropped");
                    None
                }
            };
            if let Some(resolution) = resolution {
                info!(summary = %resolution_log(&resolution), "resolved");
                resolved.push(resolution);
            }
        }
        resolved
    }
}

impl<C: Clock> Arcade<C, Profile> {
    /// Restore the profile and today's limits from `store`.
    pub fn load<S: KeyValueStore + ?Sized>(
        clock: C,
        store: &S,
        registry: GameRegistry,
        rng: GameRng,
    ) -> Result<Self, StoreError> {
        let profile = load_profile(store)?.unwrap_or_default();
        let limits = load_limits(store, clock.today())?;
        Ok(Self::new(clock, profile, registry, limits, rng))
    }

    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> Result<(), StoreError> {
        save_profile(store, self.settlement.wallet())?;
        save_limits(store, self.limiter.limits())
    }

    pub fn profile(&self) -> &Profile {
        self.settlement.wallet()
    }

    pub fn is_onboarded(&self) -> bool {
        self.profile().setup_complete
    }

    /// Set the display name, completing onboarding.
    pub fn set_name(&mut self, name: &str) -> Result<(), ProfileInvariantError> {
        let profile = self.settlement.wallet_mut();
        let was_onboarded = profile.setup_complete;
        profile.setup_complete = true;
        if let Err(err) = profile.rename(name) {
            profile.setup_complete = was_onboarded;
            return Err(err);
        }
        info!(name = %profile.name, "profile named");
        Ok(())
    }
}
