//! Leveraged reference-price engine (Trade Boss).
//!
//! A [`PriceFeed`] random-walks on its own tick for as long as the trading
//! screen is open, whether or not a position exists. Opening a position
//! debits the stake and records the entry price; every tick recomputes
//!
//! ```text
//! pnl = sign * ((price - entry) / entry) * stake * leverage
//! ```
//!
//! and liquidates the position (no payout) once `pnl <= -stake`. Closing
//! credits `floor(stake + pnl)`.

use super::{
    logging::{clamp_i64, floor_units},
    registry::LeverageConfig,
    settle, GameError, RoundHeader, TickDriven,
};
use crate::{
    rng::GameRng,
    scheduler::{TickHandle, TickScheduler},
    settlement::{Settlement, Wallet},
};
use arcade_types::{Direction, GameId, Outcome, Resolution, RoundId, RoundStatus};
use std::collections::VecDeque;
use tracing::{debug, info};

fn round_cents(price: f64) -> f64 {
    (price * 100.0).round() / 100.0
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PricePoint {
    pub id: u64,
    pub price: f64,
}

/// Bounded random-walk price series.
#[derive(Clone, Debug)]
pub struct PriceFeed {
    config: LeverageConfig,
    history: VecDeque<PricePoint>,
    next_id: u64,
}

impl PriceFeed {
    /// Seed the history with `history_len` points at the initial price.
    pub fn new(config: LeverageConfig) -> Self {
        let initial = round_cents(config.initial_price.max(config.min_price));
        let history = (0..config.history_len as u64)
            .map(|id| PricePoint { id, price: initial })
            .collect();
        let next_id = config.history_len as u64;
        Self {
            config,
            history,
            next_id,
        }
    }

    pub fn price(&self) -> f64 {
        self.history
            .back()
            .map_or(self.config.initial_price, |point| point.price)
    }

    pub fn history(&self) -> impl Iterator<Item = &PricePoint> {
        self.history.iter()
    }

    /// Advance one step: uniform noise plus a slow sinusoidal trend.
    pub fn step(&mut self, now_ms: u64, rng: &mut GameRng) -> f64 {
        let noise = rng.centered(self.config.volatility);
        let trend =
            (now_ms as f64 / self.config.trend_period_ms).sin() * self.config.trend_amplitude;
        let next = round_cents((self.price() + noise + trend).max(self.config.min_price));
        self.push(next);
        next
    }

    fn push(&mut self, price: f64) {
        self.history.push_back(PricePoint {
            id: self.next_id,
            price,
        });
        self.next_id += 1;
        while self.history.len() > self.config.history_len {
            self.history.pop_front();
        }
    }
}

/// Leveraged profit and loss of a position.
pub fn position_pnl(
    direction: Direction,
    entry_price: f64,
    price: f64,
    stake: u64,
    leverage: f64,
) -> f64 {
    direction.sign() * ((price - entry_price) / entry_price) * stake as f64 * leverage
}

#[derive(Clone, Debug)]
struct Position {
    header: RoundHeader,
    direction: Direction,
    entry_price: f64,
    pnl: f64,
}

/// Presentation view of the open (or last) position.
#[derive(Clone, Debug, PartialEq)]
pub struct PositionView {
    pub round: RoundId,
    pub direction: Direction,
    pub stake: u64,
    pub entry_price: f64,
    pub pnl: f64,
    /// `stake + pnl`, floored at zero.
    pub equity: f64,
    pub resolution: Option<Resolution>,
}

#[derive(Debug)]
pub struct LeverageEngine {
    config: LeverageConfig,
    rng: GameRng,
    feed: PriceFeed,
    status: RoundStatus,
    position: Option<Position>,
    pending_tick: Option<TickHandle>,
}

impl LeverageEngine {
    pub fn new(config: LeverageConfig, rng: GameRng) -> Self {
        Self {
            feed: PriceFeed::new(config.clone()),
            config,
            rng,
            status: RoundStatus::Idle,
            position: None,
            pending_tick: None,
        }
    }

    pub fn status(&self) -> RoundStatus {
        self.status
    }

    pub fn feed(&self) -> &PriceFeed {
        &self.feed
    }

    pub fn price(&self) -> f64 {
        self.feed.price()
    }

    pub fn is_streaming(&self) -> bool {
        self.pending_tick.is_some()
    }

    pub fn pnl(&self) -> Option<f64> {
        match (&self.position, self.status) {
            (Some(position), RoundStatus::Active) => Some(position.pnl),
            _ => None,
        }
    }

    pub fn position(&self) -> Option<PositionView> {
        self.position.as_ref().map(|position| PositionView {
            round: position.header.id,
            direction: position.direction,
            stake: position.header.stake,
            entry_price: position.entry_price,
            pnl: position.pnl,
            equity: (position.header.stake as f64 + position.pnl).max(0.0),
            resolution: position.header.resolution().cloned(),
        })
    }

    pub fn last_resolution(&self) -> Option<&Resolution> {
        self.position
            .as_ref()
            .and_then(|position| position.header.resolution())
    }

    /// Begin ticking the price feed. Idempotent.
    pub fn start_feed<S: TickScheduler>(&mut self, now_ms: u64, scheduler: &mut S) {
        if self.pending_tick.is_some() {
            return;
        }
        self.pending_tick =
            Some(scheduler.schedule(GameId::TradeBoss, now_ms + self.config.tick_ms));
        debug!(price = self.feed.price(), "price feed started");
    }

    /// Open a position at the current price. Allowed whenever none is active.
    pub fn open<W: Wallet>(
        &mut self,
        direction: Direction,
        stake: u64,
        now_ms: u64,
        settlement: &mut Settlement<W>,
    ) -> Result<RoundId, GameError> {
        if self.status.is_active() {
            return Err(GameError::InvalidTransition {
                game: GameId::TradeBoss,
                status: self.status,
                action: "open",
            });
        }
        if stake == 0 {
            return Err(GameError::InvalidStake {
                game: GameId::TradeBoss,
                stake,
            });
        }
        settlement.ensure_funds(stake)?;

        let id = settlement.open_round();
        settlement.debit_stake(id, stake)?;
        let entry_price = self.feed.price();
        self.position = Some(Position {
            header: RoundHeader::new(id, GameId::TradeBoss, stake, now_ms),
            direction,
            entry_price,
            pnl: 0.0,
        });
        self.status = RoundStatus::Active;
        info!(
            game = %GameId::TradeBoss,
            round = %id,
            direction = direction.as_str(),
            stake,
            entry_price,
            "position opened"
        );
        Ok(id)
    }

    /// Close the active position at the current price. A no-op otherwise.
    pub fn close<W: Wallet>(
        &mut self,
        now_ms: u64,
        settlement: &mut Settlement<W>,
    ) -> Option<Resolution> {
        if !self.status.is_active() {
            debug!(status = %self.status, "close ignored");
            return None;
        }
        let price = self.feed.price();
        self.settle_at(price, now_ms, settlement)
    }

    fn settle_at<W: Wallet>(
        &mut self,
        price: f64,
        now_ms: u64,
        settlement: &mut Settlement<W>,
    ) -> Option<Resolution> {
        let position = self.position.as_mut()?;
        let stake = position.header.stake;
        let pnl = position_pnl(
            position.direction,
            position.entry_price,
            price,
            stake,
            self.config.leverage,
        );
        position.pnl = pnl;

        let staked = clamp_i64(i128::from(stake));
        let liquidated = pnl <= -(stake as f64);
        let (wallet_delta, outcome) = if liquidated {
            (0, Outcome::Loss)
        } else {
            let credit = clamp_i64(i128::from(floor_units(stake as f64 + pnl)));
            (credit, Outcome::from_net(credit.saturating_sub(staked)))
        };
        let net = wallet_delta.saturating_sub(staked);
        let resolution = position
            .header
            .resolve(outcome, wallet_delta, net, pnl, now_ms)?;
        info!(
            game = %GameId::TradeBoss,
            round = %resolution.round,
            price,
            pnl,
            liquidated,
            outcome = outcome.as_str(),
            "position closed"
        );
        settle(settlement, &resolution);
        self.status = RoundStatus::Resolved(outcome);
        Some(resolution)
    }
}

impl TickDriven for LeverageEngine {
    fn on_tick<W: Wallet, S: TickScheduler>(
        &mut self,
        fired: TickHandle,
        now_ms: u64,
        settlement: &mut Settlement<W>,
        scheduler: &mut S,
    ) -> Option<Resolution> {
        if self.pending_tick != Some(fired) {
            debug!(game = %GameId::TradeBoss, tick = fired.id(), "stale tick ignored");
            return None;
        }
        let price = self.feed.step(now_ms, &mut self.rng);
        self.pending_tick =
            Some(scheduler.schedule(GameId::TradeBoss, now_ms + self.config.tick_ms));

        if !self.status.is_active() {
            return None;
        }
        let position = self.position.as_mut()?;
        let pnl = position_pnl(
            position.direction,
            position.entry_price,
            price,
            position.header.stake,
            self.config.leverage,
        );
        position.pnl = pnl;
        if pnl <= -(position.header.stake as f64) {
            return self.settle_at(price, now_ms, settlement);
        }
        None
    }

    /// Stops the feed and closes an open position at the last price.
    fn teardown<W: Wallet, S: TickScheduler>(
        &mut self,
        now_ms: u64,
        settlement: &mut Settlement<W>,
        scheduler: &mut S,
    ) -> Option<Resolution> {
        if let Some(handle) = self.pending_tick.take() {
            scheduler.cancel(handle);
        }
        self.close(now_ms, settlement)
    }
}
