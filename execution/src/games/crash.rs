//! Continuous-time crash engine (Balloon and Rocket).
//!
//! A round draws a hidden crash duration when it starts. While active, the
//! reward grows along the game's curve on every tick. The round resolves
//! exactly once: by the player locking in, by the auto-lock target being
//! reached, or by a tick observing that the crash duration has passed.
//!
//! Each tick evaluates, in order:
//! 1. the reward at `min(elapsed, crash)`
//! 2. auto-lock: if a target is set and that reward reached it, resolve as a
//!    win committing the target value
//! 3. crash: if `elapsed >= crash`, resolve as a loss at `reward(crash)`
//! 4. otherwise publish the reward and schedule the next tick
//!
//! So auto-lock wins a tie with a crash observed in the same tick, but only
//! when the target was reached no later than the crash itself. A manual
//! lock-in evaluates the curve at `min(elapsed, crash)` as well, so it can
//! never be worth more than the crash value.
//!
//! After resolution the engine schedules a cool-down tick and returns to
//! [`RoundStatus::Idle`] when it fires.

use super::{
    logging::{clamp_i64, floor_units},
    registry::{BalloonConfig, RocketConfig},
    settle, GameError, RoundHeader, TickDriven,
};
use crate::{
    rng::GameRng,
    scheduler::{TickHandle, TickScheduler},
    settlement::{Settlement, Wallet},
};
use arcade_types::{GameId, Outcome, Resolution, RoundId, RoundStatus, BASIS_POINTS};
use tracing::{debug, info, warn};

/// Reward curve and settlement rules of a crash game.
pub trait CrashCurve {
    const GAME: GameId;

    /// Reward after `elapsed_ms` of growth. Non-decreasing in `elapsed_ms`.
    fn reward(&self, elapsed_ms: u64) -> f64;

    fn initial_reward(&self) -> f64 {
        self.reward(0)
    }

    /// Draw the hidden crash duration.
    fn draw_crash_ms(&self, rng: &mut GameRng) -> u64;

    fn tick_ms(&self) -> u64;

    fn cooldown_ms(&self, outcome: Outcome) -> u64;

    fn validate_stake(&self, stake: u64) -> Result<(), GameError>;

    /// Whether the stake leg is debited when the round starts.
    fn debits_stake(&self) -> bool;

    /// Wallet credit for a win committed at `reward`.
    fn win_credit(&self, stake: u64, reward: f64) -> u64;

    /// Wallet delta when the round crashes at `reward`.
    fn loss_delta(&self, stake: u64, reward: f64) -> i64;
}

impl CrashCurve for BalloonConfig {
    const GAME: GameId = GameId::Balloon;

    fn reward(&self, elapsed_ms: u64) -> f64 {
        self.base_value * self.growth_rate.powf(elapsed_ms as f64 / 1_000.0)
    }

    fn draw_crash_ms(&self, rng: &mut GameRng) -> u64 {
        rng.range_inclusive(self.min_crash_ms, self.max_crash_ms)
    }

    fn tick_ms(&self) -> u64 {
        self.tick_ms
    }

    fn cooldown_ms(&self, _outcome: Outcome) -> u64 {
        self.cooldown_ms
    }

    fn validate_stake(&self, stake: u64) -> Result<(), GameError> {
        if stake != 0 {
            return Err(GameError::InvalidStake {
                game: GameId::Balloon,
                stake,
            });
        }
        Ok(())
    }

    fn debits_stake(&self) -> bool {
        false
    }

    fn win_credit(&self, _stake: u64, reward: f64) -> u64 {
        floor_units(reward)
    }

    /// A popped balloon costs the profit it had reached.
    fn loss_delta(&self, _stake: u64, reward: f64) -> i64 {
        -clamp_i64(i128::from(floor_units(reward)))
    }
}

impl RocketConfig {
    /// Multiplier truncated to basis points.
    pub fn multiplier_bps(reward: f64) -> u64 {
        floor_units(reward * BASIS_POINTS as f64)
    }
}

impl CrashCurve for RocketConfig {
    const GAME: GameId = GameId::Rocket;

    fn reward(&self, elapsed_ms: u64) -> f64 {
        (self.growth_k * elapsed_ms as f64 / 1_000.0).exp()
    }

    /// Inverse-CDF draw: `P(crash >= m) = target_rtp / m` for `m` up to the cap.
    fn draw_crash_ms(&self, rng: &mut GameRng) -> u64 {
        let r = rng.unit();
        let crash = (self.target_rtp / (1.0 - r)).min(self.max_crash_multiplier);
        let ms = 1_000.0 * crash.ln() / self.growth_k;
        // Negative durations (crash below 1.0x) saturate to zero before the floor.
        (ms.ceil() as u64).max(self.min_crash_ms)
    }

    fn tick_ms(&self) -> u64 {
        self.tick_ms
    }

    fn cooldown_ms(&self, outcome: Outcome) -> u64 {
        match outcome {
            Outcome::Loss => self.loss_cooldown_ms,
            Outcome::Win | Outcome::Push => self.win_cooldown_ms,
        }
    }

    fn validate_stake(&self, stake: u64) -> Result<(), GameError> {
        if stake == 0 {
            return Err(GameError::InvalidStake {
                game: GameId::Rocket,
                stake,
            });
        }
        Ok(())
    }

    fn debits_stake(&self) -> bool {
        true
    }

    fn win_credit(&self, stake: u64, reward: f64) -> u64 {
        let credit = u128::from(stake) * u128::from(Self::multiplier_bps(reward))
            / u128::from(BASIS_POINTS);
        u64::try_from(credit).unwrap_or(u64::MAX)
    }

    fn loss_delta(&self, _stake: u64, _reward: f64) -> i64 {
        0
    }
}

#[derive(Clone, Debug)]
struct CrashRound {
    header: RoundHeader,
    crash_at_ms: u64,
    auto_lock: Option<f64>,
    reward: f64,
}

/// Presentation view of a crash engine. The crash point stays hidden until
/// the round has resolved.
#[derive(Clone, Debug, PartialEq)]
pub struct CrashSnapshot {
    pub game: GameId,
    pub status: RoundStatus,
    pub round: Option<RoundId>,
    pub stake: u64,
    pub reward: f64,
    /// Wallet credit a lock-in at the current reward would produce.
    pub potential_credit: u64,
    pub auto_lock: Option<f64>,
    pub elapsed_ms: u64,
    pub crash_at_ms: Option<u64>,
    pub resolution: Option<Resolution>,
}

#[derive(Debug)]
pub struct CrashEngine<C: CrashCurve> {
    curve: C,
    rng: GameRng,
    status: RoundStatus,
    round: Option<CrashRound>,
    pending_tick: Option<TickHandle>,
}

pub type BalloonEngine = CrashEngine<BalloonConfig>;
pub type RocketEngine = CrashEngine<RocketConfig>;

impl<C: CrashCurve> CrashEngine<C> {
    pub fn new(curve: C, rng: GameRng) -> Self {
        Self {
            curve,
            rng,
            status: RoundStatus::Idle,
            round: None,
            pending_tick: None,
        }
    }

    pub fn curve(&self) -> &C {
        &self.curve
    }

    pub fn status(&self) -> RoundStatus {
        self.status
    }

    pub fn round_id(&self) -> Option<RoundId> {
        self.round.as_ref().map(|round| round.header.id)
    }

    pub fn has_pending_tick(&self) -> bool {
        self.pending_tick.is_some()
    }

    pub fn last_resolution(&self) -> Option<&Resolution> {
        self.round.as_ref().and_then(|round| round.header.resolution())
    }

    /// Last published reward, or the curve's initial reward before any round.
    pub fn reward(&self) -> f64 {
        self.round
            .as_ref()
            .map_or_else(|| self.curve.initial_reward(), |round| round.reward)
    }

    pub fn snapshot(&self, now_ms: u64) -> CrashSnapshot {
        let Some(round) = self.round.as_ref() else {
            return CrashSnapshot {
                game: C::GAME,
                status: self.status,
                round: None,
                stake: 0,
                reward: self.curve.initial_reward(),
                potential_credit: self.curve.win_credit(0, self.curve.initial_reward()),
                auto_lock: None,
                elapsed_ms: 0,
                crash_at_ms: None,
                resolution: None,
            };
        };
        let resolution = round.header.resolution().cloned();
        let elapsed_ms = match &resolution {
            Some(res) => round.header.elapsed_ms(res.resolved_at_ms),
            None => round.header.elapsed_ms(now_ms),
        };
        CrashSnapshot {
            game: C::GAME,
            status: self.status,
            round: Some(round.header.id),
            stake: round.header.stake,
            reward: round.reward,
            potential_credit: self.curve.win_credit(round.header.stake, round.reward),
            auto_lock: round.auto_lock,
            elapsed_ms,
            crash_at_ms: resolution.as_ref().map(|_| round.crash_at_ms),
            resolution,
        }
    }

    /// Start a round. Requires [`RoundStatus::Idle`].
    pub fn start<W: Wallet, S: TickScheduler>(
        &mut self,
        stake: u64,
        auto_lock: Option<f64>,
        now_ms: u64,
        settlement: &mut Settlement<W>,
        scheduler: &mut S,
    ) -> Result<RoundId, GameError> {
        self.start_round(stake, auto_lock, None, now_ms, settlement, scheduler)
    }

    /// Start a round with a fixed crash duration instead of a random draw.
    #[cfg(any(test, feature = "mocks"))]
    pub fn start_with_crash_at<W: Wallet, S: TickScheduler>(
        &mut self,
        stake: u64,
        auto_lock: Option<f64>,
        crash_at_ms: u64,
        now_ms: u64,
        settlement: &mut Settlement<W>,
        scheduler: &mut S,
    ) -> Result<RoundId, GameError> {
        self.start_round(
            stake,
            auto_lock,
            Some(crash_at_ms),
            now_ms,
            settlement,
            scheduler,
        )
    }

    fn start_round<W: Wallet, S: TickScheduler>(
        &mut self,
        stake: u64,
        auto_lock: Option<f64>,
        crash_override: Option<u64>,
        now_ms: u64,
        settlement: &mut Settlement<W>,
        scheduler: &mut S,
    ) -> Result<RoundId, GameError> {
        if !self.status.is_idle() {
            warn!(game = %C::GAME, status = %self.status, "start rejected");
            return Err(GameError::InvalidTransition {
                game: C::GAME,
                status: self.status,
                action: "start",
            });
        }
        self.curve.validate_stake(stake)?;
        if let Some(target) = auto_lock {
            let floor = self.curve.initial_reward();
            // Also rejects NaN.
            if !(target > floor) {
                return Err(GameError::InvalidAutoTarget { target, floor });
            }
        }
        if self.curve.debits_stake() {
            settlement.ensure_funds(stake)?;
        }

        let id = settlement.open_round();
        if self.curve.debits_stake() {
            settlement.debit_stake(id, stake)?;
        }
        let crash_at_ms =
            crash_override.unwrap_or_else(|| self.curve.draw_crash_ms(&mut self.rng));
        self.round = Some(CrashRound {
            header: RoundHeader::new(id, C::GAME, stake, now_ms),
            crash_at_ms,
            auto_lock,
            reward: self.curve.initial_reward(),
        });
        self.status = RoundStatus::Active;
        self.pending_tick = Some(scheduler.schedule(C::GAME, now_ms + self.curve.tick_ms()));
        info!(game = %C::GAME, round = %id, stake, ?auto_lock, "round started");
        Ok(id)
    }

    /// Lock in the current reward. A no-op unless the round is active.
    pub fn lock_in<W: Wallet, S: TickScheduler>(
        &mut self,
        now_ms: u64,
        settlement: &mut Settlement<W>,
        scheduler: &mut S,
    ) -> Option<Resolution> {
        if !self.status.is_active() {
            debug!(game = %C::GAME, status = %self.status, "lock-in ignored");
            return None;
        }
        let round = self.round.as_ref()?;
        let effective = round.header.elapsed_ms(now_ms).min(round.crash_at_ms);
        let reward = self.curve.reward(effective);
        self.resolve(Outcome::Win, reward, now_ms, settlement, scheduler)
    }

    fn advance<W: Wallet, S: TickScheduler>(
        &mut self,
        now_ms: u64,
        settlement: &mut Settlement<W>,
        scheduler: &mut S,
    ) -> Option<Resolution> {
        let (elapsed, crash_at_ms, auto_lock) = {
            let round = self.round.as_ref()?;
            (
                round.header.elapsed_ms(now_ms),
                round.crash_at_ms,
                round.auto_lock,
            )
        };
        let reward = self.curve.reward(elapsed.min(crash_at_ms));

        if let Some(target) = auto_lock {
            if reward >= target {
                return self.resolve(Outcome::Win, target, now_ms, settlement, scheduler);
            }
        }
        if elapsed >= crash_at_ms {
            let crashed = self.curve.reward(crash_at_ms);
            return self.resolve(Outcome::Loss, crashed, now_ms, settlement, scheduler);
        }

        if let Some(round) = self.round.as_mut() {
            round.reward = round.reward.max(reward);
        }
        self.pending_tick = Some(scheduler.schedule(C::GAME, now_ms + self.curve.tick_ms()));
        None
    }

    fn resolve<W: Wallet, S: TickScheduler>(
        &mut self,
        outcome: Outcome,
        reward: f64,
        now_ms: u64,
        settlement: &mut Settlement<W>,
        scheduler: &mut S,
    ) -> Option<Resolution> {
        if let Some(handle) = self.pending_tick.take() {
            scheduler.cancel(handle);
        }
        let round = self.round.as_mut()?;
        let stake = round.header.stake;
        let staked = if self.curve.debits_stake() {
            clamp_i64(i128::from(stake))
        } else {
            0
        };
        let wallet_delta = match outcome {
            Outcome::Win | Outcome::Push => {
                clamp_i64(i128::from(self.curve.win_credit(stake, reward)))
            }
            Outcome::Loss => self.curve.loss_delta(stake, reward),
        };
        let net = wallet_delta.saturating_sub(staked);
        let resolution = round
            .header
            .resolve(outcome, wallet_delta, net, reward, now_ms)?;
        round.reward = reward;
        let crash_at_ms = round.crash_at_ms;

        settle(settlement, &resolution);
        self.status = RoundStatus::Resolved(outcome);
        self.pending_tick = Some(
            scheduler.schedule(C::GAME, now_ms + self.curve.cooldown_ms(outcome)),
        );
        info!(
            game = %C::GAME,
            round = %resolution.round,
            outcome = outcome.as_str(),
            reward,
            crash_at_ms,
            net,
            "round resolved"
        );
        Some(resolution)
    }
}

impl<C: CrashCurve> TickDriven for CrashEngine<C> {
    fn on_tick<W: Wallet, S: TickScheduler>(
        &mut self,
        fired: TickHandle,
        now_ms: u64,
        settlement: &mut Settlement<W>,
        scheduler: &mut S,
    ) -> Option<Resolution> {
        if self.pending_tick != Some(fired) {
            debug!(game = %C::GAME, tick = fired.id(), "stale tick ignored");
            return None;
        }
        self.pending_tick = None;
        match self.status {
            RoundStatus::Active => self.advance(now_ms, settlement, scheduler),
            RoundStatus::Resolved(_) => {
                debug!(game = %C::GAME, "cool-down elapsed");
                self.status = RoundStatus::Idle;
                None
            }
            RoundStatus::Idle => None,
        }
    }

    /// Forfeits an active round as the loss it would have become.
    fn teardown<W: Wallet, S: TickScheduler>(
        &mut self,
        now_ms: u64,
        settlement: &mut Settlement<W>,
        scheduler: &mut S,
    ) -> Option<Resolution> {
        if let Some(handle) = self.pending_tick.take() {
            scheduler.cancel(handle);
        }
        let crash_at_ms = self
            .round
            .as_ref()
            .filter(|_| self.status.is_active())
            .map(|round| round.crash_at_ms);
        let resolution = crash_at_ms.and_then(|crash_at_ms| {
            let crashed = self.curve.reward(crash_at_ms);
            warn!(game = %C::GAME, crash_at_ms, "active round forfeited on teardown");
            self.resolve(Outcome::Loss, crashed, now_ms, settlement, scheduler)
        });
        // The cool-down goes with the screen.
        if let Some(handle) = self.pending_tick.take() {
            scheduler.cancel(handle);
        }
        self.status = RoundStatus::Idle;
        resolution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{create_rng, funded_settlement, run_until};
    use crate::scheduler::TimerQueue;
    use arcade_types::Leg;
    use proptest::prelude::*;

    fn balloon() -> BalloonEngine {
        BalloonEngine::new(BalloonConfig::default(), create_rng(1))
    }

    fn rocket() -> RocketEngine {
        RocketEngine::new(RocketConfig::default(), create_rng(2))
    }

    #[test]
    fn test_balloon_curve_values() {
        let config = BalloonConfig::default();
        assert_eq!(config.reward(0), 10.0);
        assert!((config.reward(1_000) - 12.1).abs() < 1e-9);
        assert_eq!(config.win_credit(0, config.reward(3_000)), 17);
        assert_eq!(config.loss_delta(0, config.reward(5_000)), -25);
    }

    #[test]
    fn test_rocket_curve_values() {
        let config = RocketConfig::default();
        assert_eq!(config.reward(0), 1.0);
        assert_eq!(RocketConfig::multiplier_bps(1.0), 10_000);
        assert_eq!(config.win_credit(100, 1.5), 150);
        assert_eq!(config.win_credit(100, 1.23456), 123);
        assert_eq!(RocketConfig::multiplier_bps(1.15), 11_500);
        assert_eq!(config.win_credit(100, 1.15), 115);
        assert_eq!(config.win_credit(100, 1.14999), 114);
        assert_eq!(config.loss_delta(100, 3.0), 0);
    }

    #[test]
    fn test_balloon_crash_window() {
        let config = BalloonConfig::default();
        let mut rng = create_rng(9);
        for _ in 0..5_000 {
            let ms = config.draw_crash_ms(&mut rng);
            assert!((1_000..=12_000).contains(&ms));
        }
    }

    #[test]
    fn test_rocket_crash_bounds() {
        let config = RocketConfig::default();
        let cap_ms = (1_000.0 * 50f64.ln() / 0.075).ceil() as u64;
        let mut rng = create_rng(4);
        for _ in 0..10_000 {
            let ms = config.draw_crash_ms(&mut rng);
            assert!(ms >= 100 && ms <= cap_ms, "crash {ms}ms out of bounds");
        }
    }

    #[test]
    fn test_rocket_survival_matches_rtp() {
        let config = RocketConfig::default();
        let mut rng = create_rng(11);
        let trials = 200_000;
        for target in [1.5f64, 2.0, 5.0] {
            let threshold = 1_000.0 * target.ln() / config.growth_k;
            let survived = (0..trials)
                .filter(|_| config.draw_crash_ms(&mut rng) as f64 >= threshold)
                .count();
            let observed = survived as f64 / trials as f64;
            let expected = config.target_rtp / target;
            assert!(
                (observed - expected).abs() < 0.006,
                "target {target}: observed {observed}, expected {expected}"
            );
        }
    }

    #[test]
    fn test_start_validation() {
        let mut timers = TimerQueue::new();
        let mut settlement = funded_settlement(50);

        let mut engine = balloon();
        assert_eq!(
            engine.start(5, None, 0, &mut settlement, &mut timers),
            Err(GameError::InvalidStake {
                game: GameId::Balloon,
                stake: 5
            })
        );
        assert!(matches!(
            engine.start(0, Some(10.0), 0, &mut settlement, &mut timers),
            Err(GameError::InvalidAutoTarget { .. })
        ));

        let mut engine = rocket();
        assert!(matches!(
            engine.start(0, None, 0, &mut settlement, &mut timers),
            Err(GameError::InvalidStake { .. })
        ));
        assert!(matches!(
            engine.start(10, Some(f64::NAN), 0, &mut settlement, &mut timers),
            Err(GameError::InvalidAutoTarget { .. })
        ));
        assert_eq!(
            engine.start(100, None, 0, &mut settlement, &mut timers),
            Err(GameError::InsufficientStake {
                stake: 100,
                balance: 50
            })
        );
        assert_eq!(engine.status(), RoundStatus::Idle);
        assert!(timers.is_empty());
        assert_eq!(settlement.balance(), 50);
    }

    #[test]
    fn test_start_requires_idle() {
        let mut timers = TimerQueue::new();
        let mut settlement = funded_settlement(1_000);
        let mut engine = rocket();

        engine
            .start(100, None, 0, &mut settlement, &mut timers)
            .expect("start");
        assert_eq!(settlement.balance(), 900);
        assert_eq!(
            engine.start(100, None, 10, &mut settlement, &mut timers),
            Err(GameError::InvalidTransition {
                game: GameId::Rocket,
                status: RoundStatus::Active,
                action: "start",
            })
        );
        assert_eq!(settlement.balance(), 900);
    }

    #[test]
    fn test_lock_in_when_idle_is_noop() {
        let mut timers = TimerQueue::new();
        let mut settlement = funded_settlement(100);
        let mut engine = rocket();
        assert!(engine.lock_in(0, &mut settlement, &mut timers).is_none());
        assert_eq!(settlement.balance(), 100);
    }

    #[test]
    fn test_rocket_manual_win() {
        let mut timers = TimerQueue::new();
        let mut settlement = funded_settlement(1_000);
        let mut engine = rocket();
        let round = engine
            .start_with_crash_at(100, None, 20_000, 0, &mut settlement, &mut timers)
            .expect("start");

        run_until(&mut engine, &mut timers, &mut settlement, 9_999);
        assert!(engine.snapshot(9_999).crash_at_ms.is_none());
        let res = engine
            .lock_in(10_000, &mut settlement, &mut timers)
            .expect("resolution");
        // exp(0.75) = 2.117
        assert_eq!(res.round, round);
        assert_eq!(res.outcome, Outcome::Win);
        assert_eq!(res.wallet_delta, 211);
        assert_eq!(res.net, 111);
        assert_eq!(settlement.balance(), 1_111);
        assert_eq!(engine.snapshot(10_000).crash_at_ms, Some(20_000));

        // A second lock-in and later ticks never pay again.
        assert!(engine.lock_in(10_001, &mut settlement, &mut timers).is_none());
        run_until(&mut engine, &mut timers, &mut settlement, 30_000);
        assert_eq!(settlement.balance(), 1_111);
        assert!(settlement.is_applied(round, Leg::Payout));
    }

    #[test]
    fn test_rocket_loss_and_cooldown() {
        let mut timers = TimerQueue::new();
        let mut settlement = funded_settlement(100);
        let mut engine = rocket();
        engine
            .start_with_crash_at(100, None, 1_000, 0, &mut settlement, &mut timers)
            .expect("start");

        let resolved = run_until(&mut engine, &mut timers, &mut settlement, 1_008);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].outcome, Outcome::Loss);
        assert_eq!(resolved[0].net, -100);
        assert_eq!(resolved[0].wallet_delta, 0);
        assert_eq!(settlement.balance(), 0);
        assert_eq!(engine.status(), RoundStatus::Resolved(Outcome::Loss));

        // Loss cool-down is 4s.
        run_until(&mut engine, &mut timers, &mut settlement, 5_007);
        assert!(engine.status().is_resolved());
        run_until(&mut engine, &mut timers, &mut settlement, 5_008);
        assert_eq!(engine.status(), RoundStatus::Idle);
        assert!(!engine.has_pending_tick());
        assert!(timers.is_empty());
    }

    #[test]
    fn test_auto_lock_commits_target() {
        let mut timers = TimerQueue::new();
        let mut settlement = funded_settlement(100);
        let mut engine = rocket();
        engine
            .start_with_crash_at(100, Some(2.0), 60_000, 0, &mut settlement, &mut timers)
            .expect("start");

        let resolved = run_until(&mut engine, &mut timers, &mut settlement, 20_000);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].outcome, Outcome::Win);
        assert_eq!(resolved[0].reward, 2.0);
        assert_eq!(resolved[0].wallet_delta, 200);
        assert_eq!(settlement.balance(), 200);
    }

    #[test]
    fn test_auto_lock_tie_with_crash() {
        // Target 1.9 is reached at ~8558ms; the tick at 8560ms also sees the crash.
        let run = |crash_at_ms: u64, target: f64| {
            let mut timers = TimerQueue::new();
            let mut settlement = funded_settlement(100);
            let mut engine = rocket();
            engine
                .start_with_crash_at(100, Some(target), crash_at_ms, 0, &mut settlement, &mut timers)
                .expect("start");
            let resolved = run_until(&mut engine, &mut timers, &mut settlement, 10_000);
            assert_eq!(resolved.len(), 1);
            resolved[0].outcome
        };

        // Crash at the same instant the target is reached: auto-lock wins.
        assert_eq!(run(8_560, 1.9), Outcome::Win);
        // Crash (1.8989x) just before the target: loss, even within the same tick.
        assert_eq!(run(8_550, 1.9), Outcome::Loss);
        assert_eq!(run(9_000, 2.5), Outcome::Loss);
    }

    #[test]
    fn test_late_lock_in_clamps_to_crash() {
        // Lock-in arriving after the crash instant but before the crash tick.
        let mut timers = TimerQueue::new();
        let mut settlement = funded_settlement(100);
        let mut engine = rocket();
        engine
            .start_with_crash_at(100, None, 1_000, 0, &mut settlement, &mut timers)
            .expect("start");
        run_until(&mut engine, &mut timers, &mut settlement, 999);
        let res = engine
            .lock_in(1_005, &mut settlement, &mut timers)
            .expect("resolution");
        assert_eq!(res.reward, RocketConfig::default().reward(1_000));
        assert!(run_until(&mut engine, &mut timers, &mut settlement, 2_000).is_empty());
    }

    #[test]
    fn test_stale_tick_ignored() {
        let mut timers = TimerQueue::new();
        let mut settlement = funded_settlement(100);
        let mut engine = rocket();
        engine
            .start_with_crash_at(100, None, 500, 0, &mut settlement, &mut timers)
            .expect("start");
        let fired = timers.drain_due(16);
        assert_eq!(fired.len(), 1);
        assert!(engine
            .on_tick(fired[0].handle, 16, &mut settlement, &mut timers)
            .is_none());
        // Replaying an already-handled tick past the crash must not resolve.
        assert!(engine
            .on_tick(fired[0].handle, 600, &mut settlement, &mut timers)
            .is_none());
        assert!(engine.status().is_active());
    }

    #[test]
    fn test_teardown_cancels_tick() {
        let mut timers = TimerQueue::new();
        let mut settlement = funded_settlement(0);
        let mut engine = balloon();
        engine
            .start(0, None, 0, &mut settlement, &mut timers)
            .expect("start");
        assert_eq!(timers.len(), 1);
        assert!(engine.teardown(0, &mut settlement, &mut timers).is_none());
        assert!(timers.is_empty());
        assert!(!engine.has_pending_tick());
        assert!(engine.status().is_idle());
        assert!(run_until(&mut engine, &mut timers, &mut settlement, 20_000).is_empty());
        assert_eq!(settlement.balance(), 0);
    }

    #[test]
    fn test_teardown_forfeits_active_round() {
        let mut timers = TimerQueue::new();
        let mut settlement = funded_settlement(1_000);
        let mut engine = rocket();
        let id = engine
            .start_with_crash_at(100, None, 6_000, 0, &mut settlement, &mut timers)
            .expect("start");
        run_until(&mut engine, &mut timers, &mut settlement, 32);

        let res = engine
            .teardown(40, &mut settlement, &mut timers)
            .expect("forfeit resolution");
        assert_eq!(res.round, id);
        assert_eq!(res.outcome, Outcome::Loss);
        assert_eq!(res.wallet_delta, 0);
        assert_eq!(res.net, -100);
        assert!(timers.is_empty());
        assert!(engine.status().is_idle());
        assert!(settlement.is_applied(id, Leg::Payout));

        // Coming back much later cannot lock in the crash value.
        assert!(engine.lock_in(600_000, &mut settlement, &mut timers).is_none());
        assert_eq!(settlement.balance(), 900);
        engine
            .start(100, None, 600_000, &mut settlement, &mut timers)
            .expect("restart after teardown");
    }

    proptest! {
        #[test]
        fn prop_rewards_non_decreasing(a in 0u64..60_000, b in 0u64..60_000) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let balloon = BalloonConfig::default();
            let rocket = RocketConfig::default();
            prop_assert!(balloon.reward(lo) <= balloon.reward(hi));
            prop_assert!(rocket.reward(lo) <= rocket.reward(hi));
        }

        #[test]
        fn prop_published_reward_monotonic(crash_at in 100u64..20_000, horizon in 0u64..25_000) {
            let mut timers = TimerQueue::new();
            let mut settlement = funded_settlement(100);
            let mut engine = rocket();
            engine
                .start_with_crash_at(100, None, crash_at, 0, &mut settlement, &mut timers)
                .expect("start");
            let mut last = engine.reward();
            let mut now = 0;
            while now < horizon && engine.status().is_active() {
                now += 16;
                run_until(&mut engine, &mut timers, &mut settlement, now);
                prop_assert!(engine.reward() >= last);
                last = engine.reward();
            }
        }

        #[test]
        fn prop_exactly_one_resolution(
            crash_at in 100u64..12_000,
            lock_at in proptest::option::of(0u64..15_000),
            auto in proptest::option::of(1.01f64..5.0),
        ) {
            let mut timers = TimerQueue::new();
            let mut settlement = funded_settlement(1_000);
            let mut engine = rocket();
            let round = engine
                .start_with_crash_at(100, auto, crash_at, 0, &mut settlement, &mut timers)
                .expect("start");

            let mut resolutions = Vec::new();
            if let Some(lock_at) = lock_at {
                resolutions.extend(run_until(&mut engine, &mut timers, &mut settlement, lock_at));
                resolutions.extend(engine.lock_in(lock_at, &mut settlement, &mut timers));
            }
            resolutions.extend(run_until(&mut engine, &mut timers, &mut settlement, 30_000));
            resolutions.extend(engine.lock_in(30_001, &mut settlement, &mut timers));

            prop_assert_eq!(resolutions.len(), 1);
            let res = &resolutions[0];
            prop_assert_eq!(res.round, round);
            prop_assert_eq!(settlement.balance() as i64, 1_000 + res.net);
            let crash_value = RocketConfig::default().reward(crash_at);
            match res.outcome {
                Outcome::Win => prop_assert!(res.reward <= crash_value + 1e-9),
                Outcome::Loss => prop_assert_eq!(res.reward, crash_value),
                Outcome::Push => prop_assert!(false, "crash rounds never push"),
            }
        }
    }
}
