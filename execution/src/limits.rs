//! Per-game daily play limits.
//!
//! Counters live in a [`GameLimits`] blob keyed by calendar date. Every
//! operation first rolls the blob over when the date has changed, so a new
//! day always starts with fresh counters. Only starts are gated: a round
//! already running when the date changes is never aborted.

use crate::games::GameError;
use arcade_types::{GameId, GameLimits, LimitPolicy};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{info, warn};

#[derive(Clone, Debug)]
pub struct DailyLimiter {
    limits: GameLimits,
    policies: BTreeMap<GameId, LimitPolicy>,
}

impl DailyLimiter {
    pub fn new(today: NaiveDate) -> Self {
        Self::from_limits(GameLimits::fresh(today), today)
    }

    /// Resume from persisted counters, discarding them if they are from another day.
    pub fn from_limits(mut limits: GameLimits, today: NaiveDate) -> Self {
        if limits.roll_over(today) {
            info!(%today, "stale daily limits discarded");
        }
        let policies = GameId::ALL
            .iter()
            .map(|&game| (game, LimitPolicy::default_for(game)))
            .collect();
        Self { limits, policies }
    }

    pub fn with_policy(mut self, game: GameId, policy: LimitPolicy) -> Self {
        self.policies.insert(game, policy);
        self
    }

    pub fn policy(&self, game: GameId) -> LimitPolicy {
        self.policies
            .get(&game)
            .copied()
            .unwrap_or(LimitPolicy::Unlimited)
    }

    pub fn limits(&self) -> &GameLimits {
        &self.limits
    }

    fn roll(&mut self, today: NaiveDate) {
        if self.limits.roll_over(today) {
            info!(%today, "daily limits reset");
        }
    }

    /// Rounds or seconds left today; `None` for unlimited games.
    pub fn remaining(&mut self, game: GameId, today: NaiveDate) -> Option<u32> {
        self.roll(today);
        match self.policy(game) {
            LimitPolicy::Unlimited => None,
            LimitPolicy::Rounds(max) => Some(max.saturating_sub(self.limits.rounds_played(game))),
            LimitPolicy::Seconds(max) => Some(max.saturating_sub(self.limits.seconds_used(game))),
        }
    }

    pub fn can_start(&mut self, game: GameId, today: NaiveDate) -> bool {
        self.remaining(game, today) != Some(0)
    }

    pub fn check(&mut self, game: GameId, today: NaiveDate) -> Result<(), GameError> {
        if self.can_start(game, today) {
            return Ok(());
        }
        warn!(%game, "daily limit reached");
        Err(GameError::LimitExhausted { game })
    }

    /// Count a started round. Returns today's count for `game`.
    pub fn record_round_start(&mut self, game: GameId, today: NaiveDate) -> u32 {
        self.roll(today);
        self.limits.increment_rounds(game)
    }

    /// Add seconds of play. Returns today's total for `game`.
    pub fn record_play_time(&mut self, game: GameId, seconds: u32, today: NaiveDate) -> u32 {
        self.roll(today);
        self.limits.add_seconds(game, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).expect("valid date")
    }

    #[test]
    fn test_balloon_round_limit() {
        let mut limiter = DailyLimiter::new(day(16));
        for played in 1..=15 {
            assert!(limiter.check(GameId::Balloon, day(16)).is_ok());
            assert_eq!(limiter.record_round_start(GameId::Balloon, day(16)), played);
        }
        assert_eq!(limiter.remaining(GameId::Balloon, day(16)), Some(0));
        assert_eq!(
            limiter.check(GameId::Balloon, day(16)),
            Err(GameError::LimitExhausted {
                game: GameId::Balloon
            })
        );

        // Next day starts fresh.
        assert!(limiter.can_start(GameId::Balloon, day(17)));
        assert_eq!(limiter.remaining(GameId::Balloon, day(17)), Some(15));
        assert_eq!(limiter.limits().date, day(17));
    }

    #[test]
    fn test_seconds_budget() {
        let mut limiter = DailyLimiter::new(day(16));
        assert_eq!(limiter.record_play_time(GameId::Triumph, 45, day(16)), 45);
        assert_eq!(limiter.remaining(GameId::Triumph, day(16)), Some(15));
        limiter.record_play_time(GameId::Triumph, 30, day(16));
        assert!(!limiter.can_start(GameId::Triumph, day(16)));
    }

    #[test]
    fn test_single_daily_round() {
        let mut limiter = DailyLimiter::new(day(16));
        limiter.record_round_start(GameId::TrueWar, day(16));
        assert!(limiter.check(GameId::TrueWar, day(16)).is_err());
        assert_eq!(limiter.remaining(GameId::NeonHockey, day(16)), Some(5));
    }

    #[test]
    fn test_unlimited_games() {
        let mut limiter = DailyLimiter::new(day(16));
        for _ in 0..100 {
            limiter.record_round_start(GameId::Rocket, day(16));
        }
        assert_eq!(limiter.remaining(GameId::Rocket, day(16)), None);
        assert!(limiter.can_start(GameId::Rocket, day(16)));
    }

    #[test]
    fn test_stale_limits_discarded() {
        let mut stale = GameLimits::fresh(day(15));
        stale.increment_rounds(GameId::Balloon);
        let limiter = DailyLimiter::from_limits(stale, day(16));
        assert_eq!(limiter.limits(), &GameLimits::fresh(day(16)));
    }

    #[test]
    fn test_custom_policy() {
        let mut limiter =
            DailyLimiter::new(day(16)).with_policy(GameId::Mines, LimitPolicy::Rounds(1));
        limiter.record_round_start(GameId::Mines, day(16));
        assert!(!limiter.can_start(GameId::Mines, day(16)));
    }
}
