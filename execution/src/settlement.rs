//! Idempotent settlement.
//!
//! Each round touches the wallet through at most two legs: the stake debit at
//! start and the payout delta at resolution. Both are keyed by
//! `(RoundId, Leg)` and applied at most once, so a resolution observed twice
//! (lock-in racing a crash tick, a duplicate close) never moves money twice.
//!
//! Round ids are issued in order, so the ledger only remembers rounds still
//! awaiting their payout. Any issued id below the counter that is not pending
//! is closed, and both of its legs count as applied.

use crate::games::{logging::clamp_i64, GameError};
use arcade_types::{Leg, Profile, Resolution, RoundId};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Balance holder the settlement ledger writes to.
pub trait Wallet {
    fn balance(&self) -> u64;

    /// Apply a signed delta, clamping at zero. Returns the new balance.
    fn apply_delta(&mut self, delta: i64) -> u64;
}

fn clamped(balance: u64, delta: i64) -> u64 {
    if delta >= 0 {
        balance.saturating_add(delta.unsigned_abs())
    } else {
        balance.saturating_sub(delta.unsigned_abs())
    }
}

/// Bare in-memory balance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LocalWallet {
    balance: u64,
}

impl LocalWallet {
    pub fn new(balance: u64) -> Self {
        Self { balance }
    }
}

impl Wallet for LocalWallet {
    fn balance(&self) -> u64 {
        self.balance
    }

    fn apply_delta(&mut self, delta: i64) -> u64 {
        self.balance = clamped(self.balance, delta);
        self.balance
    }
}

impl Wallet for Profile {
    fn balance(&self) -> u64 {
        self.balance
    }

    fn apply_delta(&mut self, delta: i64) -> u64 {
        self.balance = clamped(self.balance, delta);
        self.balance
    }
}

/// At-most-once ledger in front of a [`Wallet`].
#[derive(Debug)]
pub struct Settlement<W: Wallet = LocalWallet> {
    wallet: W,
    /// Issued rounds without a payout, mapped to whether the stake was debited.
    pending: BTreeMap<RoundId, bool>,
    next_round: u64,
}

impl<W: Wallet> Settlement<W> {
    pub fn new(wallet: W) -> Self {
        Self {
            wallet,
            pending: BTreeMap::new(),
            next_round: 1,
        }
    }

    pub fn wallet(&self) -> &W {
        &self.wallet
    }

    /// Mutable access for non-monetary fields. Balance changes go through the ledger.
    pub fn wallet_mut(&mut self) -> &mut W {
        &mut self.wallet
    }

    pub fn balance(&self) -> u64 {
        self.wallet.balance()
    }

    /// Allocate the identifier for a new round.
    pub fn open_round(&mut self) -> RoundId {
        let id = RoundId(self.next_round);
        self.next_round += 1;
        self.pending.insert(id, false);
        id
    }

    /// Rounds issued and not yet paid out.
    pub fn open_rounds(&self) -> usize {
        self.pending.len()
    }

    pub fn is_applied(&self, round: RoundId, leg: Leg) -> bool {
        match self.pending.get(&round) {
            Some(debited) => leg == Leg::Stake && *debited,
            None => round.0 < self.next_round,
        }
    }

    /// Track a round id this ledger did not issue. Ids up to it are retired.
    fn adopt(&mut self, round: RoundId) {
        if round.0 >= self.next_round {
            self.next_round = round.0.saturating_add(1);
            self.pending.insert(round, false);
        }
    }

    /// Check the wallet can cover `stake` without touching it.
    pub fn ensure_funds(&self, stake: u64) -> Result<(), GameError> {
        let balance = self.wallet.balance();
        if stake > balance {
            return Err(GameError::InsufficientStake { stake, balance });
        }
        Ok(())
    }

    /// Debit the stake leg of `round`. Returns the new balance.
    pub fn debit_stake(&mut self, round: RoundId, stake: u64) -> Result<u64, GameError> {
        self.adopt(round);
        if self.is_applied(round, Leg::Stake) {
            return Err(GameError::AlreadySettled {
                round,
                leg: Leg::Stake,
            });
        }
        self.ensure_funds(stake)?;
        let balance = self.wallet.apply_delta(-clamp_i64(i128::from(stake)));
        self.pending.insert(round, true);
        debug!(%round, stake, balance, "stake debited");
        Ok(balance)
    }

    /// Apply the payout leg of a resolution. Returns the new balance.
    ///
    /// Zero-delta resolutions are still recorded so a later duplicate is refused.
    pub fn settle(&mut self, resolution: &Resolution) -> Result<u64, GameError> {
        self.adopt(resolution.round);
        if self.pending.remove(&resolution.round).is_none() {
            return Err(GameError::AlreadySettled {
                round: resolution.round,
                leg: Leg::Payout,
            });
        }
        let balance = self.wallet.apply_delta(resolution.wallet_delta);
        info!(
            round = %resolution.round,
            game = %resolution.game,
            outcome = resolution.outcome.as_str(),
            delta = resolution.wallet_delta,
            net = resolution.net,
            balance,
            "round settled"
        );
        Ok(balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcade_types::{GameId, Outcome};

    fn resolution(round: u64, wallet_delta: i64) -> Resolution {
        Resolution {
            round: RoundId(round),
            game: GameId::Rocket,
            outcome: Outcome::Win,
            stake: 100,
            wallet_delta,
            net: wallet_delta - 100,
            reward: 1.5,
            resolved_at_ms: 1_000,
        }
    }

    #[test]
    fn test_round_ids_increase() {
        let mut settlement = Settlement::new(LocalWallet::new(0));
        assert_eq!(settlement.open_round(), RoundId(1));
        assert_eq!(settlement.open_round(), RoundId(2));
    }

    #[test]
    fn test_stake_debit_once() {
        let mut settlement = Settlement::new(LocalWallet::new(500));
        let round = settlement.open_round();
        assert_eq!(settlement.debit_stake(round, 100), Ok(400));
        assert_eq!(
            settlement.debit_stake(round, 100),
            Err(GameError::AlreadySettled {
                round,
                leg: Leg::Stake
            })
        );
        assert_eq!(settlement.balance(), 400);
    }

    #[test]
    fn test_insufficient_stake_leaves_wallet() {
        let mut settlement = Settlement::new(LocalWallet::new(50));
        let round = settlement.open_round();
        assert_eq!(
            settlement.debit_stake(round, 100),
            Err(GameError::InsufficientStake {
                stake: 100,
                balance: 50
            })
        );
        assert_eq!(settlement.balance(), 50);
        assert!(!settlement.is_applied(round, Leg::Stake));
    }

    #[test]
    fn test_payout_applied_once() {
        let mut settlement = Settlement::new(LocalWallet::new(0));
        let res = resolution(1, 150);
        assert_eq!(settlement.settle(&res), Ok(150));
        assert!(settlement.settle(&res).is_err());
        assert_eq!(settlement.balance(), 150);
    }

    #[test]
    fn test_zero_delta_still_recorded() {
        let mut settlement = Settlement::new(LocalWallet::new(10));
        let res = resolution(4, 0);
        assert_eq!(settlement.settle(&res), Ok(10));
        assert!(settlement.is_applied(RoundId(4), Leg::Payout));
    }

    #[test]
    fn test_negative_delta_clamps_at_zero() {
        let mut settlement = Settlement::new(LocalWallet::new(10));
        assert_eq!(settlement.settle(&resolution(2, -25)), Ok(0));
    }

    #[test]
    fn test_ledger_forgets_closed_rounds() {
        let mut settlement = Settlement::new(LocalWallet::new(1_000_000));
        let mut last = None;
        for _ in 0..10_000 {
            let round = settlement.open_round();
            settlement.debit_stake(round, 10).expect("debit");
            assert_eq!(settlement.open_rounds(), 1);
            settlement
                .settle(&resolution(round.0, 10))
                .expect("settle");
            assert_eq!(settlement.open_rounds(), 0);
            last = Some(round);
        }
        let last = last.expect("rounds played");
        assert!(settlement.is_applied(last, Leg::Stake));
        assert!(settlement.is_applied(last, Leg::Payout));
        assert!(settlement.is_applied(RoundId(1), Leg::Payout));
        assert!(settlement.settle(&resolution(1, 10)).is_err());
        assert_eq!(settlement.balance(), 1_000_000);
    }

    #[test]
    fn test_pending_round_legs() {
        let mut settlement = Settlement::new(LocalWallet::new(100));
        let staked = settlement.open_round();
        let free = settlement.open_round();
        settlement.debit_stake(staked, 40).expect("debit");
        assert!(settlement.is_applied(staked, Leg::Stake));
        assert!(!settlement.is_applied(staked, Leg::Payout));
        assert!(!settlement.is_applied(free, Leg::Stake));
        assert!(!settlement.is_applied(RoundId(99), Leg::Payout));
        assert_eq!(settlement.open_rounds(), 2);

        settlement.settle(&resolution(free.0, 5)).expect("settle");
        assert_eq!(settlement.open_rounds(), 1);
        assert!(settlement.is_applied(free, Leg::Payout));
        assert_eq!(settlement.balance(), 65);
    }

    #[test]
    fn test_profile_is_a_wallet() {
        let mut profile = Profile::new("Awa".to_string()).expect("valid name");
        assert_eq!(profile.apply_delta(40), 40);
        assert_eq!(profile.apply_delta(-100), 0);
    }
}
