use crate::{
    clock::ManualClock,
    games::TickDriven,
    rng::GameRng,
    scheduler::TimerQueue,
    settlement::{LocalWallet, Settlement, Wallet},
};
use arcade_types::Resolution;
use chrono::NaiveDate;

/// Calendar date used by fixtures.
pub fn test_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 16).unwrap_or_default()
}

/// Creates a deterministic game RNG.
pub fn create_rng(seed: u64) -> GameRng {
    GameRng::new(seed)
}

/// Creates a settlement ledger over a wallet holding `balance`.
pub fn funded_settlement(balance: u64) -> Settlement<LocalWallet> {
    Settlement::new(LocalWallet::new(balance))
}

/// Creates a manual clock at time zero on [`test_date`].
pub fn manual_clock() -> ManualClock {
    ManualClock::new(test_date())
}

/// Fires every tick due at or before `until_ms` in deadline order, using each
/// tick's deadline as the current time. Returns the resolutions produced.
pub fn run_until<E: TickDriven, W: Wallet>(
    engine: &mut E,
    timers: &mut TimerQueue,
    settlement: &mut Settlement<W>,
    until_ms: u64,
) -> Vec<Resolution> {
    let mut resolved = Vec::new();
    while let Some(due_ms) = timers.next_deadline() {
        if due_ms > until_ms {
            break;
        }
        for tick in timers.drain_due(due_ms) {
            resolved.extend(engine.on_tick(tick.handle, tick.due_ms, settlement, timers));
        }
    }
    resolved
}
