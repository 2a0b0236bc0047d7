//! Headless return-to-player estimation.
//!
//! Each run drives one engine against its own [`TimerQueue`] and a ledger with
//! an effectively unlimited balance. Simulated time jumps straight to the next
//! tick deadline, so a trial costs one call per scheduled tick.

use crate::{config::SimulatorConfig, stats::Stats};
use anyhow::{bail, Context, Result};
use arcade_execution::{
    BalloonEngine, CellOutcome, GameRng, LeverageEngine, LocalWallet, MinesEngine,
    RocketEngine, Settlement, TickDriven, TimerQueue,
};
use arcade_types::{Direction, GameId, Resolution};
use tracing::{debug, info};

const HOUSE_BALANCE: u64 = u64::MAX / 4;

/// Player behaviour applied to every trial.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Strategy {
    /// Auto-lock a crash round at this reward.
    CrashTarget(f64),
    /// Clear this many mines rows, then cash out.
    ClearRows(usize),
    /// Hold a random-direction position for this many price ticks.
    HoldTicks(u32),
}

impl Strategy {
    fn check(&self, game: GameId) -> Result<()> {
        match (game, self) {
            (GameId::Balloon | GameId::Rocket, Strategy::CrashTarget(target)) => {
                anyhow::ensure!(target.is_finite(), "crash target must be finite");
            }
            (GameId::Mines, Strategy::ClearRows(rows)) => {
                anyhow::ensure!(*rows > 0, "must clear at least one row");
            }
            (GameId::TradeBoss, Strategy::HoldTicks(_)) => {}
            (game, strategy) if !game.has_engine() => {
                bail!("{game} has no round engine to simulate ({strategy:?})")
            }
            (game, strategy) => bail!("strategy {strategy:?} does not apply to {game}"),
        }
        Ok(())
    }
}

/// Play `trials` rounds of `game` and collect their net results.
pub fn run_trials(
    game: GameId,
    strategy: Strategy,
    config: &SimulatorConfig,
    trials: u64,
    seed: u64,
) -> Result<Stats> {
    strategy.check(game)?;
    let mut timers = TimerQueue::new();
    let mut settlement = Settlement::new(LocalWallet::new(HOUSE_BALANCE));
    let mut stats = Stats::default();
    let mut now_ms = 0;

    match (game, strategy) {
        (GameId::Balloon, Strategy::CrashTarget(target)) => {
            let mut engine = BalloonEngine::new(config.balloon.clone(), GameRng::new(seed));
            for _ in 0..trials {
                engine.start(0, Some(target), now_ms, &mut settlement, &mut timers)?;
                let resolution = drain_round(&mut engine, &mut timers, &mut settlement, &mut now_ms)?;
                stats.add(resolution.net, resolution.stake);
            }
        }
        (GameId::Rocket, Strategy::CrashTarget(target)) => {
            let mut engine = RocketEngine::new(config.rocket.clone(), GameRng::new(seed));
            for _ in 0..trials {
                engine.start(config.stake, Some(target), now_ms, &mut settlement, &mut timers)?;
                let resolution = drain_round(&mut engine, &mut timers, &mut settlement, &mut now_ms)?;
                stats.add(resolution.net, resolution.stake);
            }
        }
        (GameId::Mines, Strategy::ClearRows(rows)) => {
            let mut engine = MinesEngine::new(config.mines.clone(), GameRng::new(seed));
            let mut picker = GameRng::new(seed).fork(u64::from(u32::MAX));
            for _ in 0..trials {
                let resolution = play_mines(
                    &mut engine,
                    &mut picker,
                    rows,
                    config.stake,
                    now_ms,
                    &mut settlement,
                )?;
                now_ms += 1;
                stats.add(resolution.net, resolution.stake);
            }
        }
        (GameId::TradeBoss, Strategy::HoldTicks(ticks)) => {
            let mut engine = LeverageEngine::new(config.leverage.clone(), GameRng::new(seed));
            let mut picker = GameRng::new(seed).fork(u64::from(u32::MAX));
            engine.start_feed(now_ms, &mut timers);
            for _ in 0..trials {
                let direction = if picker.unit() < 0.5 {
                    Direction::Long
                } else {
                    Direction::Short
                };
                let resolution = hold_position(
                    &mut engine,
                    direction,
                    ticks,
                    config.stake,
                    &mut timers,
                    &mut settlement,
                    &mut now_ms,
                )?;
                stats.add(resolution.net, resolution.stake);
            }
        }
        (game, strategy) => bail!("strategy {strategy:?} does not apply to {game}"),
    }

    info!(
        %game,
        ?strategy,
        seed,
        trials = stats.trials,
        mean_net = stats.mean_net(),
        rtp = stats.rtp(),
        "simulation finished"
    );
    Ok(stats)
}

/// Split `trials` into seeded chunks and run them across the rayon pool.
#[cfg(feature = "parallel")]
pub fn run_parallel(
    game: GameId,
    strategy: Strategy,
    config: &SimulatorConfig,
    trials: u64,
    seed: u64,
    chunks: u64,
) -> Result<Stats> {
    use rayon::prelude::*;

    let chunks = chunks.clamp(1, trials.max(1));
    let per_chunk = trials / chunks;
    let extra = trials % chunks;
    (0..chunks)
        .into_par_iter()
        .map(|chunk| {
            let count = per_chunk + u64::from(chunk < extra);
            run_trials(game, strategy, config, count, seed.wrapping_add(chunk))
        })
        .try_reduce(Stats::default, |mut acc, part| {
            acc.merge(&part);
            Ok(acc)
        })
}

/// Feed due ticks until the engine resolves and sits idle again.
fn drain_round<E: TickDriven + IdleAware>(
    engine: &mut E,
    timers: &mut TimerQueue,
    settlement: &mut Settlement<LocalWallet>,
    now_ms: &mut u64,
) -> Result<Resolution> {
    let mut resolved = None;
    while resolved.is_none() || !engine.is_idle() {
        let due_ms = timers
            .next_deadline()
            .context("round stalled with no pending tick")?;
        *now_ms = due_ms;
        for tick in timers.drain_due(due_ms) {
            if let Some(resolution) = engine.on_tick(tick.handle, due_ms, settlement, timers) {
                resolved = Some(resolution);
            }
        }
    }
    resolved.context("round went idle without resolving")
}

fn play_mines(
    engine: &mut MinesEngine,
    picker: &mut GameRng,
    rows: usize,
    stake: u64,
    now_ms: u64,
    settlement: &mut Settlement<LocalWallet>,
) -> Result<Resolution> {
    engine.start(stake, now_ms, settlement)?;
    let columns = engine.config().columns;
    loop {
        let row = engine.active_row();
        match engine.select_cell(row, picker.index(columns), now_ms, settlement)? {
            CellOutcome::Exploded(resolution) => return Ok(resolution),
            CellOutcome::Cleared { next_row, .. } if next_row >= rows => {
                return engine
                    .cash_out(now_ms, settlement)
                    .context("cash-out after a cleared row must resolve");
            }
            CellOutcome::Cleared { .. } => {}
            CellOutcome::Ignored => bail!("selection on active row {row} was ignored"),
        }
    }
}

fn hold_position(
    engine: &mut LeverageEngine,
    direction: Direction,
    ticks: u32,
    stake: u64,
    timers: &mut TimerQueue,
    settlement: &mut Settlement<LocalWallet>,
    now_ms: &mut u64,
) -> Result<Resolution> {
    engine.open(direction, stake, *now_ms, settlement)?;
    for _ in 0..ticks {
        let due_ms = timers
            .next_deadline()
            .context("price feed stopped ticking")?;
        *now_ms = due_ms;
        for tick in timers.drain_due(due_ms) {
            if let Some(resolution) = engine.on_tick(tick.handle, due_ms, settlement, timers) {
                debug!(round = %resolution.round, "position liquidated");
                return Ok(resolution);
            }
        }
    }
    engine
        .close(*now_ms, settlement)
        .context("open position must close")
}

/// Engines whose cooldown ends in [`arcade_types::RoundStatus::Idle`].
trait IdleAware {
    fn is_idle(&self) -> bool;
}

impl IdleAware for BalloonEngine {
    fn is_idle(&self) -> bool {
        self.status().is_idle()
    }
}

impl IdleAware for RocketEngine {
    fn is_idle(&self) -> bool {
        self.status().is_idle()
    }
}
