//! Real-time round driven by a tokio interval against the wall clock.

use crate::config::SimulatorConfig;
use anyhow::{bail, Context, Result};
use arcade_execution::{
    Arcade, Clock, FileStore, GameRng, KeyValueStore, LocalWallet, SystemClock, Wallet,
};
use arcade_types::{
    arcade::{GameLimits, FRAME_TICK_MS},
    Direction, GameId, Resolution,
};
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::{interval, sleep_until, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Where a live session keeps its balance.
#[derive(Clone, Debug, PartialEq)]
pub enum LiveWallet {
    /// Throwaway in-memory balance.
    Local(u64),
    /// Saved profile in a file store; `None` uses the platform data directory.
    Profile { dir: Option<PathBuf>, name: String },
}

#[derive(Clone, Debug)]
pub struct LiveOptions {
    pub game: GameId,
    pub stake: u64,
    pub target: Option<f64>,
    pub direction: Direction,
    pub hold_ms: u64,
    pub wallet: LiveWallet,
    pub seed: Option<u64>,
}

/// Play one round live. Ctrl-C locks in a crash round or closes a position.
pub async fn run_live(config: &SimulatorConfig, options: LiveOptions) -> Result<Resolution> {
    let clock = SystemClock::new();
    let rng = match options.seed {
        Some(seed) => GameRng::new(seed),
        None => GameRng::from_entropy(),
    };
    let registry = config.registry()?;

    match &options.wallet {
        LiveWallet::Local(balance) => {
            let today = clock.today();
            let mut arcade = Arcade::new(
                clock,
                LocalWallet::new(*balance),
                registry,
                GameLimits::fresh(today),
                rng,
            );
            play(&mut arcade, &options).await
        }
        LiveWallet::Profile { dir, name } => {
            let mut store = match dir {
                Some(dir) => FileStore::new(dir),
                None => FileStore::default_location()?,
            };
            let mut arcade = Arcade::load(clock, &store, registry, rng)
                .with_context(|| format!("failed to load profile from {}", store.dir().display()))?;
            if !arcade.is_onboarded() {
                arcade.set_name(name)?;
            }
            let outcome = play(&mut arcade, &options).await;
            // Starts and settled rounds are persisted even when the round errs.
            save(&arcade, &mut store)?;
            outcome
        }
    }
}

fn save<C: Clock, S: KeyValueStore>(arcade: &Arcade<C>, store: &mut S) -> Result<()> {
    arcade.save(store).context("failed to save profile")?;
    info!(balance = arcade.balance(), "profile saved");
    Ok(())
}

async fn play<W: Wallet>(
    arcade: &mut Arcade<SystemClock, W>,
    options: &LiveOptions,
) -> Result<Resolution> {
    let game = options.game;
    let hold = match game {
        GameId::Balloon => {
            arcade.start_balloon(options.target)?;
            None
        }
        GameId::Rocket => {
            arcade.start_rocket(options.stake, options.target)?;
            None
        }
        GameId::TradeBoss => {
            arcade.enter_trading();
            arcade.open_position(options.direction, options.stake)?;
            Some(Instant::now() + Duration::from_millis(options.hold_ms))
        }
        GameId::Mines => bail!("mines has no clock; use the rtp command"),
        other => bail!("{other} has no round engine"),
    };
    info!(%game, stake = options.stake, balance = arcade.balance(), "live round started");

    let mut frames = interval(Duration::from_millis(FRAME_TICK_MS));
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let deadline = hold.unwrap_or_else(|| Instant::now() + Duration::from_secs(3_600));
    let mut interrupted = false;

    let resolution = loop {
        tokio::select! {
            _ = frames.tick() => {
                if let Some(resolution) = arcade.pump().into_iter().find(|r| r.game == game) {
                    break Some(resolution);
                }
                if let Some(snapshot) = arcade.crash_snapshot(game) {
                    debug!(%game, reward = snapshot.reward, elapsed_ms = snapshot.elapsed_ms, "tick");
                } else if let Some(position) = arcade.trade().position() {
                    debug!(price = arcade.trade().price(), pnl = position.pnl, "tick");
                }
            }
            _ = sleep_until(deadline), if hold.is_some() => {
                break arcade.close_position();
            }
            signal = tokio::signal::ctrl_c(), if !interrupted => {
                signal.context("failed to listen for ctrl-c")?;
                interrupted = true;
                let resolution = match game {
                    GameId::TradeBoss => arcade.close_position(),
                    _ => arcade.lock_in(game),
                };
                if resolution.is_some() {
                    break resolution;
                }
            }
        }
    };
    arcade.leave(game);

    let resolution = resolution.context("round ended without a resolution")?;
    info!(
        %game,
        outcome = resolution.outcome.as_str(),
        reward = resolution.reward,
        net = resolution.net,
        balance = arcade.balance(),
        "live round finished"
    );
    Ok(resolution)
}
