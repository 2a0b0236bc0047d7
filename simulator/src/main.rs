use anyhow::{Context, Result};
use arcade_simulator::{run_live, LiveOptions, LiveWallet, SimulatorConfig, Strategy};
use arcade_types::{Direction, GameId};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML file overriding engine and simulation defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Estimate return-to-player over many simulated rounds.
    Rtp {
        #[arg(long)]
        game: GameId,

        /// Crash auto-lock target.
        #[arg(long, default_value_t = 2.0)]
        target: f64,

        /// Mines rows to clear before cashing out.
        #[arg(long, default_value_t = 3)]
        rows: usize,

        /// Price ticks to hold a trading position.
        #[arg(long, default_value_t = 20)]
        hold_ticks: u32,

        #[arg(long)]
        trials: Option<u64>,

        #[arg(long)]
        seed: Option<u64>,

        #[arg(long)]
        stake: Option<u64>,

        /// Worker chunks for the rayon pool (with the `parallel` feature).
        #[arg(long, default_value_t = 8)]
        chunks: u64,
    },
    /// Play one round in real time. Ctrl-C locks in or closes.
    Live {
        #[arg(long)]
        game: GameId,

        #[arg(long)]
        target: Option<f64>,

        #[arg(long)]
        stake: Option<u64>,

        #[arg(long, default_value_t = false)]
        short: bool,

        #[arg(long, default_value_t = 5_000)]
        hold_ms: u64,

        /// Starting balance of a throwaway wallet.
        #[arg(long, default_value_t = 1_000)]
        balance: u64,

        /// Play against the saved profile instead of a throwaway wallet.
        #[arg(long, default_value_t = false)]
        persist: bool,

        /// Profile directory (defaults to the platform data directory).
        #[arg(long, requires = "persist")]
        store_dir: Option<PathBuf>,

        /// Display name used when the saved profile is not set up yet.
        #[arg(long, default_value = "Player")]
        name: String,

        #[arg(long)]
        seed: Option<u64>,
    },
}

fn init_tracing(level: &str, json: bool) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level).context("invalid log level")?,
    };
    let builder = fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

fn build_config(args: &Args) -> Result<SimulatorConfig> {
    let mut config = match &args.config {
        Some(path) => SimulatorConfig::load(path)?,
        None => SimulatorConfig::default(),
    };
    match &args.command {
        Command::Rtp {
            trials,
            seed,
            stake,
            ..
        } => {
            config.trials = trials.unwrap_or(config.trials);
            config.seed = seed.unwrap_or(config.seed);
            config.stake = stake.unwrap_or(config.stake);
        }
        Command::Live { stake, .. } => {
            config.stake = stake.unwrap_or(config.stake);
        }
    }
    config.validate()?;
    Ok(config)
}

fn strategy_for(game: GameId, target: f64, rows: usize, hold_ticks: u32) -> Strategy {
    match game {
        GameId::Mines => Strategy::ClearRows(rows),
        GameId::TradeBoss => Strategy::HoldTicks(hold_ticks),
        _ => Strategy::CrashTarget(target),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level, args.json_logs)?;
    let config = build_config(&args)?;

    match args.command {
        Command::Rtp {
            game,
            target,
            rows,
            hold_ticks,
            chunks,
            ..
        } => {
            let strategy = strategy_for(game, target, rows, hold_ticks);
            #[cfg(feature = "parallel")]
            let stats = arcade_simulator::run_parallel(
                game,
                strategy,
                &config,
                config.trials,
                config.seed,
                chunks,
            )?;
            #[cfg(not(feature = "parallel"))]
            let stats = {
                let _ = chunks;
                arcade_simulator::run_trials(game, strategy, &config, config.trials, config.seed)?
            };
            println!("{game} {strategy:?}\n{stats}");
        }
        Command::Live {
            game,
            target,
            short,
            hold_ms,
            balance,
            persist,
            store_dir,
            name,
            seed,
            ..
        } => {
            let wallet = if persist {
                LiveWallet::Profile {
                    dir: store_dir,
                    name,
                }
            } else {
                LiveWallet::Local(balance)
            };
            let options = LiveOptions {
                game,
                stake: if game == GameId::Balloon { 0 } else { config.stake },
                target,
                direction: if short { Direction::Short } else { Direction::Long },
                hold_ms,
                wallet,
                seed,
            };
            let resolution = run_live(&config, options).await?;
            info!(round = %resolution.round, "done");
            println!(
                "{game}: {} at {:.2} (net {})",
                resolution.outcome.as_str(),
                resolution.reward,
                resolution.net
            );
        }
    }
    Ok(())
}
