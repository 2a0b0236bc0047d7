//! Headless driver for the arcade engines.
//!
//! [`rtp`] estimates return-to-player by replaying many rounds against a
//! simulated clock. [`live`] plays a single round in real time on a tokio
//! interval, the way an app shell would pump the engines every frame.

pub mod config;
pub mod live;
pub mod rtp;
pub mod stats;

pub use config::SimulatorConfig;
pub use live::{run_live, LiveOptions, LiveWallet};
#[cfg(feature = "parallel")]
pub use rtp::run_parallel;
pub use rtp::{run_trials, Strategy};
pub use stats::Stats;
