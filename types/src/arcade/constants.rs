/// Maximum display name length accepted during onboarding.
pub const MAX_NAME_LENGTH: usize = 32;

/// Balance granted to a freshly onboarded profile.
pub const INITIAL_BALANCE: u64 = 0;

/// Store key holding the serialized [`super::Profile`].
pub const PROFILE_KEY: &str = "user_data";

/// Store key holding the serialized [`super::GameLimits`].
pub const LIMITS_KEY: &str = "game_limits";

/// Basis points per 1.0x multiplier.
pub const BASIS_POINTS: u64 = 10_000;

// Balloon (time-indexed profit curve, loss settled at crash).
pub const BALLOON_BASE_VALUE: f64 = 10.0;
pub const BALLOON_GROWTH_RATE: f64 = 1.21;
pub const BALLOON_MIN_CRASH_MS: u64 = 1_000;
/// Raised to 12s so late cash-outs can approach ~100 units.
pub const BALLOON_MAX_CRASH_MS: u64 = 12_000;
pub const BALLOON_COOLDOWN_MS: u64 = 3_000;

// Rocket (stake debited up front, inverse-CDF crash draw).
pub const ROCKET_GROWTH_K: f64 = 0.075;
pub const ROCKET_TARGET_RTP: f64 = 0.97;
/// Crash multipliers above this are clamped to keep session variance bounded.
pub const ROCKET_MAX_CRASH_MULTIPLIER: f64 = 50.0;
pub const ROCKET_MIN_CRASH_MS: u64 = 100;
pub const ROCKET_WIN_COOLDOWN_MS: u64 = 3_000;
pub const ROCKET_LOSS_COOLDOWN_MS: u64 = 4_000;

/// One animation frame at ~60Hz.
pub const FRAME_TICK_MS: u64 = 16;

// Mines (three columns, one failure cell per row).
pub const MINES_COLUMNS: u8 = 3;
pub const MINES_GROWTH_FACTOR: f64 = 1.44;
pub const MINES_INITIAL_ROWS: usize = 20;
pub const MINES_REFILL_ROWS: usize = 10;
pub const MINES_REFILL_MARGIN: usize = 5;

// Trade Boss (leveraged position on a random-walk price).
pub const LEVERAGE_INITIAL_PRICE: f64 = 1_000.0;
pub const LEVERAGE_TICK_MS: u64 = 100;
pub const LEVERAGE_VOLATILITY: f64 = 1.5;
pub const LEVERAGE_TREND_AMPLITUDE: f64 = 0.2;
pub const LEVERAGE_TREND_PERIOD_MS: f64 = 2_000.0;
pub const LEVERAGE_MIN_PRICE: f64 = 0.01;
pub const LEVERAGE_FACTOR: f64 = 100.0;
pub const LEVERAGE_HISTORY_LEN: usize = 60;

// Daily limits.
pub const BALLOON_DAILY_ROUNDS: u32 = 15;
pub const TRUE_WAR_DAILY_ROUNDS: u32 = 1;
pub const NEON_HOCKEY_DAILY_ROUNDS: u32 = 5;
pub const TRIUMPH_DAILY_SECONDS: u32 = 60;
