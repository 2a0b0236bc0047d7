//! Compact JSON log lines for the presentation layer.

use arcade_types::Resolution;
use std::fmt::Write;

pub fn clamp_i64(value: i128) -> i64 {
    value.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

/// Slack added before flooring so products such as `100 * 1.44` or
/// `1.15 * 10_000` do not land one unit low.
pub const PAYOUT_EPSILON: f64 = 1e-9;

/// Floor a non-negative float amount to whole currency units. Every payout
/// goes through here.
pub fn floor_units(value: f64) -> u64 {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    // `as` saturates at u64::MAX.
    (value + PAYOUT_EPSILON).floor() as u64
}

pub fn push_board_entry(out: &mut String, row: usize, failure: u8, selected: Option<u8>) {
    if !out.is_empty() {
        out.push(',');
    }
    match selected {
        Some(column) => {
            let _ = write!(
                out,
                r#"{{"row":{},"mine":{},"picked":{}}}"#,
                row, failure, column
            );
        }
        None => {
            let _ = write!(out, r#"{{"row":{},"mine":{}}}"#, row, failure);
        }
    }
}

/// One-line summary of a resolved round.
pub fn resolution_log(resolution: &Resolution) -> String {
    let mut out = String::with_capacity(128);
    let _ = write!(
        out,
        r#"{{"game":"{}","round":{},"outcome":"{}","stake":{},"delta":{},"net":{},"reward":{:.2}}}"#,
        resolution.game.as_str(),
        resolution.round.0,
        resolution.outcome.as_str(),
        resolution.stake,
        resolution.wallet_delta,
        resolution.net,
        resolution.reward,
    );
    out
}
