//! Discrete-choice mine engine.
//!
//! A round generates rows lazily, each with one hidden failure column. The
//! player picks a column on the active row: the failure column resolves the
//! round as a loss, any other column advances to the next row. Cashing out
//! after `n` cleared rows credits `floor(stake * growth_factor^n)`.
//!
//! The failure columns are revealed only once the round has resolved.

use super::{
    logging::{floor_units, push_board_entry},
    registry::MinesConfig,
    settle, GameError, RoundHeader,
};
use crate::{
    games::logging::clamp_i64,
    rng::GameRng,
    settlement::{Settlement, Wallet},
};
use arcade_types::{GameId, Outcome, Resolution, RoundId, RoundStatus};
use tracing::{debug, info};

impl MinesConfig {
    /// Multiplier shown on row `row` (0-based): `growth_factor^(row + 1)`.
    pub fn multiplier(&self, row: usize) -> f64 {
        self.growth_factor.powi(clamp_exponent(row.saturating_add(1)))
    }

    /// Credit for cashing out after `rows_cleared` rows.
    pub fn payout(&self, stake: u64, rows_cleared: usize) -> u64 {
        let multiplier = self.growth_factor.powi(clamp_exponent(rows_cleared));
        floor_units(stake as f64 * multiplier)
    }
}

fn clamp_exponent(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Row {
    failure_column: u8,
    selected: Option<u8>,
}

/// Presentation view of one row.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RowView {
    pub index: usize,
    pub multiplier: f64,
    pub selected: Option<u8>,
    /// `Some` only after the round has resolved.
    pub failure_column: Option<u8>,
}

/// Result of [`MinesEngine::select_cell`].
#[derive(Clone, Debug, PartialEq)]
pub enum CellOutcome {
    /// Not the active row, or no active round.
    Ignored,
    /// The row was cleared; play continues on `next_row`.
    Cleared {
        next_row: usize,
        multiplier: f64,
        cash_out_value: u64,
    },
    /// The failure cell was picked.
    Exploded(Resolution),
}

#[derive(Clone, Debug)]
struct MinesRound {
    header: RoundHeader,
    rows: Vec<Row>,
    active_row: usize,
}

impl MinesRound {
    fn board_log(&self) -> String {
        let mut out = String::new();
        for (index, row) in self.rows.iter().enumerate().take(self.active_row + 1) {
            push_board_entry(&mut out, index, row.failure_column, row.selected);
        }
        out
    }
}

#[derive(Debug)]
pub struct MinesEngine {
    config: MinesConfig,
    rng: GameRng,
    status: RoundStatus,
    round: Option<MinesRound>,
}

impl MinesEngine {
    pub fn new(config: MinesConfig, rng: GameRng) -> Self {
        Self {
            config,
            rng,
            status: RoundStatus::Idle,
            round: None,
        }
    }

    pub fn config(&self) -> &MinesConfig {
        &self.config
    }

    pub fn status(&self) -> RoundStatus {
        self.status
    }

    pub fn round_id(&self) -> Option<RoundId> {
        self.round.as_ref().map(|round| round.header.id)
    }

    pub fn active_row(&self) -> usize {
        self.round.as_ref().map_or(0, |round| round.active_row)
    }

    pub fn last_resolution(&self) -> Option<&Resolution> {
        self.round.as_ref().and_then(|round| round.header.resolution())
    }

    /// Multiplier earned so far (1.0 before the first cleared row).
    pub fn current_multiplier(&self) -> f64 {
        match self.active_row() {
            0 => 1.0,
            n => self.config.multiplier(n - 1),
        }
    }

    /// What [`Self::cash_out`] would credit right now.
    pub fn cash_out_value(&self) -> u64 {
        match (&self.round, self.status) {
            (Some(round), RoundStatus::Active) if round.active_row > 0 => {
                self.config.payout(round.header.stake, round.active_row)
            }
            _ => 0,
        }
    }

    pub fn rows(&self) -> Vec<RowView> {
        let Some(round) = self.round.as_ref() else {
            return Vec::new();
        };
        let revealed = self.status.is_resolved() || round.header.resolution().is_some();
        round
            .rows
            .iter()
            .enumerate()
            .map(|(index, row)| RowView {
                index,
                multiplier: self.config.multiplier(index),
                selected: row.selected,
                failure_column: revealed.then_some(row.failure_column),
            })
            .collect()
    }

    fn generate_rows(&mut self, count: usize) -> Vec<Row> {
        (0..count)
            .map(|_| Row {
                failure_column: self.rng.index(self.config.columns),
                selected: None,
            })
            .collect()
    }

    /// Start a round, debiting `stake`. Allowed whenever no round is active.
    pub fn start<W: Wallet>(
        &mut self,
        stake: u64,
        now_ms: u64,
        settlement: &mut Settlement<W>,
    ) -> Result<RoundId, GameError> {
        if self.status.is_active() {
            return Err(GameError::InvalidTransition {
                game: GameId::Mines,
                status: self.status,
                action: "start",
            });
        }
        if stake == 0 {
            return Err(GameError::InvalidStake {
                game: GameId::Mines,
                stake,
            });
        }
        settlement.ensure_funds(stake)?;

        let id = settlement.open_round();
        settlement.debit_stake(id, stake)?;
        let rows = self.generate_rows(self.config.initial_rows);
        self.round = Some(MinesRound {
            header: RoundHeader::new(id, GameId::Mines, stake, now_ms),
            rows,
            active_row: 0,
        });
        self.status = RoundStatus::Active;
        info!(game = %GameId::Mines, round = %id, stake, "round started");
        Ok(id)
    }

    /// Pick `column` on `row`. Only the active row of an active round counts.
    pub fn select_cell<W: Wallet>(
        &mut self,
        row: usize,
        column: u8,
        now_ms: u64,
        settlement: &mut Settlement<W>,
    ) -> Result<CellOutcome, GameError> {
        if column >= self.config.columns {
            return Err(GameError::InvalidCell {
                column,
                columns: self.config.columns,
            });
        }
        if !self.status.is_active() {
            debug!(row, column, status = %self.status, "selection ignored");
            return Ok(CellOutcome::Ignored);
        }
        let needs_refill = {
            let Some(round) = self.round.as_mut() else {
                return Ok(CellOutcome::Ignored);
            };
            if row != round.active_row {
                debug!(row, active = round.active_row, "selection off the active row");
                return Ok(CellOutcome::Ignored);
            }
            let Some(cell) = round.rows.get_mut(row) else {
                return Ok(CellOutcome::Ignored);
            };
            cell.selected = Some(column);

            if cell.failure_column == column {
                let net = -clamp_i64(i128::from(round.header.stake));
                let Some(resolution) = round.header.resolve(Outcome::Loss, 0, net, 0.0, now_ms)
                else {
                    return Ok(CellOutcome::Ignored);
                };
                info!(
                    game = %GameId::Mines,
                    round = %resolution.round,
                    row,
                    board = %round.board_log(),
                    "mine hit"
                );
                settle(settlement, &resolution);
                self.status = RoundStatus::Resolved(Outcome::Loss);
                return Ok(CellOutcome::Exploded(resolution));
            }

            round.active_row += 1;
            // A zero margin would let the active row run off the board.
            round.active_row + self.config.refill_margin.max(1) > round.rows.len()
        };

        if needs_refill {
            let extra = self.generate_rows(self.config.refill_rows);
            if let Some(round) = self.round.as_mut() {
                round.rows.extend(extra);
                debug!(rows = round.rows.len(), "rows refilled");
            }
        }

        let next_row = self.active_row();
        Ok(CellOutcome::Cleared {
            next_row,
            multiplier: self.config.multiplier(next_row - 1),
            cash_out_value: self.cash_out_value(),
        })
    }

    /// Bank the current multiplier. A no-op before the first cleared row or
    /// when no round is active.
    pub fn cash_out<W: Wallet>(
        &mut self,
        now_ms: u64,
        settlement: &mut Settlement<W>,
    ) -> Option<Resolution> {
        if !self.status.is_active() {
            debug!(status = %self.status, "cash-out ignored");
            return None;
        }
        let round = self.round.as_mut()?;
        if round.active_row == 0 {
            debug!("cash-out before the first cleared row ignored");
            return None;
        }
        let stake = round.header.stake;
        let payout = self.config.payout(stake, round.active_row);
        let reward = self.config.multiplier(round.active_row - 1);
        let wallet_delta = clamp_i64(i128::from(payout));
        let net = wallet_delta.saturating_sub(clamp_i64(i128::from(stake)));
        let resolution = round
            .header
            .resolve(Outcome::Win, wallet_delta, net, reward, now_ms)?;
        info!(
            game = %GameId::Mines,
            round = %resolution.round,
            rows = round.active_row,
            payout,
            "cashed out"
        );
        settle(settlement, &resolution);
        self.status = RoundStatus::Resolved(Outcome::Win);
        Some(resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{create_rng, funded_settlement};
    use arcade_types::Leg;
    use proptest::prelude::*;

    fn engine() -> MinesEngine {
        MinesEngine::new(MinesConfig::default(), create_rng(5))
    }

    /// Column that is safe on the active row.
    fn safe_column(engine: &MinesEngine) -> u8 {
        let round = engine.round.as_ref().expect("active round");
        (round.rows[round.active_row].failure_column + 1) % engine.config.columns
    }

    fn failure_column(engine: &MinesEngine) -> u8 {
        let round = engine.round.as_ref().expect("active round");
        round.rows[round.active_row].failure_column
    }

    #[test]
    fn test_multiplier_and_payout() {
        let config = MinesConfig::default();
        assert!((config.multiplier(0) - 1.44).abs() < 1e-12);
        assert!((config.multiplier(1) - 2.0736).abs() < 1e-12);
        assert_eq!(config.payout(100, 0), 100);
        assert_eq!(config.payout(100, 1), 144);
        assert_eq!(config.payout(100, 2), 207);
        assert_eq!(config.payout(25, 1), 36);
    }

    #[test]
    fn test_two_rows_then_cash_out() {
        let mut settlement = funded_settlement(1_000);
        let mut engine = engine();
        let round = engine.start(100, 0, &mut settlement).expect("start");
        assert_eq!(settlement.balance(), 900);
        assert!(engine.rows().iter().all(|row| row.failure_column.is_none()));

        for expected_row in 1..=2 {
            let column = safe_column(&engine);
            let outcome = engine
                .select_cell(expected_row - 1, column, 10, &mut settlement)
                .expect("valid cell");
            assert!(matches!(
                outcome,
                CellOutcome::Cleared { next_row, .. } if next_row == expected_row
            ));
        }
        assert_eq!(engine.cash_out_value(), 207);

        let res = engine.cash_out(20, &mut settlement).expect("resolution");
        assert_eq!(res.round, round);
        assert_eq!(res.wallet_delta, 207);
        assert_eq!(res.net, 107);
        assert_eq!(settlement.balance(), 1_107);
        assert_eq!(engine.status(), RoundStatus::Resolved(Outcome::Win));
        assert!(engine.rows().iter().all(|row| row.failure_column.is_some()));

        assert!(engine.cash_out(30, &mut settlement).is_none());
        assert_eq!(settlement.balance(), 1_107);
    }

    #[test]
    fn test_mine_hit_loses_stake() {
        let mut settlement = funded_settlement(100);
        let mut engine = engine();
        let round = engine.start(100, 0, &mut settlement).expect("start");
        let column = failure_column(&engine);

        let outcome = engine
            .select_cell(0, column, 5, &mut settlement)
            .expect("valid cell");
        let CellOutcome::Exploded(res) = outcome else {
            panic!("expected a mine");
        };
        assert_eq!(res.outcome, Outcome::Loss);
        assert_eq!(res.net, -100);
        assert_eq!(settlement.balance(), 0);
        assert!(settlement.is_applied(round, Leg::Payout));

        // Later intents are no-ops.
        assert_eq!(
            engine.select_cell(0, 0, 6, &mut settlement),
            Ok(CellOutcome::Ignored)
        );
        assert!(engine.cash_out(7, &mut settlement).is_none());
    }

    #[test]
    fn test_selection_rules() {
        let mut settlement = funded_settlement(500);
        let mut engine = engine();
        assert_eq!(
            engine.select_cell(0, 0, 0, &mut settlement),
            Ok(CellOutcome::Ignored)
        );
        engine.start(100, 0, &mut settlement).expect("start");
        assert_eq!(
            engine.select_cell(0, 3, 0, &mut settlement),
            Err(GameError::InvalidCell {
                column: 3,
                columns: 3
            })
        );
        assert_eq!(
            engine.select_cell(4, 0, 0, &mut settlement),
            Ok(CellOutcome::Ignored)
        );
        assert!(engine.cash_out(0, &mut settlement).is_none());
        assert!(engine.status().is_active());
        assert_eq!(settlement.balance(), 400);
    }

    #[test]
    fn test_start_rules() {
        let mut settlement = funded_settlement(150);
        let mut engine = engine();
        assert!(matches!(
            engine.start(0, 0, &mut settlement),
            Err(GameError::InvalidStake { .. })
        ));
        assert!(matches!(
            engine.start(200, 0, &mut settlement),
            Err(GameError::InsufficientStake { .. })
        ));
        engine.start(100, 0, &mut settlement).expect("start");
        assert!(matches!(
            engine.start(10, 0, &mut settlement),
            Err(GameError::InvalidTransition { .. })
        ));

        // A resolved round may be followed immediately by a new one.
        let column = failure_column(&engine);
        engine
            .select_cell(0, column, 1, &mut settlement)
            .expect("valid cell");
        let next = engine.start(50, 2, &mut settlement).expect("restart");
        assert_eq!(engine.round_id(), Some(next));
        assert_eq!(engine.active_row(), 0);
        assert_eq!(settlement.balance(), 0);
    }

    #[test]
    fn test_rows_refill_ahead() {
        let mut settlement = funded_settlement(100);
        let mut engine = engine();
        engine.start(1, 0, &mut settlement).expect("start");
        assert_eq!(engine.rows().len(), 20);

        for row in 0..16 {
            let column = safe_column(&engine);
            engine
                .select_cell(row, column, 0, &mut settlement)
                .expect("valid cell");
        }
        // active_row 16: 16 + 5 > 20 triggered one refill.
        assert_eq!(engine.active_row(), 16);
        assert_eq!(engine.rows().len(), 30);
    }

    #[test]
    fn test_board_keeps_growing_without_margin() {
        let config = MinesConfig {
            refill_margin: 0,
            ..MinesConfig::default()
        };
        let mut settlement = funded_settlement(100);
        let mut engine = MinesEngine::new(config, create_rng(6));
        engine.start(1, 0, &mut settlement).expect("start");

        for row in 0..25 {
            let column = safe_column(&engine);
            let outcome = engine
                .select_cell(row, column, 0, &mut settlement)
                .expect("valid cell");
            assert!(
                matches!(outcome, CellOutcome::Cleared { next_row, .. } if next_row == row + 1),
                "row {row} was not cleared: {outcome:?}"
            );
        }
        assert_eq!(engine.active_row(), 25);
        assert!(engine.rows().len() > 25);
    }

    proptest! {
        #[test]
        fn prop_payout_formula(stake in 1u64..1_000_000, rows in 0usize..25) {
            let config = MinesConfig::default();
            let exact = stake as f64 * 1.44f64.powi(rows as i32);
            let payout = config.payout(stake, rows);
            prop_assert!(payout as f64 <= exact + 1e-6);
            prop_assert!(exact - (payout as f64) < 1.0 + 1e-6);
        }

        #[test]
        fn prop_round_settles_once(picks in proptest::collection::vec((0usize..4, 0u8..3), 1..40)) {
            let mut settlement = funded_settlement(100);
            let mut engine = engine();
            engine.start(100, 0, &mut settlement).expect("start");
            let mut resolutions = 0;
            for (row, column) in picks {
                if let Ok(CellOutcome::Exploded(_)) = engine.select_cell(row, column, 0, &mut settlement) {
                    resolutions += 1;
                }
            }
            resolutions += engine.cash_out(0, &mut settlement).into_iter().count();
            resolutions += engine.cash_out(0, &mut settlement).into_iter().count();
            prop_assert!(resolutions <= 1);
            prop_assert!(!engine.status().is_active() || engine.active_row() == 0);
        }
    }
}
