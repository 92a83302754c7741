//! Mines model
//!
//! A 5x5 grid hides a chosen number of mines. Each safe reveal
//! compounds the payout; hitting a mine forfeits everything. Payouts
//! are pure functions of bet, mine count, and reveal count, so any
//! round state can be re-priced without replaying it.

use serde::Serialize;

use super::GameError;
use crate::config::MinesConfig;
use crate::rng::Dice;

pub const GRID_CELLS: u8 = 25;

/// Chance that the next reveal is safe, given the mines still hidden
/// and the cells already opened. Callers keep `opened` strictly below
/// the number of safe cells.
pub fn survival_chance(mine_count: u8, opened: u8) -> f64 {
    let remaining = (GRID_CELLS - opened) as f64;
    let safe = (GRID_CELLS - mine_count - opened) as f64;
    safe / remaining
}

/// Keep the survival chance away from zero so its reciprocal stays
/// finite.
fn clamped_chance(chance: f64) -> f64 {
    chance.max(0.01)
}

/// Per-step multiplier for a reveal made at the given survival chance:
/// the house-discounted fair odds, never below the configured floor.
pub fn step_multiplier(config: &MinesConfig, chance: f64) -> f64 {
    let fair = 1.0 / clamped_chance(chance);
    (fair * config.house_margin).max(config.floor_multiplier)
}

/// Total payout owed after `revealed` safe reveals: the bet compounded
/// by the current step multiplier once per reveal, rounded down.
pub fn payout_after(config: &MinesConfig, bet: u64, mine_count: u8, revealed: u8) -> u64 {
    if revealed == 0 {
        return bet;
    }
    let chance = survival_chance(mine_count, revealed - 1);
    let multiplier = step_multiplier(config, chance);
    (bet as f64 * multiplier.powi(revealed as i32)).floor() as u64
}

/// Profit component of [`payout_after`], never negative.
pub fn profit_after(config: &MinesConfig, bet: u64, mine_count: u8, revealed: u8) -> u64 {
    payout_after(config, bet, mine_count, revealed).saturating_sub(bet)
}

/// What a reveal did to the round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealOutcome {
    /// Safe cell, round continues.
    Safe { profit: u64, payout: u64 },
    /// Last safe cell opened, round settles itself.
    Cleared {
        profit: u64,
        payout: u64,
        mines: Vec<u8>,
    },
    /// Mine hit, stake forfeited, layout disclosed.
    Mine { cell: u8, mines: Vec<u8> },
}

/// One mines round for one player. Mine and reveal sets are bitsets
/// over the 25 cells.
#[derive(Debug, Clone)]
pub struct MinesRound {
    bet: u64,
    mine_count: u8,
    mines: u32,
    revealed: u32,
    active: bool,
}

impl MinesRound {
    /// Place `mine_count` mines uniformly at random and open the round.
    pub fn deal(bet: u64, mine_count: u8, dice: &mut impl Dice) -> Result<Self, GameError> {
        if !(1..GRID_CELLS).contains(&mine_count) {
            return Err(GameError::InvalidMineCount(mine_count));
        }

        // partial shuffle: the first mine_count entries are the mines
        let mut cells: Vec<u8> = (0..GRID_CELLS).collect();
        let mut mines = 0u32;
        for i in 0..mine_count as usize {
            let j = i + dice.uniform_int((GRID_CELLS as usize - i) as u32) as usize;
            cells.swap(i, j);
            mines |= 1 << cells[i];
        }

        Ok(Self {
            bet,
            mine_count,
            mines,
            revealed: 0,
            active: true,
        })
    }

    /// Open one cell.
    pub fn reveal(&mut self, config: &MinesConfig, cell: u8) -> Result<RevealOutcome, GameError> {
        if cell >= GRID_CELLS {
            return Err(GameError::CellOutOfRange(cell));
        }
        let bit = 1u32 << cell;
        if self.revealed & bit != 0 {
            return Err(GameError::CellAlreadyRevealed(cell));
        }

        if self.mines & bit != 0 {
            self.active = false;
            return Ok(RevealOutcome::Mine {
                cell,
                mines: self.mine_cells(),
            });
        }

        self.revealed |= bit;
        let revealed = self.revealed_count();
        let payout = payout_after(config, self.bet, self.mine_count, revealed);
        let profit = profit_after(config, self.bet, self.mine_count, revealed);

        if revealed == GRID_CELLS - self.mine_count {
            self.active = false;
            return Ok(RevealOutcome::Cleared {
                profit,
                payout,
                mines: self.mine_cells(),
            });
        }

        Ok(RevealOutcome::Safe { profit, payout })
    }

    /// Settle the round at its current value. Cashing out never
    /// discloses the mine layout.
    pub fn cashout(&mut self, config: &MinesConfig) -> CashoutOutcome {
        self.active = false;
        let revealed = self.revealed_count();
        CashoutOutcome {
            payout: payout_after(config, self.bet, self.mine_count, revealed),
            profit: profit_after(config, self.bet, self.mine_count, revealed),
        }
    }

    pub fn mine_cells(&self) -> Vec<u8> {
        (0..GRID_CELLS).filter(|c| self.mines & (1 << c) != 0).collect()
    }

    pub fn revealed_cells(&self) -> Vec<u8> {
        (0..GRID_CELLS)
            .filter(|c| self.revealed & (1 << c) != 0)
            .collect()
    }

    pub fn revealed_count(&self) -> u8 {
        self.revealed.count_ones() as u8
    }

    pub fn bet(&self) -> u64 {
        self.bet
    }

    pub fn mine_count(&self) -> u8 {
        self.mine_count
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// Result of cashing out a live round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CashoutOutcome {
    /// Stake plus profit.
    pub payout: u64,
    pub profit: u64,
}

/// Wire view of a round. Mine positions appear only once the round is
/// over and the layout may be disclosed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MinesView {
    pub revealed: Vec<u8>,
    pub profit: u64,
    pub payout: u64,
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mine_positions: Option<Vec<u8>>,
}

impl MinesView {
    pub fn active(round: &MinesRound, config: &MinesConfig) -> Self {
        let revealed = round.revealed_count();
        Self {
            revealed: round.revealed_cells(),
            profit: profit_after(config, round.bet(), round.mine_count(), revealed),
            payout: payout_after(config, round.bet(), round.mine_count(), revealed),
            active: true,
            mine_positions: None,
        }
    }

    /// Settled view with the layout disclosed (mine hit or board clear).
    pub fn disclosed(round: &MinesRound, profit: u64, payout: u64, mines: Vec<u8>) -> Self {
        Self {
            revealed: round.revealed_cells(),
            profit,
            payout,
            active: false,
            mine_positions: Some(mines),
        }
    }

    /// Settled view that keeps the layout hidden (cashout).
    pub fn hidden(round: &MinesRound, profit: u64, payout: u64) -> Self {
        Self {
            revealed: round.revealed_cells(),
            profit,
            payout,
            active: false,
            mine_positions: None,
        }
    }
}
