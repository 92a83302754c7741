//! Game models
//!
//! Pure, deterministic game logic. Every model takes its randomness
//! through the [`crate::rng::Dice`] trait and never touches balances;
//! stake and payout movement lives in the engine layer.

pub mod blackjack;
pub mod mines;
pub mod roulette;
pub mod slots;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The games the engine can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameKind {
    Slots,
    Roulette,
    Blackjack,
    Mines,
}

impl GameKind {
    /// Parse a wire-format game name.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "slots" => Some(GameKind::Slots),
            "roulette" => Some(GameKind::Roulette),
            "blackjack" => Some(GameKind::Blackjack),
            "mines" => Some(GameKind::Mines),
            _ => None,
        }
    }
}

impl std::fmt::Display for GameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GameKind::Slots => "slots",
            GameKind::Roulette => "roulette",
            GameKind::Blackjack => "blackjack",
            GameKind::Mines => "mines",
        };
        write!(f, "{}", name)
    }
}

/// Rule violations raised by the game models.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("round not started")]
    RoundNotStarted,
    #[error("cell {0} is out of range")]
    CellOutOfRange(u8),
    #[error("cell {0} already revealed")]
    CellAlreadyRevealed(u8),
    #[error("mine count {0} outside 1..=24")]
    InvalidMineCount(u8),
}

pub use blackjack::{BlackjackRound, BlackjackView};
pub use mines::{MinesRound, MinesView, RevealOutcome};
pub use roulette::{Color, RouletteOutcome};
pub use slots::{SpinOutcome, SpinTier};
