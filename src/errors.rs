//! Engine error taxonomy
//!
//! Every failed action maps to one of these categories. The API layer
//! turns them into HTTP statuses; the engine itself only cares that a
//! failed action never moves money.

use thiserror::Error;

use crate::games::GameError;
use crate::ledger::LedgerError;

/// Why an action was refused.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The request itself is malformed: unknown game or action, bad
    /// number ranges, missing fields.
    #[error("{0}")]
    Validation(String),

    /// The player's balance cannot cover the stake.
    #[error("insufficient funds: balance {balance}, required {required}")]
    InsufficientFunds { balance: u64, required: u64 },

    /// The action does not fit the player's current round state.
    #[error("{0}")]
    State(String),

    /// The burst guard rejected the action.
    #[error("too many actions, slow down")]
    RateLimited,

    /// The user-record store could not be reached or answered garbage.
    #[error("ledger unavailable: {0}")]
    LedgerUnavailable(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl From<GameError> for EngineError {
    fn from(e: GameError) -> Self {
        match e {
            GameError::RoundNotStarted | GameError::CellAlreadyRevealed(_) => {
                EngineError::State(e.to_string())
            }
            GameError::CellOutOfRange(_) | GameError::InvalidMineCount(_) => {
                EngineError::Validation(e.to_string())
            }
        }
    }
}

impl From<LedgerError> for EngineError {
    fn from(e: LedgerError) -> Self {
        EngineError::LedgerUnavailable(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_wire_ready() {
        let err = EngineError::Validation("unknown game: poker".to_string());
        assert_eq!(err.to_string(), "unknown game: poker");

        let err = EngineError::InsufficientFunds {
            balance: 50,
            required: 100,
        };
        assert_eq!(
            err.to_string(),
            "insufficient funds: balance 50, required 100"
        );

        assert_eq!(
            EngineError::RateLimited.to_string(),
            "too many actions, slow down"
        );
    }

    #[test]
    fn test_game_errors_map_to_the_right_category() {
        let err: EngineError = GameError::RoundNotStarted.into();
        assert!(matches!(err, EngineError::State(_)));
        assert_eq!(err.to_string(), "round not started");

        let err: EngineError = GameError::CellAlreadyRevealed(3).into();
        assert!(matches!(err, EngineError::State(_)));

        let err: EngineError = GameError::CellOutOfRange(40).into();
        assert!(matches!(err, EngineError::Validation(_)));

        let err: EngineError = GameError::InvalidMineCount(0).into();
        assert!(matches!(err, EngineError::Validation(_)));
    }
}
