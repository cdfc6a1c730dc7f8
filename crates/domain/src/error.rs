//! Error types for the domain layer
//!
//! Only move application can fail. Everything else in the domain is valid by construction.

use thiserror::Error;

/// Why a move was rejected by the engine.
///
/// All variants are reported to the mover as an `InvalidMove`; the board is left untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoveError {
    /// Column index outside `[0, COLS)`
    #[error("invalid move: column {column} is out of bounds")]
    OutOfBounds { column: i64 },

    /// Top cell of the column is occupied
    #[error("invalid move: column {column} is full")]
    ColumnFull { column: usize },

    /// The game already reached a terminal state
    #[error("invalid move: the game is over")]
    GameOver,
}

impl MoveError {
    /// Column the move targeted, if any.
    pub fn column(&self) -> Option<i64> {
        match self {
            Self::OutOfBounds { column } => Some(*column),
            Self::ColumnFull { column } => Some(*column as i64),
            Self::GameOver => None,
        }
    }
}
