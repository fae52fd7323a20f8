use std::fmt;

use thiserror::Error;

use crate::game::Position;

/// Why a move was rejected by [`GlobalBoard::apply_move`](crate::game::GlobalBoard::apply_move).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IllegalMoveReason {
    InactiveBoard,
    OccupiedCell,
    OutOfBounds,
}

impl fmt::Display for IllegalMoveReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IllegalMoveReason::InactiveBoard => write!(f, "board is not active"),
            IllegalMoveReason::OccupiedCell => write!(f, "cell is already occupied"),
            IllegalMoveReason::OutOfBounds => write!(f, "cell index out of range"),
        }
    }
}

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum GameError {
    #[error("illegal move {position}: {reason}")]
    IllegalMove {
        position: Position,
        reason: IllegalMoveReason,
    },

    #[error("no legal move available")]
    NoLegalMove,
}

pub type Result<T> = std::result::Result<T, GameError>;
