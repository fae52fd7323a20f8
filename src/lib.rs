//! Rules engine and rollout agent for Ultimate Tic-Tac-Toe.
//!
//! A [`GlobalBoard`] holds nine [`LocalBoard`]s. A driver applies each move with
//! [`GlobalBoard::apply_move`] followed by [`GlobalBoard::advance_active_set`],
//! and asks an [`Agent`] for moves with [`Agent::choose_move`].

pub mod config;
pub mod error;
pub mod game;
pub mod player;
pub mod playout;

pub use config::AgentConfig;
pub use error::{GameError, IllegalMoveReason, Result};
pub use game::{ActiveSet, Board, Cell, GlobalBoard, LocalBoard, Mark, Position, Square, Status};
pub use player::{Agent, CandidateEvaluation, RolloutAgent};
