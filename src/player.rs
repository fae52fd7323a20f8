use log::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::config::AgentConfig;
use crate::error::{GameError, Result};
use crate::game::{GlobalBoard, Mark, Position};
use crate::playout::{after_move, playout_score, safe_moves, simulate, winning_move};

/// A participant that picks moves for one [`Mark`].
pub trait Agent {
    fn mark(&self) -> Mark;

    /// Chooses a legal move on `board` and remembers it as [`Agent::chosen_move`].
    fn choose_move(&mut self, board: &GlobalBoard) -> Result<Position>;

    fn chosen_move(&self) -> Option<Position>;
}

/// A candidate move with its mean playout score.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CandidateEvaluation {
    pub position: Position,
    pub score: f64,
}

/// Agent combining one-ply lookahead with Monte-Carlo playouts.
///
/// Scores are always measured from X's side, whichever mark the agent plays.
#[derive(Clone, Debug)]
pub struct RolloutAgent {
    mark: Mark,
    config: AgentConfig,
    chosen_move: Option<Position>,
}

impl RolloutAgent {
    pub fn new(mark: Mark) -> Self {
        RolloutAgent::with_config(mark, AgentConfig::default())
    }

    pub fn with_config(mark: Mark, config: AgentConfig) -> Self {
        RolloutAgent {
            mark,
            config,
            chosen_move: None,
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Runs the playouts for every candidate in `pool`, results in pool order.
    ///
    /// Candidate `i` draws its randomness from a stream derived from `seed`
    /// and `i`, so the result does not depend on which thread evaluates it.
    /// When the pool outgrows the budget no playouts run and every score is 0.
    pub fn evaluate(&self, board: &GlobalBoard, pool: &[Position], seed: u64) -> Result<Vec<CandidateEvaluation>> {
        let playouts = self.config.playouts_per_candidate(pool.len());

        let evaluate_one = |(i, &position): (usize, &Position)| -> Result<CandidateEvaluation> {
            let start = after_move(board, self.mark, position)?;
            let mut rng = candidate_rng(seed, i);

            let mut total = 0.0;
            for _ in 0..playouts {
                total += playout_score(simulate(start, self.mark.other(), &mut rng)?);
            }
            let score = if playouts == 0 { 0.0 } else { total / playouts as f64 };

            debug!("candidate {} scored {:.3} over {} playouts", position, score, playouts);
            Ok(CandidateEvaluation { position, score })
        };

        if self.config.parallel {
            pool.par_iter().enumerate().map(evaluate_one).collect()
        } else {
            pool.iter().enumerate().map(evaluate_one).collect()
        }
    }

    fn decide(&self, board: &GlobalBoard) -> Result<Position> {
        if board.status().is_finished() {
            return Err(GameError::NoLegalMove);
        }

        if let Some(position) = winning_move(board, self.mark)? {
            debug!("{} wins immediately with {}", self.mark, position);
            return Ok(position);
        }

        let legal = board.legal_moves();
        if legal.is_empty() {
            return Err(GameError::NoLegalMove);
        }

        let safe = safe_moves(board, self.mark, &legal)?;
        let pool = if safe.is_empty() {
            debug!("every move of {} loses immediately", self.mark);
            legal
        } else {
            safe
        };

        let seed = self.config.seed.unwrap_or_else(|| rand::thread_rng().gen());
        let evaluations = self.evaluate(board, &pool, seed)?;
        select_best(&evaluations)
            .map(|best| best.position)
            .ok_or(GameError::NoLegalMove)
    }
}

impl Agent for RolloutAgent {
    fn mark(&self) -> Mark {
        self.mark
    }

    fn choose_move(&mut self, board: &GlobalBoard) -> Result<Position> {
        let position = self.decide(board)?;
        debug!("{} chose {}", self.mark, position);
        self.chosen_move = Some(position);
        Ok(position)
    }

    fn chosen_move(&self) -> Option<Position> {
        self.chosen_move
    }
}

/// Highest score wins; on ties the earliest candidate is kept.
pub fn select_best(evaluations: &[CandidateEvaluation]) -> Option<&CandidateEvaluation> {
    let (first, rest) = evaluations.split_first()?;
    Some(rest.iter().fold(first, |best, candidate| {
        if candidate.score > best.score {
            candidate
        } else {
            best
        }
    }))
}

fn candidate_rng(seed: u64, candidate: usize) -> ChaCha8Rng {
    let stream = (candidate as u64).wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    ChaCha8Rng::seed_from_u64(seed.wrapping_add(stream))
}
