//! One-ply tactics and the playout policy used by the rollout agent.
//!
//! Every function here works on copies of the board it is given.

use log::trace;
use rand::{seq::SliceRandom, Rng};

use crate::error::{GameError, Result};
use crate::game::{GlobalBoard, Mark, Position, Status};

/// The board after `mark` plays `position`, active set included.
pub fn after_move(board: &GlobalBoard, mark: Mark, position: Position) -> Result<GlobalBoard> {
    let mut next = *board;
    next.play(mark, position)?;
    Ok(next)
}

/// First legal move, in enumeration order, that wins the whole game for `mark`.
pub fn winning_move(board: &GlobalBoard, mark: Mark) -> Result<Option<Position>> {
    let target = Status::win_for(mark);
    for position in board.legal_moves() {
        if after_move(board, mark, position)?.status() == target {
            return Ok(Some(position));
        }
    }
    Ok(None)
}

/// Legal moves that win the local board they are played in for `mark`.
pub fn local_winning_moves(board: &GlobalBoard, mark: Mark) -> Result<Vec<Position>> {
    let target = Status::win_for(mark);
    let mut moves = Vec::new();
    for position in board.legal_moves() {
        let next = after_move(board, mark, position)?;
        if next.local_board(position.global).status() == target {
            moves.push(position);
        }
    }
    Ok(moves)
}

/// Whether playing `position` leaves the opponent without an immediate game win.
/// A move that ends the game is always safe.
pub fn is_safe(board: &GlobalBoard, mark: Mark, position: Position) -> Result<bool> {
    let next = after_move(board, mark, position)?;
    if next.status().is_finished() {
        return Ok(true);
    }
    Ok(winning_move(&next, mark.other())?.is_none())
}

/// The safe subset of `moves`, order preserved.
pub fn safe_moves(board: &GlobalBoard, mark: Mark, moves: &[Position]) -> Result<Vec<Position>> {
    let mut safe = Vec::with_capacity(moves.len());
    for &position in moves {
        if is_safe(board, mark, position)? {
            safe.push(position);
        }
    }
    Ok(safe)
}

/// Picks the move `mark` plays inside a playout.
///
/// In order: a game-winning move, the first safe move that wins its local
/// board, a random safe move, a random legal move.
pub fn rollout_move<R: Rng + ?Sized>(board: &GlobalBoard, mark: Mark, rng: &mut R) -> Result<Position> {
    if let Some(position) = winning_move(board, mark)? {
        return Ok(position);
    }

    for position in local_winning_moves(board, mark)? {
        if is_safe(board, mark, position)? {
            return Ok(position);
        }
    }

    let legal = board.legal_moves();
    let safe = safe_moves(board, mark, &legal)?;
    let pool = if safe.is_empty() { &legal } else { &safe };
    pool.choose(rng).copied().ok_or(GameError::NoLegalMove)
}

/// Plays the game out on its own copy of the board, `to_move` acting first.
pub fn simulate<R: Rng + ?Sized>(mut board: GlobalBoard, mut to_move: Mark, rng: &mut R) -> Result<Status> {
    while board.status() == Status::InProgress {
        let position = rollout_move(&board, to_move, rng)?;
        board.play(to_move, position)?;
        to_move = to_move.other();
    }
    trace!("playout finished with {:?}", board.status());
    Ok(board.status())
}

/// Playout result seen from X: 1 for an X win, 0.5 for a draw, 0 for an O win.
pub fn playout_score(status: Status) -> f64 {
    match status {
        Status::WinX => 1.0,
        Status::WinO => 0.0,
        Status::Draw | Status::InProgress => 0.5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use crate::game::Mark::{O, X};

    /// O owns boards 0 and 4 and threatens (8, 2); X must move in board 3.
    fn o_threatens_diagonal() -> GlobalBoard {
        let mut board = GlobalBoard::new();
        board.force_cells(0, &[(0, O), (1, O), (2, O)]);
        board.force_cells(4, &[(0, O), (4, O), (8, O)]);
        board.force_cells(8, &[(0, O), (1, O)]);
        board.force_active(&[3]);
        board
    }

    #[test]
    fn test_winning_move_found() {
        let mut board = GlobalBoard::new();
        board.force_cells(0, &[(0, X), (1, X), (2, X)]);
        board.force_cells(4, &[(3, X), (4, X), (5, X)]);
        board.force_cells(8, &[(0, X), (1, X)]);
        board.force_active(&[8]);

        assert_eq!(winning_move(&board, X).unwrap(), Some(Position::new(8, 2)));
        assert_eq!(winning_move(&board, O).unwrap(), None);
    }

    #[test]
    fn test_no_winning_move_on_empty_board() {
        assert_eq!(winning_move(&GlobalBoard::new(), X).unwrap(), None);
    }

    #[test]
    fn test_unsafe_moves_are_filtered() {
        let board = o_threatens_diagonal();
        let legal = board.legal_moves();
        assert_eq!(legal.len(), 9);

        // sending O to board 8, or anywhere through a finished board, loses
        let safe = safe_moves(&board, X, &legal).unwrap();
        let locals: Vec<_> = safe.iter().map(|p| p.local).collect();
        assert_eq!(locals, vec![1, 2, 3, 5, 6, 7]);
        assert!(safe.iter().all(|p| p.global == 3));
    }

    #[test]
    fn test_game_ending_move_is_safe() {
        let mut board = GlobalBoard::new();
        board.force_cells(0, &[(0, X), (1, X), (2, X)]);
        board.force_cells(4, &[(3, X), (4, X), (5, X)]);
        board.force_cells(8, &[(0, X), (1, X)]);
        board.force_active(&[8]);
        assert!(is_safe(&board, X, Position::new(8, 2)).unwrap());
    }

    #[test]
    fn test_local_winning_moves() {
        let mut board = GlobalBoard::new();
        board.force_cells(2, &[(0, X), (1, X), (4, O)]);
        board.force_active(&[2]);

        assert_eq!(local_winning_moves(&board, X).unwrap(), vec![Position::new(2, 2)]);
        assert!(local_winning_moves(&board, O).unwrap().is_empty());
    }

    #[test]
    fn test_rollout_prefers_local_win() {
        let mut board = GlobalBoard::new();
        board.force_cells(2, &[(0, X), (1, X), (4, O)]);
        board.force_active(&[2]);

        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(rollout_move(&board, X, &mut rng).unwrap(), Position::new(2, 2));
    }

    #[test]
    fn test_rollout_takes_game_win() {
        let mut board = GlobalBoard::new();
        board.force_cells(0, &[(0, O), (1, O), (2, O)]);
        board.force_cells(4, &[(0, O), (4, O), (8, O)]);
        board.force_cells(8, &[(0, O), (1, O)]);
        board.force_active(&[8]);

        let mut rng = ChaCha8Rng::seed_from_u64(9);
        assert_eq!(rollout_move(&board, O, &mut rng).unwrap(), Position::new(8, 2));
    }

    #[test]
    fn test_rollout_avoids_losing_moves() {
        let board = o_threatens_diagonal();
        for seed in 0..20 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let position = rollout_move(&board, X, &mut rng).unwrap();
            assert!(![0, 4, 8].contains(&position.local), "{} is unsafe", position);
        }
    }

    #[test]
    fn test_rollout_without_moves() {
        let mut board = GlobalBoard::new();
        board.force_active(&[]);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(rollout_move(&board, X, &mut rng), Err(GameError::NoLegalMove));
    }

    #[test]
    fn test_simulate_reaches_the_end() {
        let board = GlobalBoard::new();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let status = simulate(board, X, &mut rng).unwrap();
        assert!(status.is_finished());
        assert_eq!(board, GlobalBoard::new());
    }

    #[test]
    fn test_simulate_is_reproducible() {
        let first = simulate(GlobalBoard::new(), X, &mut ChaCha8Rng::seed_from_u64(5)).unwrap();
        let second = simulate(GlobalBoard::new(), X, &mut ChaCha8Rng::seed_from_u64(5)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_playout_score_is_seen_from_x() {
        assert_eq!(playout_score(Status::WinX), 1.0);
        assert_eq!(playout_score(Status::Draw), 0.5);
        assert_eq!(playout_score(Status::WinO), 0.0);
    }
}
