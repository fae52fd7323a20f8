use proptest::prelude::*;
use ultimate_tic_tac_toe::playout::winning_move;
use ultimate_tic_tac_toe::{Agent, AgentConfig, GlobalBoard, Mark, RolloutAgent, Status};

fn agent(mark: Mark, seed: u64) -> RolloutAgent {
    let config = AgentConfig::default()
        .with_seed(seed)
        .with_playout_budget(18)
        .with_parallel(false);
    RolloutAgent::with_config(mark, config)
}

fn play_prefix(choices: &[u16]) -> (GlobalBoard, Mark) {
    let mut board = GlobalBoard::new();
    let mut mark = Mark::X;
    for &choice in choices {
        if board.status() != Status::InProgress {
            break;
        }
        let moves = board.legal_moves();
        let position = moves[choice as usize % moves.len()];
        board.play(mark, position).unwrap();
        mark = mark.other();
    }
    (board, mark)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn chosen_move_is_legal(choices in prop::collection::vec(any::<u16>(), 0..50), seed in any::<u64>()) {
        let (board, mark) = play_prefix(&choices);
        prop_assume!(board.status() == Status::InProgress);

        let mut player = agent(mark, seed);
        let position = player.choose_move(&board).unwrap();
        prop_assert!(board.legal_moves().contains(&position));
        prop_assert_eq!(player.chosen_move(), Some(position));

        if winning_move(&board, mark).unwrap().is_some() {
            let mut next = board;
            next.play(mark, position).unwrap();
            prop_assert_eq!(next.status(), Status::win_for(mark));
        }
    }
}

#[test]
fn test_agents_finish_a_game() {
    let mut board = GlobalBoard::new();
    let mut players = [agent(Mark::X, 1), agent(Mark::O, 2)];
    let mut turn = 0;

    while board.status() == Status::InProgress {
        let player = &mut players[turn % 2];
        let position = player.choose_move(&board).unwrap();
        assert!(board.legal_moves().contains(&position));
        board.apply_move(player.mark(), position.global, position.local).unwrap();
        board.advance_active_set(position.local);
        turn += 1;
    }

    assert!(turn <= 81);
    assert!(board.status().is_finished());
}

#[test]
fn test_same_seed_same_move() {
    let (board, mark) = play_prefix(&[3, 1, 4, 1, 5, 9, 2, 6]);
    let first = agent(mark, 99).choose_move(&board).unwrap();
    let second = agent(mark, 99).choose_move(&board).unwrap();
    assert_eq!(first, second);
}
