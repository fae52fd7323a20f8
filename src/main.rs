use colored::Colorize;
use log::info;
use ultimate_tic_tac_toe::{Agent, AgentConfig, GameError, GlobalBoard, Mark, RolloutAgent, Status};

// #############################
// Change these values to change the matches being played
const GAMES: u64 = 10;
const SEED: u64 = 0x5EED;
// #############################

fn main() {
    env_logger::init();

    let mut wins_x = 0;
    let mut wins_o = 0;
    let mut draws = 0;

    for i in 0..GAMES {
        let player_x = RolloutAgent::with_config(Mark::X, AgentConfig::default().with_seed(SEED + 2 * i));
        let player_o = RolloutAgent::with_config(Mark::O, AgentConfig::default().with_seed(SEED + 2 * i + 1));
        let mut game = Game::new(Box::new(player_x), Box::new(player_o));

        match game.play() {
            Ok(Status::WinX) => wins_x += 1,
            Ok(Status::WinO) => wins_o += 1,
            Ok(_) => draws += 1,
            Err(e) => {
                println!("{}", format!("Game {} aborted: {}", i + 1, e).red());
                return;
            }
        }
    }

    println!(
        "Player X: {} | Player O: {} | Draws {}",
        wins_x.to_string().as_str().red(),
        wins_o.to_string().as_str().green(),
        draws.to_string().as_str().yellow()
    )
}

// ##############################
// # Game
// ##############################

struct Game {
    players: [Box<dyn Agent>; 2],
    board: GlobalBoard,
    current_player: usize,
}

impl Game {
    fn new(player_x: Box<dyn Agent>, player_o: Box<dyn Agent>) -> Self {
        Game {
            players: [player_x, player_o],
            board: GlobalBoard::new(),
            current_player: 0,
        }
    }

    fn play(&mut self) -> Result<Status, GameError> {
        while self.board.status() == Status::InProgress {
            let player = &mut self.players[self.current_player];
            let mark = player.mark();

            let chosen_move = player.choose_move(&self.board)?;
            self.board.apply_move(mark, chosen_move.global, chosen_move.local)?;
            self.board.advance_active_set(chosen_move.local);

            info!("player {} chose {}", mark, chosen_move);
            self.current_player = 1 - self.current_player;
        }

        println!("{}", self.board);
        match self.board.status() {
            Status::WinX => println!("{}", "Player X wins!".red()),
            Status::WinO => println!("{}", "Player O wins!".green()),
            _ => println!("{}", "It's a draw!".yellow()),
        }
        Ok(self.board.status())
    }
}
