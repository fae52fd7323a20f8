use std::fmt;

use flagset::{flags, FlagSet, Flags};
use log::warn;

use crate::error::{GameError, IllegalMoveReason, Result};

// #############################
// #                           #
// #      Fixed Constants      #
// #                           #
// #############################
pub const BOARD_SIZE: usize = 3;
pub const BOARD_SIZE_SQUARED: usize = BOARD_SIZE * BOARD_SIZE;
const FULL_BOARD: u16 = 0b111_111_111;
const WINNING_POSITIONS: [u16; 8] = [
    0b000_000_111, 0b000_111_000, 0b111_000_000, // rows
    0b001_001_001, 0b010_010_010, 0b100_100_100, // columns
    0b100_010_001, 0b001_010_100, // diagonals
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    pub fn to_char(self) -> char {
        match self {
            Mark::X => 'X',
            Mark::O => 'O',
        }
    }

    pub fn other(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// Outcome of a board. Once it leaves `InProgress` it never changes again.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Status {
    #[default]
    InProgress,
    WinX,
    WinO,
    Draw,
}

impl Status {
    pub fn win_for(mark: Mark) -> Self {
        match mark {
            Mark::X => Status::WinX,
            Mark::O => Status::WinO,
        }
    }

    pub fn winner(self) -> Option<Mark> {
        match self {
            Status::WinX => Some(Mark::X),
            Status::WinO => Some(Mark::O),
            Status::InProgress | Status::Draw => None,
        }
    }

    pub fn is_finished(self) -> bool {
        self != Status::InProgress
    }
}

// #############################
// #                           #
// #         Position          #
// #                           #
// #############################

/// Address of one cell: the local board (`global`) and the cell inside it (`local`).
///
/// Ordering is lexicographic on `(global, local)`, which is the order
/// [`GlobalBoard::legal_moves`] produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub global: usize,
    pub local: usize,
}

impl Position {
    pub const fn new(global: usize, local: usize) -> Self {
        Position { global, local }
    }
}

impl From<(usize, usize)> for Position {
    fn from((global, local): (usize, usize)) -> Self {
        Position::new(global, local)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.global, self.local)
    }
}

// #############################
// #                           #
// #           Cell            #
// #                           #
// #############################

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cell(Option<Mark>);

impl Cell {
    pub fn value(&self) -> Option<Mark> {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    fn set(&mut self, mark: Mark) -> bool {
        if self.0.is_some() {
            return false;
        }
        self.0 = Some(mark);
        true
    }
}

// #############################
// #                           #
// #          Square           #
// #                           #
// #############################

/// A position of a [`Board`] as seen by the line and fullness checks.
pub trait Square {
    /// The mark this square contributes to a winning line, if any.
    fn mark(&self) -> Option<Mark>;

    /// Whether the square counts as taken when testing for a full board.
    fn is_occupied(&self) -> bool;
}

impl Square for Cell {
    fn mark(&self) -> Option<Mark> {
        self.value()
    }

    fn is_occupied(&self) -> bool {
        !self.is_empty()
    }
}

// A finished local board is a taken super-cell even when drawn, otherwise a
// global board full of drawn boards could never end.
impl Square for LocalBoard {
    fn mark(&self) -> Option<Mark> {
        self.status().winner()
    }

    fn is_occupied(&self) -> bool {
        self.status().is_finished()
    }
}

// #############################
// #                           #
// #         BitBoard          #
// #                           #
// #############################

/// Bit projection of a board used for the line checks.
#[derive(Clone, Copy, PartialEq, Debug)]
struct BitBoard {
    x: u16,
    o: u16,
    occupied: u16,
}

impl BitBoard {
    fn from_squares<S: Square>(squares: &[S; BOARD_SIZE_SQUARED]) -> Self {
        let mut bits = BitBoard { x: 0, o: 0, occupied: 0 };
        for (i, square) in squares.iter().enumerate() {
            let mask = 1 << i;
            match square.mark() {
                Some(Mark::X) => bits.x |= mask,
                Some(Mark::O) => bits.o |= mask,
                None => {}
            }
            if square.is_occupied() {
                bits.occupied |= mask;
            }
        }
        bits
    }

    fn get_winner(&self) -> Option<Mark> {
        for &pos in WINNING_POSITIONS.iter() {
            if self.x & pos == pos {
                return Some(Mark::X);
            } else if self.o & pos == pos {
                return Some(Mark::O);
            }
        }
        None
    }

    fn is_full(&self) -> bool {
        self.occupied == FULL_BOARD
    }
}

// #############################
// #                           #
// #           Board           #
// #                           #
// #############################

/// The status state machine shared by [`LocalBoard`] and [`GlobalBoard`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Board<S> {
    squares: [S; BOARD_SIZE_SQUARED],
    status: Status,
}

impl<S: Square> Board<S> {
    fn new(squares: [S; BOARD_SIZE_SQUARED]) -> Self {
        Board {
            squares,
            status: Status::InProgress,
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Recomputes the status from the squares.
    ///
    /// A finished board keeps its status; the attempt is logged and the
    /// frozen status returned.
    pub fn refresh_status(&mut self) -> Status {
        if self.status.is_finished() {
            warn!("attempt to update status of a finished board ({:?})", self.status);
            return self.status;
        }

        let bits = BitBoard::from_squares(&self.squares);
        self.status = match bits.get_winner() {
            Some(mark) => Status::win_for(mark),
            None if bits.is_full() => Status::Draw,
            None => Status::InProgress,
        };
        self.status
    }

    /// Mark held at `index`, `None` when empty or out of range.
    pub fn value_at(&self, index: usize) -> Option<Mark> {
        self.squares.get(index).and_then(|square| square.mark())
    }

    pub fn value_at_row_col(&self, row: usize, col: usize) -> Option<Mark> {
        if row >= BOARD_SIZE || col >= BOARD_SIZE {
            return None;
        }
        self.value_at(row * BOARD_SIZE + col)
    }

    pub fn values(&self) -> [Option<Mark>; BOARD_SIZE_SQUARED] {
        let mut values = [None; BOARD_SIZE_SQUARED];
        for (value, square) in values.iter_mut().zip(self.squares.iter()) {
            *value = square.mark();
        }
        values
    }

    pub fn squares(&self) -> &[S; BOARD_SIZE_SQUARED] {
        &self.squares
    }
}

// #############################
// #                           #
// #        LocalBoard         #
// #                           #
// #############################

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LocalBoard {
    board: Board<Cell>,
    index: usize,
}

impl LocalBoard {
    fn new(index: usize) -> Self {
        LocalBoard {
            board: Board::new([Cell::default(); BOARD_SIZE_SQUARED]),
            index,
        }
    }

    /// Location of this board in the global grid.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn status(&self) -> Status {
        self.board.status()
    }

    pub fn refresh_status(&mut self) -> Status {
        self.board.refresh_status()
    }

    pub fn value_at(&self, index: usize) -> Option<Mark> {
        self.board.value_at(index)
    }

    pub fn value_at_row_col(&self, row: usize, col: usize) -> Option<Mark> {
        self.board.value_at_row_col(row, col)
    }

    pub fn values(&self) -> [Option<Mark>; BOARD_SIZE_SQUARED] {
        self.board.values()
    }

    pub fn is_empty_at(&self, index: usize) -> bool {
        self.board.squares().get(index).map_or(false, Cell::is_empty)
    }

    pub fn empty_positions(&self) -> impl Iterator<Item = usize> + '_ {
        (0..BOARD_SIZE_SQUARED).filter(move |&i| self.is_empty_at(i))
    }

    fn set_cell(&mut self, mark: Mark, index: usize) -> bool {
        self.board.squares[index].set(mark)
    }
}

impl fmt::Display for LocalBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..BOARD_SIZE {
            for col in 0..BOARD_SIZE {
                if col > 0 {
                    write!(f, " ")?;
                }
                let symbol = self.value_at_row_col(row, col).map_or('-', Mark::to_char);
                write!(f, "{}", symbol)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

// #############################
// #                           #
// #        ActiveSet          #
// #                           #
// #############################

flags! {
    /// One flag per local board, in board index order.
    pub enum BoardFlag: u16 {
        B0 = 0b000_000_001,
        B1 = 0b000_000_010,
        B2 = 0b000_000_100,
        B3 = 0b000_001_000,
        B4 = 0b000_010_000,
        B5 = 0b000_100_000,
        B6 = 0b001_000_000,
        B7 = 0b010_000_000,
        B8 = 0b100_000_000,
    }
}

/// The local boards the next move may be played in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActiveSet(FlagSet<BoardFlag>);

impl ActiveSet {
    pub fn all() -> Self {
        ActiveSet(FlagSet::full())
    }

    pub fn empty() -> Self {
        ActiveSet(FlagSet::default())
    }

    pub fn single(index: usize) -> Self {
        let mut set = ActiveSet::empty();
        set.insert(index);
        set
    }

    pub fn insert(&mut self, index: usize) {
        if let Some(&flag) = BoardFlag::LIST.get(index) {
            self.0 |= flag;
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        BoardFlag::LIST
            .get(index)
            .map_or(false, |&flag| self.0.contains(flag))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.indices().count()
    }

    /// Member board indices in ascending order.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        (0..BOARD_SIZE_SQUARED).filter(move |&i| self.contains(i))
    }
}

impl FromIterator<usize> for ActiveSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut set = ActiveSet::empty();
        for index in iter {
            set.insert(index);
        }
        set
    }
}

// #############################
// #                           #
// #        GlobalBoard        #
// #                           #
// #############################

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GlobalBoard {
    board: Board<LocalBoard>,
    active: ActiveSet,
}

impl Default for GlobalBoard {
    fn default() -> Self {
        GlobalBoard::new()
    }
}

impl GlobalBoard {
    pub fn new() -> Self {
        GlobalBoard {
            board: Board::new(std::array::from_fn(LocalBoard::new)),
            active: ActiveSet::all(),
        }
    }

    pub fn status(&self) -> Status {
        self.board.status()
    }

    pub fn refresh_status(&mut self) -> Status {
        self.board.refresh_status()
    }

    /// Super-cell value of local board `index`: its winner, if any.
    pub fn value_at(&self, index: usize) -> Option<Mark> {
        self.board.value_at(index)
    }

    pub fn value_at_row_col(&self, row: usize, col: usize) -> Option<Mark> {
        self.board.value_at_row_col(row, col)
    }

    pub fn values(&self) -> [Option<Mark>; BOARD_SIZE_SQUARED] {
        self.board.values()
    }

    pub fn local_boards(&self) -> &[LocalBoard; BOARD_SIZE_SQUARED] {
        self.board.squares()
    }

    /// # Panics
    ///
    /// Panics if `index` is not below 9.
    pub fn local_board(&self, index: usize) -> &LocalBoard {
        &self.board.squares()[index]
    }

    /// Local board in grid row `row` and column `col`, `None` when out of range.
    pub fn local_board_at(&self, row: usize, col: usize) -> Option<&LocalBoard> {
        if row >= BOARD_SIZE || col >= BOARD_SIZE {
            return None;
        }
        self.board.squares().get(row * BOARD_SIZE + col)
    }

    pub fn cell(&self, position: Position) -> Option<Mark> {
        self.board
            .squares()
            .get(position.global)
            .and_then(|board| board.value_at(position.local))
    }

    pub fn active_set(&self) -> ActiveSet {
        self.active
    }

    pub fn active_boards(&self) -> Vec<usize> {
        self.active.indices().collect()
    }

    pub fn is_active(&self, index: usize) -> bool {
        self.active.contains(index)
    }

    pub fn boards_in_progress(&self) -> Vec<usize> {
        self.local_boards()
            .iter()
            .filter(|board| board.status() == Status::InProgress)
            .map(LocalBoard::index)
            .collect()
    }

    /// Places `mark` on cell `local` of board `global` and refreshes the
    /// affected statuses. Does not touch the active set, see
    /// [`GlobalBoard::advance_active_set`].
    pub fn apply_move(&mut self, mark: Mark, global: usize, local: usize) -> Result<Status> {
        let position = Position::new(global, local);
        let illegal = |reason| GameError::IllegalMove { position, reason };

        if !self.active.contains(global) {
            return Err(illegal(IllegalMoveReason::InactiveBoard));
        }
        if local >= BOARD_SIZE_SQUARED {
            return Err(illegal(IllegalMoveReason::OutOfBounds));
        }

        let local_board = &mut self.board.squares[global];
        if !local_board.set_cell(mark, local) {
            return Err(illegal(IllegalMoveReason::OccupiedCell));
        }
        local_board.refresh_status();

        Ok(self.refresh_status())
    }

    /// Recomputes the active set after a move played on cell `local`:
    /// the board with that index if it is still open, otherwise every open board.
    pub fn advance_active_set(&mut self, local: usize) {
        self.active = match self.board.squares.get(local) {
            Some(next) if next.status() == Status::InProgress => ActiveSet::single(local),
            _ => self.boards_in_progress().into_iter().collect(),
        };
    }

    /// [`GlobalBoard::apply_move`] followed by [`GlobalBoard::advance_active_set`].
    pub fn play(&mut self, mark: Mark, position: Position) -> Result<Status> {
        let status = self.apply_move(mark, position.global, position.local)?;
        self.advance_active_set(position.local);
        Ok(status)
    }

    /// All legal moves in ascending `(global, local)` order.
    pub fn legal_moves(&self) -> Vec<Position> {
        self.active
            .indices()
            .flat_map(|global| {
                self.local_boards()[global]
                    .empty_positions()
                    .map(move |local| Position::new(global, local))
            })
            .collect()
    }

    pub fn is_legal(&self, position: Position) -> bool {
        self.is_active(position.global)
            && self.local_boards()[position.global].is_empty_at(position.local)
    }
}

#[cfg(test)]
impl GlobalBoard {
    /// Writes marks straight into local board `global`, ignoring the active set,
    /// then refreshes the local and global statuses.
    pub(crate) fn force_cells(&mut self, global: usize, cells: &[(usize, Mark)]) {
        for &(local, mark) in cells {
            assert!(self.board.squares[global].set_cell(mark, local));
        }
        self.board.squares[global].refresh_status();
        self.refresh_status();
    }

    pub(crate) fn force_active(&mut self, boards: &[usize]) {
        self.active = boards.iter().copied().collect();
    }
}

// #############################
// #                           #
// #           Display         #
// #                           #
// #############################

impl fmt::Display for GlobalBoard {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for global_row in 0..BOARD_SIZE {
            if global_row > 0 {
                writeln!(f, "---+---+---")?;
            }
            for local_row in 0..BOARD_SIZE {
                for global_col in 0..BOARD_SIZE {
                    if global_col > 0 {
                        write!(f, "|")?;
                    }
                    let board = self.local_board(global_row * BOARD_SIZE + global_col);
                    for local_col in 0..BOARD_SIZE {
                        let symbol = board
                            .value_at_row_col(local_row, local_col)
                            .map_or('-', Mark::to_char);
                        write!(f, "{}", symbol)?;
                    }
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

// #############################
// #                           #
// #           Tests           #
// #                           #
// #############################
