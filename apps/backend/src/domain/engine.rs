use crate::domain::board::{Board, Position, Seat};
use crate::domain::rules::{GameRule, LineRun, DIRECTIONS};

/// Board state plus win evaluation for one game.
///
/// Invariants:
/// - an owned cell is never reassigned or cleared;
/// - the current player flips on every accepted, non-terminal move and only then;
/// - `game_over` only ever goes from false to true.
#[derive(Debug, Clone)]
pub struct GameEngine {
    board: Board,
    current: Seat,
    game_over: bool,
    winner: Option<Seat>,
    winning_line: Option<Vec<Position>>,
    rule: GameRule,
    history: Vec<Position>,
}

impl GameEngine {
    pub fn new(rows: usize, columns: usize, rule: GameRule) -> Self {
        Self {
            board: Board::new(rows, columns),
            current: Seat::X,
            game_over: false,
            winner: None,
            winning_line: None,
            rule,
            history: Vec::new(),
        }
    }

    /// Places a piece for the current player.
    ///
    /// Returns false (and leaves every field untouched) when the game is over, the
    /// position is outside the grid, or the cell is already owned.
    pub fn place_piece(&mut self, pos: Position) -> bool {
        if self.game_over {
            return false;
        }
        let mover = self.current;
        if !self.board.claim(pos, mover) {
            return false;
        }
        self.history.push(pos);

        if let Some(line) = self.check_win(pos, mover) {
            self.game_over = true;
            self.winner = Some(mover);
            self.winning_line = Some(line);
        } else if self.board.is_full() {
            self.game_over = true;
        } else {
            self.current = mover.opponent();
        }
        true
    }

    fn check_win(&self, last: Position, mover: Seat) -> Option<Vec<Position>> {
        DIRECTIONS.iter().find_map(|&direction| {
            let run = LineRun::scan(&self.board, last, direction, mover);
            self.rule
                .is_winning(&run, &self.board, mover)
                .then(|| run.cells())
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn current_player(&self) -> Seat {
        self.current
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// `None` while the game runs, and also for a drawn (full-board) game.
    pub fn winner(&self) -> Option<Seat> {
        self.winner
    }

    pub fn winning_line(&self) -> Option<&[Position]> {
        self.winning_line.as_deref()
    }

    pub fn rule(&self) -> GameRule {
        self.rule
    }

    pub fn history(&self) -> &[Position] {
        &self.history
    }
}
