use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the two playing slots. X always moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Seat {
    X,
    O,
}

impl Seat {
    pub fn opponent(self) -> Seat {
        match self {
            Seat::X => Seat::O,
            Seat::O => Seat::X,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Seat::X => 0,
            Seat::O => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Seat::X => "X",
            Seat::O => "O",
        }
    }

    /// Seat label for the n-th move of a game (0-based), assuming strict alternation.
    pub fn for_move(order: usize) -> Seat {
        if order % 2 == 0 {
            Seat::X
        } else {
            Seat::O
        }
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Board coordinate: `x` is the column, `y` is the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32, steps: i32) -> Position {
        Position {
            x: self.x + dx * steps,
            y: self.y + dy * steps,
        }
    }
}

/// Fixed-size grid of cells, each empty or owned by one seat.
#[derive(Debug, Clone)]
pub struct Board {
    rows: usize,
    columns: usize,
    cells: Vec<Option<Seat>>,
    filled: usize,
}

impl Board {
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            rows,
            columns,
            cells: vec![None; rows * columns],
            filled: 0,
        }
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.columns && (pos.y as usize) < self.rows
    }

    /// Owner of the cell, or `None` when empty or off the board.
    pub fn owner(&self, pos: Position) -> Option<Seat> {
        self.index(pos).and_then(|idx| self.cells[idx])
    }

    pub fn is_full(&self) -> bool {
        self.filled == self.cells.len()
    }

    /// Claims an empty cell. Returns false when the cell is off-board or already owned;
    /// owned cells are never reassigned.
    pub(crate) fn claim(&mut self, pos: Position, seat: Seat) -> bool {
        let Some(idx) = self.index(pos) else {
            return false;
        };
        if self.cells[idx].is_some() {
            return false;
        }
        self.cells[idx] = Some(seat);
        self.filled += 1;
        true
    }

    fn index(&self, pos: Position) -> Option<usize> {
        if !self.contains(pos) {
            return None;
        }
        Some(pos.y as usize * self.columns + pos.x as usize)
    }
}
