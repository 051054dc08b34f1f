use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::board::{Board, Position, Seat};

/// Length of the line every variant is built around.
pub const WIN_LENGTH: i32 = 5;

/// Maximum steps scanned in each direction from the placed cell.
pub const SCAN_LIMIT: i32 = 5;

/// The four line directions through a cell: horizontal, vertical, `\` and `/`.
pub const DIRECTIONS: [(i32, i32); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

/// Win-condition variant selected when a game is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GameRule {
    /// Exactly five in a row.
    #[default]
    #[serde(rename = "standard")]
    Standard,
    /// Five or more in a row.
    #[serde(rename = "freeStyle")]
    FreeStyle,
    /// Exactly five, unless the opponent caps both ends.
    #[serde(rename = "caro")]
    Caro,
}

impl GameRule {
    pub fn as_str(self) -> &'static str {
        match self {
            GameRule::Standard => "standard",
            GameRule::FreeStyle => "freeStyle",
            GameRule::Caro => "caro",
        }
    }

    /// Applies the variant's policy to one contiguous run through the last move.
    pub fn is_winning(self, run: &LineRun, board: &Board, mover: Seat) -> bool {
        match self {
            GameRule::Standard => run.len() == WIN_LENGTH,
            GameRule::FreeStyle => run.len() >= WIN_LENGTH,
            GameRule::Caro => {
                run.len() == WIN_LENGTH
                    && !(is_capped(board, run.beyond_forward(), mover)
                        && is_capped(board, run.beyond_backward(), mover))
            }
        }
    }
}

// An end is capped only by an on-board opponent stone; the board edge does not count.
fn is_capped(board: &Board, beyond: Position, mover: Seat) -> bool {
    board.owner(beyond) == Some(mover.opponent())
}

impl fmt::Display for GameRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(GameRule::Standard),
            "freestyle" | "free_style" | "free-style" => Ok(GameRule::FreeStyle),
            "caro" => Ok(GameRule::Caro),
            other => Err(format!("unknown game rule '{other}'")),
        }
    }
}

/// Contiguous same-owner cells through `origin` along one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRun {
    pub origin: Position,
    pub direction: (i32, i32),
    pub forward: i32,
    pub backward: i32,
}

impl LineRun {
    /// Scans from `origin` in both senses of `direction`, at most `SCAN_LIMIT` steps each.
    pub fn scan(board: &Board, origin: Position, direction: (i32, i32), owner: Seat) -> Self {
        let (dx, dy) = direction;
        let count = |sign: i32| {
            (1..=SCAN_LIMIT)
                .take_while(|&step| board.owner(origin.offset(dx, dy, sign * step)) == Some(owner))
                .count() as i32
        };
        Self {
            origin,
            direction,
            forward: count(1),
            backward: count(-1),
        }
    }

    pub fn len(&self) -> i32 {
        1 + self.forward + self.backward
    }

    pub fn beyond_forward(&self) -> Position {
        let (dx, dy) = self.direction;
        self.origin.offset(dx, dy, self.forward + 1)
    }

    pub fn beyond_backward(&self) -> Position {
        let (dx, dy) = self.direction;
        self.origin.offset(dx, dy, -(self.backward + 1))
    }

    /// Cells of the run ordered from the backward end to the forward end.
    pub fn cells(&self) -> Vec<Position> {
        let (dx, dy) = self.direction;
        (-self.backward..=self.forward)
            .map(|step| self.origin.offset(dx, dy, step))
            .collect()
    }
}
