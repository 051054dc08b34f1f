use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Per-game time settings: a bank per seat, a per-move increment and a per-move cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeControl {
    pub total: Duration,
    pub increment: Duration,
    /// Upper bound for a single move; zero disables the cap.
    pub move_limit: Duration,
}

impl TimeControl {
    pub fn new(total: Duration, increment: Duration, move_limit: Duration) -> Self {
        Self {
            total,
            increment,
            move_limit,
        }
    }

    /// Bank left after a move that took `elapsed`: debit, credit the increment, clamp at zero.
    pub fn bank_after_move(&self, remaining: Duration, elapsed: Duration) -> Duration {
        (remaining + self.increment).saturating_sub(elapsed)
    }

    /// How long the seat to move may think before forfeiting on time.
    pub fn turn_budget(&self, remaining: Duration) -> Duration {
        if self.move_limit.is_zero() {
            remaining
        } else {
            remaining.min(self.move_limit)
        }
    }
}
