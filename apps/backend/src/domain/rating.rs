//! Elo rating adjustment for a finished game.

/// Update factor applied to the score surprise.
pub const K_FACTOR: f64 = 32.0;

/// Result of a game from the first player's point of view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameScore {
    Win,
    Loss,
    Draw,
}

impl GameScore {
    pub fn value(self) -> f64 {
        match self {
            GameScore::Win => 1.0,
            GameScore::Loss => 0.0,
            GameScore::Draw => 0.5,
        }
    }

    /// The same result seen from the other player.
    pub fn reversed(self) -> Self {
        match self {
            GameScore::Win => GameScore::Loss,
            GameScore::Loss => GameScore::Win,
            GameScore::Draw => GameScore::Draw,
        }
    }
}

/// Logistic expectation (base 400) that a player rated `rating` beats `opponent`.
pub fn expected_score(rating: i32, opponent: i32) -> f64 {
    1.0 / (1.0 + 10f64.powf(f64::from(opponent - rating) / 400.0))
}

/// New ratings for both players given the first player's actual score.
///
/// Each side moves by `K_FACTOR * (actual - expected)` rounded to the nearest integer,
/// so the two deltas may differ by one point.
pub fn calculate_ratings(rating_a: i32, rating_b: i32, score_a: f64) -> (i32, i32) {
    let expected_a = expected_score(rating_a, rating_b);
    let expected_b = 1.0 - expected_a;
    let score_b = 1.0 - score_a;

    let new_a = f64::from(rating_a) + K_FACTOR * (score_a - expected_a);
    let new_b = f64::from(rating_b) + K_FACTOR * (score_b - expected_b);

    (new_a.round() as i32, new_b.round() as i32)
}
