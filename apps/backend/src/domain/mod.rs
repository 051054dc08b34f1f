//! Domain layer: pure game logic types and helpers.

pub mod board;
pub mod clock;
pub mod engine;
pub mod rating;
pub mod rules;

#[cfg(test)]
mod tests_props_engine;

// Re-exports for ergonomics
pub use board::{Board, Position, Seat};
pub use clock::TimeControl;
pub use engine::GameEngine;
pub use rating::{calculate_ratings, GameScore};
pub use rules::GameRule;
