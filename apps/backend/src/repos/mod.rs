pub mod ratings;

pub use ratings::{MatchRecord, MoveRecord, PlayerRecord, RatingStore, StoreError};
