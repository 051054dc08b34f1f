//! Rating/record storage collaborator consumed by settlement.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;

use crate::domain::Seat;

/// Persisted rating and record row for one player identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: String,
    pub elo: i32,
    pub games_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

impl PlayerRecord {
    pub fn new(id: impl Into<String>, elo: i32) -> Self {
        Self {
            id: id.into(),
            elo,
            games_played: 0,
            wins: 0,
            losses: 0,
            draws: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub x: i32,
    pub y: i32,
    pub player: Seat,
    pub order: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: String,
    pub player_x_id: String,
    pub player_o_id: String,
    /// `None` for a draw.
    pub winner_id: Option<String>,
    pub moves: Vec<MoveRecord>,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Storage keyed by player identity string.
#[async_trait]
pub trait RatingStore: Send + Sync {
    /// Returns the stored row, creating a default-rated one when absent.
    async fn get_or_create(&self, player_id: &str) -> Result<PlayerRecord, StoreError>;

    async fn save_player(&self, record: &PlayerRecord) -> Result<(), StoreError>;

    async fn save_match(&self, record: &MatchRecord) -> Result<(), StoreError>;
}
