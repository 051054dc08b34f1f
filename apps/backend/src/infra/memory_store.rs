use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::repos::ratings::{MatchRecord, PlayerRecord, RatingStore, StoreError};

/// Process-local store; contents vanish with the process.
#[derive(Debug)]
pub struct MemoryStore {
    default_rating: i32,
    players: RwLock<HashMap<String, PlayerRecord>>,
    matches: RwLock<Vec<MatchRecord>>,
}

impl MemoryStore {
    pub fn new(default_rating: i32) -> Self {
        Self {
            default_rating,
            players: RwLock::new(HashMap::new()),
            matches: RwLock::new(Vec::new()),
        }
    }

    pub fn player(&self, player_id: &str) -> Option<PlayerRecord> {
        self.players.read().get(player_id).cloned()
    }

    pub fn matches(&self) -> Vec<MatchRecord> {
        self.matches.read().clone()
    }

    /// Seeds or overwrites a row directly.
    pub fn insert_player(&self, record: PlayerRecord) {
        self.players.write().insert(record.id.clone(), record);
    }
}

#[async_trait]
impl RatingStore for MemoryStore {
    async fn get_or_create(&self, player_id: &str) -> Result<PlayerRecord, StoreError> {
        let mut players = self.players.write();
        let record = players
            .entry(player_id.to_string())
            .or_insert_with(|| PlayerRecord::new(player_id, self.default_rating));
        Ok(record.clone())
    }

    async fn save_player(&self, record: &PlayerRecord) -> Result<(), StoreError> {
        self.players
            .write()
            .insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn save_match(&self, record: &MatchRecord) -> Result<(), StoreError> {
        self.matches.write().push(record.clone());
        Ok(())
    }
}
