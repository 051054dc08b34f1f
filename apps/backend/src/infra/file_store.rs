use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::repos::ratings::{MatchRecord, PlayerRecord, RatingStore, StoreError};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    players: HashMap<String, PlayerRecord>,
    #[serde(default)]
    matches: Vec<MatchRecord>,
}

/// JSON document store. Every save rewrites the whole file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    default_rating: i32,
    doc: Mutex<Document>,
}

impl FileStore {
    /// Opens `path`, starting empty when the file does not exist yet.
    pub async fn open(path: impl AsRef<Path>, default_rating: i32) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let doc = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => Document::default(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(err) if err.kind() == ErrorKind::NotFound => Document::default(),
            Err(err) => return Err(err.into()),
        };
        info!(
            path = %path.display(),
            players = doc.players.len(),
            matches = doc.matches.len(),
            "[FILE STORE] opened"
        );
        Ok(Self {
            path,
            default_rating,
            doc: Mutex::new(doc),
        })
    }

    async fn flush(&self, doc: &Document) -> Result<(), StoreError> {
        let data = serde_json::to_vec_pretty(doc)?;
        tokio::fs::write(&self.path, data).await?;
        debug!(path = %self.path.display(), "[FILE STORE] flushed");
        Ok(())
    }
}

#[async_trait]
impl RatingStore for FileStore {
    async fn get_or_create(&self, player_id: &str) -> Result<PlayerRecord, StoreError> {
        let mut doc = self.doc.lock().await;
        if let Some(record) = doc.players.get(player_id) {
            return Ok(record.clone());
        }
        let record = PlayerRecord::new(player_id, self.default_rating);
        doc.players.insert(player_id.to_string(), record.clone());
        self.flush(&doc).await?;
        Ok(record)
    }

    async fn save_player(&self, record: &PlayerRecord) -> Result<(), StoreError> {
        let mut doc = self.doc.lock().await;
        doc.players.insert(record.id.clone(), record.clone());
        self.flush(&doc).await
    }

    async fn save_match(&self, record: &MatchRecord) -> Result<(), StoreError> {
        let mut doc = self.doc.lock().await;
        doc.matches.push(record.clone());
        self.flush(&doc).await
    }
}
