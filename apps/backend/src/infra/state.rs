use std::sync::Arc;

use actix::Actor;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::AppError;
use crate::infra::file_store::FileStore;
use crate::infra::memory_store::MemoryStore;
use crate::repos::ratings::RatingStore;
use crate::services::matchmaker::Matchmaker;
use crate::services::rooms::RoomDirectory;
use crate::state::app_state::AppState;
use crate::state::security_config::SecurityConfig;
use crate::ws::hub::Hub;

/// Builder for creating AppState instances (used in both tests and main).
///
/// Starts the hub and matchmaker actors, so `build` must run inside an actix system.
pub struct StateBuilder {
    config: ServerConfig,
    security_config: Option<SecurityConfig>,
    store: Option<Arc<dyn RatingStore>>,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            security_config: None,
            store: None,
        }
    }

    pub fn with_config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Overrides the security settings derived from the config.
    pub fn with_security(mut self, security_config: SecurityConfig) -> Self {
        self.security_config = Some(security_config);
        self
    }

    /// Overrides the store selected by `users_db`.
    pub fn with_store(mut self, store: Arc<dyn RatingStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub async fn build(self) -> Result<AppState, AppError> {
        let config = Arc::new(self.config);
        let security = self
            .security_config
            .unwrap_or_else(|| SecurityConfig::from_config(&config));

        let store: Arc<dyn RatingStore> = match (self.store, &config.users_db) {
            (Some(store), _) => store,
            (None, Some(path)) => Arc::new(FileStore::open(path, config.default_rating).await?),
            (None, None) => {
                info!("[STATE] using in-memory rating store");
                Arc::new(MemoryStore::new(config.default_rating))
            }
        };

        let hub = Hub::new().start();
        let matchmaker = Matchmaker::new(config.clone(), store.clone()).start();
        let rooms = Arc::new(RoomDirectory::new(&config));

        Ok(AppState {
            config,
            security,
            store,
            rooms,
            hub,
            matchmaker,
        })
    }
}

impl Default for StateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn build_state() -> StateBuilder {
    StateBuilder::new()
}
