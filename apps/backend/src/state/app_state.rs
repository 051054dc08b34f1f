use std::sync::Arc;

use actix::Addr;

use super::security_config::SecurityConfig;
use crate::config::ServerConfig;
use crate::repos::ratings::RatingStore;
use crate::services::matchmaker::Matchmaker;
use crate::services::rooms::RoomDirectory;
use crate::ws::hub::Hub;

/// Shared handles given to every HTTP handler and socket actor.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub security: SecurityConfig,
    pub store: Arc<dyn RatingStore>,
    pub rooms: Arc<RoomDirectory>,
    pub hub: Addr<Hub>,
    pub matchmaker: Addr<Matchmaker>,
}
