pub mod game_session;
pub mod matchmaker;
pub mod rooms;
pub mod settlement;
