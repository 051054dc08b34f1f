pub mod player_identity;

pub use player_identity::PlayerIdentity;
