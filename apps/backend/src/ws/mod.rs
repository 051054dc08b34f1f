//! Socket layer: wire envelopes, per-connection handles and the connection registry.

pub mod connection;
pub mod hub;
pub mod protocol;
pub mod router;
pub mod session;
