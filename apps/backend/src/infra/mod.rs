//! Infrastructure layer: rating store implementations and state wiring.

pub mod file_store;
pub mod memory_store;
pub mod state;
