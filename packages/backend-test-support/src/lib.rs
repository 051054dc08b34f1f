//! Backend test support utilities
//!
//! Shared by the backend's unit tests and integration test binaries: logging
//! bootstrap, problem+json assertions and unique identity helpers.

pub mod logging;
pub mod problem_details;
pub mod unique_helpers;
