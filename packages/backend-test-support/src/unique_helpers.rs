//! Unique identities so concurrently running tests never share a player row.

use uuid::Uuid;

/// `{prefix}-{uuid}`.
///
/// ```
/// use backend_test_support::unique_helpers::unique_player_id;
///
/// let a = unique_player_id("alice");
/// assert!(a.starts_with("alice-"));
/// assert_ne!(a, unique_player_id("alice"));
/// ```
pub fn unique_player_id(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}
