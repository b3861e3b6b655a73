//! Per-attempt session identifiers.

use uuid::Uuid;

/// Length of a chipper session id.
pub const SESSION_ID_LEN: usize = 16;

/// A fresh session id: the leading 16 characters of a random UUID.
///
/// Called once per connection attempt; collisions are not checked.
pub fn new_session_id() -> String {
    let mut id = Uuid::new_v4().to_string();
    id.truncate(SESSION_ID_LEN);
    id
}
