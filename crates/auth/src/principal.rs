use serde::{Deserialize, Serialize};

use stocktrail_core::UserId;

/// Identity of an authenticated principal.
///
/// Threaded explicitly through every service call; there is no ambient
/// "current user" context anywhere in the system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    pub username: String,
}
