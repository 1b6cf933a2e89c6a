use stocktrail_auth::Principal;
use stocktrail_core::UserId;

/// Principal context for a request (authenticated identity).
///
/// This is immutable and must be present for all authenticated routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    user_id: UserId,
    username: String,
}

impl PrincipalContext {
    pub fn new(user_id: UserId, username: String) -> Self {
        Self { user_id, username }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// The principal threaded through service calls.
    pub fn principal(&self) -> Principal {
        Principal {
            user_id: self.user_id,
            username: self.username.clone(),
        }
    }
}
