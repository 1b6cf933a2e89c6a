//! Write authorization: owner-gated mutation, open reads.
//!
//! Any authenticated principal may view any item; only the managing user
//! may update or delete it. That asymmetry is deliberate and must hold at
//! the service boundary, before any state is touched.

use thiserror::Error;

use stocktrail_core::UserId;

use crate::principal::Principal;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthzError {
    #[error("only the managing user may modify this item")]
    NotOwner,
}

/// Check that `principal` owns the resource managed by `managed_by`.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize_owner(principal: &Principal, managed_by: UserId) -> Result<(), AuthzError> {
    if principal.user_id == managed_by {
        Ok(())
    } else {
        Err(AuthzError::NotOwner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_may_write_others_may_not() {
        let owner = UserId::new();
        let principal = Principal {
            user_id: owner,
            username: "alice".to_string(),
        };

        assert_eq!(authorize_owner(&principal, owner), Ok(()));
        assert_eq!(
            authorize_owner(&principal, UserId::new()),
            Err(AuthzError::NotOwner)
        );
    }
}
