use thiserror::Error;

use bookshelf_core::UserId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: user {principal} may not access user {target}")]
    Forbidden { principal: UserId, target: UserId },
}

/// Authorize access to a user record.
///
/// A principal may only read or mutate its own record.
///
/// - No IO
/// - No panics
pub fn authorize_owner(principal: UserId, target: UserId) -> Result<(), AuthzError> {
    if principal == target {
        Ok(())
    } else {
        Err(AuthzError::Forbidden { principal, target })
    }
}
