//! API-side ownership guard for user records.
//!
//! This runs after the target id is parsed and before any store access.

use bookshelf_auth::authorize_owner;
use bookshelf_core::UserId;

use crate::app::errors::ApiError;
use crate::context::PrincipalContext;

/// Check that the caller may touch the user record `target`.
///
/// Without a principal (authentication disabled) every request passes.
pub fn authorize_user_access(
    principal: Option<&PrincipalContext>,
    target: UserId,
) -> Result<(), ApiError> {
    let Some(principal) = principal else {
        return Ok(());
    };

    authorize_owner(principal.user_id(), target).map_err(|e| {
        tracing::info!("{e}");
        ApiError::forbidden("You do not have access to this data")
    })
}
