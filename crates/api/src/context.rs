use bookshelf_core::UserId;

/// Principal context for a request (the user the bearer token was issued to).
///
/// Inserted by the auth middleware; absent when authentication is disabled.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    user_id: UserId,
}

impl PrincipalContext {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }
}
