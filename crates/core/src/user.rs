//! User records.
//!
//! A user owns a login (email + bcrypt password hash). The hash is carried on
//! the record so the store can persist it, but it never leaves the process in
//! a serialized response.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{DomainError, DomainResult, Entity, UserId};

// ─────────────────────────────────────────────────────────────────────────────
// User
// ─────────────────────────────────────────────────────────────────────────────

/// A stored user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Merge a partial update onto this record.
    ///
    /// Absent fields keep their stored value; `updated_at` always moves to `now`.
    pub fn apply(&mut self, changes: UserChanges, now: DateTime<Utc>) -> DomainResult<()> {
        let name = changes.name.as_deref().map(normalize_name).transpose()?;
        let email = changes.email.as_deref().map(normalize_email).transpose()?;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(email) = email {
            self.email = email;
        }
        if let Some(hash) = changes.password_hash {
            self.password_hash = hash;
        }
        self.updated_at = now;
        Ok(())
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Inputs
// ─────────────────────────────────────────────────────────────────────────────

/// Fields needed to register a user (password already hashed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

impl NewUser {
    /// Validate and normalize (trimmed name, trimmed lowercase email).
    pub fn validate(self) -> DomainResult<Self> {
        Ok(Self {
            name: normalize_name(&self.name)?,
            email: normalize_email(&self.email)?,
            password_hash: self.password_hash,
        })
    }
}

/// Partial update for a user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

fn normalize_name(name: &str) -> DomainResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::validation("name must not be empty"));
    }
    Ok(name.to_string())
}

/// Normalize an email for storage and lookup.
pub fn normalize_email(email: &str) -> DomainResult<String> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(DomainError::validation("invalid email format"));
    }
    Ok(email.to_lowercase())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
