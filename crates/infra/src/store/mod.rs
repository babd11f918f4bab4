//! Record storage abstractions.
//!
//! Every operation is a single-table call: list, fetch by id, create, save,
//! soft-delete. Deleted rows stay in the table but are invisible to every
//! read.

use async_trait::async_trait;
use thiserror::Error;

use bookshelf_core::{Book, BookId, NewBook, NewUser, User, UserId};

pub mod in_memory;
pub mod postgres;

pub use in_memory::{InMemoryBookStore, InMemoryUserStore};
pub use postgres::{PostgresBookStore, PostgresUserStore};

/// Result type used by every store.
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    /// A uniqueness constraint rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Persistence for user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// All live users, ascending by id.
    async fn list(&self) -> StoreResult<Vec<User>>;

    async fn get(&self, id: UserId) -> StoreResult<User>;

    /// Look up a live user by (normalized) email.
    async fn find_by_email(&self, email: &str) -> StoreResult<User>;

    /// Insert a new user; the store assigns id and timestamps.
    async fn create(&self, new: NewUser) -> StoreResult<User>;

    /// Persist every field of an existing user.
    async fn save(&self, user: &User) -> StoreResult<User>;

    /// Soft-delete a user.
    async fn delete(&self, id: UserId) -> StoreResult<()>;
}

/// Persistence for book records.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// All live books, ascending by id.
    async fn list(&self) -> StoreResult<Vec<Book>>;

    async fn get(&self, id: BookId) -> StoreResult<Book>;

    async fn create(&self, new: NewBook) -> StoreResult<Book>;

    async fn save(&self, book: &Book) -> StoreResult<Book>;

    async fn delete(&self, id: BookId) -> StoreResult<()>;
}
