//! Domain records and identifiers.
//!
//! This crate contains **pure domain** types (no storage or HTTP concerns).

pub mod book;
pub mod entity;
pub mod error;
pub mod id;
pub mod user;

pub use book::{Book, BookChanges, NewBook};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{BookId, UserId};
pub use user::{NewUser, User, UserChanges};
