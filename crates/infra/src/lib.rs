//! Infrastructure layer: relational storage for users and books.

pub mod db;
pub mod store;

pub use store::{
    BookStore, InMemoryBookStore, InMemoryUserStore, PostgresBookStore, PostgresUserStore,
    StoreError, StoreResult, UserStore,
};
