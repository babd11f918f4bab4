//! In-memory stores for tests/dev.
//!
//! Rows are kept in id order with a monotonically increasing id counter
//! starting at 1, mirroring a `BIGSERIAL` column. Deletes are soft: the row
//! keeps its id (ids are never reused) but disappears from every read.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use bookshelf_core::{Book, BookId, Entity, NewBook, NewUser, User, UserId};

use super::{BookStore, StoreError, StoreResult, UserStore};

#[derive(Debug)]
struct Row<T> {
    record: T,
    deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug)]
struct TableState<T> {
    next_id: i64,
    rows: BTreeMap<i64, Row<T>>,
}

/// A single soft-delete table keyed by integer id.
#[derive(Debug)]
struct Table<T> {
    inner: RwLock<TableState<T>>,
}

impl<T: Entity> Table<T> {
    fn new() -> Self {
        Self {
            inner: RwLock::new(TableState {
                next_id: 1,
                rows: BTreeMap::new(),
            }),
        }
    }

    fn read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, TableState<T>>> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend("in-memory table lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<std::sync::RwLockWriteGuard<'_, TableState<T>>> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("in-memory table lock poisoned".to_string()))
    }

    fn live(state: &TableState<T>) -> impl Iterator<Item = &T> {
        state
            .rows
            .values()
            .filter(|row| row.deleted_at.is_none())
            .map(|row| &row.record)
    }

    fn list(&self) -> StoreResult<Vec<T>> {
        let state = self.read()?;
        Ok(Self::live(&state).cloned().collect())
    }

    fn get(&self, id: T::Id) -> StoreResult<T> {
        let key: i64 = id.into();
        let state = self.read()?;
        state
            .rows
            .get(&key)
            .filter(|row| row.deleted_at.is_none())
            .map(|row| row.record.clone())
            .ok_or(StoreError::NotFound)
    }

    fn find(&self, pred: impl Fn(&T) -> bool) -> StoreResult<Option<T>> {
        let state = self.read()?;
        Ok(Self::live(&state).find(|r| pred(*r)).cloned())
    }

    /// Insert a record built from the freshly assigned id.
    ///
    /// `unique` is checked against live rows under the same write lock.
    fn insert(
        &self,
        build: impl FnOnce(i64) -> T,
        unique: impl Fn(&T, &T) -> bool,
    ) -> StoreResult<T> {
        let mut state = self.write()?;
        let id = state.next_id;
        let record = build(id);

        if Self::live(&state).any(|existing| unique(existing, &record)) {
            return Err(StoreError::Conflict("duplicate record".to_string()));
        }

        state.next_id += 1;
        state.rows.insert(
            id,
            Row {
                record: record.clone(),
                deleted_at: None,
            },
        );
        Ok(record)
    }

    fn replace(&self, record: &T, unique: impl Fn(&T, &T) -> bool) -> StoreResult<T> {
        let mut state = self.write()?;
        let id: i64 = record.id().into();

        if Self::live(&state).any(|existing| existing.id() != record.id() && unique(existing, record)) {
            return Err(StoreError::Conflict("duplicate record".to_string()));
        }

        match state.rows.get_mut(&id) {
            Some(row) if row.deleted_at.is_none() => {
                row.record = record.clone();
                Ok(record.clone())
            }
            _ => Err(StoreError::NotFound),
        }
    }

    fn soft_delete(&self, id: T::Id) -> StoreResult<()> {
        let key: i64 = id.into();
        let mut state = self.write()?;
        match state.rows.get_mut(&key) {
            Some(row) if row.deleted_at.is_none() => {
                row.deleted_at = Some(Utc::now());
                Ok(())
            }
            _ => Err(StoreError::NotFound),
        }
    }
}

fn same_email(a: &User, b: &User) -> bool {
    a.email == b.email
}

fn never(_: &Book, _: &Book) -> bool {
    false
}

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct InMemoryUserStore {
    table: Table<User>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self { table: Table::new() }
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn list(&self) -> StoreResult<Vec<User>> {
        self.table.list()
    }

    async fn get(&self, id: UserId) -> StoreResult<User> {
        self.table.get(id)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<User> {
        self.table
            .find(|u| u.email == email)?
            .ok_or(StoreError::NotFound)
    }

    async fn create(&self, new: NewUser) -> StoreResult<User> {
        let now = Utc::now();
        self.table
            .insert(
                |id| User {
                    id: UserId::new(id),
                    name: new.name,
                    email: new.email,
                    password_hash: new.password_hash,
                    created_at: now,
                    updated_at: now,
                },
                same_email,
            )
            .map_err(email_conflict)
    }

    async fn save(&self, user: &User) -> StoreResult<User> {
        self.table.replace(user, same_email).map_err(email_conflict)
    }

    async fn delete(&self, id: UserId) -> StoreResult<()> {
        self.table.soft_delete(id)
    }
}

fn email_conflict(err: StoreError) -> StoreError {
    match err {
        StoreError::Conflict(_) => StoreError::Conflict("email already registered".to_string()),
        other => other,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Books
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct InMemoryBookStore {
    table: Table<Book>,
}

impl InMemoryBookStore {
    pub fn new() -> Self {
        Self { table: Table::new() }
    }
}

impl Default for InMemoryBookStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookStore for InMemoryBookStore {
    async fn list(&self) -> StoreResult<Vec<Book>> {
        self.table.list()
    }

    async fn get(&self, id: BookId) -> StoreResult<Book> {
        self.table.get(id)
    }

    async fn create(&self, new: NewBook) -> StoreResult<Book> {
        let now = Utc::now();
        self.table.insert(
            |id| Book {
                id: BookId::new(id),
                title: new.title,
                author: new.author,
                publisher: new.publisher,
                created_at: now,
                updated_at: now,
            },
            never,
        )
    }

    async fn save(&self, book: &Book) -> StoreResult<Book> {
        self.table.replace(book, never)
    }

    async fn delete(&self, id: BookId) -> StoreResult<()> {
        self.table.soft_delete(id)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
