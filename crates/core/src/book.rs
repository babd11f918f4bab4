//! Book records.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{BookId, DomainError, DomainResult, Entity};

/// A stored book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub publisher: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// Merge a partial update onto this record, bumping `updated_at`.
    pub fn apply(&mut self, changes: BookChanges, now: DateTime<Utc>) -> DomainResult<()> {
        let title = changes.title.as_deref().map(normalize_title).transpose()?;

        if let Some(title) = title {
            self.title = title;
        }
        if let Some(author) = changes.author {
            self.author = author.trim().to_string();
        }
        if let Some(publisher) = changes.publisher {
            self.publisher = publisher.trim().to_string();
        }
        self.updated_at = now;
        Ok(())
    }
}

impl Entity for Book {
    type Id = BookId;

    fn id(&self) -> BookId {
        self.id
    }
}

/// Fields needed to create a book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub publisher: String,
}

impl NewBook {
    pub fn validate(self) -> DomainResult<Self> {
        Ok(Self {
            title: normalize_title(&self.title)?,
            author: self.author.trim().to_string(),
            publisher: self.publisher.trim().to_string(),
        })
    }
}

/// Partial update for a book.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookChanges {
    pub title: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
}

fn normalize_title(title: &str) -> DomainResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(DomainError::validation("title must not be empty"));
    }
    Ok(title.to_string())
}
