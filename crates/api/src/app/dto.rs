use serde::Deserialize;

use bookshelf_core::{BookChanges, NewBook};

// -------------------------
// Request DTOs
// -------------------------

/// Missing fields bind to empty strings and are caught by validation.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBookRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub publisher: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateBookRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
}

// -------------------------
// Mapping helpers
// -------------------------

impl From<CreateBookRequest> for NewBook {
    fn from(body: CreateBookRequest) -> Self {
        NewBook {
            title: body.title,
            author: body.author,
            publisher: body.publisher,
        }
    }
}

impl From<UpdateBookRequest> for BookChanges {
    fn from(body: UpdateBookRequest) -> Self {
        BookChanges {
            title: body.title,
            author: body.author,
            publisher: body.publisher,
        }
    }
}
