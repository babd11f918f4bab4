use axum::Router;

use crate::middleware::AuthState;

pub mod books;
pub mod common;
pub mod system;
pub mod users;

/// Router for the resource endpoints.
///
/// `auth` is `None` when authentication is disabled; otherwise it guards every
/// route except registration and login.
pub fn router(auth: Option<AuthState>) -> Router {
    Router::new()
        .nest("/users", users::router(auth.as_ref()))
        .nest("/books", books::router(auth.as_ref()))
}
