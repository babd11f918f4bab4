use core::str::FromStr;

use axum::extract::{Path, rejection::PathRejection};
use axum::routing::MethodRouter;

use bookshelf_core::DomainError;

use crate::app::errors::ApiError;
use crate::middleware::{AuthState, auth_middleware};

/// Require a valid token on `route` when authentication is enabled.
pub fn guarded(auth: Option<&AuthState>, route: MethodRouter) -> MethodRouter {
    match auth {
        Some(state) => route.route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        )),
        None => route,
    }
}

/// Parse a path id, answering 400 with `message` on failure.
pub fn parse_id<T>(raw: &str, message: &'static str) -> Result<T, ApiError>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse::<T>()
        .map_err(|e| ApiError::bad_request(message).with_detail(e))
}

/// Like [`parse_id`], for a path segment that may not have decoded at all.
pub fn path_id<T>(
    path: Result<Path<String>, PathRejection>,
    message: &'static str,
) -> Result<T, ApiError>
where
    T: FromStr<Err = DomainError>,
{
    let Path(raw) = path.map_err(|e| ApiError::bad_request(message).with_detail(e.body_text()))?;
    parse_id(&raw, message)
}
