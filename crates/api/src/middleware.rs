use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, Uri},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use bookshelf_auth::JwtValidator;

use crate::app::errors::ApiError;
use crate::context::PrincipalContext;

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
}

pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::extract::Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(req.headers(), req.uri())
        .ok_or_else(|| ApiError::unauthorized("need authorization token"))?;

    let claims = state.jwt.validate(&token, Utc::now()).map_err(|e| {
        tracing::debug!("rejected token: {e}");
        ApiError::unauthorized("invalid authorization token")
    })?;

    req.extensions_mut()
        .insert(PrincipalContext::new(claims.user_id));

    Ok(next.run(req).await)
}

/// Take the token from `Authorization` (with or without a `Bearer ` prefix),
/// falling back to the first `token` query parameter.
///
/// The query string is only consulted when the header is absent; one that
/// fails to decode counts as carrying no token.
pub fn extract_token(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    let from_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(|h| h.strip_prefix("Bearer ").unwrap_or(h).trim())
        .filter(|t| !t.is_empty());

    if let Some(token) = from_header {
        return Some(token.to_string());
    }

    let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(uri).ok()?;
    pairs
        .into_iter()
        .find(|(key, _)| key == "token")
        .map(|(_, value)| value.trim().to_string())
        .filter(|t| !t.is_empty())
}
