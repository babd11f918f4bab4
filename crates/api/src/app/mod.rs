//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store selection, password hashing, token issuance
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request DTOs and mapping into domain inputs
//! - `errors.rs`: consistent `{message, error}` error responses

use std::future::Future;
use std::sync::Arc;

use axum::{Extension, Router, ServiceExt, extract::Request, routing::get};
use tokio::net::TcpListener;
use tower::Layer;
use tower_http::{
    cors::CorsLayer,
    normalize_path::NormalizePathLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use bookshelf_auth::{Hs256Jwt, JwtValidator, TokenIssuer};
use bookshelf_infra::StoreError;

use crate::config::AppConfig;
use crate::middleware::AuthState;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: &AppConfig) -> Result<Router, StoreError> {
    let jwt = Arc::new(Hs256Jwt::with_ttl(config.jwt_secret.as_bytes(), config.token_ttl));
    let issuer: Arc<dyn TokenIssuer> = jwt.clone();
    let validator: Arc<dyn JwtValidator> = jwt;

    let services = Arc::new(services::build_services(config, issuer).await?);

    let auth = if config.auth_required {
        Some(AuthState { jwt: validator })
    } else {
        tracing::warn!("AUTH_REQUIRED=false; all routes are public");
        None
    };

    Ok(router(services, auth))
}

/// Assemble routes and layers around already-built services.
pub fn router(services: Arc<services::AppServices>, auth: Option<AuthState>) -> Router {
    let trace = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router(auth))
        .method_not_allowed_fallback(routes::system::method_not_allowed)
        .fallback(routes::system::not_found)
        .layer(Extension(services))
        .layer(trace)
        .layer(CorsLayer::permissive())
}

/// Serve `app` until `shutdown` resolves. Trailing slashes are stripped
/// before routing, so `/books/` and `/books` hit the same handler.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let app = NormalizePathLayer::trim_trailing_slash().layer(app);
    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown)
        .await
}
