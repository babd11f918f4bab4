//! Service wiring: stores, password hashing and token issuance.

use std::sync::Arc;

use chrono::Utc;

use bookshelf_auth::{PasswordHasher, TokenIssuer};
use bookshelf_core::UserId;
use bookshelf_infra::{
    BookStore, InMemoryBookStore, InMemoryUserStore, PostgresBookStore, PostgresUserStore,
    StoreError, UserStore, db,
};

use crate::app::errors::ApiError;
use crate::config::AppConfig;

/// Everything the handlers need, shared behind an `Arc`.
#[derive(Clone)]
pub struct AppServices {
    pub users: Arc<dyn UserStore>,
    pub books: Arc<dyn BookStore>,
    pub passwords: PasswordHasher,
    pub tokens: Arc<dyn TokenIssuer>,
}

impl AppServices {
    /// In-memory wiring (dev/test).
    pub fn in_memory(passwords: PasswordHasher, tokens: Arc<dyn TokenIssuer>) -> Self {
        Self {
            users: Arc::new(InMemoryUserStore::new()),
            books: Arc::new(InMemoryBookStore::new()),
            passwords,
            tokens,
        }
    }

    /// bcrypt is CPU-bound; keep it off the async workers.
    pub async fn hash_password(&self, password: String) -> Result<String, ApiError> {
        let hasher = self.passwords;
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| ApiError::internal("failed to hash password").with_detail(e))?
            .map_err(|e| ApiError::internal("failed to hash password").with_detail(e))
    }

    pub async fn verify_password(&self, password: String, stored_hash: String) -> Result<bool, ApiError> {
        let hasher = self.passwords;
        tokio::task::spawn_blocking(move || hasher.verify(&password, &stored_hash))
            .await
            .map_err(|e| ApiError::internal("failed to verify password").with_detail(e))
    }

    pub fn issue_token(&self, user_id: UserId) -> Result<String, ApiError> {
        self.tokens
            .issue(user_id, Utc::now())
            .map_err(|e| ApiError::internal("Failed in creating JWT token").with_detail(e))
    }
}

/// Pick persistent stores when `DATABASE_URL` is configured, in-memory otherwise.
pub async fn build_services(
    config: &AppConfig,
    tokens: Arc<dyn TokenIssuer>,
) -> Result<AppServices, StoreError> {
    let passwords = PasswordHasher::new(config.bcrypt_cost);

    match &config.database_url {
        Some(url) => {
            let pool = db::connect(url, config.database_max_connections).await?;
            tracing::info!("using postgres stores");
            Ok(AppServices {
                users: Arc::new(PostgresUserStore::new(pool.clone())),
                books: Arc::new(PostgresBookStore::new(pool)),
                passwords,
                tokens,
            })
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory stores");
            Ok(AppServices::in_memory(passwords, tokens))
        }
    }
}
