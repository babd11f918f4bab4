//! Token and password primitives for `bookshelf-api`.
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod password;

pub use authorize::{authorize_owner, AuthzError};
pub use claims::{TokenClaims, TokenError, validate_claims};
pub use jwt::{Hs256Jwt, JwtValidator, TokenIssuer, DEFAULT_TOKEN_TTL_HOURS};
pub use password::{PasswordError, PasswordHasher};
