//! Bungalow Auth: the bearer token boundary. Verifies EdDSA JWT access
//! tokens and resolves them to the staff user id they were issued for.

pub mod config;
pub mod error;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use token::{AccessTokenClaims, bearer_token, issue_access_token, verify_bearer};
