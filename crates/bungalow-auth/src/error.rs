//! Token boundary error types.

use bungalow_core::error::BungalowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no bearer token was supplied")]
    MissingToken,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for BungalowError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenExpired => BungalowError::TokenExpired,
            AuthError::MissingToken | AuthError::TokenInvalid(_) => {
                BungalowError::AuthenticationFailed {
                    reason: err.to_string(),
                }
            }
            AuthError::Crypto(msg) => BungalowError::Internal(msg),
        }
    }
}
