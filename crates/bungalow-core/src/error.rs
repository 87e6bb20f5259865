//! Error types for the Bungalow reservation backend.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BungalowError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity} ({detail})")]
    AlreadyExists { entity: String, detail: String },

    #[error("Cabin {cabin_id} is not available for the requested days")]
    SchedulingConflict { cabin_id: String },

    #[error("{entity} is still referenced: {reason}")]
    InUse { entity: String, reason: String },

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Authorization denied: {reason}")]
    AuthorizationDenied { reason: String },

    #[error("Account is locked: {reason}")]
    Locked { reason: String },

    #[error("Token has expired")]
    TokenExpired,

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BungalowError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn denied(reason: impl Into<String>) -> Self {
        Self::AuthorizationDenied {
            reason: reason.into(),
        }
    }

    /// HTTP status code this error renders with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation { .. } => 400,
            Self::AuthenticationFailed { .. } => 401,
            Self::AuthorizationDenied { .. } => 403,
            Self::NotFound { .. } => 404,
            Self::AlreadyExists { .. } | Self::SchedulingConflict { .. } | Self::InUse { .. } => {
                409
            }
            Self::Locked { .. } => 423,
            Self::TokenExpired => 498,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Stable machine-readable discriminator so clients can tell a
    /// scheduling conflict from a duplicate key or a bad field.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::AlreadyExists { .. } => "duplicate_key",
            Self::SchedulingConflict { .. } => "scheduling_conflict",
            Self::InUse { .. } => "in_use",
            Self::AuthenticationFailed { .. } => "unauthenticated",
            Self::AuthorizationDenied { .. } => "forbidden",
            Self::Locked { .. } => "locked",
            Self::TokenExpired => "token_expired",
            Self::Validation { .. } => "validation",
            Self::Database(_) => "database",
            Self::Internal(_) => "internal",
        }
    }

    /// Operational errors are expected failures whose message is safe to
    /// show to a client.
    pub fn is_operational(&self) -> bool {
        !matches!(self, Self::Database(_) | Self::Internal(_))
    }
}

impl From<serde_json::Error> for BungalowError {
    fn from(err: serde_json::Error) -> Self {
        Self::validation(format!("invalid input data: {err}"))
    }
}

pub type BungalowResult<T> = Result<T, BungalowError>;
