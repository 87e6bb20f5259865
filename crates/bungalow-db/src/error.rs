//! Database-specific error types and conversions.

use bungalow_core::error::BungalowError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Duplicate {entity}: {detail}")]
    Duplicate { entity: String, detail: String },

    /// A stored record that no longer decodes into its model.
    #[error("Corrupt {entity} record {id}: {reason}")]
    Corrupt {
        entity: String,
        id: String,
        reason: String,
    },
}

impl DbError {
    /// Classify a failed write, surfacing unique-index and record-id
    /// collisions as [`DbError::Duplicate`].
    pub(crate) fn from_write(entity: &str, err: surrealdb::Error) -> Self {
        let message = err.to_string();
        if message.contains("already contains") {
            let detail = match index_name(&message) {
                Some(index) => {
                    let field = index
                        .strip_prefix(&format!("idx_{entity}_"))
                        .unwrap_or(index);
                    format!("a {entity} with this {field} already exists")
                }
                None => message,
            };
            DbError::Duplicate {
                entity: entity.to_string(),
                detail,
            }
        } else if message.contains("already exists") {
            DbError::Duplicate {
                entity: entity.to_string(),
                detail: message,
            }
        } else {
            DbError::Surreal(err)
        }
    }

    pub(crate) fn corrupt(entity: &str, id: &str, reason: impl std::fmt::Display) -> Self {
        DbError::Corrupt {
            entity: entity.to_string(),
            id: id.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// The first backtick-quoted token of an index violation message.
fn index_name(message: &str) -> Option<&str> {
    let start = message.find('`')? + 1;
    let len = message[start..].find('`')?;
    Some(&message[start..start + len])
}

impl From<DbError> for BungalowError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => BungalowError::NotFound { entity, id },
            DbError::Duplicate { entity, detail } => BungalowError::AlreadyExists { entity, detail },
            other => BungalowError::Database(other.to_string()),
        }
    }
}
