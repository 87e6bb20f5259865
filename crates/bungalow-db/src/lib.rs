//! Bungalow Database: SurrealDB connection management, schema migrations,
//! the predicate-to-SurrealQL compiler and repository implementations of
//! the `bungalow-core` storage traits.

mod connection;
mod error;
pub mod query;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::{run_migrations, schema_v1};
