//! Bungalow Server: the axum REST surface over the core services and the
//! SurrealDB repositories.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod router;
pub mod state;

pub use config::{ConfigError, Environment, ServerConfig};
pub use router::build_router;
pub use state::AppState;
