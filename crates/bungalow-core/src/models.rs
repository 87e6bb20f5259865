//! Domain models for the reservation backend.
//!
//! Each module carries the stored document, its create/update inputs and
//! the [`ResourceSchema`](crate::query::ResourceSchema) that whitelists
//! what clients may filter, sort, project and expand.

pub mod booking;
pub mod cabin;
pub mod guest;
pub mod settings;
pub mod user;
