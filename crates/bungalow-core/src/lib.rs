//! Core domain of the Bungalow reservation backend: models, the dynamic
//! query layer, scheduling and pricing rules, access restrictions, the
//! generic resource controller and the per-resource services.

pub mod access;
pub mod controller;
pub mod error;
pub mod models;
pub mod pricing;
pub mod query;
pub mod repository;
pub mod scheduling;
pub mod services;

pub use error::{BungalowError, BungalowResult};
