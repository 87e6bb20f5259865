//! Dynamic query layer shared by every resource endpoint.
//!
//! An untrusted query string is decoded ([`params`]), its filter keys are
//! translated into a whitelisted [`Predicate`] ([`filter`], [`raw`]), and
//! the remaining directive keys become sort, projection, expansion and
//! pagination instructions ([`directives`]).

pub mod directives;
pub mod filter;
pub mod params;
pub mod projection;
pub mod raw;
pub mod schema;

pub use directives::{Expansion, ListDirectives, Projection, SortKey};
pub use filter::{CompareOp, Predicate, translate_filter};
pub use params::QueryParams;
pub use schema::{ExpansionSpec, FieldKind, FieldSpec, FilterValue, ID_FIELD, ResourceSchema};
