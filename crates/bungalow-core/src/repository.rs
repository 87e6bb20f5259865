//! Repository trait definitions for data access abstraction.
//!
//! [`Collection`] is the generic document-store surface every resource
//! shares; it is driven by [`Predicate`] trees, so any filter the query
//! layer accepts can be executed by any backend implementing it. The
//! per-resource traits add the few lookups the domain services need.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::BungalowResult;
use crate::models::{booking::Booking, cabin::Cabin, guest::Guest, settings::Settings, user::User};
use crate::query::directives::DEFAULT_PAGE_LIMIT;
use crate::query::{Predicate, ResourceSchema, SortKey};

/// Pagination parameters for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

/// A page of results together with the total number of matches.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

/// Typed document collection addressed by predicates.
pub trait Collection: Send + Sync {
    type Doc: Serialize + Clone + Send + Sync + 'static;

    fn schema(&self) -> &'static ResourceSchema;

    fn insert(&self, doc: &Self::Doc) -> impl Future<Output = BungalowResult<Self::Doc>> + Send;

    /// Overwrite the stored document with the same id.
    fn replace(&self, doc: &Self::Doc) -> impl Future<Output = BungalowResult<Self::Doc>> + Send;

    fn get(&self, id: Uuid) -> impl Future<Output = BungalowResult<Option<Self::Doc>>> + Send;

    fn find(
        &self,
        filter: &Predicate,
        sort: &[SortKey],
        pagination: Pagination,
    ) -> impl Future<Output = BungalowResult<Vec<Self::Doc>>> + Send;

    fn find_one(
        &self,
        filter: &Predicate,
    ) -> impl Future<Output = BungalowResult<Option<Self::Doc>>> + Send;

    fn count(&self, filter: &Predicate) -> impl Future<Output = BungalowResult<u64>> + Send;

    fn delete(&self, id: Uuid) -> impl Future<Output = BungalowResult<()>> + Send;

    /// Delete every document matching `filter`; returns how many went.
    fn delete_where(&self, filter: &Predicate)
    -> impl Future<Output = BungalowResult<u64>> + Send;
}

pub trait CabinRepository: Collection<Doc = Cabin> {
    fn get_many(&self, ids: &[Uuid]) -> impl Future<Output = BungalowResult<Vec<Cabin>>> + Send;
}

pub trait GuestRepository: Collection<Doc = Guest> {
    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = BungalowResult<Option<Guest>>> + Send;

    fn get_many(&self, ids: &[Uuid]) -> impl Future<Output = BungalowResult<Vec<Guest>>> + Send;
}

pub trait BookingRepository: Collection<Doc = Booking> {
    /// Bookings of `cabin_id` whose `[start, end)` intersects the given
    /// interval, ignoring `excluding` (the booking being rewritten).
    fn find_overlapping(
        &self,
        cabin_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        excluding: Option<Uuid>,
    ) -> impl Future<Output = BungalowResult<Vec<Booking>>> + Send;

    fn find_by_cabin(
        &self,
        cabin_id: Uuid,
    ) -> impl Future<Output = BungalowResult<Vec<Booking>>> + Send;

    fn count_by_cabin(&self, cabin_id: Uuid) -> impl Future<Output = BungalowResult<u64>> + Send;

    fn find_by_pnr(
        &self,
        pnr_code: &str,
    ) -> impl Future<Output = BungalowResult<Option<Booking>>> + Send;

    /// Bookings created in `[first, last]`, oldest first.
    fn find_created_between(
        &self,
        first: DateTime<Utc>,
        last: DateTime<Utc>,
    ) -> impl Future<Output = BungalowResult<Vec<Booking>>> + Send;

    /// Atomically delete every booking and insert `bookings`.
    fn replace_all(
        &self,
        bookings: &[Booking],
    ) -> impl Future<Output = BungalowResult<u64>> + Send;
}

pub trait SettingsRepository: Collection<Doc = Settings> {
    fn active(&self) -> impl Future<Output = BungalowResult<Option<Settings>>> + Send;

    /// Write `settings` and, when it is active, deactivate every other
    /// record in the same transaction.
    fn save_exclusive(
        &self,
        settings: &Settings,
    ) -> impl Future<Output = BungalowResult<Settings>> + Send;

    fn delete_inactive(&self) -> impl Future<Output = BungalowResult<u64>> + Send;
}

pub trait UserRepository: Collection<Doc = User> {
    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = BungalowResult<Option<User>>> + Send;
}
