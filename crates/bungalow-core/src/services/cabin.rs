//! Cabin service: cabin writes and the in-use guard on deletes.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::booking::CabinLocks;
use crate::controller::ResourceStore;
use crate::error::{BungalowError, BungalowResult};
use crate::models::cabin::{self, Cabin, CreateCabin, UpdateCabin};
use crate::query::{Predicate, ResourceSchema, SortKey};
use crate::repository::{BookingRepository, CabinRepository, Pagination};

/// Cabin writes, guarded against deleting cabins that still have bookings.
///
/// `locks` must be the registry the booking service commits under, so a
/// booking cannot land between the in-use check and the delete.
pub struct CabinService<C, B> {
    cabins: Arc<C>,
    bookings: Arc<B>,
    locks: Arc<CabinLocks>,
}

impl<C: CabinRepository, B: BookingRepository> CabinService<C, B> {
    pub fn new(cabins: Arc<C>, bookings: Arc<B>, locks: Arc<CabinLocks>) -> Self {
        Self {
            cabins,
            bookings,
            locks,
        }
    }
}

impl<C: CabinRepository, B: BookingRepository> ResourceStore for CabinService<C, B> {
    type Doc = Cabin;
    type Create = CreateCabin;
    type Patch = UpdateCabin;

    fn schema(&self) -> &'static ResourceSchema {
        &cabin::SCHEMA
    }

    async fn create(&self, input: CreateCabin) -> BungalowResult<Cabin> {
        let cabin = Cabin::new(input, Utc::now())?;
        self.cabins.insert(&cabin).await
    }

    async fn update(&self, mut current: Cabin, patch: UpdateCabin) -> BungalowResult<Cabin> {
        current.apply(patch)?;
        current.updated_at = Utc::now();
        self.cabins.replace(&current).await
    }

    async fn delete(&self, current: Cabin) -> BungalowResult<()> {
        let _guards = self.locks.acquire(&[current.id]).await;
        let bookings = self.bookings.count_by_cabin(current.id).await?;
        if bookings > 0 {
            return Err(BungalowError::InUse {
                entity: "cabin".into(),
                reason: format!("{bookings} booking(s) reference cabin {}", current.name),
            });
        }
        self.cabins.delete(current.id).await?;
        info!(cabin_id = %current.id, "cabin deleted");
        Ok(())
    }

    async fn find(
        &self,
        filter: &Predicate,
        sort: &[SortKey],
        pagination: Pagination,
    ) -> BungalowResult<Vec<Cabin>> {
        self.cabins.find(filter, sort, pagination).await
    }

    async fn find_one(&self, filter: &Predicate) -> BungalowResult<Option<Cabin>> {
        self.cabins.find_one(filter).await
    }

    async fn count(&self, filter: &Predicate) -> BungalowResult<u64> {
        self.cabins.count(filter).await
    }

    async fn delete_all(&self) -> BungalowResult<u64> {
        let bookings = self.bookings.count(&Predicate::all()).await?;
        if bookings > 0 {
            return Err(BungalowError::InUse {
                entity: "cabin".into(),
                reason: format!("{bookings} booking(s) still reference cabins"),
            });
        }
        self.cabins.delete_where(&Predicate::all()).await
    }
}
