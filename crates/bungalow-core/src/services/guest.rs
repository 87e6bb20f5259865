//! Guest service: registration that matches returning guests by email.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::controller::ResourceStore;
use crate::error::{BungalowError, BungalowResult};
use crate::models::guest::{self, CreateGuest, Guest, UpdateGuest, normalize_email};
use crate::query::{Predicate, ResourceSchema, SortKey};
use crate::repository::{GuestRepository, Pagination};

/// Outcome of a guest registration.
#[derive(Debug, Clone, PartialEq)]
pub enum Registration {
    Created(Guest),
    /// An existing guest with the same email and identical details.
    Matched(Guest),
}

impl Registration {
    pub fn guest(&self) -> &Guest {
        match self {
            Registration::Created(g) | Registration::Matched(g) => g,
        }
    }
}

pub struct GuestService<G> {
    guests: Arc<G>,
}

impl<G: GuestRepository> GuestService<G> {
    pub fn new(guests: Arc<G>) -> Self {
        Self { guests }
    }

    /// Register a guest, or return the existing guest registered under the
    /// same email when name, national id and nationality all match.
    pub async fn register(&self, input: CreateGuest) -> BungalowResult<Registration> {
        let email = normalize_email(&input.email);
        if let Some(existing) = self.guests.find_by_email(&email).await? {
            return Self::reconcile(existing, &input);
        }

        let guest = Guest::new(input.clone(), Utc::now())?;
        match self.guests.insert(&guest).await {
            Ok(created) => {
                info!(guest_id = %created.id, "guest registered");
                Ok(Registration::Created(created))
            }
            // Lost a race against a concurrent registration of the same email.
            Err(BungalowError::AlreadyExists { .. }) => {
                let existing = self
                    .guests
                    .find_by_email(&email)
                    .await?
                    .ok_or_else(|| BungalowError::Internal("guest vanished after conflict".into()))?;
                Self::reconcile(existing, &input)
            }
            Err(e) => Err(e),
        }
    }

    fn reconcile(existing: Guest, input: &CreateGuest) -> BungalowResult<Registration> {
        if existing.matches(input) {
            Ok(Registration::Matched(existing))
        } else {
            warn!(guest_id = %existing.id, "guest details do not match registered email");
            Err(BungalowError::denied(
                "guest details do not match the registered email",
            ))
        }
    }
}

impl<G: GuestRepository> ResourceStore for GuestService<G> {
    type Doc = Guest;
    type Create = CreateGuest;
    type Patch = UpdateGuest;

    fn schema(&self) -> &'static ResourceSchema {
        &guest::SCHEMA
    }

    async fn create(&self, input: CreateGuest) -> BungalowResult<Guest> {
        let guest = Guest::new(input, Utc::now())?;
        self.guests.insert(&guest).await
    }

    async fn update(&self, mut current: Guest, patch: UpdateGuest) -> BungalowResult<Guest> {
        current.apply(patch)?;
        current.updated_at = Utc::now();
        self.guests.replace(&current).await
    }

    async fn delete(&self, current: Guest) -> BungalowResult<()> {
        self.guests.delete(current.id).await
    }

    async fn find(
        &self,
        filter: &Predicate,
        sort: &[SortKey],
        pagination: Pagination,
    ) -> BungalowResult<Vec<Guest>> {
        self.guests.find(filter, sort, pagination).await
    }

    async fn find_one(&self, filter: &Predicate) -> BungalowResult<Option<Guest>> {
        self.guests.find_one(filter).await
    }

    async fn count(&self, filter: &Predicate) -> BungalowResult<u64> {
        self.guests.count(filter).await
    }

    async fn delete_all(&self) -> BungalowResult<u64> {
        self.guests.delete_where(&Predicate::all()).await
    }
}
