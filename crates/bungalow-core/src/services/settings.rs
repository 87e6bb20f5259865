//! Settings service: one active settings document at a time.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::controller::ResourceStore;
use crate::error::BungalowResult;
use crate::models::settings::{self, CreateSettings, Settings, UpdateSettings};
use crate::query::{Predicate, ResourceSchema, SortKey};
use crate::repository::{Pagination, SettingsRepository};

/// Settings writes. Saving an active record deactivates every other one
/// in the same transaction, so at most one record is ever active.
pub struct SettingsService<S> {
    settings: Arc<S>,
}

impl<S: SettingsRepository> SettingsService<S> {
    pub fn new(settings: Arc<S>) -> Self {
        Self { settings }
    }

    pub async fn active(&self) -> BungalowResult<Option<Settings>> {
        self.settings.active().await
    }

    pub async fn delete_inactive(&self) -> BungalowResult<u64> {
        let deleted = self.settings.delete_inactive().await?;
        info!(deleted, "inactive settings deleted");
        Ok(deleted)
    }
}

impl<S: SettingsRepository> ResourceStore for SettingsService<S> {
    type Doc = Settings;
    type Create = CreateSettings;
    type Patch = UpdateSettings;

    fn schema(&self) -> &'static ResourceSchema {
        &settings::SCHEMA
    }

    async fn create(&self, input: CreateSettings) -> BungalowResult<Settings> {
        let settings = Settings::new(input, Utc::now())?;
        let saved = self.settings.save_exclusive(&settings).await?;
        if saved.is_active {
            info!(settings_id = %saved.id, "settings activated");
        }
        Ok(saved)
    }

    async fn update(&self, mut current: Settings, patch: UpdateSettings) -> BungalowResult<Settings> {
        current.apply(patch)?;
        current.updated_at = Utc::now();
        self.settings.save_exclusive(&current).await
    }

    async fn delete(&self, current: Settings) -> BungalowResult<()> {
        self.settings.delete(current.id).await
    }

    async fn find(
        &self,
        filter: &Predicate,
        sort: &[SortKey],
        pagination: Pagination,
    ) -> BungalowResult<Vec<Settings>> {
        self.settings.find(filter, sort, pagination).await
    }

    async fn find_one(&self, filter: &Predicate) -> BungalowResult<Option<Settings>> {
        self.settings.find_one(filter).await
    }

    async fn count(&self, filter: &Predicate) -> BungalowResult<u64> {
        self.settings.count(filter).await
    }

    async fn delete_all(&self) -> BungalowResult<u64> {
        self.settings.delete_where(&Predicate::all()).await
    }
}
