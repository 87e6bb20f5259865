//! SurrealDB implementation of [`SettingsRepository`].

use bungalow_core::error::BungalowResult;
use bungalow_core::models::settings::{self, Settings};
use bungalow_core::query::{FilterValue, Predicate, ResourceSchema, SortKey};
use bungalow_core::repository::{Collection, Pagination, SettingsRepository};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value, json};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use super::table::{Record, Table, parse_decimal, parse_uuid};
use crate::error::DbError;
use crate::query::datetime_text;

#[derive(Debug, SurrealValue)]
pub(crate) struct SettingsRow {
    record_id: String,
    min_booking_length: u32,
    max_booking_length: u32,
    max_guests_per_booking: u32,
    breakfast_price_text: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Record for Settings {
    type Row = SettingsRow;

    const TABLE: &'static str = "settings";
    const SELECT: &'static str = "meta::id(id) AS record_id, \
        <string> breakfast_price AS breakfast_price_text, *";
    const ASSIGN: &'static str = "min_booking_length = $v.min_booking_length, \
        max_booking_length = $v.max_booking_length, \
        max_guests_per_booking = $v.max_guests_per_booking, \
        breakfast_price = <decimal> $v.breakfast_price, \
        is_active = $v.is_active, \
        created_at = <datetime> $v.created_at, \
        updated_at = <datetime> $v.updated_at";

    fn id(&self) -> Uuid {
        self.id
    }

    fn vars(&self) -> Value {
        let mut vars = Map::new();
        vars.insert("min_booking_length".into(), json!(self.min_booking_length));
        vars.insert("max_booking_length".into(), json!(self.max_booking_length));
        vars.insert("max_guests_per_booking".into(), json!(self.max_guests_per_booking));
        vars.insert("breakfast_price".into(), json!(self.breakfast_price.to_string()));
        vars.insert("is_active".into(), json!(self.is_active));
        vars.insert("created_at".into(), json!(datetime_text(&self.created_at)));
        vars.insert("updated_at".into(), json!(datetime_text(&self.updated_at)));
        Value::Object(vars)
    }

    fn from_row(row: SettingsRow) -> Result<Self, DbError> {
        let id = &row.record_id;
        Ok(Settings {
            id: parse_uuid("settings", id, id)?,
            min_booking_length: row.min_booking_length,
            max_booking_length: row.max_booking_length,
            max_guests_per_booking: row.max_guests_per_booking,
            breakfast_price: parse_decimal("settings", id, &row.breakfast_price_text)?,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn active_is(value: bool) -> BungalowResult<Predicate> {
    Ok(Predicate::eq(
        settings::SCHEMA.require_field("isActive")?,
        FilterValue::Boolean(value),
    ))
}

/// SurrealDB implementation of the settings repository.
pub struct SurrealSettingsRepository<C: Connection> {
    table: Table<C, Settings>,
}

impl<C: Connection> SurrealSettingsRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self {
            table: Table::new(db),
        }
    }
}

impl<C: Connection> Collection for SurrealSettingsRepository<C> {
    type Doc = Settings;

    fn schema(&self) -> &'static ResourceSchema {
        &settings::SCHEMA
    }

    async fn insert(&self, doc: &Settings) -> BungalowResult<Settings> {
        Ok(self.table.insert(doc).await?)
    }

    async fn replace(&self, doc: &Settings) -> BungalowResult<Settings> {
        Ok(self.table.replace(doc).await?)
    }

    async fn get(&self, id: Uuid) -> BungalowResult<Option<Settings>> {
        Ok(self.table.get(&id.to_string()).await?)
    }

    async fn find(
        &self,
        filter: &Predicate,
        sort: &[SortKey],
        pagination: Pagination,
    ) -> BungalowResult<Vec<Settings>> {
        Ok(self.table.find(filter, sort, pagination).await?)
    }

    async fn find_one(&self, filter: &Predicate) -> BungalowResult<Option<Settings>> {
        Ok(self.table.find_one(filter).await?)
    }

    async fn count(&self, filter: &Predicate) -> BungalowResult<u64> {
        Ok(self.table.count(filter).await?)
    }

    async fn delete(&self, id: Uuid) -> BungalowResult<()> {
        Ok(self.table.delete(id).await?)
    }

    async fn delete_where(&self, filter: &Predicate) -> BungalowResult<u64> {
        Ok(self.table.delete_where(filter).await?)
    }
}

impl<C: Connection> SettingsRepository for SurrealSettingsRepository<C> {
    async fn active(&self) -> BungalowResult<Option<Settings>> {
        Ok(self.table.find_one(&active_is(true)?).await?)
    }

    async fn save_exclusive(&self, doc: &Settings) -> BungalowResult<Settings> {
        let id = doc.id.to_string();
        debug!(settings_id = %id, active = doc.is_active, "saving settings");
        self.table
            .db()
            .query(format!(
                "BEGIN TRANSACTION; \
                 IF $v.is_active {{ \
                     UPDATE settings SET is_active = false, updated_at = time::now() \
                     WHERE is_active = true AND meta::id(id) != $id; \
                 }}; \
                 UPSERT type::record('settings', $id) SET {}; \
                 COMMIT TRANSACTION;",
                Settings::ASSIGN
            ))
            .bind(("id", id.clone()))
            .bind(("v", doc.vars()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::from_write(Settings::TABLE, e))?;

        let saved = self.table.get(&id).await?.ok_or_else(|| DbError::NotFound {
            entity: Settings::TABLE.into(),
            id,
        })?;
        Ok(saved)
    }

    async fn delete_inactive(&self) -> BungalowResult<u64> {
        Ok(self.table.delete_where(&active_is(false)?).await?)
    }
}
