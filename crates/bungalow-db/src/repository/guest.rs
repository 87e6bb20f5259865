//! SurrealDB implementation of [`GuestRepository`].

use bungalow_core::error::BungalowResult;
use bungalow_core::models::guest::{self, Guest};
use bungalow_core::query::{Predicate, ResourceSchema, SortKey};
use bungalow_core::repository::{Collection, GuestRepository, Pagination};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value, json};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::table::{Record, Table, insert_opt, parse_uuid};
use crate::error::DbError;
use crate::query::datetime_text;

#[derive(Debug, SurrealValue)]
pub(crate) struct GuestRow {
    record_id: String,
    full_name: String,
    full_name_lower_case: String,
    email: String,
    national_id: String,
    nationality: String,
    country_flag: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Record for Guest {
    type Row = GuestRow;

    const TABLE: &'static str = "guest";
    const SELECT: &'static str = "meta::id(id) AS record_id, *";
    const ASSIGN: &'static str = "full_name = $v.full_name, \
        full_name_lower_case = $v.full_name_lower_case, \
        email = $v.email, \
        national_id = $v.national_id, \
        nationality = $v.nationality, \
        country_flag = $v.country_flag, \
        created_at = <datetime> $v.created_at, \
        updated_at = <datetime> $v.updated_at";

    fn id(&self) -> Uuid {
        self.id
    }

    fn vars(&self) -> Value {
        let mut vars = Map::new();
        vars.insert("full_name".into(), json!(self.full_name));
        vars.insert("full_name_lower_case".into(), json!(self.full_name_lower_case));
        vars.insert("email".into(), json!(self.email));
        vars.insert("national_id".into(), json!(self.national_id));
        vars.insert("nationality".into(), json!(self.nationality));
        insert_opt(&mut vars, "country_flag", self.country_flag.as_ref().map(|f| json!(f)));
        vars.insert("created_at".into(), json!(datetime_text(&self.created_at)));
        vars.insert("updated_at".into(), json!(datetime_text(&self.updated_at)));
        Value::Object(vars)
    }

    fn from_row(row: GuestRow) -> Result<Self, DbError> {
        Ok(Guest {
            id: parse_uuid("guest", &row.record_id, &row.record_id)?,
            full_name: row.full_name,
            full_name_lower_case: row.full_name_lower_case,
            email: row.email,
            national_id: row.national_id,
            nationality: row.nationality,
            country_flag: row.country_flag,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// SurrealDB implementation of the guest repository.
pub struct SurrealGuestRepository<C: Connection> {
    table: Table<C, Guest>,
}

impl<C: Connection> SurrealGuestRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self {
            table: Table::new(db),
        }
    }
}

impl<C: Connection> Collection for SurrealGuestRepository<C> {
    type Doc = Guest;

    fn schema(&self) -> &'static ResourceSchema {
        &guest::SCHEMA
    }

    async fn insert(&self, doc: &Guest) -> BungalowResult<Guest> {
        Ok(self.table.insert(doc).await?)
    }

    async fn replace(&self, doc: &Guest) -> BungalowResult<Guest> {
        Ok(self.table.replace(doc).await?)
    }

    async fn get(&self, id: Uuid) -> BungalowResult<Option<Guest>> {
        Ok(self.table.get(&id.to_string()).await?)
    }

    async fn find(
        &self,
        filter: &Predicate,
        sort: &[SortKey],
        pagination: Pagination,
    ) -> BungalowResult<Vec<Guest>> {
        Ok(self.table.find(filter, sort, pagination).await?)
    }

    async fn find_one(&self, filter: &Predicate) -> BungalowResult<Option<Guest>> {
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

impl<C: Connection> GuestRepository for SurrealGuestRepository<C> {
    async fn find_by_email(&self, email: &str) -> BungalowResult<Option<Guest>> {
        let filter = Predicate::eq_text(guest::SCHEMA.require_field("email")?, email);
        Ok(self.table.find_one(&filter).await?)
    }

    async fn get_many(&self, ids: &[Uuid]) -> BungalowResult<Vec<Guest>> {
        Ok(self.table.get_many(ids).await?)
    }
}
