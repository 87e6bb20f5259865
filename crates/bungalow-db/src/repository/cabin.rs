//! SurrealDB implementation of [`CabinRepository`].

use bungalow_core::error::BungalowResult;
use bungalow_core::models::cabin::{self, Cabin};
use bungalow_core::query::{Predicate, ResourceSchema, SortKey};
use bungalow_core::repository::{CabinRepository, Collection, Pagination};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value, json};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::table::{Record, Table, insert_opt, parse_decimal, parse_uuid};
use crate::error::DbError;
use crate::query::datetime_text;

#[derive(Debug, SurrealValue)]
pub(crate) struct CabinRow {
    record_id: String,
    name: String,
    name_lower_case: String,
    max_capacity: u32,
    regular_price_text: String,
    discount_text: String,
    description: Option<String>,
    images: serde_json::Value,
    image: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Record for Cabin {
    type Row = CabinRow;

    const TABLE: &'static str = "cabin";
    const SELECT: &'static str = "meta::id(id) AS record_id, \
        <string> regular_price AS regular_price_text, \
        <string> discount AS discount_text, *";
    const ASSIGN: &'static str = "name = $v.name, \
        name_lower_case = $v.name_lower_case, \
        max_capacity = $v.max_capacity, \
        regular_price = <decimal> $v.regular_price, \
        discount = <decimal> $v.discount, \
        description = $v.description, \
        images = $v.images, \
        image = $v.image, \
        created_at = <datetime> $v.created_at, \
        updated_at = <datetime> $v.updated_at";

    fn id(&self) -> Uuid {
        self.id
    }

    fn vars(&self) -> Value {
        let mut vars = Map::new();
        vars.insert("name".into(), json!(self.name));
        vars.insert("name_lower_case".into(), json!(self.name_lower_case));
        vars.insert("max_capacity".into(), json!(self.max_capacity));
        vars.insert("regular_price".into(), json!(self.regular_price.to_string()));
        vars.insert("discount".into(), json!(self.discount.to_string()));
        insert_opt(&mut vars, "description", self.description.as_ref().map(|d| json!(d)));
        vars.insert("images".into(), json!(self.images));
        insert_opt(&mut vars, "image", self.image.as_ref().map(|i| json!(i)));
        vars.insert("created_at".into(), json!(datetime_text(&self.created_at)));
        vars.insert("updated_at".into(), json!(datetime_text(&self.updated_at)));
        Value::Object(vars)
    }

    fn from_row(row: CabinRow) -> Result<Self, DbError> {
        let id = &row.record_id;
        let images = match row.images {
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s),
                    other => Err(DbError::corrupt("cabin", id, format!("image {other}"))),
                })
                .collect::<Result<Vec<_>, _>>()?,
            Value::Null => Vec::new(),
            other => return Err(DbError::corrupt("cabin", id, format!("images {other}"))),
        };
        Ok(Cabin {
            id: parse_uuid("cabin", id, id)?,
            regular_price: parse_decimal("cabin", id, &row.regular_price_text)?,
            discount: parse_decimal("cabin", id, &row.discount_text)?,
            name: row.name,
            name_lower_case: row.name_lower_case,
            max_capacity: row.max_capacity,
            description: row.description,
            images,
            image: row.image,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// SurrealDB implementation of the cabin repository.
pub struct SurrealCabinRepository<C: Connection> {
    table: Table<C, Cabin>,
}

impl<C: Connection> SurrealCabinRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self {
            table: Table::new(db),
        }
    }
}

impl<C: Connection> Collection for SurrealCabinRepository<C> {
    type Doc = Cabin;

    fn schema(&self) -> &'static ResourceSchema {
        &cabin::SCHEMA
    }

    async fn insert(&self, doc: &Cabin) -> BungalowResult<Cabin> {
        Ok(self.table.insert(doc).await?)
    }

    async fn replace(&self, doc: &Cabin) -> BungalowResult<Cabin> {
        Ok(self.table.replace(doc).await?)
    }

    async fn get(&self, id: Uuid) -> BungalowResult<Option<Cabin>> {
        Ok(self.table.get(&id.to_string()).await?)
    }

    async fn find(
        &self,
        filter: &Predicate,
        sort: &[SortKey],
        pagination: Pagination,
    ) -> BungalowResult<Vec<Cabin>> {
        Ok(self.table.find(filter, sort, pagination).await?)
    }

    async fn find_one(&self, filter: &Predicate) -> BungalowResult<Option<Cabin>> {
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

impl<C: Connection> CabinRepository for SurrealCabinRepository<C> {
    async fn get_many(&self, ids: &[Uuid]) -> BungalowResult<Vec<Cabin>> {
        Ok(self.table.get_many(ids).await?)
    }
}
