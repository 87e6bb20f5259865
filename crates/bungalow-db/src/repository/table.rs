//! Generic SurrealDB table access shared by every resource repository.
//!
//! A [`Record`] describes how one model maps onto its table: the read
//! projection (decimals are read back through string aliases so the
//! stored columns stay numeric for filtering and sorting) and the
//! `SET` clause that writes a record from the bound `$v` object.

use std::marker::PhantomData;

use bungalow_core::query::{Predicate, SortKey};
use bungalow_core::repository::Pagination;
use rust_decimal::Decimal;
use serde_json::Value;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;
use crate::query::{FILTER_VAR, compile_filter, order_clause};

/// Helper struct for deserializing `count()` query results.
#[derive(Debug, SurrealValue)]
pub(crate) struct CountRow {
    pub total: u64,
}

pub(crate) trait Record: Sized + Send + Sync + 'static {
    type Row: SurrealValue + Send + 'static;

    const TABLE: &'static str;
    /// Read projection; must expose `meta::id(id) AS record_id`.
    const SELECT: &'static str;
    /// `SET` assignments reading every column from `$v`.
    const ASSIGN: &'static str;

    fn id(&self) -> Uuid;

    /// Column values keyed by column name. `None` values are left out so
    /// the matching `$v.field` reads as NONE.
    fn vars(&self) -> Value;

    fn from_row(row: Self::Row) -> Result<Self, DbError>;
}

pub(crate) struct Table<C: Connection, R> {
    db: Surreal<C>,
    _record: PhantomData<fn() -> R>,
}

impl<C: Connection, R: Record> Table<C, R> {
    pub fn new(db: Surreal<C>) -> Self {
        Self {
            db,
            _record: PhantomData,
        }
    }

    pub fn db(&self) -> &Surreal<C> {
        &self.db
    }

    pub async fn insert(&self, record: &R) -> Result<R, DbError> {
        let id = record.id().to_string();
        self.db
            .query(format!(
                "CREATE type::record('{}', $id) SET {}",
                R::TABLE,
                R::ASSIGN
            ))
            .bind(("id", id.clone()))
            .bind(("v", record.vars()))
            .await?
            .check()
            .map_err(|e| DbError::from_write(R::TABLE, e))?;
        self.require(&id).await
    }

    pub async fn replace(&self, record: &R) -> Result<R, DbError> {
        let id = record.id().to_string();
        self.require(&id).await?;
        self.db
            .query(format!(
                "UPDATE type::record('{}', $id) SET {}",
                R::TABLE,
                R::ASSIGN
            ))
            .bind(("id", id.clone()))
            .bind(("v", record.vars()))
            .await?
            .check()
            .map_err(|e| DbError::from_write(R::TABLE, e))?;
        self.require(&id).await
    }

    pub async fn get(&self, id: &str) -> Result<Option<R>, DbError> {
        let mut result = self
            .db
            .query(format!(
                "SELECT {} FROM type::record('{}', $id)",
                R::SELECT,
                R::TABLE
            ))
            .bind(("id", id.to_string()))
            .await?;
        let rows: Vec<R::Row> = result.take(0)?;
        rows.into_iter().next().map(R::from_row).transpose()
    }

    async fn require(&self, id: &str) -> Result<R, DbError> {
        self.get(id).await?.ok_or_else(|| DbError::NotFound {
            entity: R::TABLE.into(),
            id: id.to_string(),
        })
    }

    pub async fn get_many(&self, ids: &[Uuid]) -> Result<Vec<R>, DbError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<String> = ids.iter().map(Uuid::to_string).collect();
        let mut result = self
            .db
            .query(format!(
                "SELECT {} FROM {} WHERE meta::id(id) IN $ids",
                R::SELECT,
                R::TABLE
            ))
            .bind(("ids", Value::from(ids)))
            .await?;
        let rows: Vec<R::Row> = result.take(0)?;
        rows.into_iter().map(R::from_row).collect()
    }

    pub async fn find(
        &self,
        filter: &Predicate,
        sort: &[SortKey],
        pagination: Pagination,
    ) -> Result<Vec<R>, DbError> {
        let compiled = compile_filter(filter);
        let mut result = self
            .db
            .query(format!(
                "SELECT {} FROM {} WHERE {}{} LIMIT $limit START $offset",
                R::SELECT,
                R::TABLE,
                compiled.clause,
                order_clause(sort)
            ))
            .bind((FILTER_VAR, compiled.vars_value()))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await?;
        let rows: Vec<R::Row> = result.take(0)?;
        rows.into_iter().map(R::from_row).collect()
    }

    /// Every match, ordered by the raw SurrealQL `order` (no pagination).
    pub async fn find_all(&self, filter: &Predicate, order: &str) -> Result<Vec<R>, DbError> {
        let compiled = compile_filter(filter);
        let mut result = self
            .db
            .query(format!(
                "SELECT {} FROM {} WHERE {}{order}",
                R::SELECT,
                R::TABLE,
                compiled.clause
            ))
            .bind((FILTER_VAR, compiled.vars_value()))
            .await?;
        let rows: Vec<R::Row> = result.take(0)?;
        rows.into_iter().map(R::from_row).collect()
    }

    pub async fn find_one(&self, filter: &Predicate) -> Result<Option<R>, DbError> {
        let page = Pagination {
            offset: 0,
            limit: 1,
        };
        Ok(self.find(filter, &[], page).await?.into_iter().next())
    }

    pub async fn count(&self, filter: &Predicate) -> Result<u64, DbError> {
        let compiled = compile_filter(filter);
        let mut result = self
            .db
            .query(format!(
                "SELECT count() AS total FROM {} WHERE {} GROUP ALL",
                R::TABLE,
                compiled.clause
            ))
            .bind((FILTER_VAR, compiled.vars_value()))
            .await?;
        let rows: Vec<CountRow> = result.take(0)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), DbError> {
        let id = id.to_string();
        self.require(&id).await?;
        self.db
            .query(format!("DELETE type::record('{}', $id)", R::TABLE))
            .bind(("id", id))
            .await?
            .check()?;
        Ok(())
    }

    pub async fn delete_where(&self, filter: &Predicate) -> Result<u64, DbError> {
        let compiled = compile_filter(filter);
        let mut result = self
            .db
            .query(format!(
                "SELECT count() AS total FROM {table} WHERE {clause} GROUP ALL; \
                 DELETE {table} WHERE {clause};",
                table = R::TABLE,
                clause = compiled.clause
            ))
            .bind((FILTER_VAR, compiled.vars_value()))
            .await?
            .check()?;
        let rows: Vec<CountRow> = result.take(0)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}

pub(crate) fn parse_uuid(entity: &str, id: &str, raw: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(raw).map_err(|e| DbError::corrupt(entity, id, format!("invalid UUID {raw}: {e}")))
}

/// Parse a decimal read back through `<string>`; SurrealDB renders
/// decimals with a `dec` suffix.
pub(crate) fn parse_decimal(entity: &str, id: &str, raw: &str) -> Result<Decimal, DbError> {
    raw.trim_end_matches("dec")
        .parse::<Decimal>()
        .map_err(|e| DbError::corrupt(entity, id, format!("invalid decimal {raw}: {e}")))
}

pub(crate) fn insert_opt(vars: &mut serde_json::Map<String, Value>, key: &str, value: Option<Value>) {
    if let Some(value) = value {
        vars.insert(key.to_string(), value);
    }
}
