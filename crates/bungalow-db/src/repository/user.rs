//! SurrealDB implementation of [`UserRepository`].

use bungalow_core::error::BungalowResult;
use bungalow_core::models::user::{self, Role, User};
use bungalow_core::query::{Predicate, ResourceSchema, SortKey};
use bungalow_core::repository::{Collection, Pagination, UserRepository};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value, json};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::table::{Record, Table, insert_opt, parse_uuid};
use crate::error::DbError;
use crate::query::datetime_text;

#[derive(Debug, SurrealValue)]
pub(crate) struct UserRow {
    record_id: String,
    email: String,
    full_name: String,
    full_name_lower_case: String,
    role: String,
    is_active: bool,
    lang: String,
    dark_mode: bool,
    avatar: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Record for User {
    type Row = UserRow;

    const TABLE: &'static str = "user";
    const SELECT: &'static str = "meta::id(id) AS record_id, *";
    const ASSIGN: &'static str = "email = $v.email, \
        full_name = $v.full_name, \
        full_name_lower_case = $v.full_name_lower_case, \
        role = $v.role, \
        is_active = $v.is_active, \
        lang = $v.lang, \
        dark_mode = $v.dark_mode, \
        avatar = $v.avatar, \
        created_at = <datetime> $v.created_at, \
        updated_at = <datetime> $v.updated_at";

    fn id(&self) -> Uuid {
        self.id
    }

    fn vars(&self) -> Value {
        let mut vars = Map::new();
        vars.insert("email".into(), json!(self.email));
        vars.insert("full_name".into(), json!(self.full_name));
        vars.insert("full_name_lower_case".into(), json!(self.full_name_lower_case));
        vars.insert("role".into(), json!(self.role.as_str()));
        vars.insert("is_active".into(), json!(self.is_active));
        vars.insert("lang".into(), json!(self.lang));
        vars.insert("dark_mode".into(), json!(self.dark_mode));
        insert_opt(&mut vars, "avatar", self.avatar.as_ref().map(|a| json!(a)));
        vars.insert("created_at".into(), json!(datetime_text(&self.created_at)));
        vars.insert("updated_at".into(), json!(datetime_text(&self.updated_at)));
        Value::Object(vars)
    }

    fn from_row(row: UserRow) -> Result<Self, DbError> {
        let id = parse_uuid("user", &row.record_id, &row.record_id)?;
        let role = row
            .role
            .parse::<Role>()
            .map_err(|e| DbError::corrupt("user", &row.record_id, e))?;
        Ok(User {
            id,
            email: row.email,
            full_name: row.full_name,
            full_name_lower_case: row.full_name_lower_case,
            role,
            is_active: row.is_active,
            lang: row.lang,
            dark_mode: row.dark_mode,
            avatar: row.avatar,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// SurrealDB implementation of the staff user repository.
pub struct SurrealUserRepository<C: Connection> {
    table: Table<C, User>,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self {
            table: Table::new(db),
        }
    }
}

impl<C: Connection> Collection for SurrealUserRepository<C> {
    type Doc = User;

    fn schema(&self) -> &'static ResourceSchema {
        &user::SCHEMA
    }

    async fn insert(&self, doc: &User) -> BungalowResult<User> {
        Ok(self.table.insert(doc).await?)
    }

    async fn replace(&self, doc: &User) -> BungalowResult<User> {
        Ok(self.table.replace(doc).await?)
    }

    async fn get(&self, id: Uuid) -> BungalowResult<Option<User>> {
        Ok(self.table.get(&id.to_string()).await?)
    }

    async fn find(
        &self,
        filter: &Predicate,
        sort: &[SortKey],
        pagination: Pagination,
    ) -> BungalowResult<Vec<User>> {
        Ok(self.table.find(filter, sort, pagination).await?)
    }

    async fn find_one(&self, filter: &Predicate) -> BungalowResult<Option<User>> {
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

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn find_by_email(&self, email: &str) -> BungalowResult<Option<User>> {
        let filter = Predicate::eq_text(user::SCHEMA.require_field("email")?, email);
        Ok(self.table.find_one(&filter).await?)
    }
}
