//! SurrealDB implementation of [`BookingRepository`].

use bungalow_core::error::BungalowResult;
use bungalow_core::models::booking::{self, Booking, BookingStatus};
use bungalow_core::query::{CompareOp, FilterValue, Predicate, ResourceSchema, SortKey};
use bungalow_core::repository::{BookingRepository, Collection, Pagination};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value, json};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;
use uuid::Uuid;

use super::table::{Record, Table, insert_opt, parse_decimal, parse_uuid};
use crate::error::DbError;
use crate::query::datetime_text;

#[derive(Debug, SurrealValue)]
pub(crate) struct BookingRow {
    record_id: String,
    cabin_id: String,
    guest_id: String,
    start_date: DateTime<Utc>,
    num_nights: u32,
    end_date: DateTime<Utc>,
    hotel_time_zone: String,
    num_guests: u32,
    status: String,
    has_breakfast: bool,
    is_paid: bool,
    cabin_price_text: String,
    extra_price_text: Option<String>,
    total_price_text: String,
    observations: Option<String>,
    pnr_code: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Record for Booking {
    type Row = BookingRow;

    const TABLE: &'static str = "booking";
    const SELECT: &'static str = "meta::id(id) AS record_id, \
        <string> cabin_price AS cabin_price_text, \
        (IF extra_price != NONE THEN <string> extra_price ELSE NONE END) AS extra_price_text, \
        <string> total_price AS total_price_text, *";
    const ASSIGN: &'static str = "cabin_id = $v.cabin_id, \
        guest_id = $v.guest_id, \
        start_date = <datetime> $v.start_date, \
        num_nights = $v.num_nights, \
        end_date = <datetime> $v.end_date, \
        hotel_time_zone = $v.hotel_time_zone, \
        num_guests = $v.num_guests, \
        status = $v.status, \
        has_breakfast = $v.has_breakfast, \
        is_paid = $v.is_paid, \
        cabin_price = <decimal> $v.cabin_price, \
        extra_price = (IF $v.extra_price != NONE THEN <decimal> $v.extra_price ELSE NONE END), \
        total_price = <decimal> $v.total_price, \
        observations = $v.observations, \
        pnr_code = $v.pnr_code, \
        created_at = <datetime> $v.created_at, \
        updated_at = <datetime> $v.updated_at";

    fn id(&self) -> Uuid {
        self.id
    }

    fn vars(&self) -> Value {
        let mut vars = Map::new();
        vars.insert("cabin_id".into(), json!(self.cabin_id.to_string()));
        vars.insert("guest_id".into(), json!(self.guest_id.to_string()));
        vars.insert("start_date".into(), json!(datetime_text(&self.start_date)));
        vars.insert("num_nights".into(), json!(self.num_nights));
        vars.insert("end_date".into(), json!(datetime_text(&self.end_date)));
        vars.insert("hotel_time_zone".into(), json!(self.hotel_time_zone));
        vars.insert("num_guests".into(), json!(self.num_guests));
        vars.insert("status".into(), json!(self.status.as_str()));
        vars.insert("has_breakfast".into(), json!(self.has_breakfast));
        vars.insert("is_paid".into(), json!(self.is_paid));
        vars.insert("cabin_price".into(), json!(self.cabin_price.to_string()));
        insert_opt(
            &mut vars,
            "extra_price",
            self.extra_price.map(|p| json!(p.to_string())),
        );
        vars.insert("total_price".into(), json!(self.total_price.to_string()));
        insert_opt(&mut vars, "observations", self.observations.as_ref().map(|o| json!(o)));
        vars.insert("pnr_code".into(), json!(self.pnr_code));
        vars.insert("created_at".into(), json!(datetime_text(&self.created_at)));
        vars.insert("updated_at".into(), json!(datetime_text(&self.updated_at)));
        Value::Object(vars)
    }

    fn from_row(row: BookingRow) -> Result<Self, DbError> {
        let id = &row.record_id;
        let status = row
            .status
            .parse::<BookingStatus>()
            .map_err(|e| DbError::corrupt("booking", id, e))?;
        let extra_price = row
            .extra_price_text
            .as_deref()
            .map(|raw| parse_decimal("booking", id, raw))
            .transpose()?;
        Ok(Booking {
            id: parse_uuid("booking", id, id)?,
            cabin_id: parse_uuid("booking", id, &row.cabin_id)?,
            guest_id: parse_uuid("booking", id, &row.guest_id)?,
            start_date: row.start_date,
            num_nights: row.num_nights,
            end_date: row.end_date,
            hotel_time_zone: row.hotel_time_zone,
            num_guests: row.num_guests,
            status,
            has_breakfast: row.has_breakfast,
            is_paid: row.is_paid,
            cabin_price: parse_decimal("booking", id, &row.cabin_price_text)?,
            extra_price,
            total_price: parse_decimal("booking", id, &row.total_price_text)?,
            observations: row.observations,
            pnr_code: row.pnr_code,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn field(name: &str) -> BungalowResult<&'static bungalow_core::query::FieldSpec> {
    booking::SCHEMA.require_field(name)
}

fn by_cabin(cabin_id: Uuid) -> Predicate {
    Predicate::eq_text(booking::cabin_field(), cabin_id)
}

/// SurrealDB implementation of the booking repository.
pub struct SurrealBookingRepository<C: Connection> {
    table: Table<C, Booking>,
}

impl<C: Connection> SurrealBookingRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self {
            table: Table::new(db),
        }
    }
}

impl<C: Connection> Collection for SurrealBookingRepository<C> {
    type Doc = Booking;

    fn schema(&self) -> &'static ResourceSchema {
        &booking::SCHEMA
    }

    async fn insert(&self, doc: &Booking) -> BungalowResult<Booking> {
        Ok(self.table.insert(doc).await?)
    }

    async fn replace(&self, doc: &Booking) -> BungalowResult<Booking> {
        Ok(self.table.replace(doc).await?)
    }

    async fn get(&self, id: Uuid) -> BungalowResult<Option<Booking>> {
        Ok(self.table.get(&id.to_string()).await?)
    }

    async fn find(
        &self,
        filter: &Predicate,
        sort: &[SortKey],
        pagination: Pagination,
    ) -> BungalowResult<Vec<Booking>> {
        Ok(self.table.find(filter, sort, pagination).await?)
    }

    async fn find_one(&self, filter: &Predicate) -> BungalowResult<Option<Booking>> {
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

impl<C: Connection> BookingRepository for SurrealBookingRepository<C> {
    async fn find_overlapping(
        &self,
        cabin_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        excluding: Option<Uuid>,
    ) -> BungalowResult<Vec<Booking>> {
        // Half-open intervals: touching check-out/check-in days do not clash.
        let filter = Predicate::And(vec![
            by_cabin(cabin_id),
            Predicate::Compare {
                field: field("startDate")?,
                op: CompareOp::Lt,
                value: FilterValue::DateTime(end),
            },
            Predicate::Compare {
                field: field("endDate")?,
                op: CompareOp::Gt,
                value: FilterValue::DateTime(start),
            },
        ]);
        let found = self
            .table
            .find_all(&filter, " ORDER BY start_date ASC")
            .await?;
        Ok(found
            .into_iter()
            .filter(|b| Some(b.id) != excluding)
            .collect())
    }

    async fn find_by_cabin(&self, cabin_id: Uuid) -> BungalowResult<Vec<Booking>> {
        Ok(self
            .table
            .find_all(&by_cabin(cabin_id), " ORDER BY start_date ASC")
            .await?)
    }

    async fn count_by_cabin(&self, cabin_id: Uuid) -> BungalowResult<u64> {
        Ok(self.table.count(&by_cabin(cabin_id)).await?)
    }

    async fn find_by_pnr(&self, pnr_code: &str) -> BungalowResult<Option<Booking>> {
        let filter = Predicate::eq_text(field("pnrCode")?, pnr_code);
        Ok(self.table.find_one(&filter).await?)
    }

    async fn find_created_between(
        &self,
        first: DateTime<Utc>,
        last: DateTime<Utc>,
    ) -> BungalowResult<Vec<Booking>> {
        let created = field("createdAt")?;
        let filter = Predicate::And(vec![
            Predicate::Compare {
                field: created,
                op: CompareOp::Gte,
                value: FilterValue::DateTime(first),
            },
            Predicate::Compare {
                field: created,
                op: CompareOp::Lte,
                value: FilterValue::DateTime(last),
            },
        ]);
        Ok(self
            .table
            .find_all(&filter, " ORDER BY created_at ASC")
            .await?)
    }

    async fn replace_all(&self, bookings: &[Booking]) -> BungalowResult<u64> {
        let rows: Vec<Value> = bookings
            .iter()
            .map(|b| {
                let mut vars = b.vars();
                if let Value::Object(map) = &mut vars {
                    map.insert("id".into(), json!(b.id.to_string()));
                }
                vars
            })
            .collect();

        self.table
            .db()
            .query(format!(
                "BEGIN TRANSACTION; \
                 DELETE booking; \
                 FOR $v IN $rows {{ \
                     CREATE type::record('booking', $v.id) SET {}; \
                 }}; \
                 COMMIT TRANSACTION;",
                Booking::ASSIGN
            ))
            .bind(("rows", Value::Array(rows)))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::from_write(Booking::TABLE, e))?;

        let loaded = bookings.len() as u64;
        info!(loaded, "bookings replaced");
        Ok(loaded)
    }
}
