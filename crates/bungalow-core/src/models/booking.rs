//! Booking domain model.
//!
//! Dates are stored as UTC instants truncated to midnight; `end_date` is
//! always `start_date + num_nights` days and is never taken from input.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::{BungalowError, BungalowResult};
use crate::pricing;
use crate::query::schema::parse_datetime;
use crate::query::{ExpansionSpec, FieldKind, FieldSpec, ResourceSchema};

pub const MAX_OBSERVATIONS_LEN: usize = 250;
pub const PNR_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BookingStatus {
    Unconfirmed,
    CheckedIn,
    CheckedOut,
}

impl BookingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Unconfirmed => "unconfirmed",
            BookingStatus::CheckedIn => "checked-in",
            BookingStatus::CheckedOut => "checked-out",
        }
    }

    /// Statuses that can only be reached once the booking is paid.
    pub fn requires_payment(self) -> bool {
        matches!(self, BookingStatus::CheckedIn | BookingStatus::CheckedOut)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = BungalowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unconfirmed" => Ok(BookingStatus::Unconfirmed),
            "checked-in" => Ok(BookingStatus::CheckedIn),
            "checked-out" => Ok(BookingStatus::CheckedOut),
            other => Err(BungalowError::validation(format!(
                "Unknown booking status: {other}."
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub cabin_id: Uuid,
    pub guest_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub num_nights: u32,
    pub end_date: DateTime<Utc>,
    pub hotel_time_zone: String,
    pub num_guests: u32,
    pub status: BookingStatus,
    pub has_breakfast: bool,
    pub is_paid: bool,
    #[serde(with = "rust_decimal::serde::float")]
    pub cabin_price: Decimal,
    #[serde(with = "rust_decimal::serde::float_option", default)]
    pub extra_price: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
    pub observations: Option<String>,
    pub pnr_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client input for a new booking. Status, prices and the end date are
/// derived server-side; a supplied `endDate` or `status` is ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateBooking {
    pub cabin_id: Uuid,
    pub guest_id: Uuid,
    #[serde(deserialize_with = "flexible_datetime")]
    pub start_date: DateTime<Utc>,
    pub num_nights: u32,
    pub num_guests: u32,
    pub hotel_time_zone: Option<String>,
    #[serde(default)]
    pub has_breakfast: bool,
    #[serde(default)]
    pub is_paid: bool,
    pub observations: Option<String>,
    #[serde(default)]
    pub end_date: Option<IgnoredAny>,
    #[serde(default)]
    pub status: Option<IgnoredAny>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateBooking {
    pub cabin_id: Option<Uuid>,
    pub guest_id: Option<Uuid>,
    #[serde(default, deserialize_with = "flexible_datetime_opt")]
    pub start_date: Option<DateTime<Utc>>,
    pub num_nights: Option<u32>,
    pub num_guests: Option<u32>,
    pub hotel_time_zone: Option<String>,
    pub status: Option<BookingStatus>,
    pub has_breakfast: Option<bool>,
    pub is_paid: Option<bool>,
    pub cabin_price: Option<Decimal>,
    pub extra_price: Option<Decimal>,
    pub observations: Option<String>,
    /// Always recomputed from the parts.
    #[serde(default)]
    pub total_price: Option<IgnoredAny>,
    #[serde(default)]
    pub end_date: Option<IgnoredAny>,
}

/// One record of a bulk reload. Status and payment are derived from the
/// stay's position relative to today; occupants are capped at capacity.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReloadBooking {
    pub cabin_id: Uuid,
    pub guest_id: Uuid,
    #[serde(deserialize_with = "flexible_datetime")]
    pub start_date: DateTime<Utc>,
    pub num_nights: u32,
    pub num_guests: u32,
    pub hotel_time_zone: Option<String>,
    #[serde(default)]
    pub has_breakfast: bool,
    #[serde(default)]
    pub is_paid: bool,
    pub observations: Option<String>,
}

impl Booking {
    pub fn validate(&self) -> BungalowResult<()> {
        if self.num_nights == 0 {
            return Err(BungalowError::validation(
                "A booking must be at least one night.",
            ));
        }
        if self.num_guests == 0 {
            return Err(BungalowError::validation(
                "A booking must have at least one guest.",
            ));
        }
        if self.end_date <= self.start_date {
            return Err(BungalowError::validation(
                "End date must be after start date.",
            ));
        }
        if self.status.requires_payment() && !self.is_paid {
            return Err(BungalowError::validation(format!(
                "A booking can not be {} before it is paid.",
                self.status
            )));
        }
        if self
            .observations
            .as_ref()
            .is_some_and(|o| o.chars().count() > MAX_OBSERVATIONS_LEN)
        {
            return Err(BungalowError::validation(
                "Observations can not exceed 250 characters.",
            ));
        }
        if self.cabin_price.is_sign_negative()
            || self.extra_price.is_some_and(|p| p.is_sign_negative())
        {
            return Err(BungalowError::validation("Prices can not be negative."));
        }
        if pricing::total(self.cabin_price, self.extra_price)? != self.total_price {
            return Err(BungalowError::Internal(
                "total price does not add up".into(),
            ));
        }
        Ok(())
    }

    /// Interval this booking occupies, `[start, end)`.
    pub fn interval(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.start_date, self.end_date)
    }
}

fn flexible_datetime<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(d)?;
    parse_datetime(raw.trim())
        .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {raw}")))
}

fn flexible_datetime_opt<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    flexible_datetime(d).map(Some)
}

static FIELDS: &[FieldSpec] = &[
    FieldSpec::new("id", "id", FieldKind::Id),
    FieldSpec::new("cabinId", "cabin_id", FieldKind::Reference),
    FieldSpec::new("guestId", "guest_id", FieldKind::Reference),
    FieldSpec::new("startDate", "start_date", FieldKind::DateTime),
    FieldSpec::new("numNights", "num_nights", FieldKind::Integer),
    FieldSpec::new("endDate", "end_date", FieldKind::DateTime),
    FieldSpec::new("hotelTimeZone", "hotel_time_zone", FieldKind::Text),
    FieldSpec::new("numGuests", "num_guests", FieldKind::Integer),
    FieldSpec::new("status", "status", FieldKind::Text),
    FieldSpec::new("hasBreakfast", "has_breakfast", FieldKind::Boolean),
    FieldSpec::new("isPaid", "is_paid", FieldKind::Boolean),
    FieldSpec::new("cabinPrice", "cabin_price", FieldKind::Decimal),
    FieldSpec::new("extraPrice", "extra_price", FieldKind::Decimal),
    FieldSpec::new("totalPrice", "total_price", FieldKind::Decimal),
    FieldSpec::new("observations", "observations", FieldKind::Text),
    FieldSpec::new("pnrCode", "pnr_code", FieldKind::Text),
    FieldSpec::new("createdAt", "created_at", FieldKind::DateTime),
    FieldSpec::new("updatedAt", "updated_at", FieldKind::DateTime),
];

static EXPANSIONS: &[ExpansionSpec] = &[
    ExpansionSpec {
        path: "cabinId",
        fields: &["name"],
    },
    ExpansionSpec {
        path: "guestId",
        fields: &["fullName", "email", "nationalId"],
    },
];

pub static SCHEMA: ResourceSchema = ResourceSchema {
    entity: "booking",
    table: "booking",
    fields: FIELDS,
    default_sort: None,
    expansions: EXPANSIONS,
    internal_fields: &[],
};

/// The `cabinId` field, used for route nesting under a cabin.
pub fn cabin_field() -> &'static FieldSpec {
    &FIELDS[1]
}
