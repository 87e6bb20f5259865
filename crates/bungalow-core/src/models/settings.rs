//! Booking policy settings. At most one record is active at a time.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{BungalowError, BungalowResult};
use crate::query::{FieldKind, FieldSpec, ResourceSchema};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub id: Uuid,
    pub min_booking_length: u32,
    pub max_booking_length: u32,
    pub max_guests_per_booking: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub breakfast_price: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateSettings {
    pub min_booking_length: u32,
    pub max_booking_length: u32,
    pub max_guests_per_booking: u32,
    #[serde(default)]
    pub breakfast_price: Decimal,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateSettings {
    pub min_booking_length: Option<u32>,
    pub max_booking_length: Option<u32>,
    pub max_guests_per_booking: Option<u32>,
    pub breakfast_price: Option<Decimal>,
    pub is_active: Option<bool>,
}

impl Settings {
    pub fn new(input: CreateSettings, now: DateTime<Utc>) -> BungalowResult<Self> {
        let settings = Self {
            id: Uuid::new_v4(),
            min_booking_length: input.min_booking_length,
            max_booking_length: input.max_booking_length,
            max_guests_per_booking: input.max_guests_per_booking,
            breakfast_price: input.breakfast_price,
            is_active: input.is_active,
            created_at: now,
            updated_at: now,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn apply(&mut self, patch: UpdateSettings) -> BungalowResult<()> {
        if let Some(v) = patch.min_booking_length {
            self.min_booking_length = v;
        }
        if let Some(v) = patch.max_booking_length {
            self.max_booking_length = v;
        }
        if let Some(v) = patch.max_guests_per_booking {
            self.max_guests_per_booking = v;
        }
        if let Some(v) = patch.breakfast_price {
            self.breakfast_price = v;
        }
        if let Some(v) = patch.is_active {
            self.is_active = v;
        }
        self.validate()
    }

    pub fn validate(&self) -> BungalowResult<()> {
        if self.min_booking_length == 0 {
            return Err(BungalowError::validation(
                "Minimum booking length must be at least one night.",
            ));
        }
        if self.max_booking_length < self.min_booking_length {
            return Err(BungalowError::validation(
                "Maximum booking length can not be less than the minimum.",
            ));
        }
        if self.max_guests_per_booking == 0 {
            return Err(BungalowError::validation(
                "At least one guest per booking must be allowed.",
            ));
        }
        if self.breakfast_price.is_sign_negative() {
            return Err(BungalowError::validation("Breakfast price can not be negative."));
        }
        Ok(())
    }
}

static FIELDS: &[FieldSpec] = &[
    FieldSpec::new("id", "id", FieldKind::Id),
    FieldSpec::new("minBookingLength", "min_booking_length", FieldKind::Integer),
    FieldSpec::new("maxBookingLength", "max_booking_length", FieldKind::Integer),
    FieldSpec::new("maxGuestsPerBooking", "max_guests_per_booking", FieldKind::Integer),
    FieldSpec::new("breakfastPrice", "breakfast_price", FieldKind::Decimal),
    FieldSpec::new("isActive", "is_active", FieldKind::Boolean),
    FieldSpec::new("createdAt", "created_at", FieldKind::DateTime),
    FieldSpec::new("updatedAt", "updated_at", FieldKind::DateTime),
];

pub static SCHEMA: ResourceSchema = ResourceSchema {
    entity: "settings",
    table: "settings",
    fields: FIELDS,
    default_sort: None,
    expansions: &[],
    internal_fields: &[],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_by_default() {
        let input: CreateSettings = serde_json::from_value(serde_json::json!({
            "minBookingLength": 2,
            "maxBookingLength": 10,
            "maxGuestsPerBooking": 6,
            "breakfastPrice": 15.5
        }))
        .unwrap();
        let settings = Settings::new(input, Utc::now()).unwrap();
        assert!(settings.is_active);
        assert_eq!(settings.breakfast_price, Decimal::new(155, 1));
    }

    #[test]
    fn max_length_not_below_min() {
        let input = CreateSettings {
            min_booking_length: 5,
            max_booking_length: 3,
            max_guests_per_booking: 2,
            breakfast_price: Decimal::ZERO,
            is_active: true,
        };
        assert!(Settings::new(input, Utc::now()).is_err());
    }
}
