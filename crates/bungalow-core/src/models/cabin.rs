//! Cabin (bookable unit) domain model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{BungalowError, BungalowResult};
use crate::query::{FieldKind, FieldSpec, ResourceSchema};

pub const MAX_NAME_LEN: usize = 20;
pub const MAX_IMAGES: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Cabin {
    pub id: Uuid,
    pub name: String,
    /// Lowercase comparison key; uniqueness of cabin names is enforced on
    /// this copy.
    pub name_lower_case: String,
    pub max_capacity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub regular_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount: Decimal,
    pub description: Option<String>,
    pub images: Vec<String>,
    /// Cover image; defaults to the first of `images`.
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateCabin {
    pub name: String,
    pub max_capacity: u32,
    pub regular_price: Decimal,
    #[serde(default)]
    pub discount: Decimal,
    pub description: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateCabin {
    pub name: Option<String>,
    pub max_capacity: Option<u32>,
    pub regular_price: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub description: Option<String>,
    pub images: Option<Vec<String>>,
    pub image: Option<String>,
}

impl Cabin {
    pub fn new(input: CreateCabin, now: DateTime<Utc>) -> BungalowResult<Self> {
        let name = input.name.trim().to_string();
        let image = input.image.or_else(|| input.images.first().cloned());
        let cabin = Self {
            id: Uuid::new_v4(),
            name_lower_case: name.to_lowercase(),
            name,
            max_capacity: input.max_capacity,
            regular_price: input.regular_price,
            discount: input.discount,
            description: input.description.map(|d| d.trim().to_string()),
            images: input.images,
            image,
            created_at: now,
            updated_at: now,
        };
        cabin.validate()?;
        Ok(cabin)
    }

    /// Shallow merge of the supplied fields, followed by validation.
    pub fn apply(&mut self, patch: UpdateCabin) -> BungalowResult<()> {
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
            self.name_lower_case = self.name.to_lowercase();
        }
        if let Some(v) = patch.max_capacity {
            self.max_capacity = v;
        }
        if let Some(v) = patch.regular_price {
            self.regular_price = v;
        }
        if let Some(v) = patch.discount {
            self.discount = v;
        }
        if let Some(v) = patch.description {
            self.description = Some(v.trim().to_string());
        }
        if let Some(images) = patch.images {
            if patch.image.is_none() {
                self.image = images.first().cloned();
            }
            self.images = images;
        }
        if let Some(v) = patch.image {
            self.image = Some(v);
        }
        self.validate()
    }

    pub fn validate(&self) -> BungalowResult<()> {
        if self.name.is_empty() {
            return Err(BungalowError::validation("A cabin must have a name."));
        }
        if self.name.chars().count() > MAX_NAME_LEN {
            return Err(BungalowError::validation(
                "A cabin name can not exceed 20 characters.",
            ));
        }
        if self.max_capacity == 0 {
            return Err(BungalowError::validation(
                "A cabin must host at least one guest.",
            ));
        }
        if self.regular_price.is_sign_negative() || self.discount.is_sign_negative() {
            return Err(BungalowError::validation("Prices can not be negative."));
        }
        if self.discount > self.regular_price {
            return Err(BungalowError::validation(
                "Discount should be less than regular price.",
            ));
        }
        if self.images.len() > MAX_IMAGES {
            return Err(BungalowError::validation("Only 5 images for each cabin."));
        }
        Ok(())
    }

    /// Price of one night after discount.
    pub fn nightly_rate(&self) -> Decimal {
        self.regular_price - self.discount
    }
}

static FIELDS: &[FieldSpec] = &[
    FieldSpec::new("id", "id", FieldKind::Id),
    FieldSpec::new("name", "name", FieldKind::Text),
    FieldSpec::new("nameLowerCase", "name_lower_case", FieldKind::Text),
    FieldSpec::new("maxCapacity", "max_capacity", FieldKind::Integer),
    FieldSpec::new("regularPrice", "regular_price", FieldKind::Decimal),
    FieldSpec::new("discount", "discount", FieldKind::Decimal),
    FieldSpec::new("description", "description", FieldKind::Text),
    FieldSpec::new("images", "images", FieldKind::TextList),
    FieldSpec::new("image", "image", FieldKind::Text),
    FieldSpec::new("createdAt", "created_at", FieldKind::DateTime),
    FieldSpec::new("updatedAt", "updated_at", FieldKind::DateTime),
];

pub static SCHEMA: ResourceSchema = ResourceSchema {
    entity: "cabin",
    table: "cabin",
    fields: FIELDS,
    default_sort: Some("name"),
    expansions: &[],
    internal_fields: &["nameLowerCase"],
};
