use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{BungalowError, BungalowResult};
use crate::query::{FieldKind, FieldSpec, ResourceSchema};

pub const MAX_FULL_NAME_LEN: usize = 50;
pub const MAX_NATIONAL_ID_LEN: usize = 30;
pub const MAX_NATIONALITY_LEN: usize = 50;

/// A guest, identified by email.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Guest {
    pub id: Uuid,
    pub full_name: String,
    pub full_name_lower_case: String,
    pub email: String,
    pub national_id: String,
    pub nationality: String,
    pub country_flag: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateGuest {
    pub full_name: String,
    pub email: String,
    pub national_id: String,
    pub nationality: String,
    pub country_flag: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateGuest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub national_id: Option<String>,
    pub nationality: Option<String>,
    pub country_flag: Option<String>,
}

impl Guest {
    pub fn new(input: CreateGuest, now: DateTime<Utc>) -> BungalowResult<Self> {
        let full_name = input.full_name.trim().to_string();
        let guest = Self {
            id: Uuid::new_v4(),
            full_name_lower_case: full_name.to_lowercase(),
            full_name,
            email: normalize_email(&input.email),
            national_id: input.national_id.trim().to_string(),
            nationality: input.nationality.trim().to_lowercase(),
            country_flag: input.country_flag,
            created_at: now,
            updated_at: now,
        };
        guest.validate()?;
        Ok(guest)
    }

    pub fn apply(&mut self, patch: UpdateGuest) -> BungalowResult<()> {
        if let Some(name) = patch.full_name {
            self.full_name = name.trim().to_string();
            self.full_name_lower_case = self.full_name.to_lowercase();
        }
        if let Some(email) = patch.email {
            self.email = normalize_email(&email);
        }
        if let Some(v) = patch.national_id {
            self.national_id = v.trim().to_string();
        }
        if let Some(v) = patch.nationality {
            self.nationality = v.trim().to_lowercase();
        }
        if let Some(v) = patch.country_flag {
            self.country_flag = Some(v);
        }
        self.validate()
    }

    pub fn validate(&self) -> BungalowResult<()> {
        if self.full_name.is_empty() || self.full_name.chars().count() > MAX_FULL_NAME_LEN {
            return Err(BungalowError::validation(
                "Full name must be between 1 and 50 characters.",
            ));
        }
        if !is_valid_email(&self.email) {
            return Err(BungalowError::validation("Please provide a valid email."));
        }
        if self.national_id.is_empty() || self.national_id.chars().count() > MAX_NATIONAL_ID_LEN
        {
            return Err(BungalowError::validation(
                "National id must be between 1 and 30 characters.",
            ));
        }
        if self.nationality.is_empty() || self.nationality.chars().count() > MAX_NATIONALITY_LEN
        {
            return Err(BungalowError::validation(
                "Nationality must be between 1 and 50 characters.",
            ));
        }
        Ok(())
    }

    /// Whether a repeated registration describes this same guest.
    pub fn matches(&self, input: &CreateGuest) -> bool {
        self.full_name == input.full_name.trim()
            && self.national_id == input.national_id.trim()
            && self.nationality == input.nationality.trim().to_lowercase()
    }
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// `local@domain.tld` with no whitespace and a dotted domain.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(head, tail)| !head.is_empty() && !tail.is_empty() && !tail.ends_with('.'))
}

static FIELDS: &[FieldSpec] = &[
    FieldSpec::new("id", "id", FieldKind::Id),
    FieldSpec::new("fullName", "full_name", FieldKind::Text),
    FieldSpec::new("fullNameLowerCase", "full_name_lower_case", FieldKind::Text),
    FieldSpec::new("email", "email", FieldKind::Text),
    FieldSpec::new("nationalId", "national_id", FieldKind::Text),
    FieldSpec::new("nationality", "nationality", FieldKind::Text),
    FieldSpec::new("countryFlag", "country_flag", FieldKind::Text),
    FieldSpec::new("createdAt", "created_at", FieldKind::DateTime),
    FieldSpec::new("updatedAt", "updated_at", FieldKind::DateTime),
];

pub static SCHEMA: ResourceSchema = ResourceSchema {
    entity: "guest",
    table: "guest",
    fields: FIELDS,
    default_sort: None,
    expansions: &[],
    internal_fields: &["fullNameLowerCase"],
};
