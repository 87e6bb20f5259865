use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{BungalowError, BungalowResult};
use crate::models::guest::{is_valid_email, normalize_email};
use crate::query::{FieldKind, FieldSpec, ResourceSchema};

pub const MAX_FULL_NAME_LEN: usize = 70;

/// Staff role, ordered from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    Receptionist,
    Manager,
    Admin,
    SuperAdmin,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::Receptionist,
        Role::Manager,
        Role::Admin,
        Role::SuperAdmin,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Receptionist => "receptionist",
            Role::Manager => "manager",
            Role::Admin => "admin",
            Role::SuperAdmin => "superAdmin",
        }
    }

    /// Roles whose user records this role may see and manage.
    /// A super admin sees everyone; every other role sees its own level
    /// and the levels below it.
    pub fn visible_roles(self) -> &'static [Role] {
        match self {
            Role::SuperAdmin => &Role::ALL,
            Role::Admin => &[Role::Receptionist, Role::Manager, Role::Admin],
            Role::Manager => &[Role::Receptionist, Role::Manager],
            Role::Receptionist => &[Role::Receptionist],
        }
    }

    pub fn can_see(self, other: Role) -> bool {
        self.visible_roles().contains(&other)
    }

    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = BungalowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| BungalowError::validation(format!("Unknown role: {s}.")))
    }
}

/// A staff account. Credentials live with the token issuer, not here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub full_name_lower_case: String,
    pub role: Role,
    pub is_active: bool,
    pub lang: String,
    pub dark_mode: bool,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateUser {
    pub email: String,
    pub full_name: String,
    #[serde(default = "default_role")]
    pub role: Role,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default = "default_lang")]
    pub lang: String,
    #[serde(default)]
    pub dark_mode: bool,
    pub avatar: Option<String>,
}

fn default_role() -> Role {
    Role::Receptionist
}

fn default_lang() -> String {
    "en".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub lang: Option<String>,
    pub dark_mode: Option<bool>,
    pub avatar: Option<String>,
}

impl User {
    pub fn new(input: CreateUser, now: DateTime<Utc>) -> BungalowResult<Self> {
        let full_name = input.full_name.trim().to_string();
        let user = Self {
            id: Uuid::new_v4(),
            email: normalize_email(&input.email),
            full_name_lower_case: full_name.to_lowercase(),
            full_name,
            role: input.role,
            is_active: input.is_active,
            lang: input.lang.trim().to_lowercase(),
            dark_mode: input.dark_mode,
            avatar: input.avatar,
            created_at: now,
            updated_at: now,
        };
        user.validate()?;
        Ok(user)
    }

    pub fn apply(&mut self, patch: UpdateUser) -> BungalowResult<()> {
        if let Some(email) = patch.email {
            self.email = normalize_email(&email);
        }
        if let Some(name) = patch.full_name {
            self.full_name = name.trim().to_string();
            self.full_name_lower_case = self.full_name.to_lowercase();
        }
        if let Some(v) = patch.role {
            self.role = v;
        }
        if let Some(v) = patch.is_active {
            self.is_active = v;
        }
        if let Some(v) = patch.lang {
            self.lang = v.trim().to_lowercase();
        }
        if let Some(v) = patch.dark_mode {
            self.dark_mode = v;
        }
        if let Some(v) = patch.avatar {
            self.avatar = Some(v);
        }
        self.validate()
    }

    pub fn validate(&self) -> BungalowResult<()> {
        if !is_valid_email(&self.email) {
            return Err(BungalowError::validation("Please provide a valid email."));
        }
        if self.full_name.is_empty() || self.full_name.chars().count() > MAX_FULL_NAME_LEN {
            return Err(BungalowError::validation(
                "Full name must be between 1 and 70 characters.",
            ));
        }
        if self.lang.len() != 2 || !self.lang.chars().all(|c| c.is_ascii_lowercase()) {
            return Err(BungalowError::validation(
                "Language must be a two letter code.",
            ));
        }
        Ok(())
    }
}

static FIELDS: &[FieldSpec] = &[
    FieldSpec::new("id", "id", FieldKind::Id),
    FieldSpec::new("email", "email", FieldKind::Text),
    FieldSpec::new("fullName", "full_name", FieldKind::Text),
    FieldSpec::new("fullNameLowerCase", "full_name_lower_case", FieldKind::Text),
    FieldSpec::new("role", "role", FieldKind::Text),
    FieldSpec::new("isActive", "is_active", FieldKind::Boolean),
    FieldSpec::new("lang", "lang", FieldKind::Text),
    FieldSpec::new("darkMode", "dark_mode", FieldKind::Boolean),
    FieldSpec::new("avatar", "avatar", FieldKind::Text),
    FieldSpec::new("createdAt", "created_at", FieldKind::DateTime),
    FieldSpec::new("updatedAt", "updated_at", FieldKind::DateTime),
];

pub static SCHEMA: ResourceSchema = ResourceSchema {
    entity: "user",
    table: "user",
    fields: FIELDS,
    default_sort: None,
    expansions: &[],
    internal_fields: &["fullNameLowerCase"],
};

/// The `role` field, for role-visibility restrictions.
pub fn role_field() -> &'static FieldSpec {
    &FIELDS[4]
}
