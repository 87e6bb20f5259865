//! Per-request access context.
//!
//! A [`RestrictionContext`] is built from the authenticated principal and
//! the route, handed explicitly to every controller call, and folded into
//! the client's filter before any data access. It is never stored.

use uuid::Uuid;

use crate::error::{BungalowError, BungalowResult};
use crate::models::user::{Role, User, role_field};
use crate::query::{FieldSpec, FilterValue, Predicate};

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

impl Principal {
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            role: user.role,
        }
    }

    /// Fails with 403 unless the caller holds one of `roles`.
    pub fn require_any(&self, roles: &[Role]) -> BungalowResult<()> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(BungalowError::denied(format!(
                "role {} may not perform this action",
                self.role
            )))
        }
    }

    /// Fails with 403 when `role` is outside what the caller may manage.
    pub fn require_visible(&self, role: Role) -> BungalowResult<()> {
        if self.role.can_see(role) {
            Ok(())
        } else {
            Err(BungalowError::denied(format!(
                "role {} may not manage {role} accounts",
                self.role
            )))
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RestrictionContext {
    ownership: Option<Predicate>,
    visibility: Option<Predicate>,
    nesting: Option<(&'static FieldSpec, Uuid)>,
}

impl RestrictionContext {
    pub fn unrestricted() -> Self {
        Self::default()
    }

    /// Only documents whose `field` equals `owner`.
    pub fn owned_by(mut self, field: &'static FieldSpec, owner: Uuid) -> Self {
        self.ownership = Some(Predicate::eq_text(field, owner));
        self
    }

    /// Only staff records whose role the principal may see. A super admin
    /// sees every role, so no restriction is added.
    pub fn visible_to(mut self, principal: &Principal) -> Self {
        self.visibility = match principal.role {
            Role::SuperAdmin => None,
            role => Some(Predicate::OneOf {
                field: role_field(),
                values: role
                    .visible_roles()
                    .iter()
                    .map(|r| FilterValue::Text(r.as_str().to_string()))
                    .collect(),
            }),
        };
        self
    }

    /// Scope to a parent resource taken from the route, e.g. the cabin in
    /// `/cabins/:cabinId/bookings`.
    pub fn nested(mut self, field: &'static FieldSpec, parent: Uuid) -> Self {
        self.nesting = Some((field, parent));
        self
    }

    /// Field name and value merged into created documents.
    pub fn nesting(&self) -> Option<(&'static str, Uuid)> {
        self.nesting.map(|(field, parent)| (field.name, parent))
    }

    /// Combine the restrictions with a client or id filter.
    pub fn restrict(&self, filter: Predicate) -> Predicate {
        let mut combined = Predicate::all();
        if let Some((field, parent)) = self.nesting {
            combined = combined.and(Predicate::eq_text(field, parent));
        }
        for part in [&self.ownership, &self.visibility].into_iter().flatten() {
            combined = combined.and(part.clone());
        }
        combined.and(filter)
    }
}
