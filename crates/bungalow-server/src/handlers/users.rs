//! `/users` handlers for staff accounts.
//!
//! Every read and write is narrowed to the roles the caller may see, and
//! a caller can never assign a role above their own visibility. Staff below
//! manager can only read their own record.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use bungalow_core::BungalowError;
use bungalow_core::access::{Principal, RestrictionContext};
use bungalow_core::controller::to_document;
use bungalow_core::models::user::{self, Role};
use bungalow_core::query::{ID_FIELD, Projection};
use bungalow_core::query::projection::project;
use serde_json::Value;
use tracing::info;

use super::{ApiResult, document, listing, no_content};
use crate::error::AppError;
use crate::extract::{ADMINS, MANAGERS, Params, Staff, parse_body, parse_id};
use crate::state::AppState;

pub async fn me(State(state): State<Arc<AppState>>, Staff(principal): Staff) -> ApiResult {
    let user = state.users.store().me(&principal).await?;
    let doc = project(to_document(&user)?, &Projection::Default, &user::SCHEMA);
    Ok(document(StatusCode::OK, doc))
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Staff(principal): Staff,
    Params(params): Params,
) -> ApiResult {
    principal.require_any(MANAGERS)?;
    let ctx = RestrictionContext::unrestricted().visible_to(&principal);
    Ok(listing(state.users.list(&params, &ctx).await?))
}

pub async fn get_one(
    State(state): State<Arc<AppState>>,
    Staff(principal): Staff,
    Path(id): Path<String>,
    Params(params): Params,
) -> ApiResult {
    let ctx = if MANAGERS.contains(&principal.role) {
        RestrictionContext::unrestricted().visible_to(&principal)
    } else {
        // Receptionists may only read their own account.
        RestrictionContext::unrestricted().owned_by(&ID_FIELD, principal.user_id)
    };
    let doc = state.users.get_one(parse_id(&id)?, &params, &ctx).await?;
    Ok(document(StatusCode::OK, doc))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Staff(principal): Staff,
    body: Bytes,
) -> ApiResult {
    principal.require_any(ADMINS)?;
    let body = parse_body(&body)?;
    match &body {
        Value::Array(items) => {
            for item in items {
                require_assignable(&principal, item, Some(Role::Receptionist))?;
            }
        }
        single => require_assignable(&principal, single, Some(Role::Receptionist))?,
    }
    let doc = state
        .users
        .create(body, &RestrictionContext::unrestricted().visible_to(&principal))
        .await?;
    Ok(document(StatusCode::CREATED, doc))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    Staff(principal): Staff,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult {
    principal.require_any(ADMINS)?;
    let body = parse_body(&body)?;
    require_assignable(&principal, &body, None)?;
    let ctx = RestrictionContext::unrestricted().visible_to(&principal);
    let doc = state.users.update(parse_id(&id)?, body, &ctx).await?;
    Ok(document(StatusCode::OK, doc))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Staff(principal): Staff,
    Path(id): Path<String>,
) -> ApiResult {
    principal.require_any(ADMINS)?;
    let id = parse_id(&id)?;
    if id == principal.user_id {
        return Err(AppError(BungalowError::denied(
            "you cannot delete your own account",
        )));
    }
    let ctx = RestrictionContext::unrestricted().visible_to(&principal);
    state.users.delete(id, &ctx).await?;
    info!(user_id = %id, by = %principal.email, "user deleted");
    Ok(no_content())
}

pub async fn delete_all(State(state): State<Arc<AppState>>, Staff(principal): Staff) -> ApiResult {
    principal.require_any(&[Role::SuperAdmin])?;
    let deleted = state.users.delete_all().await?;
    info!(deleted, by = %principal.email, "users wiped");
    Ok(no_content())
}

/// Reject a body assigning a role the caller may not manage. `default` is
/// the role a create falls back to when the body names none.
fn require_assignable(
    principal: &Principal,
    body: &Value,
    default: Option<Role>,
) -> Result<(), AppError> {
    let role = match body.get("role") {
        Some(Value::String(raw)) => Some(raw.parse::<Role>()?),
        // Non-string roles fail input deserialization later.
        Some(_) => None,
        None => default,
    };
    if let Some(role) = role {
        principal.require_visible(role)?;
    }
    Ok(())
}
