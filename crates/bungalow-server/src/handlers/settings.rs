//! `/settings` handlers. Reads are public; writes need a manager or above.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use bungalow_core::access::RestrictionContext;
use tracing::info;

use super::{ApiResult, document, listing, no_content};
use crate::extract::{MANAGERS, Params, Staff, parse_body, parse_id};
use crate::state::AppState;

pub async fn list(State(state): State<Arc<AppState>>, Params(params): Params) -> ApiResult {
    let page = state
        .settings
        .list(&params, &RestrictionContext::unrestricted())
        .await?;
    Ok(listing(page))
}

pub async fn get_one(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Params(params): Params,
) -> ApiResult {
    let doc = state
        .settings
        .get_one(parse_id(&id)?, &params, &RestrictionContext::unrestricted())
        .await?;
    Ok(document(StatusCode::OK, doc))
}

/// Creating an active settings document deactivates the previous one.
pub async fn create(
    State(state): State<Arc<AppState>>,
    Staff(principal): Staff,
    body: Bytes,
) -> ApiResult {
    principal.require_any(MANAGERS)?;
    let doc = state
        .settings
        .create(parse_body(&body)?, &RestrictionContext::unrestricted())
        .await?;
    Ok(document(StatusCode::CREATED, doc))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    Staff(principal): Staff,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult {
    principal.require_any(MANAGERS)?;
    let doc = state
        .settings
        .update(parse_id(&id)?, parse_body(&body)?, &RestrictionContext::unrestricted())
        .await?;
    Ok(document(StatusCode::OK, doc))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Staff(principal): Staff,
    Path(id): Path<String>,
) -> ApiResult {
    principal.require_any(MANAGERS)?;
    state
        .settings
        .delete(parse_id(&id)?, &RestrictionContext::unrestricted())
        .await?;
    Ok(no_content())
}

/// `DELETE /settings` only clears inactive documents.
pub async fn delete_inactive(
    State(state): State<Arc<AppState>>,
    Staff(principal): Staff,
) -> ApiResult {
    principal.require_any(MANAGERS)?;
    let deleted = state.settings.store().delete_inactive().await?;
    info!(deleted, by = %principal.email, "inactive settings deleted");
    Ok(no_content())
}
