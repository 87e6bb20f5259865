//! `/guests` handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use bungalow_core::access::RestrictionContext;
use bungalow_core::controller::to_document;
use bungalow_core::models::guest::{self, CreateGuest};
use bungalow_core::query::Projection;
use bungalow_core::query::projection::project;
use bungalow_core::services::Registration;
use tracing::info;

use super::{ApiResult, document, listing, no_content};
use crate::extract::{ADMINS, Params, Staff, parse_body, parse_id};
use crate::state::AppState;

/// Public registration: 201 for a new guest, 200 when the same guest had
/// already registered with this email.
pub async fn register(State(state): State<Arc<AppState>>, body: Bytes) -> ApiResult {
    let input: CreateGuest = serde_json::from_value(parse_body(&body)?)?;
    let registration = state.guests.store().register(input).await?;
    let status = match registration {
        Registration::Created(_) => StatusCode::CREATED,
        Registration::Matched(_) => StatusCode::OK,
    };
    let doc = project(
        to_document(registration.guest())?,
        &Projection::Default,
        &guest::SCHEMA,
    );
    Ok(document(status, doc))
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Staff(_): Staff,
    Params(params): Params,
) -> ApiResult {
    let page = state
        .guests
        .list(&params, &RestrictionContext::unrestricted())
        .await?;
    Ok(listing(page))
}

pub async fn get_one(
    State(state): State<Arc<AppState>>,
    Staff(_): Staff,
    Path(id): Path<String>,
    Params(params): Params,
) -> ApiResult {
    let doc = state
        .guests
        .get_one(parse_id(&id)?, &params, &RestrictionContext::unrestricted())
        .await?;
    Ok(document(StatusCode::OK, doc))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    Staff(_): Staff,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult {
    let doc = state
        .guests
        .update(parse_id(&id)?, parse_body(&body)?, &RestrictionContext::unrestricted())
        .await?;
    Ok(document(StatusCode::OK, doc))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Staff(principal): Staff,
    Path(id): Path<String>,
) -> ApiResult {
    principal.require_any(ADMINS)?;
    state
        .guests
        .delete(parse_id(&id)?, &RestrictionContext::unrestricted())
        .await?;
    Ok(no_content())
}

pub async fn delete_all(State(state): State<Arc<AppState>>, Staff(principal): Staff) -> ApiResult {
    principal.require_any(ADMINS)?;
    let deleted = state.guests.delete_all().await?;
    info!(deleted, by = %principal.email, "guests wiped");
    Ok(no_content())
}
