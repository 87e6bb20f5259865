//! `/cabins` handlers, including the nested `/cabins/:id/bookings`.
//!
//! Reads are public; writes need an admin.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use bungalow_core::access::RestrictionContext;
use bungalow_core::models::booking;
use tracing::info;

use super::{ApiResult, document, listing, no_content};
use crate::extract::{ADMINS, Params, Staff, parse_body, parse_id};
use crate::state::AppState;

pub async fn list(State(state): State<Arc<AppState>>, Params(params): Params) -> ApiResult {
    let page = state
        .cabins
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
        .cabins
        .get_one(parse_id(&id)?, &params, &RestrictionContext::unrestricted())
        .await?;
    Ok(document(StatusCode::OK, doc))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Staff(principal): Staff,
    body: Bytes,
) -> ApiResult {
    principal.require_any(ADMINS)?;
    let doc = state
        .cabins
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
    principal.require_any(ADMINS)?;
    let doc = state
        .cabins
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
        .cabins
        .delete(parse_id(&id)?, &RestrictionContext::unrestricted())
        .await?;
    Ok(no_content())
}

pub async fn delete_all(State(state): State<Arc<AppState>>, Staff(principal): Staff) -> ApiResult {
    principal.require_any(ADMINS)?;
    let deleted = state.cabins.delete_all().await?;
    info!(deleted, by = %principal.email, "cabins wiped");
    Ok(no_content())
}

/// Staff view of one cabin's bookings.
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Staff(_): Staff,
    Path(id): Path<String>,
    Params(params): Params,
) -> ApiResult {
    let ctx = RestrictionContext::unrestricted().nested(booking::cabin_field(), parse_id(&id)?);
    Ok(listing(state.bookings.list(&params, &ctx).await?))
}

/// Public booking of one cabin; the cabin comes from the path.
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult {
    let ctx = RestrictionContext::unrestricted().nested(booking::cabin_field(), parse_id(&id)?);
    let doc = state.bookings.create(parse_body(&body)?, &ctx).await?;
    Ok(document(StatusCode::CREATED, doc))
}
