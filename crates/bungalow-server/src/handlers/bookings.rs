//! `/bookings` handlers.
//!
//! Guests may create a booking, look one up by PNR and see which days a
//! cabin is taken. Everything else is staff-only; wiping and reloading the
//! collection needs an admin.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use bungalow_core::BungalowError;
use bungalow_core::access::RestrictionContext;
use bungalow_core::controller::to_document;
use bungalow_core::models::booking::ReloadBooking;
use bungalow_core::query::QueryParams;
use bungalow_core::query::schema::parse_datetime;
use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::info;

use super::{ApiResult, document, listing, no_content, success};
use crate::error::AppError;
use crate::extract::{ADMINS, Params, Staff, parse_body, parse_id};
use crate::state::AppState;

pub async fn list(
    State(state): State<Arc<AppState>>,
    Staff(_): Staff,
    Params(params): Params,
) -> ApiResult {
    let page = state
        .bookings
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
        .bookings
        .get_one(parse_id(&id)?, &params, &RestrictionContext::unrestricted())
        .await?;
    Ok(document(StatusCode::OK, doc))
}

/// Public booking request; always starts unconfirmed.
pub async fn create(State(state): State<Arc<AppState>>, body: Bytes) -> ApiResult {
    let doc = state
        .bookings
        .create(parse_body(&body)?, &RestrictionContext::unrestricted())
        .await?;
    Ok(document(StatusCode::CREATED, doc))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    Staff(_): Staff,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult {
    let doc = state
        .bookings
        .update(parse_id(&id)?, parse_body(&body)?, &RestrictionContext::unrestricted())
        .await?;
    Ok(document(StatusCode::OK, doc))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Staff(_): Staff,
    Path(id): Path<String>,
) -> ApiResult {
    state
        .bookings
        .delete(parse_id(&id)?, &RestrictionContext::unrestricted())
        .await?;
    Ok(no_content())
}

pub async fn delete_all(State(state): State<Arc<AppState>>, Staff(principal): Staff) -> ApiResult {
    principal.require_any(ADMINS)?;
    let deleted = state.bookings.delete_all().await?;
    info!(deleted, by = %principal.email, "bookings wiped");
    Ok(no_content())
}

/// `GET /bookings/lookup?email=&pnrCode=&nationalId=`
pub async fn lookup(State(state): State<Arc<AppState>>, Params(params): Params) -> ApiResult {
    let (Some(email), Some(pnr_code), Some(national_id)) = (
        params.get_non_empty("email"),
        params.get_non_empty("pnrCode"),
        params.get_non_empty("nationalId"),
    ) else {
        return Err(AppError(BungalowError::validation(
            "Please provide email, pnrCode and nationalId.",
        )));
    };
    let booking = state
        .bookings
        .store()
        .lookup(email, pnr_code, national_id)
        .await?;
    Ok(success(StatusCode::OK, json!({ "booking": booking })))
}

/// `GET /bookings/occupied-days/:cabinId`
pub async fn occupied_days(
    State(state): State<Arc<AppState>>,
    Path(cabin_id): Path<String>,
) -> ApiResult {
    let stays = state
        .bookings
        .store()
        .occupied_days(parse_id(&cabin_id)?)
        .await?;
    Ok(success(StatusCode::OK, to_document(&stays)?))
}

/// `GET /bookings/daily-stats?firstDate=&lastDate=`
pub async fn daily_stats(
    State(state): State<Arc<AppState>>,
    Staff(_): Staff,
    Params(params): Params,
) -> ApiResult {
    let first = required_date(&params, "firstDate")?;
    let last = required_date(&params, "lastDate")?;
    let stats = state.bookings.store().daily_stats(first, last).await?;
    Ok(success(StatusCode::OK, json!({ "stats": to_document(&stats)? })))
}

/// `POST /bookings/reload`: replace every booking with the given batch.
pub async fn reload(
    State(state): State<Arc<AppState>>,
    Staff(principal): Staff,
    body: Bytes,
) -> ApiResult {
    principal.require_any(ADMINS)?;
    let records: Vec<ReloadBooking> = serde_json::from_value(parse_body(&body)?)?;
    let store = state.bookings.store();
    let loaded = store.reload(records, store.today()?).await?;
    info!(loaded, by = %principal.email, "booking reload requested");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "message": "Bookings restored.",
            "data": { "loaded": loaded },
        })),
    )
        .into_response())
}

fn required_date(params: &QueryParams, key: &str) -> Result<DateTime<Utc>, AppError> {
    let raw = params
        .get_non_empty(key)
        .ok_or_else(|| AppError(BungalowError::validation(format!("{key} is required."))))?;
    parse_datetime(raw)
        .ok_or_else(|| AppError(BungalowError::validation(format!("Invalid {key}: {raw}."))))
}
