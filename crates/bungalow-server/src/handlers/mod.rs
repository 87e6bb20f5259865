//! Request handlers, one module per resource.
//!
//! Successful responses use the `{ "status": "success", "data": ... }`
//! envelope; listings add `allDocsNumber` and `results`.

pub mod bookings;
pub mod cabins;
pub mod guests;
pub mod health;
pub mod settings;
pub mod users;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bungalow_core::controller::Listing;
use serde_json::{Value, json};

use crate::error::AppError;

pub type ApiResult = Result<Response, AppError>;

pub(crate) fn success(status: StatusCode, data: Value) -> Response {
    (status, Json(json!({ "status": "success", "data": data }))).into_response()
}

pub(crate) fn document(status: StatusCode, doc: Value) -> Response {
    success(status, json!({ "doc": doc }))
}

pub(crate) fn listing(listing: Listing) -> Response {
    Json(json!({
        "status": "success",
        "allDocsNumber": listing.all_docs_number,
        "results": listing.results,
        "data": { "docs": listing.docs },
    }))
    .into_response()
}

pub(crate) fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}
