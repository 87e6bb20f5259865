use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use bungalow_db::DbError;
use serde_json::json;

use super::{ApiResult, success};
use crate::state::AppState;

/// Liveness plus a round trip to the store.
pub async fn health(State(state): State<Arc<AppState>>) -> ApiResult {
    state
        .db
        .query("RETURN true")
        .await
        .and_then(|response| response.check())
        .map_err(DbError::from)?;
    Ok(success(
        StatusCode::OK,
        json!({ "service": "bungalow", "database": "ok" }),
    ))
}
