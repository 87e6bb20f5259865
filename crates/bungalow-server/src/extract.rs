//! Request extractors and input parsing helpers.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use bungalow_auth::{bearer_token, verify_bearer};
use bungalow_core::BungalowError;
use bungalow_core::access::Principal;
use bungalow_core::models::user::Role;
use bungalow_core::query::QueryParams;
use serde_json::Value;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

pub const ADMINS: &[Role] = &[Role::Admin, Role::SuperAdmin];
pub const MANAGERS: &[Role] = &[Role::Manager, Role::Admin, Role::SuperAdmin];

/// An authenticated, active staff member.
///
/// Rejects with 401 without a valid bearer token, 498 when it has expired,
/// 403 when its user no longer exists and 423 when that user is inactive.
#[derive(Debug, Clone)]
pub struct Staff(pub Principal);

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for Staff {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        let token = bearer_token(header)?;
        let user_id = verify_bearer(token, &state.auth)?;
        let principal = state.users.store().principal(user_id).await?;
        Ok(Staff(principal))
    }
}

/// The raw query string, kept in order with repeated keys and bracketed
/// operators intact.
#[derive(Debug, Clone, Default)]
pub struct Params(pub QueryParams);

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Params {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Params(QueryParams::parse(parts.uri.query().unwrap_or_default())))
    }
}

pub fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError(BungalowError::validation(format!("Invalid id: {raw}."))))
}

/// Parse a JSON request body. Content type is not enforced.
pub fn parse_body(bytes: &[u8]) -> Result<Value, AppError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(AppError(BungalowError::validation(
            "Request body is required.",
        )));
    }
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_must_be_uuids() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string()).unwrap(), id);
        assert_eq!(parse_id("42").unwrap_err().0.status_code(), 400);
    }

    #[test]
    fn bodies_must_be_json() {
        assert_eq!(parse_body(br#"{"a":1}"#).unwrap()["a"], 1);
        assert_eq!(parse_body(b"  ").unwrap_err().0.status_code(), 400);
        assert_eq!(parse_body(b"{oops").unwrap_err().0.status_code(), 400);
    }
}
