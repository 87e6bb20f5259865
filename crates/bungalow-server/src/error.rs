//! HTTP rendering of domain errors.
//!
//! Handlers return [`AppError`], which renders the minimal body and
//! attaches an [`ErrorReport`] to the response. The [`report_errors`]
//! middleware logs every report with the request's method, path and client
//! address, and swaps in the verbose body when running in development.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use bungalow_core::BungalowError;
use serde_json::{Value, json};
use tracing::{error, warn};

use crate::state::AppState;

const GENERIC_MESSAGE: &str = "Something went wrong!";

/// Error type of every handler.
#[derive(Debug)]
pub struct AppError(pub BungalowError);

impl<E: Into<BungalowError>> From<E> for AppError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

/// What went wrong, carried on the response for the reporting middleware.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub operational: bool,
    detail: String,
}

impl ErrorReport {
    fn new(err: &BungalowError) -> Self {
        Self {
            status: StatusCode::from_u16(err.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            code: err.code(),
            message: err.to_string(),
            operational: err.is_operational(),
            detail: format!("{err:?}"),
        }
    }

    /// `fail` for client errors, `error` for server errors.
    fn outcome(&self) -> &'static str {
        if self.status.is_client_error() {
            "fail"
        } else {
            "error"
        }
    }

    /// Body safe for production: internal failures get a generic message.
    pub fn minimal_body(&self) -> Value {
        let message = if self.operational {
            self.message.as_str()
        } else {
            GENERIC_MESSAGE
        };
        json!({ "status": self.outcome(), "code": self.code, "message": message })
    }

    pub fn verbose_body(&self) -> Value {
        json!({
            "status": self.outcome(),
            "code": self.code,
            "message": self.message,
            "error": {
                "statusCode": self.status.as_u16(),
                "isOperational": self.operational,
                "detail": self.detail,
            },
        })
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let report = ErrorReport::new(&self.0);
        let mut response = (report.status, Json(report.minimal_body())).into_response();
        response.extensions_mut().insert(report);
        response
    }
}

/// Log failed requests and render development bodies.
pub async fn report_errors(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let ip = client_ip(&request);

    let mut response = next.run(request).await;
    let Some(report) = response.extensions_mut().remove::<ErrorReport>() else {
        return response;
    };

    if report.status.is_server_error() {
        error!(%method, %path, %ip, code = report.code, detail = %report.detail, "request failed");
    } else {
        warn!(%method, %path, %ip, code = report.code, message = %report.message, "request rejected");
    }

    if state.environment.is_development() {
        response = (report.status, Json(report.verbose_body())).into_response();
    }
    response
}

/// First `X-Forwarded-For` hop, else the peer address.
fn client_ip(request: &Request) -> String {
    let forwarded = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = forwarded {
        return ip.to_owned();
    }
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".into())
}

/// Fallback for paths no route matches.
pub async fn route_not_found(request: Request) -> AppError {
    AppError(BungalowError::NotFound {
        entity: "route".into(),
        id: request.uri().path().to_owned(),
    })
}
