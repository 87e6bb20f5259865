//! Router construction for the Bungalow REST API.

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::error::{report_errors, route_not_found};
use crate::handlers::{bookings, cabins, guests, health, settings, users};
use crate::state::AppState;

/// Build the full router: `/health` plus the resources under `/api/v1`.
pub fn build_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .nest("/cabins", cabin_routes())
        .nest("/guests", guest_routes())
        .nest("/bookings", booking_routes())
        .nest("/settings", settings_routes())
        .nest("/users", user_routes());

    Router::new()
        .route("/health", get(health::health))
        .nest("/api/v1", api)
        .fallback(route_not_found)
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            report_errors,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cabin_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/",
            get(cabins::list)
                .post(cabins::create)
                .delete(cabins::delete_all),
        )
        .route(
            "/:id",
            get(cabins::get_one)
                .patch(cabins::update)
                .delete(cabins::delete),
        )
        .route(
            "/:id/bookings",
            get(cabins::list_bookings).post(cabins::create_booking),
        )
}

fn guest_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/",
            get(guests::list)
                .post(guests::register)
                .delete(guests::delete_all),
        )
        .route(
            "/:id",
            get(guests::get_one)
                .patch(guests::update)
                .delete(guests::delete),
        )
}

fn booking_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/",
            get(bookings::list)
                .post(bookings::create)
                .delete(bookings::delete_all),
        )
        .route("/lookup", get(bookings::lookup))
        .route("/occupied-days/:id", get(bookings::occupied_days))
        .route("/daily-stats", get(bookings::daily_stats))
        .route("/reload", post(bookings::reload))
        .route(
            "/:id",
            get(bookings::get_one)
                .patch(bookings::update)
                .delete(bookings::delete),
        )
}

fn settings_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/",
            get(settings::list)
                .post(settings::create)
                .delete(settings::delete_inactive),
        )
        .route(
            "/:id",
            get(settings::get_one)
                .patch(settings::update)
                .delete(settings::delete),
        )
}

fn user_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/",
            get(users::list)
                .post(users::create)
                .delete(users::delete_all),
        )
        .route("/me", get(users::me))
        .route(
            "/:id",
            get(users::get_one)
                .patch(users::update)
                .delete(users::delete),
        )
}
