//! Shared application state: one controller per resource over the
//! SurrealDB repositories.

use std::sync::Arc;

use bungalow_auth::AuthConfig;
use bungalow_core::BungalowResult;
use bungalow_core::controller::{NoRelations, ResourceController};
use bungalow_core::services::{
    BookingRelations, BookingService, CabinService, GuestService, SettingsService, UserService,
};
use bungalow_db::repository::{
    SurrealBookingRepository, SurrealCabinRepository, SurrealGuestRepository,
    SurrealSettingsRepository, SurrealUserRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::any::Any;

use crate::config::{Environment, ServerConfig};

type Cabins = SurrealCabinRepository<Any>;
type Guests = SurrealGuestRepository<Any>;
type Bookings = SurrealBookingRepository<Any>;
type SettingsRepo = SurrealSettingsRepository<Any>;
type Users = SurrealUserRepository<Any>;

pub type CabinController = ResourceController<CabinService<Cabins, Bookings>, NoRelations>;
pub type GuestController = ResourceController<GuestService<Guests>, NoRelations>;
pub type BookingController = ResourceController<
    BookingService<Bookings, Cabins, Guests, SettingsRepo>,
    BookingRelations<Cabins, Guests>,
>;
pub type SettingsController = ResourceController<SettingsService<SettingsRepo>, NoRelations>;
pub type UserController = ResourceController<UserService<Users>, NoRelations>;

pub struct AppState {
    pub db: Surreal<Any>,
    pub auth: AuthConfig,
    pub environment: Environment,
    pub cabins: CabinController,
    pub guests: GuestController,
    pub bookings: BookingController,
    pub settings: SettingsController,
    pub users: UserController,
}

impl AppState {
    /// Wire repositories, services and controllers onto one client.
    /// Fails only when the configured hotel time zone is unknown.
    pub fn new(db: Surreal<Any>, config: &ServerConfig) -> BungalowResult<Self> {
        let cabins = Arc::new(Cabins::new(db.clone()));
        let guests = Arc::new(Guests::new(db.clone()));
        let bookings = Arc::new(Bookings::new(db.clone()));
        let settings = Arc::new(SettingsRepo::new(db.clone()));
        let users = Arc::new(Users::new(db.clone()));

        let booking_service = BookingService::new(
            Arc::clone(&bookings),
            Arc::clone(&cabins),
            Arc::clone(&guests),
            Arc::clone(&settings),
            &config.hotel_time_zone,
        )?;
        let booking_relations = booking_service.relations();
        let cabin_service =
            CabinService::new(cabins, Arc::clone(&bookings), booking_service.locks());

        Ok(Self {
            cabins: ResourceController::new(Arc::new(cabin_service), NoRelations),
            guests: ResourceController::new(Arc::new(GuestService::new(guests)), NoRelations),
            bookings: ResourceController::new(Arc::new(booking_service), booking_relations),
            settings: ResourceController::new(Arc::new(SettingsService::new(settings)), NoRelations),
            users: ResourceController::new(Arc::new(UserService::new(users)), NoRelations),
            db,
            auth: config.auth.clone(),
            environment: config.environment,
        })
    }
}
