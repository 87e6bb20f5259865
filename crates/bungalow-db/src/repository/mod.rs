//! SurrealDB repository implementations.

mod booking;
mod cabin;
mod guest;
mod settings;
mod table;
mod user;

pub use booking::SurrealBookingRepository;
pub use cabin::SurrealCabinRepository;
pub use guest::SurrealGuestRepository;
pub use settings::SurrealSettingsRepository;
pub use user::SurrealUserRepository;
