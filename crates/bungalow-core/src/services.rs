//! Domain services. Each wraps the raw repositories of one resource and
//! implements [`ResourceStore`](crate::controller::ResourceStore) with that
//! resource's write rules, so the generic controller can serve it.

pub mod booking;
pub mod cabin;
pub mod guest;
pub mod settings;
pub mod user;

pub use booking::{BookingRelations, BookingService, CabinLocks, DailyStat, OccupiedStay};
pub use cabin::CabinService;
pub use guest::{GuestService, Registration};
pub use settings::SettingsService;
pub use user::UserService;
