//! Booking and cabin services over the SurrealDB repositories, focused on
//! what the per-cabin locks must guarantee.

use std::sync::Arc;

use bungalow_core::controller::ResourceStore;
use bungalow_core::models::booking::{Booking, BookingStatus, CreateBooking, UpdateBooking};
use bungalow_core::models::cabin::{Cabin, CreateCabin};
use bungalow_core::models::guest::{CreateGuest, Guest};
use bungalow_core::repository::{BookingRepository, Collection};
use bungalow_core::services::{BookingService, CabinService};
use bungalow_db::repository::{
    SurrealBookingRepository, SurrealCabinRepository, SurrealGuestRepository,
    SurrealSettingsRepository,
};
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

type Bookings = SurrealBookingRepository<Db>;
type Cabins = SurrealCabinRepository<Db>;
type Guests = SurrealGuestRepository<Db>;
type SettingsRepo = SurrealSettingsRepository<Db>;

struct Fixture {
    bookings: Arc<Bookings>,
    booking_service: BookingService<Bookings, Cabins, Guests, SettingsRepo>,
    cabin_service: CabinService<Cabins, Bookings>,
    cabin: Cabin,
    guest: Guest,
}

impl Fixture {
    async fn new() -> Self {
        let db = Surreal::new::<Mem>(()).await.unwrap();
        db.use_ns("test").use_db("test").await.unwrap();
        bungalow_db::run_migrations(&db).await.unwrap();

        let bookings = Arc::new(Bookings::new(db.clone()));
        let cabins = Arc::new(Cabins::new(db.clone()));
        let guests = Arc::new(Guests::new(db.clone()));
        let settings = Arc::new(SettingsRepo::new(db.clone()));

        let cabin = Cabin::new(
            CreateCabin {
                name: "Pine".into(),
                max_capacity: 4,
                regular_price: Decimal::new(100, 0),
                discount: Decimal::ZERO,
                description: None,
                images: vec![],
                image: None,
            },
            Utc::now(),
        )
        .unwrap();
        let cabin = cabins.insert(&cabin).await.unwrap();
        let guest = Guest::new(
            CreateGuest {
                full_name: "Ada Lovelace".into(),
                email: "ada@example.com".into(),
                national_id: "AB123".into(),
                nationality: "United Kingdom".into(),
                country_flag: None,
            },
            Utc::now(),
        )
        .unwrap();
        let guest = guests.insert(&guest).await.unwrap();

        let booking_service = BookingService::new(
            Arc::clone(&bookings),
            Arc::clone(&cabins),
            guests,
            settings,
            "Europe/Istanbul",
        )
        .unwrap();
        let cabin_service =
            CabinService::new(cabins, Arc::clone(&bookings), booking_service.locks());

        Self {
            bookings,
            booking_service,
            cabin_service,
            cabin,
            guest,
        }
    }

    fn request(&self, start: &str, nights: u32) -> CreateBooking {
        serde_json::from_value(json!({
            "cabinId": self.cabin.id,
            "guestId": self.guest.id,
            "startDate": start,
            "numNights": nights,
            "numGuests": 2,
        }))
        .unwrap()
    }

    async fn book(&self, start: &str, nights: u32) -> Booking {
        self.booking_service
            .create(self.request(start, nights))
            .await
            .unwrap()
    }

    /// A booking written straight to the repository, as a commit made
    /// under a lock the test already holds.
    fn direct_booking(&self) -> Booking {
        let now = Utc::now();
        Booking {
            id: Uuid::new_v4(),
            cabin_id: self.cabin.id,
            guest_id: self.guest.id,
            start_date: day(20),
            num_nights: 2,
            end_date: day(22),
            hotel_time_zone: "Europe/Istanbul".into(),
            num_guests: 2,
            status: BookingStatus::Unconfirmed,
            has_breakfast: false,
            is_paid: false,
            cabin_price: Decimal::new(200, 0),
            extra_price: None,
            total_price: Decimal::new(200, 0),
            observations: None,
            pnr_code: "ZX81AB".into(),
            created_at: now,
            updated_at: now,
        }
    }
}

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 6, d, 0, 0, 0).unwrap()
}

#[tokio::test]
async fn updates_merge_into_the_stored_booking() {
    let fx = Fixture::new().await;
    let first = fx.book("2030-06-01", 3).await;
    let stale = first.clone();

    let moved = fx
        .booking_service
        .update(
            first,
            UpdateBooking {
                start_date: Some(day(10)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.end_date, day(13));

    // The freed days are taken by someone else.
    let second = fx.book("2030-06-01", 3).await;

    // A write based on the copy read before the move keeps the move.
    let paid = fx
        .booking_service
        .update(
            stale,
            UpdateBooking {
                is_paid: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(paid.is_paid);
    assert_eq!(paid.start_date, day(10));
    assert_eq!(paid.end_date, day(13));

    let clashes = fx
        .bookings
        .find_overlapping(fx.cabin.id, second.start_date, second.end_date, Some(second.id))
        .await
        .unwrap();
    assert!(clashes.is_empty());
}

#[tokio::test]
async fn updates_are_checked_against_other_stays() {
    let fx = Fixture::new().await;
    fx.book("2030-06-01", 3).await;
    let later = fx.book("2030-06-10", 2).await;

    let err = fx
        .booking_service
        .update(
            later.clone(),
            UpdateBooking {
                start_date: Some(day(2)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 409);

    // Adjacent to the first stay is free.
    let moved = fx
        .booking_service
        .update(
            later,
            UpdateBooking {
                start_date: Some(day(4)),
                status: Some(BookingStatus::Unconfirmed),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.start_date, day(4));
    assert_eq!(moved.end_date, day(6));
}

#[tokio::test]
async fn concurrent_requests_for_the_same_days_admit_one() {
    let fx = Fixture::new().await;
    let (a, b) = tokio::join!(
        fx.booking_service.create(fx.request("2030-06-01", 3)),
        fx.booking_service.create(fx.request("2030-06-02", 3)),
    );
    let mut outcomes = [a.is_ok(), b.is_ok()];
    outcomes.sort();
    assert_eq!(outcomes, [false, true]);
    let err = a.err().or(b.err()).unwrap();
    assert_eq!(err.status_code(), 409);

    let stored = fx.bookings.find_by_cabin(fx.cabin.id).await.unwrap();
    assert_eq!(stored.len(), 1);
}

#[tokio::test]
async fn cabin_delete_waits_for_booking_writes() {
    let fx = Fixture::new().await;
    let locks = fx.booking_service.locks();
    let guards = locks.acquire(&[fx.cabin.id]).await;

    let delete = fx.cabin_service.delete(fx.cabin.clone());
    tokio::pin!(delete);
    tokio::select! {
        biased;
        _ = &mut delete => panic!("delete ran while a booking write held the cabin"),
        _ = std::future::ready(()) => {}
    }

    fx.bookings.insert(&fx.direct_booking()).await.unwrap();
    drop(guards);

    let err = delete.await.unwrap_err();
    assert_eq!(err.status_code(), 409);
    assert_eq!(err.code(), "in_use");
}
