//! Integration tests for the repository implementations using in-memory
//! SurrealDB.

use bungalow_core::error::BungalowError;
use bungalow_core::models::booking::{self, Booking, BookingStatus};
use bungalow_core::models::cabin::{self, Cabin, CreateCabin};
use bungalow_core::models::guest::{CreateGuest, Guest};
use bungalow_core::models::settings::{CreateSettings, Settings};
use bungalow_core::models::user::{CreateUser, Role, User};
use bungalow_core::query::{CompareOp, FilterValue, Predicate, SortKey};
use bungalow_core::repository::{
    BookingRepository, CabinRepository, Collection, GuestRepository, Pagination,
    SettingsRepository, UserRepository,
};
use bungalow_db::repository::{
    SurrealBookingRepository, SurrealCabinRepository, SurrealGuestRepository,
    SurrealSettingsRepository, SurrealUserRepository,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

/// Helper: spin up in-memory DB and run migrations.
async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    bungalow_db::run_migrations(&db).await.unwrap();
    db
}

fn cabin(name: &str, price: i64, capacity: u32) -> Cabin {
    Cabin::new(
        CreateCabin {
            name: name.into(),
            max_capacity: capacity,
            regular_price: Decimal::new(price, 0),
            discount: Decimal::new(1050, 2),
            description: Some(format!("{name} by the lake")),
            images: vec![format!("{name}-1.jpg"), format!("{name}-2.jpg")],
            image: None,
        },
        Utc::now(),
    )
    .unwrap()
}

fn guest(email: &str) -> Guest {
    Guest::new(
        CreateGuest {
            full_name: "Ada Lovelace".into(),
            email: email.into(),
            national_id: "AB123".into(),
            nationality: "United Kingdom".into(),
            country_flag: None,
        },
        Utc::now(),
    )
    .unwrap()
}

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, d, 0, 0, 0).unwrap()
}

fn booking(cabin_id: Uuid, guest_id: Uuid, start: u32, nights: u32, pnr: &str) -> Booking {
    let now = Utc::now();
    Booking {
        id: Uuid::new_v4(),
        cabin_id,
        guest_id,
        start_date: day(start),
        num_nights: nights,
        end_date: day(start) + Duration::days(i64::from(nights)),
        hotel_time_zone: "Europe/Istanbul".into(),
        num_guests: 2,
        status: BookingStatus::Unconfirmed,
        has_breakfast: false,
        is_paid: false,
        cabin_price: Decimal::new(20000, 2),
        extra_price: None,
        total_price: Decimal::new(20000, 2),
        observations: None,
        pnr_code: pnr.into(),
        created_at: now,
        updated_at: now,
    }
}

// -----------------------------------------------------------------------
// Cabin tests
// -----------------------------------------------------------------------

#[tokio::test]
async fn insert_and_get_cabin_round_trips_decimals() {
    let db = setup().await;
    let repo = SurrealCabinRepository::new(db);

    let created = repo.insert(&cabin("Alpine", 250, 4)).await.unwrap();
    assert_eq!(created.regular_price, Decimal::new(250, 0));
    assert_eq!(created.discount, Decimal::new(1050, 2));
    assert_eq!(created.images.len(), 2);
    assert_eq!(created.image.as_deref(), Some("Alpine-1.jpg"));

    let fetched = repo.get(created.id).await.unwrap().unwrap();
    assert_eq!(fetched, created);
    assert!(repo.get(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn cabin_names_are_unique_case_insensitively() {
    let db = setup().await;
    let repo = SurrealCabinRepository::new(db);

    repo.insert(&cabin("Alpine", 250, 4)).await.unwrap();
    let err = repo.insert(&cabin("ALPINE", 300, 2)).await.unwrap_err();
    assert!(matches!(err, BungalowError::AlreadyExists { .. }), "{err:?}");
}

#[tokio::test]
async fn find_filters_sorts_and_paginates() {
    let db = setup().await;
    let repo = SurrealCabinRepository::new(db);

    for (name, price) in [("A", 100), ("B", 300), ("C", 200), ("D", 400)] {
        repo.insert(&cabin(name, price, 2)).await.unwrap();
    }

    let price = cabin::SCHEMA.field("regularPrice").unwrap();
    let filter = Predicate::Compare {
        field: price,
        op: CompareOp::Gte,
        value: FilterValue::Decimal(Decimal::new(200, 0)),
    };
    let sort = [SortKey {
        field: price,
        descending: true,
    }];

    let page = repo
        .find(&filter, &sort, Pagination { offset: 0, limit: 2 })
        .await
        .unwrap();
    let names: Vec<_> = page.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["D", "B"]);

    let rest = repo
        .find(&filter, &sort, Pagination { offset: 2, limit: 2 })
        .await
        .unwrap();
    assert_eq!(rest.len(), 1);
    assert_eq!(rest[0].name, "C");

    assert_eq!(repo.count(&filter).await.unwrap(), 3);
    assert_eq!(repo.count(&Predicate::all()).await.unwrap(), 4);
}

#[tokio::test]
async fn regex_and_list_membership_filters() {
    let db = setup().await;
    let repo = SurrealCabinRepository::new(db);
    repo.insert(&cabin("Lakeside", 100, 2)).await.unwrap();
    repo.insert(&cabin("Forest", 100, 2)).await.unwrap();

    let name = cabin::SCHEMA.field("name").unwrap();
    let found = repo
        .find(&Predicate::regex(name, "^lake").unwrap(), &[], Pagination::default())
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Lakeside");

    let images = cabin::SCHEMA.field("images").unwrap();
    let found = repo
        .find_one(&Predicate::eq_text(images, "Forest-2.jpg"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.name, "Forest");
}

#[tokio::test]
async fn replace_and_delete_cabin() {
    let db = setup().await;
    let repo = SurrealCabinRepository::new(db);
    let mut stored = repo.insert(&cabin("Alpine", 250, 4)).await.unwrap();

    stored.description = None;
    stored.max_capacity = 6;
    let replaced = repo.replace(&stored).await.unwrap();
    assert_eq!(replaced.max_capacity, 6);
    assert!(replaced.description.is_none());

    repo.delete(stored.id).await.unwrap();
    let err = repo.delete(stored.id).await.unwrap_err();
    assert!(matches!(err, BungalowError::NotFound { .. }));
}

#[tokio::test]
async fn get_many_and_delete_where() {
    let db = setup().await;
    let repo = SurrealCabinRepository::new(db);
    let a = repo.insert(&cabin("A", 100, 2)).await.unwrap();
    let b = repo.insert(&cabin("B", 100, 2)).await.unwrap();
    repo.insert(&cabin("C", 100, 2)).await.unwrap();

    let many = repo.get_many(&[a.id, b.id, Uuid::new_v4()]).await.unwrap();
    assert_eq!(many.len(), 2);

    assert_eq!(repo.delete_where(&Predicate::all()).await.unwrap(), 3);
    assert_eq!(repo.count(&Predicate::all()).await.unwrap(), 0);
}

// -----------------------------------------------------------------------
// Guest tests
// -----------------------------------------------------------------------

#[tokio::test]
async fn guest_email_lookup_and_uniqueness() {
    let db = setup().await;
    let repo = SurrealGuestRepository::new(db);

    let created = repo.insert(&guest("ada@example.com")).await.unwrap();
    let found = repo.find_by_email("ada@example.com").await.unwrap().unwrap();
    assert_eq!(found.id, created.id);
    assert!(repo.find_by_email("bob@example.com").await.unwrap().is_none());

    let err = repo.insert(&guest("ada@example.com")).await.unwrap_err();
    assert!(matches!(err, BungalowError::AlreadyExists { .. }));
}

// -----------------------------------------------------------------------
// Booking tests
// -----------------------------------------------------------------------

#[tokio::test]
async fn overlap_detection_uses_half_open_intervals() {
    let db = setup().await;
    let repo = SurrealBookingRepository::new(db);
    let cabin_id = Uuid::new_v4();
    let guest_id = Uuid::new_v4();

    // June 10 to June 13.
    let existing = repo
        .insert(&booking(cabin_id, guest_id, 10, 3, "AAAAAA"))
        .await
        .unwrap();

    // Checking in on the check-out day is fine.
    let touching = repo
        .find_overlapping(cabin_id, day(13), day(15), None)
        .await
        .unwrap();
    assert!(touching.is_empty());

    let clash = repo
        .find_overlapping(cabin_id, day(12), day(14), None)
        .await
        .unwrap();
    assert_eq!(clash.len(), 1);
    assert_eq!(clash[0].id, existing.id);

    // The booking being rescheduled does not clash with itself.
    let own = repo
        .find_overlapping(cabin_id, day(11), day(12), Some(existing.id))
        .await
        .unwrap();
    assert!(own.is_empty());

    // Other cabins are independent.
    let other = repo
        .find_overlapping(Uuid::new_v4(), day(10), day(13), None)
        .await
        .unwrap();
    assert!(other.is_empty());
}

#[tokio::test]
async fn booking_lookups_by_cabin_and_pnr() {
    let db = setup().await;
    let repo = SurrealBookingRepository::new(db);
    let cabin_id = Uuid::new_v4();
    let guest_id = Uuid::new_v4();

    let mut with_extras = booking(cabin_id, guest_id, 20, 2, "BBBBBB");
    with_extras.extra_price = Some(Decimal::new(3050, 2));
    with_extras.total_price = Decimal::new(23050, 2);
    with_extras.observations = Some("late arrival".into());
    repo.insert(&with_extras).await.unwrap();
    repo.insert(&booking(cabin_id, guest_id, 1, 2, "CCCCCC"))
        .await
        .unwrap();
    repo.insert(&booking(Uuid::new_v4(), guest_id, 1, 2, "DDDDDD"))
        .await
        .unwrap();

    let stays = repo.find_by_cabin(cabin_id).await.unwrap();
    let codes: Vec<_> = stays.iter().map(|b| b.pnr_code.as_str()).collect();
    assert_eq!(codes, ["CCCCCC", "BBBBBB"]);
    assert_eq!(repo.count_by_cabin(cabin_id).await.unwrap(), 2);

    let found = repo.find_by_pnr("BBBBBB").await.unwrap().unwrap();
    assert_eq!(found.extra_price, Some(Decimal::new(3050, 2)));
    assert_eq!(found.total_price, Decimal::new(23050, 2));
    assert_eq!(found.observations.as_deref(), Some("late arrival"));
    assert!(repo.find_by_pnr("ZZZZZZ").await.unwrap().is_none());

    let err = repo
        .insert(&booking(cabin_id, guest_id, 25, 1, "BBBBBB"))
        .await
        .unwrap_err();
    assert!(matches!(err, BungalowError::AlreadyExists { .. }));
}

#[tokio::test]
async fn status_filter_with_alternatives() {
    let db = setup().await;
    let repo = SurrealBookingRepository::new(db);
    let cabin_id = Uuid::new_v4();
    let guest_id = Uuid::new_v4();

    let mut checked_in = booking(cabin_id, guest_id, 1, 1, "EEEEEE");
    checked_in.status = BookingStatus::CheckedIn;
    checked_in.is_paid = true;
    repo.insert(&checked_in).await.unwrap();
    repo.insert(&booking(cabin_id, guest_id, 5, 1, "FFFFFF"))
        .await
        .unwrap();

    let status = booking::SCHEMA.field("status").unwrap();
    let filter = Predicate::OneOf {
        field: status,
        values: vec![
            FilterValue::Text("checked-in".into()),
            FilterValue::Text("checked-out".into()),
        ],
    };
    let found = repo
        .find(&filter, &[], Pagination::default())
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].status, BookingStatus::CheckedIn);
}

#[tokio::test]
async fn created_between_is_inclusive_and_ordered() {
    let db = setup().await;
    let repo = SurrealBookingRepository::new(db);
    let cabin_id = Uuid::new_v4();
    let guest_id = Uuid::new_v4();

    for (i, code) in ["GGGGGG", "HHHHHH", "IIIIII"].into_iter().enumerate() {
        let mut b = booking(cabin_id, guest_id, 1 + 3 * i as u32, 1, code);
        b.created_at = day(1 + i as u32);
        repo.insert(&b).await.unwrap();
    }

    let found = repo.find_created_between(day(2), day(3)).await.unwrap();
    let codes: Vec<_> = found.iter().map(|b| b.pnr_code.as_str()).collect();
    assert_eq!(codes, ["HHHHHH", "IIIIII"]);
}

#[tokio::test]
async fn replace_all_swaps_the_whole_table() {
    let db = setup().await;
    let repo = SurrealBookingRepository::new(db);
    let cabin_id = Uuid::new_v4();
    let guest_id = Uuid::new_v4();

    repo.insert(&booking(cabin_id, guest_id, 1, 1, "OLD001"))
        .await
        .unwrap();

    let fresh = vec![
        booking(cabin_id, guest_id, 3, 2, "NEW001"),
        booking(cabin_id, guest_id, 8, 1, "NEW002"),
    ];
    assert_eq!(repo.replace_all(&fresh).await.unwrap(), 2);

    assert!(repo.find_by_pnr("OLD001").await.unwrap().is_none());
    assert_eq!(repo.count(&Predicate::all()).await.unwrap(), 2);
    let loaded = repo.get(fresh[0].id).await.unwrap().unwrap();
    assert_eq!(loaded.start_date, day(3));
}

// -----------------------------------------------------------------------
// Settings tests
// -----------------------------------------------------------------------

fn settings(active: bool) -> Settings {
    Settings::new(
        CreateSettings {
            min_booking_length: 1,
            max_booking_length: 30,
            max_guests_per_booking: 6,
            breakfast_price: Decimal::new(1550, 2),
            is_active: active,
        },
        Utc::now(),
    )
    .unwrap()
}

#[tokio::test]
async fn saving_active_settings_deactivates_the_rest() {
    let db = setup().await;
    let repo = SurrealSettingsRepository::new(db);

    let first = repo.save_exclusive(&settings(true)).await.unwrap();
    assert_eq!(repo.active().await.unwrap().unwrap().id, first.id);

    let second = repo.save_exclusive(&settings(true)).await.unwrap();
    let active = repo.active().await.unwrap().unwrap();
    assert_eq!(active.id, second.id);
    assert_eq!(active.breakfast_price, Decimal::new(1550, 2));
    assert!(!repo.get(first.id).await.unwrap().unwrap().is_active);

    // An inactive save leaves the active record alone.
    repo.save_exclusive(&settings(false)).await.unwrap();
    assert_eq!(repo.active().await.unwrap().unwrap().id, second.id);

    assert_eq!(repo.delete_inactive().await.unwrap(), 2);
    assert_eq!(repo.count(&Predicate::all()).await.unwrap(), 1);
}

// -----------------------------------------------------------------------
// User tests
// -----------------------------------------------------------------------

#[tokio::test]
async fn users_round_trip_roles() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = User::new(
        CreateUser {
            email: "boss@example.com".into(),
            full_name: "The Boss".into(),
            role: Role::SuperAdmin,
            is_active: true,
            lang: "en".into(),
            dark_mode: false,
            avatar: None,
        },
        Utc::now(),
    )
    .unwrap();
    repo.insert(&user).await.unwrap();

    let found = repo.find_by_email("boss@example.com").await.unwrap().unwrap();
    assert_eq!(found.role, Role::SuperAdmin);
    assert!(found.is_active);

    let role = bungalow_core::models::user::role_field();
    let filter = Predicate::OneOf {
        field: role,
        values: vec![FilterValue::Text("receptionist".into())],
    };
    assert_eq!(repo.count(&filter).await.unwrap(), 0);
}
