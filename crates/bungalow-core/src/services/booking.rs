//! Booking service: scheduling and pricing around the booking store.
//!
//! Every booking write runs its overlap check and its commit while holding
//! the locks of the cabins it touches from [`CabinLocks`], so two concurrent
//! requests can never both pass the check for the same days. Updates re-read
//! the booking under those locks and merge the patch into the fresh copy.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, NaiveDate, Utc};
use jiff::tz::TimeZone;
use rand::Rng;
use rand::distr::Alphanumeric;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::controller::{RelationResolver, ResourceStore, index_related, to_document};
use crate::error::{BungalowError, BungalowResult};
use crate::models::booking::{
    self, Booking, BookingStatus, CreateBooking, PNR_LEN, ReloadBooking, UpdateBooking,
};
use crate::models::cabin::Cabin;
use crate::models::guest::{Guest, normalize_email};
use crate::pricing;
use crate::query::projection::select_fields;
use crate::query::{Expansion, Predicate, ResourceSchema, SortKey};
use crate::repository::{
    BookingRepository, CabinRepository, GuestRepository, Pagination, SettingsRepository,
};
use crate::scheduling;

/// Attempts at drawing a PNR code that is not already taken.
const PNR_ATTEMPTS: usize = 5;

/// Attempts at locking a booking's cabin while another writer moves it.
const LOCK_ATTEMPTS: usize = 3;

/// Registry of per-cabin async locks, shared by every service that writes
/// bookings or removes cabins.
#[derive(Debug, Default)]
pub struct CabinLocks {
    locks: Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
}

impl CabinLocks {
    pub fn lock_for(&self, cabin_id: Uuid) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(cabin_id).or_default())
    }

    /// Lock every cabin in `cabin_ids`. Locks are taken in ascending id
    /// order so writers spanning several cabins cannot deadlock.
    pub async fn acquire(&self, cabin_ids: &[Uuid]) -> Vec<OwnedMutexGuard<()>> {
        let mut ids = cabin_ids.to_vec();
        ids.sort();
        ids.dedup();
        let mut guards = Vec::with_capacity(ids.len());
        for id in ids {
            guards.push(self.lock_for(id).lock_owned().await);
        }
        guards
    }
}

/// A stay as exposed by the occupied-days endpoint.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OccupiedStay {
    pub id: Uuid,
    pub start_date: DateTime<Utc>,
    pub num_nights: u32,
    pub end_date: DateTime<Utc>,
}

/// Sales of one local day in the hotel time zone.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyStat {
    pub day: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_sales: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub extras_sales: Decimal,
}

pub struct BookingService<B, C, G, S> {
    bookings: Arc<B>,
    cabins: Arc<C>,
    guests: Arc<G>,
    settings: Arc<S>,
    locks: Arc<CabinLocks>,
    hotel_zone_name: String,
    hotel_zone: TimeZone,
}

impl<B, C, G, S> BookingService<B, C, G, S>
where
    B: BookingRepository,
    C: CabinRepository,
    G: GuestRepository,
    S: SettingsRepository,
{
    pub fn new(
        bookings: Arc<B>,
        cabins: Arc<C>,
        guests: Arc<G>,
        settings: Arc<S>,
        hotel_time_zone: &str,
    ) -> BungalowResult<Self> {
        let hotel_zone = resolve_zone(hotel_time_zone)?;
        Ok(Self {
            bookings,
            cabins,
            guests,
            settings,
            locks: Arc::default(),
            hotel_zone_name: hotel_time_zone.to_string(),
            hotel_zone,
        })
    }

    /// The lock registry, for services that must not race booking writes.
    pub fn locks(&self) -> Arc<CabinLocks> {
        Arc::clone(&self.locks)
    }

    /// Resolver for the booking expansion whitelist (`cabinId`, `guestId`).
    pub fn relations(&self) -> BookingRelations<C, G> {
        BookingRelations {
            cabins: Arc::clone(&self.cabins),
            guests: Arc::clone(&self.guests),
        }
    }

    async fn cabin(&self, id: Uuid) -> BungalowResult<Cabin> {
        self.cabins
            .get(id)
            .await?
            .ok_or_else(|| BungalowError::not_found("cabin", id))
    }

    async fn guest(&self, id: Uuid) -> BungalowResult<Guest> {
        self.guests
            .get(id)
            .await?
            .ok_or_else(|| BungalowError::not_found("guest", id))
    }

    /// The current calendar day at the hotel.
    pub fn today(&self) -> BungalowResult<NaiveDate> {
        let day = local_day(Utc::now(), &self.hotel_zone)?;
        NaiveDate::from_ymd_opt(i32::from(day.year()), day.month() as u32, day.day() as u32)
            .ok_or_else(|| BungalowError::Internal(format!("unrepresentable day {day}")))
    }

    fn zone_label(&self, requested: Option<String>) -> BungalowResult<String> {
        match requested {
            Some(name) => {
                resolve_zone(&name)?;
                Ok(name)
            }
            None => Ok(self.hotel_zone_name.clone()),
        }
    }

    /// Reject `booking` when it overlaps another stay of its cabin. Callers
    /// hold that cabin's lock until the booking is written.
    async fn ensure_free(&self, booking: &Booking) -> BungalowResult<()> {
        let clashes = self
            .bookings
            .find_overlapping(
                booking.cabin_id,
                booking.start_date,
                booking.end_date,
                Some(booking.id),
            )
            .await?;
        if let Some(clash) = clashes.first() {
            debug!(cabin_id = %booking.cabin_id, clash = %clash.id, "booking overlaps");
            return Err(BungalowError::SchedulingConflict {
                cabin_id: booking.cabin_id.to_string(),
            });
        }
        Ok(())
    }

    async fn insert_with_fresh_pnr(&self, mut booking: Booking) -> BungalowResult<Booking> {
        for attempt in 1..=PNR_ATTEMPTS {
            match self.bookings.insert(&booking).await {
                Err(BungalowError::AlreadyExists { detail, .. }) if attempt < PNR_ATTEMPTS => {
                    warn!(%detail, attempt, "PNR code collision, drawing another");
                    booking.pnr_code = generate_pnr();
                }
                other => return other,
            }
        }
        Err(BungalowError::Internal("could not allocate a PNR code".into()))
    }

    /// Apply `patch` to `current`: status moves are checked, the end date is
    /// re-derived and stored prices stand unless the patch supplies them.
    async fn merge(&self, current: Booking, patch: UpdateBooking) -> BungalowResult<Booking> {
        let mut next = current.clone();

        if let Some(status) = patch.status {
            scheduling::check_transition(current.status, status)?;
            next.status = status;
        }
        if let Some(cabin_id) = patch.cabin_id {
            next.cabin_id = cabin_id;
        }
        if let Some(guest_id) = patch.guest_id {
            if guest_id != current.guest_id {
                self.guest(guest_id).await?;
            }
            next.guest_id = guest_id;
        }
        if let Some(start) = patch.start_date {
            next.start_date = scheduling::truncate_to_day(start);
        }
        if let Some(nights) = patch.num_nights {
            next.num_nights = nights;
        }
        if let Some(guests) = patch.num_guests {
            next.num_guests = guests;
        }
        if let Some(zone) = patch.hotel_time_zone {
            next.hotel_time_zone = self.zone_label(Some(zone))?;
        }
        if let Some(paid) = patch.is_paid {
            next.is_paid = paid;
        }
        if let Some(breakfast) = patch.has_breakfast {
            next.has_breakfast = breakfast;
        }
        if let Some(observations) = patch.observations {
            next.observations = Some(observations.trim().to_string());
        }

        let cabin = self.cabin(next.cabin_id).await?;
        scheduling::check_occupants(next.num_guests, cabin.max_capacity)?;
        next.end_date = scheduling::end_date(next.start_date, next.num_nights)?;

        // Breakfast switched on without a stored extra is priced from the
        // active settings.
        if let Some(price) = patch.cabin_price {
            next.cabin_price = price;
        }
        match patch.extra_price {
            Some(price) => next.extra_price = Some(price),
            None if next.has_breakfast && next.extra_price.is_none() => {
                let settings = self.settings.active().await?;
                next.extra_price = pricing::quote(
                    &cabin,
                    next.num_nights,
                    next.num_guests,
                    true,
                    settings.as_ref(),
                )?
                .extra_price;
            }
            None => {}
        }
        next.total_price = pricing::total(next.cabin_price, next.extra_price)?;
        next.updated_at = Utc::now();
        next.validate()?;
        Ok(next)
    }

    /// Find a booking by PNR for a guest proving their identity with email
    /// and national id. Any mismatch is reported as not found.
    pub async fn lookup(
        &self,
        email: &str,
        pnr_code: &str,
        national_id: &str,
    ) -> BungalowResult<Value> {
        let not_found = || BungalowError::not_found("booking", pnr_code);
        let booking = self
            .bookings
            .find_by_pnr(pnr_code.trim())
            .await?
            .ok_or_else(not_found)?;
        let guest = self.guests.get(booking.guest_id).await?.ok_or_else(not_found)?;
        if guest.email != normalize_email(email) || guest.national_id != national_id.trim() {
            return Err(not_found());
        }
        let cabin = self.cabins.get(booking.cabin_id).await?;

        let mut doc = to_document(&booking)?;
        if let Some(map) = doc.as_object_mut() {
            map.insert(
                "guestId".into(),
                select_fields(to_document(&guest)?, &["fullName", "email", "nationalId"]),
            );
            map.insert(
                "cabinId".into(),
                match cabin {
                    Some(cabin) => select_fields(to_document(&cabin)?, &["name"]),
                    None => Value::Null,
                },
            );
        }
        Ok(doc)
    }

    pub async fn occupied_days(&self, cabin_id: Uuid) -> BungalowResult<Vec<OccupiedStay>> {
        Ok(self
            .bookings
            .find_by_cabin(cabin_id)
            .await?
            .into_iter()
            .map(|b| OccupiedStay {
                id: b.id,
                start_date: b.start_date,
                num_nights: b.num_nights,
                end_date: b.end_date,
            })
            .collect())
    }

    /// Sales of bookings created in `[first, last]`, summed per local day
    /// of the hotel time zone, oldest day first.
    pub async fn daily_stats(
        &self,
        first: DateTime<Utc>,
        last: DateTime<Utc>,
    ) -> BungalowResult<Vec<DailyStat>> {
        if last < first {
            return Err(BungalowError::validation(
                "lastDate must not be before firstDate.",
            ));
        }
        let bookings = self.bookings.find_created_between(first, last).await?;

        let mut days: BTreeMap<jiff::civil::Date, (Decimal, Decimal)> = BTreeMap::new();
        for booking in &bookings {
            let day = local_day(booking.created_at, &self.hotel_zone)?;
            let entry = days.entry(day).or_default();
            let overflow = || BungalowError::Internal(format!("sales of {day} overflow"));
            entry.0 = entry.0.checked_add(booking.total_price).ok_or_else(overflow)?;
            entry.1 = entry
                .1
                .checked_add(booking.extra_price.unwrap_or_default())
                .ok_or_else(overflow)?;
        }

        Ok(days
            .into_iter()
            .map(|(day, (total_sales, extras_sales))| DailyStat {
                day: day.to_string(),
                total_sales,
                extras_sales,
            })
            .collect())
    }

    /// Replace every booking with `records`. Status and payment come from
    /// each stay's position relative to `today` and occupants are capped at
    /// the cabin capacity. The batch must not overlap itself.
    pub async fn reload(&self, records: Vec<ReloadBooking>, today: NaiveDate) -> BungalowResult<u64> {
        let settings = self.settings.active().await?;
        let now = Utc::now();
        let mut cabins: HashMap<Uuid, Cabin> = HashMap::new();
        let mut known_guests: HashSet<Uuid> = HashSet::new();
        let mut batch: Vec<Booking> = Vec::with_capacity(records.len());

        for record in records {
            if !cabins.contains_key(&record.cabin_id) {
                let cabin = self.cabin(record.cabin_id).await?;
                cabins.insert(cabin.id, cabin);
            }
            let Some(cabin) = cabins.get(&record.cabin_id) else {
                return Err(BungalowError::not_found("cabin", record.cabin_id));
            };
            if known_guests.insert(record.guest_id) {
                self.guest(record.guest_id).await?;
            }

            let num_guests = scheduling::clamp_occupants(record.num_guests, cabin.max_capacity);
            let start_date = scheduling::truncate_to_day(record.start_date);
            let end_date = scheduling::end_date(start_date, record.num_nights)?;
            let (status, is_paid) =
                scheduling::reload_status(start_date, end_date, today, record.is_paid);
            let quote = pricing::quote(
                cabin,
                record.num_nights,
                num_guests,
                record.has_breakfast,
                settings.as_ref(),
            )?;

            let booking = Booking {
                id: Uuid::new_v4(),
                cabin_id: cabin.id,
                guest_id: record.guest_id,
                start_date,
                num_nights: record.num_nights,
                end_date,
                hotel_time_zone: self.zone_label(record.hotel_time_zone)?,
                num_guests,
                status,
                has_breakfast: record.has_breakfast,
                is_paid,
                cabin_price: quote.cabin_price,
                extra_price: quote.extra_price,
                total_price: quote.total_price,
                observations: record.observations.map(|o| o.trim().to_string()),
                pnr_code: generate_pnr(),
                created_at: now,
                updated_at: now,
            };
            booking.validate()?;

            if let Some(clash) = batch.iter().find(|other| {
                other.cabin_id == booking.cabin_id
                    && scheduling::overlaps(other.interval(), booking.interval())
            }) {
                return Err(BungalowError::SchedulingConflict {
                    cabin_id: clash.cabin_id.to_string(),
                });
            }
            batch.push(booking);
        }

        // Hold every affected cabin's lock while the collection is swapped;
        // a cabin deleted since it was read fails the whole batch.
        let cabin_ids: Vec<Uuid> = cabins.keys().copied().collect();
        let guards = self.locks.acquire(&cabin_ids).await;
        let present = self.cabins.get_many(&cabin_ids).await?;
        if let Some(missing) = cabin_ids
            .iter()
            .find(|id| !present.iter().any(|cabin| cabin.id == **id))
        {
            return Err(BungalowError::not_found("cabin", missing));
        }

        let inserted = self.bookings.replace_all(&batch).await?;
        drop(guards);
        info!(inserted, "bookings reloaded");
        Ok(inserted)
    }
}

impl<B, C, G, S> ResourceStore for BookingService<B, C, G, S>
where
    B: BookingRepository,
    C: CabinRepository,
    G: GuestRepository,
    S: SettingsRepository,
{
    type Doc = Booking;
    type Create = CreateBooking;
    type Patch = UpdateBooking;

    fn schema(&self) -> &'static ResourceSchema {
        &booking::SCHEMA
    }

    async fn create(&self, input: CreateBooking) -> BungalowResult<Booking> {
        let _guards = self.locks.acquire(&[input.cabin_id]).await;
        let cabin = self.cabin(input.cabin_id).await?;
        self.guest(input.guest_id).await?;
        let settings = self.settings.active().await?;

        if let Some(settings) = &settings {
            scheduling::check_policy(input.num_nights, input.num_guests, settings)?;
        }
        scheduling::check_occupants(input.num_guests, cabin.max_capacity)?;

        let start_date = scheduling::truncate_to_day(input.start_date);
        let end_date = scheduling::end_date(start_date, input.num_nights)?;
        let quote = pricing::quote(
            &cabin,
            input.num_nights,
            input.num_guests,
            input.has_breakfast,
            settings.as_ref(),
        )?;

        let now = Utc::now();
        let booking = Booking {
            id: Uuid::new_v4(),
            cabin_id: cabin.id,
            guest_id: input.guest_id,
            start_date,
            num_nights: input.num_nights,
            end_date,
            hotel_time_zone: self.zone_label(input.hotel_time_zone)?,
            num_guests: input.num_guests,
            status: BookingStatus::Unconfirmed,
            has_breakfast: input.has_breakfast,
            is_paid: input.is_paid,
            cabin_price: quote.cabin_price,
            extra_price: quote.extra_price,
            total_price: quote.total_price,
            observations: input.observations.map(|o| o.trim().to_string()),
            pnr_code: generate_pnr(),
            created_at: now,
            updated_at: now,
        };
        booking.validate()?;
        self.ensure_free(&booking).await?;

        let created = self.insert_with_fresh_pnr(booking).await?;
        info!(booking_id = %created.id, cabin_id = %created.cabin_id, "booking created");
        Ok(created)
    }

    /// `current` only says which cabin to lock first: the patch is applied
    /// to the copy read back under the locks of the booking's cabin and of
    /// the cabin it moves to.
    async fn update(&self, current: Booking, patch: UpdateBooking) -> BungalowResult<Booking> {
        let mut cabin_id = current.cabin_id;
        for _ in 0..LOCK_ATTEMPTS {
            let mut cabin_ids = vec![cabin_id];
            cabin_ids.extend(patch.cabin_id);
            let _guards = self.locks.acquire(&cabin_ids).await;

            let fresh = self
                .bookings
                .get(current.id)
                .await?
                .ok_or_else(|| BungalowError::not_found("booking", current.id))?;
            if fresh.cabin_id != cabin_id {
                // Moved to another cabin since `current` was read.
                cabin_id = fresh.cabin_id;
                continue;
            }

            let next = self.merge(fresh, patch).await?;
            self.ensure_free(&next).await?;
            let updated = self.bookings.replace(&next).await?;
            debug!(booking_id = %updated.id, status = %updated.status, "booking updated");
            return Ok(updated);
        }
        Err(BungalowError::SchedulingConflict {
            cabin_id: cabin_id.to_string(),
        })
    }

    async fn delete(&self, current: Booking) -> BungalowResult<()> {
        self.bookings.delete(current.id).await
    }

    async fn find(
        &self,
        filter: &Predicate,
        sort: &[SortKey],
        pagination: Pagination,
    ) -> BungalowResult<Vec<Booking>> {
        self.bookings.find(filter, sort, pagination).await
    }

    async fn find_one(&self, filter: &Predicate) -> BungalowResult<Option<Booking>> {
        self.bookings.find_one(filter).await
    }

    async fn count(&self, filter: &Predicate) -> BungalowResult<u64> {
        self.bookings.count(filter).await
    }

    async fn delete_all(&self) -> BungalowResult<u64> {
        self.bookings.delete_where(&Predicate::all()).await
    }
}

/// Expands `cabinId` and `guestId` on booking documents.
pub struct BookingRelations<C, G> {
    cabins: Arc<C>,
    guests: Arc<G>,
}

impl<C, G> Clone for BookingRelations<C, G> {
    fn clone(&self) -> Self {
        Self {
            cabins: Arc::clone(&self.cabins),
            guests: Arc::clone(&self.guests),
        }
    }
}

impl<C: CabinRepository, G: GuestRepository> RelationResolver for BookingRelations<C, G> {
    async fn resolve(
        &self,
        expansion: &Expansion,
        ids: &[String],
    ) -> BungalowResult<HashMap<String, Value>> {
        let ids: Vec<Uuid> = ids.iter().filter_map(|id| id.parse().ok()).collect();
        match expansion.path {
            "cabinId" => index_related(
                self.cabins.get_many(&ids).await?.into_iter().map(|c| (c.id, c)),
                &expansion.fields,
            ),
            "guestId" => index_related(
                self.guests.get_many(&ids).await?.into_iter().map(|g| (g.id, g)),
                &expansion.fields,
            ),
            _ => Ok(HashMap::new()),
        }
    }
}

pub fn generate_pnr() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(PNR_LEN)
        .map(char::from)
        .collect()
}

fn resolve_zone(name: &str) -> BungalowResult<TimeZone> {
    TimeZone::get(name)
        .map_err(|_| BungalowError::validation(format!("Unknown time zone: {name}.")))
}

fn local_day(instant: DateTime<Utc>, zone: &TimeZone) -> BungalowResult<jiff::civil::Date> {
    let ts = jiff::Timestamp::from_millisecond(instant.timestamp_millis())
        .map_err(|e| BungalowError::Internal(e.to_string()))?;
    Ok(ts.to_zoned(zone.clone()).date())
}
