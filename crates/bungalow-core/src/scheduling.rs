//! Booking scheduling rules: day arithmetic, interval overlap, the status
//! lifecycle and occupant limits.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};

use crate::error::{BungalowError, BungalowResult};
use crate::models::booking::BookingStatus;
use crate::models::settings::Settings;

/// Midnight UTC of the day containing `instant`.
pub fn truncate_to_day(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Exclusive end of a stay: `start + nights` days.
pub fn end_date(start: DateTime<Utc>, nights: u32) -> BungalowResult<DateTime<Utc>> {
    start
        .checked_add_days(Days::new(u64::from(nights)))
        .ok_or_else(|| BungalowError::validation("Booking end date is out of range."))
}

/// Half-open interval intersection: `[a_start, a_end)` and `[b_start, b_end)`
/// overlap when each one ends after the other starts.
pub fn overlaps(
    a: (DateTime<Utc>, DateTime<Utc>),
    b: (DateTime<Utc>, DateTime<Utc>),
) -> bool {
    a.1 > b.0 && b.1 > a.0
}

/// Lifecycle only moves forward one step at a time; staying put is fine.
pub fn check_transition(from: BookingStatus, to: BookingStatus) -> BungalowResult<()> {
    use BookingStatus::*;
    let allowed = matches!(
        (from, to),
        (Unconfirmed, Unconfirmed | CheckedIn)
            | (CheckedIn, CheckedIn | CheckedOut)
            | (CheckedOut, CheckedOut)
    );
    if allowed {
        Ok(())
    } else {
        Err(BungalowError::validation(format!(
            "A booking can not go from {from} to {to}."
        )))
    }
}

/// Interactive writes refuse more occupants than the cabin holds.
pub fn check_occupants(num_guests: u32, capacity: u32) -> BungalowResult<()> {
    if num_guests > capacity {
        return Err(BungalowError::validation(format!(
            "This cabin hosts at most {capacity} guests."
        )));
    }
    Ok(())
}

/// Bulk reloads cap occupants at the cabin capacity instead of failing.
pub fn clamp_occupants(num_guests: u32, capacity: u32) -> u32 {
    num_guests.min(capacity)
}

/// Night count and party size against the active booking policy.
pub fn check_policy(num_nights: u32, num_guests: u32, settings: &Settings) -> BungalowResult<()> {
    if num_nights < settings.min_booking_length || num_nights > settings.max_booking_length {
        return Err(BungalowError::validation(format!(
            "A booking must be between {} and {} nights.",
            settings.min_booking_length, settings.max_booking_length
        )));
    }
    if num_guests > settings.max_guests_per_booking {
        return Err(BungalowError::validation(format!(
            "At most {} guests per booking.",
            settings.max_guests_per_booking
        )));
    }
    Ok(())
}

/// Status and payment a reloaded booking gets from where its stay falls
/// relative to `today`:
///
/// - stay ended before today: checked out and paid;
/// - stay starts today or later: unconfirmed, payment as given;
/// - otherwise (started before today, ends today or later): checked in
///   and paid.
pub fn reload_status(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    today: NaiveDate,
    is_paid: bool,
) -> (BookingStatus, bool) {
    let (start, end) = (start.date_naive(), end.date_naive());
    if end < today {
        (BookingStatus::CheckedOut, true)
    } else if start >= today {
        (BookingStatus::Unconfirmed, is_paid)
    } else {
        (BookingStatus::CheckedIn, true)
    }
}
