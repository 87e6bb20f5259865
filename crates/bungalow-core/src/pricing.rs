//! Booking prices. All arithmetic stays in [`Decimal`]; values become JSON
//! numbers only when a document is serialized.

use rust_decimal::Decimal;

use crate::error::{BungalowError, BungalowResult};
use crate::models::cabin::Cabin;
use crate::models::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub cabin_price: Decimal,
    pub extra_price: Option<Decimal>,
    pub total_price: Decimal,
}

/// Price a stay:
/// `cabin = (regular - discount) * nights`,
/// `extra = breakfast * nights * guests` when breakfast is requested.
///
/// Breakfast can only be priced when there are active settings.
pub fn quote(
    cabin: &Cabin,
    num_nights: u32,
    num_guests: u32,
    has_breakfast: bool,
    settings: Option<&Settings>,
) -> BungalowResult<Quote> {
    let nights = Decimal::from(num_nights);
    let cabin_price = cabin
        .nightly_rate()
        .checked_mul(nights)
        .ok_or_else(out_of_range)?;
    let extra_price = if has_breakfast {
        let settings = settings.ok_or_else(|| {
            BungalowError::validation("Breakfast is not available without active settings.")
        })?;
        let extra = settings
            .breakfast_price
            .checked_mul(nights)
            .and_then(|p| p.checked_mul(Decimal::from(num_guests)))
            .ok_or_else(out_of_range)?;
        Some(extra)
    } else {
        None
    };
    Ok(Quote {
        cabin_price,
        extra_price,
        total_price: total(cabin_price, extra_price)?,
    })
}

pub fn total(cabin_price: Decimal, extra_price: Option<Decimal>) -> BungalowResult<Decimal> {
    cabin_price
        .checked_add(extra_price.unwrap_or_default())
        .ok_or_else(out_of_range)
}

fn out_of_range() -> BungalowError {
    BungalowError::validation("Booking price is out of range.")
}
