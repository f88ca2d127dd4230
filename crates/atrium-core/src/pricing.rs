//! # Pricing Calculator
//!
//! Stateless quoting: given a room type, a stay range, and a party size,
//! read the ledger's per-day rates and the hotel's tax/service settings and
//! produce an itemized quote.
//!
//! ## Nightly Rate Precedence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  For each night:                                                        │
//! │                                                                         │
//! │  1. Explicit override  - the day's AvailabilityRecord exists AND       │
//! │                          carries a non-default (overridden) rate       │
//! │  2. Seasonal window    - the night falls inside a window on the        │
//! │                          room type (last defined match wins)           │
//! │  3. Weekend rate       - Saturday/Sunday, when the type has one        │
//! │  4. Base price         - the room type default                         │
//! │                                                                         │
//! │  Occupancy fees are charged once per STAY, not per night, matching     │
//! │  typical hotel quoting. Tax and service charge are percentage          │
//! │  add-ons on the subtotal.                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The orchestrator persists the grand total as the booking's quoted total
//! at commit time; repricing after commit never happens automatically.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{AvailabilityRecord, Hotel, RoomType, SeasonalRate, StayRange};

// =============================================================================
// Quote Types
// =============================================================================

/// Which precedence level produced a nightly rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateSource {
    /// Per-day override on the availability record.
    Override,
    /// A seasonal price window on the room type.
    Seasonal,
    /// The room type's weekend price.
    Weekend,
    /// The room type's base price.
    Base,
}

/// One line of the quote: a single night at its resolved rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NightlyRate {
    pub date: NaiveDate,
    pub rate_cents: i64,
    pub source: RateSource,
}

/// Requested party size.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Occupancy {
    pub adults: i64,
    pub children: i64,
}

impl Occupancy {
    #[inline]
    pub fn total(&self) -> i64 {
        self.adults + self.children
    }
}

/// Itemized breakdown plus grand total for one stay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    /// One line per night, in calendar order.
    pub nights: Vec<NightlyRate>,

    /// Sum of the nightly lines.
    pub room_subtotal_cents: i64,

    /// `extra_person_charge × max(0, adults − base_occupancy)`, once per stay.
    pub extra_person_fee_cents: i64,

    /// `child_charge × children`, once per stay.
    pub child_fee_cents: i64,

    /// Room subtotal plus occupancy fees; the base for both add-ons.
    pub subtotal_cents: i64,

    pub service_charge_cents: i64,
    pub tax_cents: i64,

    /// Grand total, frozen onto the booking at commit.
    pub total_cents: i64,
}

impl Quote {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Rate Resolution
// =============================================================================

/// Resolves one night's rate by precedence.
///
/// `record` is the night's ledger row, when one has been materialized.
pub fn nightly_rate(
    date: NaiveDate,
    room_type: &RoomType,
    seasonal: &[SeasonalRate],
    record: Option<&AvailabilityRecord>,
) -> NightlyRate {
    // 1. Explicit per-day override beats everything
    if let Some(record) = record {
        if record.rate_overridden {
            return NightlyRate {
                date,
                rate_cents: record.selling_rate_cents,
                source: RateSource::Override,
            };
        }
    }

    // 2. Seasonal windows: last defined match wins on overlap
    let seasonal_hit = seasonal
        .iter()
        .filter(|w| w.contains(date))
        .max_by_key(|w| w.position);
    if let Some(window) = seasonal_hit {
        return NightlyRate {
            date,
            rate_cents: window.price_cents,
            source: RateSource::Seasonal,
        };
    }

    // 3. Weekend rate (Saturday/Sunday)
    if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
        if let Some(weekend) = room_type.weekend_price_cents {
            return NightlyRate {
                date,
                rate_cents: weekend,
                source: RateSource::Weekend,
            };
        }
    }

    // 4. Base price
    NightlyRate {
        date,
        rate_cents: room_type.base_price_cents,
        source: RateSource::Base,
    }
}

// =============================================================================
// Stay Pricing
// =============================================================================

/// Prices a whole stay.
///
/// `records` are the materialized ledger rows overlapping the range; nights
/// without a row fall back to the room-type template.
pub fn price_stay(
    hotel: &Hotel,
    room_type: &RoomType,
    seasonal: &[SeasonalRate],
    records: &[AvailabilityRecord],
    range: &StayRange,
    occupancy: Occupancy,
) -> Quote {
    let nights: Vec<NightlyRate> = range
        .iter_nights()
        .map(|date| {
            let record = records.iter().find(|r| r.date == date);
            nightly_rate(date, room_type, seasonal, record)
        })
        .collect();

    let room_subtotal: Money = nights
        .iter()
        .fold(Money::zero(), |acc, n| acc + Money::from_cents(n.rate_cents));

    // Occupancy fees are per stay, not per night
    let extra_adults = (occupancy.adults - room_type.base_occupancy).max(0);
    let extra_person_fee = Money::from_cents(room_type.extra_person_charge_cents) * extra_adults;
    let child_fee = Money::from_cents(room_type.child_charge_cents) * occupancy.children;

    let subtotal = room_subtotal + extra_person_fee + child_fee;
    let service_charge = subtotal.apply_rate(hotel.service_charge_rate());
    let tax = subtotal.apply_rate(hotel.tax_rate());
    let total = subtotal + service_charge + tax;

    Quote {
        nights,
        room_subtotal_cents: room_subtotal.cents(),
        extra_person_fee_cents: extra_person_fee.cents(),
        child_fee_cents: child_fee.cents(),
        subtotal_cents: subtotal.cents(),
        service_charge_cents: service_charge.cents(),
        tax_cents: tax.cents(),
        total_cents: total.cents(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
