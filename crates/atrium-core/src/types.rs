//! # Domain Types
//!
//! Core domain types for the inventory and reservation engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────────┐   ┌──────────────────┐   ┌──────────────────┐    │
//! │  │ AvailabilityRec. │   │     Booking      │   │     RoomType     │    │
//! │  │  ──────────────  │   │  ──────────────  │   │  ──────────────  │    │
//! │  │  (hotel, type,   │   │  id (UUID)       │   │  base_price      │    │
//! │  │   date) key      │   │  code (speakable)│   │  weekend_price   │    │
//! │  │  total/booked/   │   │  status          │   │  seasonal windows│    │
//! │  │  blocked/avail   │   │  quoted_total    │   │  occupancy caps  │    │
//! │  └──────────────────┘   └──────────────────┘   └──────────────────┘    │
//! │                                                                         │
//! │  The ledger owns counts, the booking owns guest-facing state, a Room   │
//! │  is a physical unit referenced by a booking once assigned at check-in. │
//! │  Everything is scoped by hotel_id - that is the tenancy boundary.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID where staff need one: the booking `code` is a short
//!   human-speakable string usable over phone/SMS

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Rate (basis points)
// =============================================================================

/// A percentage rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1250 bps = 12.5% (a typical hotel tax rate)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateBps(u32);

impl RateBps {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        RateBps(bps)
    }

    /// Creates a rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        RateBps((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        RateBps(0)
    }

    /// Checks if the rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for RateBps {
    fn default() -> Self {
        RateBps::zero()
    }
}

// =============================================================================
// Stay Range
// =============================================================================

/// A half-open stay interval: nights `[check_in, check_out)`.
///
/// The check-out day is never a sold night. Construction rejects ranges with
/// fewer than one night, so every `StayRange` in the system is valid by type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayRange {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

impl StayRange {
    /// Creates a stay range, rejecting zero- or negative-night spans.
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Result<Self, ValidationError> {
        if check_out <= check_in {
            return Err(ValidationError::InvalidDateRange {
                check_in,
                check_out,
            });
        }
        Ok(StayRange {
            check_in,
            check_out,
        })
    }

    /// The arrival day. Its ledger record governs min/max stay for the
    /// whole span.
    #[inline]
    pub fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    /// The departure day (exclusive - not a sold night).
    #[inline]
    pub fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    /// Number of nights in the stay (always >= 1).
    #[inline]
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    /// Iterates the sold nights: every day in `[check_in, check_out)`.
    pub fn iter_nights(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        let check_out = self.check_out;
        self.check_in
            .iter_days()
            .take_while(move |d| *d < check_out)
    }

    /// Checks whether a calendar day is one of the sold nights.
    #[inline]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.check_in && date < self.check_out
    }
}

// =============================================================================
// Availability Record
// =============================================================================

/// Recomputes the derived availability count.
///
/// Invariant: `available == max(0, total - booked - blocked)` after every
/// ledger mutation. The SQL layer applies the same expression inside each
/// UPDATE so the derivation is never read-stale-then-written.
#[inline]
pub const fn derived_available(total: i64, booked: i64, blocked: i64) -> i64 {
    let available = total - booked - blocked;
    if available < 0 {
        0
    } else {
        available
    }
}

/// One ledger row: a (hotel, room type, calendar day) bucket of inventory.
///
/// Missing days mean "use room-type defaults"; they are materialized lazily
/// on first access and never overwritten once present.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct AvailabilityRecord {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Tenancy boundary - every operation is scoped by hotel.
    pub hotel_id: String,

    /// Room type this day bucket belongs to.
    pub room_type_id: String,

    /// The calendar day (one room-night per unit of `total_rooms`).
    pub date: NaiveDate,

    /// Physical capacity for this day.
    pub total_rooms: i64,

    /// Rooms committed to bookings.
    pub booked_rooms: i64,

    /// Rooms taken out of sale (maintenance etc.).
    pub blocked_rooms: i64,

    /// Derived: `max(0, total - booked - blocked)`.
    pub available_rooms: i64,

    /// Rate the room type carried when this day was materialized.
    pub base_rate_cents: i64,

    /// The day's selling rate in cents.
    pub selling_rate_cents: i64,

    /// True once `adjust_rate` has overridden the selling rate. Only then
    /// does the pricing calculator prefer this row over the template.
    pub rate_overridden: bool,

    /// Minimum stay length, evaluated on the arrival day only.
    pub min_stay: Option<i64>,

    /// Maximum stay length, evaluated on the arrival day only.
    pub max_stay: Option<i64>,

    /// Rejects stays arriving on this day.
    pub closed_to_arrival: bool,

    /// Rejects stays departing on this day.
    pub closed_to_departure: bool,

    /// No sale on this day regardless of availability.
    pub stop_sell: bool,

    /// Optimistic concurrency counter, bumped on every mutation.
    pub version: i64,

    /// When the row was last mutated.
    pub updated_at: DateTime<Utc>,
}

impl AvailabilityRecord {
    /// The day's selling rate as Money.
    #[inline]
    pub fn selling_rate(&self) -> Money {
        Money::from_cents(self.selling_rate_cents)
    }

    /// Re-derives `available_rooms` from the counts.
    pub fn recompute_available(&mut self) {
        self.available_rooms =
            derived_available(self.total_rooms, self.booked_rooms, self.blocked_rooms);
    }

    /// Checks the derivation invariant (used by tests after every operation).
    pub fn invariant_holds(&self) -> bool {
        self.available_rooms
            == derived_available(self.total_rooms, self.booked_rooms, self.blocked_rooms)
    }
}

// =============================================================================
// Hotel
// =============================================================================

/// How strictly a hotel penalizes late cancellations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum CancellationPolicy {
    /// No penalty, ever.
    Flexible,
    /// Half the quoted total if cancelled inside the window.
    Moderate,
    /// The full quoted total if cancelled inside the window.
    Strict,
    /// The full quoted total regardless of timing.
    NonRefundable,
}

impl Default for CancellationPolicy {
    fn default() -> Self {
        CancellationPolicy::Flexible
    }
}

/// Hotel-level settings consumed by the engine.
///
/// Profile CRUD lives outside the core; this is only the slice the
/// orchestrator and pricing calculator read.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Hotel {
    pub id: String,
    pub name: String,

    /// Tax applied to the quote subtotal, in basis points.
    pub tax_rate_bps: i64,

    /// Service charge applied to the quote subtotal, in basis points.
    pub service_charge_bps: i64,

    /// New bookings start `confirmed` instead of `pending`.
    pub auto_confirm_bookings: bool,

    pub cancellation_policy: CancellationPolicy,

    /// Penalty window in hours before check-in.
    pub cancellation_hours: i64,

    /// How long a `pending` booking holds its inventory before the sweeper
    /// expires it.
    pub pending_hold_minutes: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Hotel {
    #[inline]
    pub fn tax_rate(&self) -> RateBps {
        RateBps::from_bps(self.tax_rate_bps as u32)
    }

    #[inline]
    pub fn service_charge_rate(&self) -> RateBps {
        RateBps::from_bps(self.service_charge_bps as u32)
    }
}

// =============================================================================
// Room Type
// =============================================================================

/// Pricing template for a class of rooms.
///
/// Used to seed new availability records and to derive nightly rates when no
/// per-day override exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct RoomType {
    pub id: String,
    pub hotel_id: String,
    pub name: String,

    /// Default nightly rate in cents.
    pub base_price_cents: i64,

    /// Saturday/Sunday rate, when set.
    pub weekend_price_cents: Option<i64>,

    /// Charged once per stay for each adult above `base_occupancy`.
    pub extra_person_charge_cents: i64,

    /// Charged once per stay per child.
    pub child_charge_cents: i64,

    /// Adults included in the nightly rate.
    pub base_occupancy: i64,

    /// Hard cap on guests per room.
    pub max_occupancy: i64,

    /// Physical room count, seeds `total_rooms` on new ledger days.
    pub total_rooms: i64,

    /// Soft delete.
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RoomType {
    #[inline]
    pub fn base_price(&self) -> Money {
        Money::from_cents(self.base_price_cents)
    }
}

/// A named seasonal price window on a room type.
///
/// Windows may overlap; the last one defined (highest `position`) wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SeasonalRate {
    pub id: String,
    pub room_type_id: String,
    pub name: String,

    /// Inclusive start of the window.
    pub start_date: NaiveDate,

    /// Inclusive end of the window.
    pub end_date: NaiveDate,

    pub price_cents: i64,

    /// Definition order; ties between overlapping windows break to the
    /// highest position (last defined wins).
    pub position: i64,
}

impl SeasonalRate {
    /// Checks whether a night falls inside this window.
    #[inline]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}

// =============================================================================
// Room (physical unit)
// =============================================================================

/// Housekeeping/occupancy state of a physical room.
///
/// Outside the ledger's day-granularity math: the ledger can show
/// availability while zero physical rooms are presently clean, which is why
/// check-in failure is a distinct error from "no inventory".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    /// Clean and assignable.
    Available,
    /// A guest is in the room.
    Occupied,
    /// Held for an imminent arrival.
    Reserved,
    /// Awaiting housekeeping after check-out.
    Cleaning,
    /// Out of order.
    Maintenance,
    /// Administratively blocked.
    Blocked,
}

/// A physical room, owned by the hotel and referenced by a booking once
/// assigned at check-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Room {
    pub id: String,
    pub hotel_id: String,
    pub room_type_id: String,
    pub room_number: String,
    pub status: RoomStatus,
    pub current_booking_id: Option<String>,
    pub current_guest_id: Option<String>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Booking
// =============================================================================

/// Lifecycle state of a booking. See [`crate::lifecycle`] for the legal
/// transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Created, inventory held, awaiting confirmation (or hold expiry).
    Pending,
    /// Committed stay.
    Confirmed,
    /// Guest is in-house with an assigned physical room.
    CheckedIn,
    /// Lifecycle closed; the nights are consumed history.
    CheckedOut,
    /// Stay abandoned, inventory returned to the ledger.
    Cancelled,
    /// Guest never arrived; inventory stays consumed by design.
    NoShow,
}

impl BookingStatus {
    /// Terminal states are final; no transition leaves them.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::CheckedOut | BookingStatus::Cancelled | BookingStatus::NoShow
        )
    }
}

/// Payment progress, derived from the settled payment records - never set
/// directly by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Partial,
    Paid,
    Refunded,
}

/// Where the booking originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum BookingChannel {
    Direct,
    Ota,
    WalkIn,
    Phone,
    Corporate,
}

/// One guest stay, owning exactly one reservation span in the ledger
/// (rooms × nights).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Booking {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Short human-speakable code (prefix + random alphanumerics), unique
    /// platform-wide so staff can reference it over phone/SMS.
    pub code: String,

    pub hotel_id: String,
    pub guest_id: String,
    pub room_type_id: String,

    /// Physical room, assigned at check-in.
    pub room_id: Option<String>,

    pub check_in: NaiveDate,
    /// Exclusive - the guest departs this day.
    pub check_out: NaiveDate,
    /// Derived: `check_out - check_in` in days, always >= 1.
    pub nights: i64,

    pub adults: i64,
    pub children: i64,

    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub channel: BookingChannel,

    /// Grand total frozen at commit time; repricing never happens
    /// automatically after commit.
    pub quoted_total_cents: i64,

    /// Release-idempotence guard: set the first time this booking's span is
    /// returned to the ledger. The ledger itself does not deduplicate.
    pub inventory_released: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// The stay span this booking owns in the ledger.
    pub fn range(&self) -> StayRange {
        // check_out > check_in is enforced at creation
        StayRange {
            check_in: self.check_in,
            check_out: self.check_out,
        }
    }

    #[inline]
    pub fn quoted_total(&self) -> Money {
        Money::from_cents(self.quoted_total_cents)
    }
}

// =============================================================================
// Payment Record
// =============================================================================

/// Outcome reported by the payment collaborator for one settlement attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum SettlementStatus {
    Settled,
    Refunded,
    Failed,
}

/// A payment event linked to a booking. Consumed from the payment
/// collaborator's callback; never mutates inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PaymentRecord {
    pub id: String,
    pub booking_id: String,
    pub amount_cents: i64,
    pub status: SettlementStatus,
    /// External reference (gateway transaction id etc.).
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Derives the booking-level payment status from settled/refunded sums.
///
/// Pure so the callback handler and tests share one rule.
pub fn derive_payment_status(
    quoted_total_cents: i64,
    settled_cents: i64,
    refunded_cents: i64,
) -> PaymentStatus {
    if refunded_cents > 0 && refunded_cents >= settled_cents {
        return PaymentStatus::Refunded;
    }
    let net = settled_cents - refunded_cents;
    if net <= 0 {
        PaymentStatus::Unpaid
    } else if net >= quoted_total_cents {
        PaymentStatus::Paid
    } else {
        PaymentStatus::Partial
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
