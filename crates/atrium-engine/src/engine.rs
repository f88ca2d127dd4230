//! # Reservation Orchestrator
//!
//! The entry point for creating reservations.
//!
//! ## Reservation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Engine::book()                                  │
//! │                                                                         │
//! │  1. VALIDATE (no side effects)                                         │
//! │     ├── stay range has >= 1 night, within the stay cap                 │
//! │     ├── occupancy within the room type's limit                         │
//! │     └── restrictions: stop-sell / CTA / CTD / min-max stay             │
//! │                                                                         │
//! │  2. QUOTE (pure)                                                       │
//! │     └── price_stay(): override > seasonal > weekend > base,            │
//! │         occupancy fees once per stay, service charge + tax             │
//! │                                                                         │
//! │  3. COMMIT (one transaction)                                           │
//! │     ├── reserve every night (conditional UPDATE per night)             │
//! │     ├── insert the booking (pending or confirmed per hotel setting)    │
//! │     └── any failed night → rollback, RoomNotAvailable, NOTHING mutated │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The lazy-materialization step (`ensure_range`) runs before the
//! transaction: it is idempotent and never overwrites, so a crash between
//! it and the commit leaves only default rows behind.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use atrium_core::validation::{
    check_restrictions, validate_booking_code, validate_id, validate_occupancy,
    validate_rate_cents,
};
use atrium_core::{
    price_stay, pricing::nightly_rate, pricing::NightlyRate, AvailabilityRecord, Booking,
    BookingChannel, BookingStatus, CoreError, Occupancy, PaymentStatus, Quote, StayRange,
    ValidationError, MAX_STAY_NIGHTS,
};
use atrium_db::{
    AvailabilityRepository, BookingRepository, Database, DayDefaults, DayRateUpdate, DbError,
    ReserveOutcome,
};

use crate::error::EngineResult;

// =============================================================================
// Request / Response Types
// =============================================================================

/// A reservation request for one room of a type across a stay span.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StayRequest {
    pub hotel_id: String,
    pub guest_id: String,
    pub room_type_id: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub adults: i64,
    pub children: i64,
    pub channel: BookingChannel,
}

/// A committed booking together with the itemized quote frozen onto it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingWithQuote {
    pub booking: Booking,
    pub quote: Quote,
}

/// One day of the availability calendar, with the rate the pricing
/// calculator would charge for that night.
///
/// Days the reservation path never materialized are rendered from the
/// room-type defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub total_rooms: i64,
    pub booked_rooms: i64,
    pub blocked_rooms: i64,
    pub available_rooms: i64,
    pub rate: NightlyRate,
    pub min_stay: Option<i64>,
    pub max_stay: Option<i64>,
    pub closed_to_arrival: bool,
    pub closed_to_departure: bool,
    pub stop_sell: bool,
}

// =============================================================================
// Engine
// =============================================================================

/// The reservation orchestrator.
///
/// Cheap to clone (the pool handle is shared); every concurrent caller can
/// hold its own copy.
#[derive(Debug, Clone)]
pub struct Engine {
    db: Database,
}

impl Engine {
    /// Creates an engine over an opened database.
    pub fn new(db: Database) -> Self {
        Engine { db }
    }

    /// The underlying database handle, for callers that need direct
    /// repository access (seeding, reporting).
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Creates a reservation: validate, quote, then reserve the whole night
    /// span and insert the booking in one transaction.
    ///
    /// On any unavailable night the transaction rolls back and
    /// [`CoreError::RoomNotAvailable`] is returned with nothing mutated.
    pub async fn book(&self, request: StayRequest) -> EngineResult<BookingWithQuote> {
        validate_id("hotel_id", &request.hotel_id).map_err(CoreError::from)?;
        validate_id("guest_id", &request.guest_id).map_err(CoreError::from)?;
        validate_id("room_type_id", &request.room_type_id).map_err(CoreError::from)?;

        let range =
            StayRange::new(request.check_in, request.check_out).map_err(CoreError::from)?;
        if range.nights() > MAX_STAY_NIGHTS {
            return Err(ValidationError::OutOfRange {
                field: "nights".to_string(),
                min: 1,
                max: MAX_STAY_NIGHTS,
            }
            .into());
        }

        let hotel = self.db.hotels().get(&request.hotel_id).await?;
        let room_type = self
            .db
            .rooms()
            .find_room_type(&request.room_type_id)
            .await?
            .filter(|rt| rt.hotel_id == hotel.id && rt.is_active)
            .ok_or_else(|| DbError::not_found("RoomType", &request.room_type_id))?;

        let occupancy = Occupancy {
            adults: request.adults,
            children: request.children,
        };
        validate_occupancy(occupancy, &room_type).map_err(CoreError::from)?;

        // Materialize the span lazily, then evaluate restrictions against the
        // ledger rows. All of this is pre-commit: a rejection here leaves the
        // counts untouched.
        let availability = self.db.availability();
        let defaults = DayDefaults {
            total_rooms: room_type.total_rooms,
            base_rate_cents: room_type.base_price_cents,
        };
        availability
            .ensure_range(&hotel.id, &room_type.id, &range, &defaults)
            .await?;

        let records = availability
            .get_range(&hotel.id, &room_type.id, range.check_in(), range.check_out())
            .await?;
        let departure = availability
            .find_day(&hotel.id, &room_type.id, range.check_out())
            .await?;
        check_restrictions(&range, &records, departure.as_ref())?;

        let seasonal = self.db.rooms().seasonal_rates(&room_type.id).await?;
        let quote = price_stay(&hotel, &room_type, &seasonal, &records, &range, occupancy);

        let code = self.db.bookings().generate_code().await?;
        let now = Utc::now();
        let status = if hotel.auto_confirm_bookings {
            BookingStatus::Confirmed
        } else {
            BookingStatus::Pending
        };
        let booking = Booking {
            id: Uuid::new_v4().to_string(),
            code,
            hotel_id: hotel.id.clone(),
            guest_id: request.guest_id.clone(),
            room_type_id: room_type.id.clone(),
            room_id: None,
            check_in: range.check_in(),
            check_out: range.check_out(),
            nights: range.nights(),
            adults: request.adults,
            children: request.children,
            status,
            payment_status: PaymentStatus::Unpaid,
            channel: request.channel,
            quoted_total_cents: quote.total_cents,
            inventory_released: false,
            created_at: now,
            updated_at: now,
        };

        // The atomic boundary: every night's decrement plus the booking row
        // commit together or not at all.
        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;
        match AvailabilityRepository::reserve(&mut tx, &hotel.id, &room_type.id, &range, 1)
            .await?
        {
            ReserveOutcome::Reserved => {}
            ReserveOutcome::Unavailable { date } => {
                tx.rollback().await.map_err(DbError::from)?;
                let available = availability
                    .find_day(&hotel.id, &room_type.id, date)
                    .await?
                    .map(|r| r.available_rooms)
                    .unwrap_or(0);
                debug!(hotel = %hotel.id, room_type = %room_type.id, %date, "Reservation rejected, night unavailable");
                return Err(CoreError::RoomNotAvailable {
                    room_type_id: room_type.id,
                    date,
                    requested: 1,
                    available,
                }
                .into());
            }
        }
        BookingRepository::insert(&mut tx, &booking).await?;
        tx.commit().await.map_err(DbError::from)?;

        info!(
            code = %booking.code,
            hotel = %hotel.id,
            room_type = %room_type.id,
            nights = booking.nights,
            total_cents = quote.total_cents,
            ?status,
            "Booking committed"
        );

        Ok(BookingWithQuote { booking, quote })
    }

    /// The availability calendar for `[from, to)`: per-day counts,
    /// restrictions, and the rate each night would sell at.
    ///
    /// Read-only - never materializes rows.
    pub async fn availability(
        &self,
        hotel_id: &str,
        room_type_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Vec<DayAvailability>> {
        let room_type = self
            .db
            .rooms()
            .find_room_type(room_type_id)
            .await?
            .filter(|rt| rt.hotel_id == hotel_id)
            .ok_or_else(|| DbError::not_found("RoomType", room_type_id))?;
        let seasonal = self.db.rooms().seasonal_rates(room_type_id).await?;
        let records = self
            .db
            .availability()
            .get_range(hotel_id, room_type_id, from, to)
            .await?;

        let days = from
            .iter_days()
            .take_while(|d| *d < to)
            .map(|date| {
                let record = records.iter().find(|r| r.date == date);
                let rate = nightly_rate(date, &room_type, &seasonal, record);
                match record {
                    Some(r) => DayAvailability {
                        date,
                        total_rooms: r.total_rooms,
                        booked_rooms: r.booked_rooms,
                        blocked_rooms: r.blocked_rooms,
                        available_rooms: r.available_rooms,
                        rate,
                        min_stay: r.min_stay,
                        max_stay: r.max_stay,
                        closed_to_arrival: r.closed_to_arrival,
                        closed_to_departure: r.closed_to_departure,
                        stop_sell: r.stop_sell,
                    },
                    None => DayAvailability {
                        date,
                        total_rooms: room_type.total_rooms,
                        booked_rooms: 0,
                        blocked_rooms: 0,
                        available_rooms: room_type.total_rooms,
                        rate,
                        min_stay: None,
                        max_stay: None,
                        closed_to_arrival: false,
                        closed_to_departure: false,
                        stop_sell: false,
                    },
                }
            })
            .collect();

        Ok(days)
    }

    /// Overrides one day's selling rate and restriction flags, materializing
    /// the day if the reservation path never touched it.
    ///
    /// Counts are untouched; the overridden rate takes precedence over the
    /// room-type template for quotes from then on.
    pub async fn set_day_rate(
        &self,
        hotel_id: &str,
        room_type_id: &str,
        date: NaiveDate,
        update: &DayRateUpdate,
    ) -> EngineResult<AvailabilityRecord> {
        validate_id("hotel_id", hotel_id).map_err(CoreError::from)?;
        validate_id("room_type_id", room_type_id).map_err(CoreError::from)?;
        validate_rate_cents(update.selling_rate_cents).map_err(CoreError::from)?;

        let room_type = self
            .db
            .rooms()
            .find_room_type(room_type_id)
            .await?
            .filter(|rt| rt.hotel_id == hotel_id)
            .ok_or_else(|| DbError::not_found("RoomType", room_type_id))?;
        let defaults = DayDefaults {
            total_rooms: room_type.total_rooms,
            base_rate_cents: room_type.base_price_cents,
        };

        let record = self
            .db
            .availability()
            .adjust_rate(hotel_id, room_type_id, date, update, &defaults)
            .await?;
        info!(
            hotel = %hotel_id,
            room_type = %room_type_id,
            %date,
            rate_cents = update.selling_rate_cents,
            "Day rate overridden"
        );
        Ok(record)
    }

    /// Fetches a booking by id, as a typed error when missing.
    pub async fn get_booking(&self, booking_id: &str) -> EngineResult<Booking> {
        self.db
            .bookings()
            .get(booking_id)
            .await?
            .ok_or_else(|| CoreError::BookingNotFound(booking_id.to_string()).into())
    }

    /// Fetches a booking by its human-speakable code. Malformed codes are
    /// rejected before the lookup.
    pub async fn get_booking_by_code(&self, code: &str) -> EngineResult<Booking> {
        validate_booking_code(code).map_err(CoreError::from)?;
        self.db
            .bookings()
            .get_by_code(code)
            .await?
            .ok_or_else(|| CoreError::BookingNotFound(code.to_string()).into())
    }
}
