//! # Availability Ledger Repository
//!
//! One row per (hotel, room type, calendar day). Pure bookkeeping - the
//! business rules that decide WHETHER to mutate live in atrium-core and the
//! engine; this module guarantees HOW: every mutation recomputes the derived
//! `available_rooms` inside the same UPDATE statement.
//!
//! ## All-or-Nothing Reservation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  reserve() runs inside the CALLER's transaction:                        │
//! │                                                                         │
//! │  for each night in [check_in, check_out):                              │
//! │      UPDATE availability                                               │
//! │         SET booked += n, available = max(0, total - booked - blocked), │
//! │             version += 1                                               │
//! │       WHERE (hotel, room_type, date) AND NOT stop_sell                 │
//! │         AND available_rooms >= n          ◄── the no-oversell gate     │
//! │                                                                         │
//! │      rows_affected == 0 ?  → report the failing night; the caller      │
//! │                              rolls back, so nights already decremented │
//! │                              in this span are restored                 │
//! │                                                                         │
//! │  Two concurrent reservations for the same day linearize at the row:   │
//! │  whichever commits first wins, the loser sees the smaller             │
//! │  available_rooms and fails cleanly with no partial decrement.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use atrium_core::{AvailabilityRecord, StayRange};

// =============================================================================
// Input Types
// =============================================================================

/// Room-type defaults used to materialize missing ledger days.
#[derive(Debug, Clone, Copy)]
pub struct DayDefaults {
    pub total_rooms: i64,
    pub base_rate_cents: i64,
}

/// Result of an all-or-nothing reserve attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReserveOutcome {
    /// Every night in the span was decremented.
    Reserved,
    /// A night had insufficient availability (or stop-sell); the caller
    /// must roll back its transaction.
    Unavailable { date: NaiveDate },
}

/// Per-day pricing/restriction overwrite applied by `adjust_rate`.
#[derive(Debug, Clone, Copy)]
pub struct DayRateUpdate {
    pub selling_rate_cents: i64,
    pub min_stay: Option<i64>,
    pub max_stay: Option<i64>,
    pub closed_to_arrival: bool,
    pub closed_to_departure: bool,
    pub stop_sell: bool,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for the availability ledger.
#[derive(Debug, Clone)]
pub struct AvailabilityRepository {
    pool: SqlitePool,
}

impl AvailabilityRepository {
    /// Creates a new AvailabilityRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AvailabilityRepository { pool }
    }

    /// Idempotently materializes one record per missing night in the range.
    ///
    /// Seeds from the room type's current base price and total room count.
    /// Existing records are never overwritten (`ON CONFLICT DO NOTHING`),
    /// so re-running over a partially materialized range is safe.
    pub async fn ensure_range(
        &self,
        hotel_id: &str,
        room_type_id: &str,
        range: &StayRange,
        defaults: &DayDefaults,
    ) -> DbResult<()> {
        let now = Utc::now();

        for date in range.iter_nights() {
            let id = Uuid::new_v4().to_string();
            sqlx::query(
                r#"
                INSERT INTO availability (
                    id, hotel_id, room_type_id, date,
                    total_rooms, booked_rooms, blocked_rooms, available_rooms,
                    base_rate_cents, selling_rate_cents, rate_overridden,
                    min_stay, max_stay,
                    closed_to_arrival, closed_to_departure, stop_sell,
                    version, updated_at
                ) VALUES (
                    ?1, ?2, ?3, ?4,
                    ?5, 0, 0, ?5,
                    ?6, ?6, 0,
                    NULL, NULL,
                    0, 0, 0,
                    0, ?7
                )
                ON CONFLICT (hotel_id, room_type_id, date) DO NOTHING
                "#,
            )
            .bind(&id)
            .bind(hotel_id)
            .bind(room_type_id)
            .bind(date)
            .bind(defaults.total_rooms)
            .bind(defaults.base_rate_cents)
            .bind(now)
            .execute(&self.pool)
            .await?;
        }

        Ok(())
    }

    /// Materializes a single day (used by `adjust_rate` on days the
    /// reservation path has never touched).
    pub async fn ensure_day(
        &self,
        hotel_id: &str,
        room_type_id: &str,
        date: NaiveDate,
        defaults: &DayDefaults,
    ) -> DbResult<()> {
        let single_night = StayRange::new(date, date + chrono::Days::new(1))
            .map_err(|e| DbError::Internal(e.to_string()))?;
        self.ensure_range(hotel_id, room_type_id, &single_night, defaults)
            .await
    }

    /// Fetches the materialized records in `[from, to)`, in date order.
    ///
    /// Read-only, no locking: calendar reads never block reservations.
    pub async fn get_range(
        &self,
        hotel_id: &str,
        room_type_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<Vec<AvailabilityRecord>> {
        let records = sqlx::query_as::<_, AvailabilityRecord>(
            r#"
            SELECT * FROM availability
            WHERE hotel_id = ?1 AND room_type_id = ?2
              AND date >= ?3 AND date < ?4
            ORDER BY date
            "#,
        )
        .bind(hotel_id)
        .bind(room_type_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Fetches a single day's record, if materialized.
    pub async fn find_day(
        &self,
        hotel_id: &str,
        room_type_id: &str,
        date: NaiveDate,
    ) -> DbResult<Option<AvailabilityRecord>> {
        let record = sqlx::query_as::<_, AvailabilityRecord>(
            r#"
            SELECT * FROM availability
            WHERE hotel_id = ?1 AND room_type_id = ?2 AND date = ?3
            "#,
        )
        .bind(hotel_id)
        .bind(room_type_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Reserves `rooms` units on every night in the range, all-or-nothing.
    ///
    /// MUST be called inside a transaction: on `Unavailable` the caller
    /// rolls back, undoing the nights already decremented. The conditional
    /// `available_rooms >= ?` is the oversell gate; `stop_sell` days fail
    /// regardless of count.
    pub async fn reserve(
        conn: &mut SqliteConnection,
        hotel_id: &str,
        room_type_id: &str,
        range: &StayRange,
        rooms: i64,
    ) -> DbResult<ReserveOutcome> {
        let now = Utc::now();

        for date in range.iter_nights() {
            let result = sqlx::query(
                r#"
                UPDATE availability
                SET booked_rooms = booked_rooms + ?1,
                    available_rooms = MAX(0, total_rooms - (booked_rooms + ?1) - blocked_rooms),
                    version = version + 1,
                    updated_at = ?2
                WHERE hotel_id = ?3 AND room_type_id = ?4 AND date = ?5
                  AND stop_sell = 0
                  AND available_rooms >= ?1
                "#,
            )
            .bind(rooms)
            .bind(now)
            .bind(hotel_id)
            .bind(room_type_id)
            .bind(date)
            .execute(&mut *conn)
            .await?;

            if result.rows_affected() == 0 {
                debug!(%hotel_id, %room_type_id, %date, rooms, "Reserve failed, night unavailable");
                return Ok(ReserveOutcome::Unavailable { date });
            }
        }

        debug!(%hotel_id, %room_type_id, nights = range.nights(), rooms, "Span reserved");
        Ok(ReserveOutcome::Reserved)
    }

    /// Releases `rooms` units on every night in the range.
    ///
    /// Inverse of `reserve`; decrements are floored at zero. The ledger does
    /// NOT deduplicate releases - the booking's `inventory_released` flag is
    /// the caller's idempotence guard.
    pub async fn release(
        conn: &mut SqliteConnection,
        hotel_id: &str,
        room_type_id: &str,
        range: &StayRange,
        rooms: i64,
    ) -> DbResult<()> {
        let now = Utc::now();

        for date in range.iter_nights() {
            sqlx::query(
                r#"
                UPDATE availability
                SET booked_rooms = MAX(0, booked_rooms - ?1),
                    available_rooms = MAX(0, total_rooms - MAX(0, booked_rooms - ?1) - blocked_rooms),
                    version = version + 1,
                    updated_at = ?2
                WHERE hotel_id = ?3 AND room_type_id = ?4 AND date = ?5
                "#,
            )
            .bind(rooms)
            .bind(now)
            .bind(hotel_id)
            .bind(room_type_id)
            .bind(date)
            .execute(&mut *conn)
            .await?;
        }

        debug!(%hotel_id, %room_type_id, nights = range.nights(), rooms, "Span released");
        Ok(())
    }

    /// Overwrites a single day's pricing/restriction fields.
    ///
    /// Does not affect counts. Marks the day's rate as overridden so the
    /// pricing calculator prefers it over the room-type template. The day is
    /// materialized first if the reservation path never touched it.
    pub async fn adjust_rate(
        &self,
        hotel_id: &str,
        room_type_id: &str,
        date: NaiveDate,
        update: &DayRateUpdate,
        defaults: &DayDefaults,
    ) -> DbResult<AvailabilityRecord> {
        self.ensure_day(hotel_id, room_type_id, date, defaults).await?;

        let now = Utc::now();
        sqlx::query(
            r#"
            UPDATE availability
            SET selling_rate_cents = ?1,
                rate_overridden = 1,
                min_stay = ?2,
                max_stay = ?3,
                closed_to_arrival = ?4,
                closed_to_departure = ?5,
                stop_sell = ?6,
                version = version + 1,
                updated_at = ?7
            WHERE hotel_id = ?8 AND room_type_id = ?9 AND date = ?10
            "#,
        )
        .bind(update.selling_rate_cents)
        .bind(update.min_stay)
        .bind(update.max_stay)
        .bind(update.closed_to_arrival)
        .bind(update.closed_to_departure)
        .bind(update.stop_sell)
        .bind(now)
        .bind(hotel_id)
        .bind(room_type_id)
        .bind(date)
        .execute(&self.pool)
        .await?;

        self.find_day(hotel_id, room_type_id, date)
            .await?
            .ok_or_else(|| DbError::not_found("AvailabilityRecord", format!("{date}")))
    }

    /// Sets the number of blocked (out-of-sale) rooms for a day,
    /// recomputing availability in the same statement.
    pub async fn set_blocked(
        &self,
        hotel_id: &str,
        room_type_id: &str,
        date: NaiveDate,
        blocked: i64,
    ) -> DbResult<()> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE availability
            SET blocked_rooms = ?1,
                available_rooms = MAX(0, total_rooms - booked_rooms - ?1),
                version = version + 1,
                updated_at = ?2
            WHERE hotel_id = ?3 AND room_type_id = ?4 AND date = ?5
            "#,
        )
        .bind(blocked)
        .bind(now)
        .bind(hotel_id)
        .bind(room_type_id)
        .bind(date)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("AvailabilityRecord", format!("{date}")));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
