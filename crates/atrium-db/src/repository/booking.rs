//! # Booking Repository
//!
//! Database operations for bookings and their payment records.
//!
//! ## Booking Lifecycle (storage view)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. INSERT (inside the reservation transaction)                        │
//! │     └── insert() → Booking { status: pending | confirmed }             │
//! │                                                                         │
//! │  2. TRANSITIONS                                                        │
//! │     └── set_status() guarded by the expected current status;           │
//! │         rows_affected == 0 means a concurrent transition won           │
//! │                                                                         │
//! │  3. RELEASE GUARD                                                      │
//! │     └── mark_inventory_released() - flips the flag exactly once;       │
//! │         a second attempt affects 0 rows and the caller skips the       │
//! │         ledger release                                                 │
//! │                                                                         │
//! │  4. PAYMENTS                                                           │
//! │     └── record_payment() + settled_totals() → derived payment_status   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use rand::Rng;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use atrium_core::{
    Booking, BookingStatus, PaymentRecord, PaymentStatus, SettlementStatus, BOOKING_CODE_PREFIX,
    BOOKING_CODE_SUFFIX_LEN,
};

/// Code alphabet without 0/O/1/I - codes get read out over the phone.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Collision-retry budget for code generation.
const MAX_CODE_ATTEMPTS: u32 = 10;

/// Net settled/refunded cents for a booking.
#[derive(Debug, Clone, Copy, Default)]
pub struct SettledTotals {
    pub settled_cents: i64,
    pub refunded_cents: i64,
}

/// Repository for booking database operations.
#[derive(Debug, Clone)]
pub struct BookingRepository {
    pool: SqlitePool,
}

impl BookingRepository {
    /// Creates a new BookingRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BookingRepository { pool }
    }

    /// Generates a unique human-speakable booking code.
    ///
    /// Format: `BK-` + random alphanumerics. Uniqueness is checked against
    /// the bookings table; the UNIQUE index is the last line of defense for
    /// the race between check and insert.
    pub async fn generate_code(&self) -> DbResult<String> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = random_code();
            let exists: Option<i64> =
                sqlx::query_scalar("SELECT 1 FROM bookings WHERE code = ?1")
                    .bind(&code)
                    .fetch_optional(&self.pool)
                    .await?;

            if exists.is_none() {
                return Ok(code);
            }
            debug!(%code, "Booking code collision, retrying");
        }

        Err(DbError::CodeGenerationExhausted {
            attempts: MAX_CODE_ATTEMPTS,
        })
    }

    /// Inserts a booking.
    ///
    /// Takes a connection so the engine can run it inside the same
    /// transaction as the ledger reserve - the atomic boundary of the
    /// whole reservation.
    pub async fn insert(conn: &mut SqliteConnection, booking: &Booking) -> DbResult<()> {
        debug!(id = %booking.id, code = %booking.code, "Inserting booking");

        sqlx::query(
            r#"
            INSERT INTO bookings (
                id, code, hotel_id, guest_id, room_type_id, room_id,
                check_in, check_out, nights, adults, children,
                status, payment_status, channel,
                quoted_total_cents, inventory_released,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9, ?10, ?11,
                ?12, ?13, ?14,
                ?15, ?16,
                ?17, ?18
            )
            "#,
        )
        .bind(&booking.id)
        .bind(&booking.code)
        .bind(&booking.hotel_id)
        .bind(&booking.guest_id)
        .bind(&booking.room_type_id)
        .bind(&booking.room_id)
        .bind(booking.check_in)
        .bind(booking.check_out)
        .bind(booking.nights)
        .bind(booking.adults)
        .bind(booking.children)
        .bind(booking.status)
        .bind(booking.payment_status)
        .bind(booking.channel)
        .bind(booking.quoted_total_cents)
        .bind(booking.inventory_released)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Gets a booking by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(booking)
    }

    /// Gets a booking by its human-speakable code.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE code = ?1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(booking)
    }

    /// Transitions a booking's status, guarded by the expected current
    /// status.
    ///
    /// `rows_affected == 0` means the booking is gone or a concurrent
    /// transition won the race; the caller surfaces that as a conflict.
    pub async fn set_status(
        conn: &mut SqliteConnection,
        id: &str,
        expected: BookingStatus,
        to: BookingStatus,
    ) -> DbResult<bool> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE bookings SET status = ?1, updated_at = ?2
            WHERE id = ?3 AND status = ?4
            "#,
        )
        .bind(to)
        .bind(now)
        .bind(id)
        .bind(expected)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Flips the release-idempotence guard.
    ///
    /// Returns true only on the FIRST call for a booking; callers release
    /// ledger inventory only when this returns true, so a double cancel or
    /// a retried compensation can never double-release.
    pub async fn mark_inventory_released(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<bool> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE bookings SET inventory_released = 1, updated_at = ?1
            WHERE id = ?2 AND inventory_released = 0
            "#,
        )
        .bind(now)
        .bind(id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Records the physical room assigned at check-in.
    pub async fn assign_room(
        conn: &mut SqliteConnection,
        id: &str,
        room_id: &str,
    ) -> DbResult<()> {
        let now = Utc::now();
        sqlx::query("UPDATE bookings SET room_id = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(room_id)
            .bind(now)
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    /// Updates the derived payment status.
    pub async fn set_payment_status(&self, id: &str, status: PaymentStatus) -> DbResult<()> {
        let now = Utc::now();
        let result =
            sqlx::query("UPDATE bookings SET payment_status = ?1, updated_at = ?2 WHERE id = ?3")
                .bind(status)
                .bind(now)
                .bind(id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Booking", id));
        }

        Ok(())
    }

    /// Pending bookings created before `cutoff` whose inventory is still
    /// held - the sweeper's work queue.
    pub async fn find_expired_pending(
        &self,
        hotel_id: &str,
        cutoff: DateTime<Utc>,
    ) -> DbResult<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT * FROM bookings
            WHERE hotel_id = ?1
              AND status = 'pending'
              AND inventory_released = 0
              AND created_at < ?2
            ORDER BY created_at
            "#,
        )
        .bind(hotel_id)
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    // =========================================================================
    // Payments
    // =========================================================================

    /// Records a payment event reported by the payment collaborator.
    pub async fn record_payment(
        &self,
        booking_id: &str,
        amount_cents: i64,
        status: SettlementStatus,
        reference: Option<&str>,
    ) -> DbResult<PaymentRecord> {
        let record = PaymentRecord {
            id: Uuid::new_v4().to_string(),
            booking_id: booking_id.to_string(),
            amount_cents,
            status,
            reference: reference.map(str::to_string),
            created_at: Utc::now(),
        };

        debug!(booking_id, amount_cents, ?status, "Recording payment");

        sqlx::query(
            r#"
            INSERT INTO payments (id, booking_id, amount_cents, status, reference, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&record.id)
        .bind(&record.booking_id)
        .bind(record.amount_cents)
        .bind(record.status)
        .bind(&record.reference)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(record)
    }

    /// Gets all payment records for a booking, oldest first.
    pub async fn get_payments(&self, booking_id: &str) -> DbResult<Vec<PaymentRecord>> {
        let payments = sqlx::query_as::<_, PaymentRecord>(
            "SELECT * FROM payments WHERE booking_id = ?1 ORDER BY created_at",
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// Sums settled and refunded cents for a booking.
    pub async fn settled_totals(&self, booking_id: &str) -> DbResult<SettledTotals> {
        let settled: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(amount_cents) FROM payments WHERE booking_id = ?1 AND status = 'settled'",
        )
        .bind(booking_id)
        .fetch_one(&self.pool)
        .await?;

        let refunded: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(amount_cents) FROM payments WHERE booking_id = ?1 AND status = 'refunded'",
        )
        .bind(booking_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(SettledTotals {
            settled_cents: settled.unwrap_or(0),
            refunded_cents: refunded.unwrap_or(0),
        })
    }
}

/// One random code candidate: prefix + suffix from the phone-safe alphabet.
fn random_code() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..BOOKING_CODE_SUFFIX_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect();
    format!("{BOOKING_CODE_PREFIX}{suffix}")
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::test_support::{seed_hotel, seed_room_type, test_booking};

    async fn setup() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed_hotel(&db, "h1").await;
        seed_room_type(&db, "h1", "rt1", 5, 10000).await;
        db
    }

    #[test]
    fn test_random_code_shape() {
        let code = random_code();
        assert!(code.starts_with(BOOKING_CODE_PREFIX));
        assert_eq!(code.len(), BOOKING_CODE_PREFIX.len() + BOOKING_CODE_SUFFIX_LEN);
        // No ambiguous characters in the suffix
        assert!(!code[BOOKING_CODE_PREFIX.len()..]
            .chars()
            .any(|c| matches!(c, '0' | 'O' | '1' | 'I')));
    }

    #[tokio::test]
    async fn test_insert_and_fetch_by_code() {
        let db = setup().await;
        let repo = db.bookings();

        let code = repo.generate_code().await.unwrap();
        let booking = test_booking("b1", &code, "h1", "rt1");

        let mut conn = db.pool().acquire().await.unwrap();
        BookingRepository::insert(&mut conn, &booking).await.unwrap();
        drop(conn);

        let fetched = repo.get_by_code(&code).await.unwrap().unwrap();
        assert_eq!(fetched.id, "b1");
        assert_eq!(fetched.status, BookingStatus::Pending);
        assert!(!fetched.inventory_released);
    }

    #[tokio::test]
    async fn test_duplicate_code_is_unique_violation() {
        let db = setup().await;

        let booking = test_booking("b1", "BK-SAME", "h1", "rt1");
        let mut conn = db.pool().acquire().await.unwrap();
        BookingRepository::insert(&mut conn, &booking).await.unwrap();

        let duplicate = test_booking("b2", "BK-SAME", "h1", "rt1");
        let err = BookingRepository::insert(&mut conn, &duplicate)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_set_status_guards_on_expected() {
        let db = setup().await;
        let repo = db.bookings();

        let booking = test_booking("b1", "BK-AAAAAA", "h1", "rt1");
        let mut conn = db.pool().acquire().await.unwrap();
        BookingRepository::insert(&mut conn, &booking).await.unwrap();

        assert!(
            BookingRepository::set_status(
                &mut conn,
                "b1",
                BookingStatus::Pending,
                BookingStatus::Confirmed
            )
            .await
            .unwrap()
        );

        // Stale expectation loses the race
        assert!(
            !BookingRepository::set_status(
                &mut conn,
                "b1",
                BookingStatus::Pending,
                BookingStatus::Cancelled
            )
            .await
            .unwrap()
        );
        drop(conn);

        let fetched = repo.get("b1").await.unwrap().unwrap();
        assert_eq!(fetched.status, BookingStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_mark_inventory_released_is_one_shot() {
        let db = setup().await;

        let booking = test_booking("b1", "BK-BBBBBB", "h1", "rt1");
        let mut conn = db.pool().acquire().await.unwrap();
        BookingRepository::insert(&mut conn, &booking).await.unwrap();

        assert!(BookingRepository::mark_inventory_released(&mut conn, "b1")
            .await
            .unwrap());
        assert!(!BookingRepository::mark_inventory_released(&mut conn, "b1")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_payments_and_totals() {
        let db = setup().await;
        let repo = db.bookings();

        let booking = test_booking("b1", "BK-CCCCCC", "h1", "rt1");
        let mut conn = db.pool().acquire().await.unwrap();
        BookingRepository::insert(&mut conn, &booking).await.unwrap();
        drop(conn);

        repo.record_payment("b1", 12000, SettlementStatus::Settled, Some("tx-1"))
            .await
            .unwrap();
        repo.record_payment("b1", 8000, SettlementStatus::Settled, Some("tx-2"))
            .await
            .unwrap();
        repo.record_payment("b1", 5000, SettlementStatus::Refunded, None)
            .await
            .unwrap();

        let totals = repo.settled_totals("b1").await.unwrap();
        assert_eq!(totals.settled_cents, 20000);
        assert_eq!(totals.refunded_cents, 5000);

        assert_eq!(repo.get_payments("b1").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_find_expired_pending() {
        let db = setup().await;
        let repo = db.bookings();

        let mut old = test_booking("b-old", "BK-DDDDDD", "h1", "rt1");
        old.created_at = Utc::now() - chrono::Duration::hours(2);
        let mut fresh = test_booking("b-new", "BK-EEEEEE", "h1", "rt1");
        fresh.created_at = Utc::now();

        let mut conn = db.pool().acquire().await.unwrap();
        BookingRepository::insert(&mut conn, &old).await.unwrap();
        BookingRepository::insert(&mut conn, &fresh).await.unwrap();
        drop(conn);

        let cutoff = Utc::now() - chrono::Duration::minutes(30);
        let expired = repo.find_expired_pending("h1", cutoff).await.unwrap();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].id, "b-old");
    }
}
