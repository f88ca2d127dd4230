//! # Room Repository
//!
//! Database operations for room types, seasonal rate windows, and physical
//! rooms.
//!
//! Room types are the pricing/capacity templates the ledger and the pricing
//! calculator read. Physical rooms matter only at check-in time, when a
//! clean unit of the booked type gets assigned to the guest.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use atrium_core::{Room, RoomStatus, RoomType, SeasonalRate};

/// Repository for room-type and physical-room operations.
#[derive(Debug, Clone)]
pub struct RoomRepository {
    pool: SqlitePool,
}

impl RoomRepository {
    /// Creates a new RoomRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RoomRepository { pool }
    }

    // =========================================================================
    // Room types
    // =========================================================================

    /// Gets a room type by ID.
    pub async fn find_room_type(&self, id: &str) -> DbResult<Option<RoomType>> {
        let room_type = sqlx::query_as::<_, RoomType>("SELECT * FROM room_types WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(room_type)
    }

    /// Active room types for a hotel.
    pub async fn list_room_types(&self, hotel_id: &str) -> DbResult<Vec<RoomType>> {
        let room_types = sqlx::query_as::<_, RoomType>(
            "SELECT * FROM room_types WHERE hotel_id = ?1 AND is_active = 1 ORDER BY name",
        )
        .bind(hotel_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(room_types)
    }

    /// Inserts a room type.
    pub async fn insert_room_type(&self, room_type: &RoomType) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO room_types (
                id, hotel_id, name,
                base_price_cents, weekend_price_cents,
                extra_person_charge_cents, child_charge_cents,
                base_occupancy, max_occupancy, total_rooms, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&room_type.id)
        .bind(&room_type.hotel_id)
        .bind(&room_type.name)
        .bind(room_type.base_price_cents)
        .bind(room_type.weekend_price_cents)
        .bind(room_type.extra_person_charge_cents)
        .bind(room_type.child_charge_cents)
        .bind(room_type.base_occupancy)
        .bind(room_type.max_occupancy)
        .bind(room_type.total_rooms)
        .bind(room_type.is_active)
        .bind(room_type.created_at)
        .bind(room_type.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // =========================================================================
    // Seasonal rate windows
    // =========================================================================

    /// Seasonal windows for a room type, in definition order.
    ///
    /// The pricing calculator resolves overlaps to the highest position, so
    /// the ordering here is a convenience, not a correctness requirement.
    pub async fn seasonal_rates(&self, room_type_id: &str) -> DbResult<Vec<SeasonalRate>> {
        let rates = sqlx::query_as::<_, SeasonalRate>(
            "SELECT * FROM seasonal_rates WHERE room_type_id = ?1 ORDER BY position",
        )
        .bind(room_type_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rates)
    }

    /// Inserts a seasonal rate window.
    pub async fn insert_seasonal_rate(&self, rate: &SeasonalRate) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO seasonal_rates (id, room_type_id, name, start_date, end_date, price_cents, position)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&rate.id)
        .bind(&rate.room_type_id)
        .bind(&rate.name)
        .bind(rate.start_date)
        .bind(rate.end_date)
        .bind(rate.price_cents)
        .bind(rate.position)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // =========================================================================
    // Physical rooms
    // =========================================================================

    /// Gets a room by ID.
    pub async fn find_room(&self, id: &str) -> DbResult<Option<Room>> {
        let room = sqlx::query_as::<_, Room>("SELECT * FROM rooms WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(room)
    }

    /// Inserts a physical room.
    pub async fn insert_room(&self, room: &Room) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO rooms (id, hotel_id, room_type_id, room_number, status,
                               current_booking_id, current_guest_id, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&room.id)
        .bind(&room.hotel_id)
        .bind(&room.room_type_id)
        .bind(&room.room_number)
        .bind(room.status)
        .bind(&room.current_booking_id)
        .bind(&room.current_guest_id)
        .bind(room.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// First clean, assignable room of the given type. Lowest room number
    /// wins so assignment is deterministic.
    pub async fn find_available_room(
        &self,
        hotel_id: &str,
        room_type_id: &str,
    ) -> DbResult<Option<Room>> {
        let room = sqlx::query_as::<_, Room>(
            r#"
            SELECT * FROM rooms
            WHERE hotel_id = ?1 AND room_type_id = ?2 AND status = 'available'
            ORDER BY room_number
            LIMIT 1
            "#,
        )
        .bind(hotel_id)
        .bind(room_type_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(room)
    }

    /// Marks a room occupied by a guest, guarded on it still being
    /// available.
    ///
    /// Runs on the caller's transaction so the room claim and the booking's
    /// status transition commit together.
    pub async fn occupy(
        conn: &mut SqliteConnection,
        room_id: &str,
        booking_id: &str,
        guest_id: &str,
    ) -> DbResult<bool> {
        debug!(room_id, booking_id, "Occupying room");

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE rooms
            SET status = 'occupied', current_booking_id = ?1, current_guest_id = ?2,
                updated_at = ?3
            WHERE id = ?4 AND status = 'available'
            "#,
        )
        .bind(booking_id)
        .bind(guest_id)
        .bind(now)
        .bind(room_id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Releases a room to housekeeping after check-out.
    pub async fn release_to_cleaning(conn: &mut SqliteConnection, room_id: &str) -> DbResult<()> {
        debug!(room_id, "Releasing room to housekeeping");

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE rooms
            SET status = 'cleaning', current_booking_id = NULL, current_guest_id = NULL,
                updated_at = ?1
            WHERE id = ?2
            "#,
        )
        .bind(now)
        .bind(room_id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Room", room_id));
        }

        Ok(())
    }

    /// Sets a room's housekeeping status directly (front-desk tooling).
    pub async fn set_status(&self, room_id: &str, status: RoomStatus) -> DbResult<()> {
        let now = Utc::now();
        let result = sqlx::query("UPDATE rooms SET status = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(status)
            .bind(now)
            .bind(room_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Room", room_id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
