//! # Hotel Repository
//!
//! Database operations for hotel-level settings.
//!
//! The engine reads these settings on every reservation (tax and service
//! rates, auto-confirm, cancellation policy, pending-hold window). Full
//! property CRUD lives in the management surface, not here.

use sqlx::SqlitePool;

use crate::error::{DbError, DbResult};
use atrium_core::Hotel;

/// Repository for hotel settings.
#[derive(Debug, Clone)]
pub struct HotelRepository {
    pool: SqlitePool,
}

impl HotelRepository {
    /// Creates a new HotelRepository.
    pub fn new(pool: SqlitePool) -> Self {
        HotelRepository { pool }
    }

    /// Gets a hotel by ID.
    pub async fn find(&self, id: &str) -> DbResult<Option<Hotel>> {
        let hotel = sqlx::query_as::<_, Hotel>("SELECT * FROM hotels WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(hotel)
    }

    /// Gets a hotel by ID, failing when it is missing.
    pub async fn get(&self, id: &str) -> DbResult<Hotel> {
        self.find(id)
            .await?
            .ok_or_else(|| DbError::not_found("Hotel", id))
    }

    /// All hotels on the platform, for the sweeper's per-hotel pass.
    pub async fn list(&self) -> DbResult<Vec<Hotel>> {
        let hotels = sqlx::query_as::<_, Hotel>("SELECT * FROM hotels ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(hotels)
    }

    /// Inserts a hotel.
    pub async fn insert(&self, hotel: &Hotel) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO hotels (
                id, name, tax_rate_bps, service_charge_bps,
                auto_confirm_bookings, cancellation_policy, cancellation_hours,
                pending_hold_minutes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&hotel.id)
        .bind(&hotel.name)
        .bind(hotel.tax_rate_bps)
        .bind(hotel.service_charge_bps)
        .bind(hotel.auto_confirm_bookings)
        .bind(hotel.cancellation_policy)
        .bind(hotel.cancellation_hours)
        .bind(hotel.pending_hold_minutes)
        .bind(hotel.created_at)
        .bind(hotel.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
