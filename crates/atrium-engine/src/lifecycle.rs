//! # Booking Lifecycle Operations
//!
//! Applies the pure state machine in `atrium_core::lifecycle` against the
//! database: every transition is validated first, then executed inside a
//! transaction with its inventory/room side effect.
//!
//! ## Guard Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every transition is double-checked:                                    │
//! │                                                                         │
//! │  1. transition(from, to)     - pure rejection of illegal moves          │
//! │  2. UPDATE ... WHERE status = from                                      │
//! │        rows_affected == 0 → a concurrent transition won; rollback and  │
//! │        report BookingConflict with the status that actually holds      │
//! │                                                                         │
//! │  Inventory release is additionally guarded by inventory_released:      │
//! │  the flag flips exactly once, so cancel / payment-failure / sweeper    │
//! │  can all race toward the same release and the ledger still only gets   │
//! │  it back once.                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use tracing::{error, info, warn};

use atrium_core::{
    cancellation_penalty, derive_payment_status, transition, Booking, BookingStatus, CoreError,
    Money, SettlementStatus, TransitionEffect,
};
use atrium_db::{AvailabilityRepository, BookingRepository, DbError, RoomRepository};

use crate::engine::Engine;
use crate::error::EngineResult;

/// Result of a cancellation: the terminal booking plus the penalty the
/// hotel's policy assessed. The penalty is surfaced, not collected - the
/// engine owns no deposit ledger.
#[derive(Debug, Clone)]
pub struct CancellationOutcome {
    pub booking: Booking,
    pub penalty: Money,
}

impl Engine {
    /// Confirms a pending booking. No inventory change: the span was
    /// reserved at creation.
    pub async fn confirm(&self, booking_id: &str) -> EngineResult<Booking> {
        let booking = self.get_booking(booking_id).await?;
        let effect = transition(&booking.id, booking.status, BookingStatus::Confirmed)?;
        debug_assert_eq!(effect, TransitionEffect::None);

        let mut tx = self.db_pool().begin().await.map_err(DbError::from)?;
        if !BookingRepository::set_status(
            &mut tx,
            &booking.id,
            booking.status,
            BookingStatus::Confirmed,
        )
        .await?
        {
            tx.rollback().await.map_err(DbError::from)?;
            return Err(self.transition_conflict(&booking.id, BookingStatus::Confirmed).await?);
        }
        tx.commit().await.map_err(DbError::from)?;

        info!(code = %booking.code, "Booking confirmed");
        self.get_booking(booking_id).await
    }

    /// Cancels a pending or confirmed booking, returning its span to the
    /// ledger exactly once and reporting the policy penalty.
    pub async fn cancel(&self, booking_id: &str) -> EngineResult<CancellationOutcome> {
        let booking = self.get_booking(booking_id).await?;
        let effect = transition(&booking.id, booking.status, BookingStatus::Cancelled)?;
        debug_assert_eq!(effect, TransitionEffect::ReleaseInventory);

        let hotel = self.database().hotels().get(&booking.hotel_id).await?;
        let penalty = cancellation_penalty(
            hotel.cancellation_policy,
            hotel.cancellation_hours,
            booking.quoted_total(),
            Utc::now(),
            booking.check_in,
        );

        let mut tx = self.db_pool().begin().await.map_err(DbError::from)?;
        if !BookingRepository::set_status(
            &mut tx,
            &booking.id,
            booking.status,
            BookingStatus::Cancelled,
        )
        .await?
        {
            tx.rollback().await.map_err(DbError::from)?;
            return Err(self.transition_conflict(&booking.id, BookingStatus::Cancelled).await?);
        }

        if BookingRepository::mark_inventory_released(&mut tx, &booking.id).await? {
            AvailabilityRepository::release(
                &mut tx,
                &booking.hotel_id,
                &booking.room_type_id,
                &booking.range(),
                1,
            )
            .await?;
        }
        tx.commit().await.map_err(DbError::from)?;

        info!(
            code = %booking.code,
            penalty_cents = penalty.cents(),
            "Booking cancelled, inventory released"
        );

        let booking = self.get_booking(booking_id).await?;
        Ok(CancellationOutcome { booking, penalty })
    }

    /// Checks a confirmed guest in, assigning a clean physical room of the
    /// booked type.
    ///
    /// The ledger can show availability while zero units are presently
    /// clean; that case is [`CoreError::NoCleanRoom`], distinct from
    /// no-inventory.
    pub async fn check_in(&self, booking_id: &str) -> EngineResult<Booking> {
        let booking = self.get_booking(booking_id).await?;
        let effect = transition(&booking.id, booking.status, BookingStatus::CheckedIn)?;
        debug_assert_eq!(effect, TransitionEffect::AssignRoom);

        let room = self
            .database()
            .rooms()
            .find_available_room(&booking.hotel_id, &booking.room_type_id)
            .await?
            .ok_or_else(|| CoreError::NoCleanRoom {
                room_type_id: booking.room_type_id.clone(),
            })?;

        let mut tx = self.db_pool().begin().await.map_err(DbError::from)?;
        if !BookingRepository::set_status(
            &mut tx,
            &booking.id,
            booking.status,
            BookingStatus::CheckedIn,
        )
        .await?
        {
            tx.rollback().await.map_err(DbError::from)?;
            return Err(self.transition_conflict(&booking.id, BookingStatus::CheckedIn).await?);
        }
        if !RoomRepository::occupy(&mut tx, &room.id, &booking.id, &booking.guest_id).await? {
            // Another check-in claimed the room between the read and the
            // guarded update
            tx.rollback().await.map_err(DbError::from)?;
            return Err(CoreError::NoCleanRoom {
                room_type_id: booking.room_type_id.clone(),
            }
            .into());
        }
        BookingRepository::assign_room(&mut tx, &booking.id, &room.id).await?;
        tx.commit().await.map_err(DbError::from)?;

        info!(code = %booking.code, room = %room.room_number, "Guest checked in");
        self.get_booking(booking_id).await
    }

    /// Checks a guest out: the room goes to housekeeping, the ledger is
    /// untouched - the nights are consumed history.
    pub async fn check_out(&self, booking_id: &str) -> EngineResult<Booking> {
        let booking = self.get_booking(booking_id).await?;
        let effect = transition(&booking.id, booking.status, BookingStatus::CheckedOut)?;
        debug_assert_eq!(effect, TransitionEffect::ReleaseRoomToCleaning);

        let mut tx = self.db_pool().begin().await.map_err(DbError::from)?;
        if !BookingRepository::set_status(
            &mut tx,
            &booking.id,
            booking.status,
            BookingStatus::CheckedOut,
        )
        .await?
        {
            tx.rollback().await.map_err(DbError::from)?;
            return Err(self.transition_conflict(&booking.id, BookingStatus::CheckedOut).await?);
        }
        if let Some(room_id) = &booking.room_id {
            RoomRepository::release_to_cleaning(&mut tx, room_id).await?;
        }
        tx.commit().await.map_err(DbError::from)?;

        info!(code = %booking.code, "Guest checked out");
        self.get_booking(booking_id).await
    }

    /// Marks a confirmed booking no-show. The ledger keeps the nights
    /// consumed: the room was held and unsold.
    ///
    /// Only assessable once the arrival day has begun (midnight UTC of
    /// `check_in`) - before that the guest is simply not here yet.
    pub async fn mark_no_show(&self, booking_id: &str) -> EngineResult<Booking> {
        let booking = self.get_booking(booking_id).await?;
        let effect = transition(&booking.id, booking.status, BookingStatus::NoShow)?;
        debug_assert_eq!(effect, TransitionEffect::RetainInventory);

        let arrival = booking.check_in.and_time(chrono::NaiveTime::MIN).and_utc();
        if Utc::now() < arrival {
            return Err(CoreError::NoShowBeforeCheckIn {
                booking_id: booking.id.clone(),
                check_in: booking.check_in,
            }
            .into());
        }

        let mut tx = self.db_pool().begin().await.map_err(DbError::from)?;
        if !BookingRepository::set_status(
            &mut tx,
            &booking.id,
            booking.status,
            BookingStatus::NoShow,
        )
        .await?
        {
            tx.rollback().await.map_err(DbError::from)?;
            return Err(self.transition_conflict(&booking.id, BookingStatus::NoShow).await?);
        }
        tx.commit().await.map_err(DbError::from)?;

        info!(code = %booking.code, "Booking marked no-show, inventory retained");
        self.get_booking(booking_id).await
    }

    /// Callback from the payment collaborator: records the settlement event
    /// and re-derives the booking's payment status. Never touches inventory
    /// directly.
    ///
    /// A `failed` settlement on a still-pending booking triggers the
    /// compensating cancel + release and is reported as
    /// [`CoreError::PaymentFailed`] so the caller knows the hold is gone.
    /// If that compensation itself fails the error is returned for the
    /// caller to retry - a pending booking holding inventory with a failed
    /// payment is exactly the state that must not linger.
    pub async fn on_payment_settled(
        &self,
        booking_id: &str,
        amount_cents: i64,
        status: SettlementStatus,
        reference: Option<&str>,
    ) -> EngineResult<Booking> {
        let booking = self.get_booking(booking_id).await?;
        let bookings = self.database().bookings();

        bookings
            .record_payment(&booking.id, amount_cents, status, reference)
            .await?;
        let totals = bookings.settled_totals(&booking.id).await?;
        let derived = derive_payment_status(
            booking.quoted_total_cents,
            totals.settled_cents,
            totals.refunded_cents,
        );
        bookings.set_payment_status(&booking.id, derived).await?;

        info!(
            code = %booking.code,
            amount_cents,
            ?status,
            payment_status = ?derived,
            "Payment event recorded"
        );

        if status == SettlementStatus::Failed && booking.status == BookingStatus::Pending {
            warn!(code = %booking.code, "Payment failed on pending booking, compensating");
            match self.expire_pending(&booking).await {
                Ok(true) => {
                    info!(code = %booking.code, "Pending booking cancelled after failed payment");
                    return Err(CoreError::PaymentFailed {
                        booking_id: booking.id.clone(),
                        reason: "settlement declined, pending hold released".to_string(),
                    }
                    .into());
                }
                Ok(false) => {
                    // A concurrent transition (confirm, sweeper) already
                    // moved the booking; nothing left to compensate
                }
                Err(err) => {
                    error!(
                        code = %booking.code,
                        %err,
                        "Compensating release failed, inventory may be stuck"
                    );
                    return Err(err);
                }
            }
        }

        self.get_booking(booking_id).await
    }

    /// Expires a pending booking: cancel + guarded release in one
    /// transaction. Shared by the payment-failure compensation and the hold
    /// sweeper.
    ///
    /// Returns false when the booking is no longer pending (a concurrent
    /// transition won); that is not an error.
    pub(crate) async fn expire_pending(&self, booking: &Booking) -> EngineResult<bool> {
        let mut tx = self.db_pool().begin().await.map_err(DbError::from)?;
        if !BookingRepository::set_status(
            &mut tx,
            &booking.id,
            BookingStatus::Pending,
            BookingStatus::Cancelled,
        )
        .await?
        {
            tx.rollback().await.map_err(DbError::from)?;
            return Ok(false);
        }
        if BookingRepository::mark_inventory_released(&mut tx, &booking.id).await? {
            AvailabilityRepository::release(
                &mut tx,
                &booking.hotel_id,
                &booking.room_type_id,
                &booking.range(),
                1,
            )
            .await?;
        }
        tx.commit().await.map_err(DbError::from)?;
        Ok(true)
    }

    fn db_pool(&self) -> &sqlx::SqlitePool {
        self.database().pool()
    }

    /// Builds the conflict error for a lost status-guard race, reporting
    /// the status that actually holds now.
    async fn transition_conflict(
        &self,
        booking_id: &str,
        to: BookingStatus,
    ) -> EngineResult<crate::error::EngineError> {
        let current = self.get_booking(booking_id).await?;
        Ok(CoreError::BookingConflict {
            booking_id: booking_id.to_string(),
            from: current.status,
            to,
        }
        .into())
    }
}
