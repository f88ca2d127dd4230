//! # Booking State Machine
//!
//! Governs the lifecycle of a single reservation and names the inventory
//! side effect each legal transition carries.
//!
//! ## Transitions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   pending ──────► confirmed ──────► checked_in ──────► checked_out     │
//! │      │                │  │                                              │
//! │      │                │  └──────► no_show   (inventory RETAINED)       │
//! │      │                │                                                 │
//! │      └────────────────┴──────► cancelled    (inventory RELEASED)       │
//! │                                                                         │
//! │   checked_out / cancelled / no_show are terminal.                      │
//! │                                                                         │
//! │   no_show deliberately differs from cancelled: the room was held and   │
//! │   unsold, so the ledger keeps the nights consumed.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The transition function is pure; the orchestrator applies the returned
//! effect against the ledger and room repositories transactionally.

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{BookingStatus, CancellationPolicy, RateBps};

// =============================================================================
// Transition Effects
// =============================================================================

/// The inventory/room side effect a legal transition requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionEffect {
    /// No inventory change (e.g. pending → confirmed: the span was already
    /// reserved at creation).
    None,

    /// Return the booking's reserved span to the ledger - exactly once,
    /// guarded by the booking's `inventory_released` flag.
    ReleaseInventory,

    /// Assign a clean physical room of the booked type.
    AssignRoom,

    /// Send the physical room to housekeeping. The ledger is untouched:
    /// the nights are historical, already consumed.
    ReleaseRoomToCleaning,

    /// Keep the ledger as-is: the room was held and unsold.
    RetainInventory,
}

/// Validates a state transition and returns its side effect.
///
/// Terminal states reject everything, which is what makes a double cancel a
/// `BookingConflict` rather than a silent double release.
pub fn transition(
    booking_id: &str,
    from: BookingStatus,
    to: BookingStatus,
) -> CoreResult<TransitionEffect> {
    use BookingStatus::*;

    let effect = match (from, to) {
        (Pending, Confirmed) => TransitionEffect::None,
        (Pending, Cancelled) | (Confirmed, Cancelled) => TransitionEffect::ReleaseInventory,
        (Confirmed, CheckedIn) => TransitionEffect::AssignRoom,
        (CheckedIn, CheckedOut) => TransitionEffect::ReleaseRoomToCleaning,
        (Confirmed, NoShow) => TransitionEffect::RetainInventory,
        (from, to) => {
            return Err(CoreError::BookingConflict {
                booking_id: booking_id.to_string(),
                from,
                to,
            })
        }
    };

    Ok(effect)
}

// =============================================================================
// Cancellation Penalty
// =============================================================================

/// Moderate policy forfeits half the quoted total inside the window.
const MODERATE_PENALTY_BPS: u32 = 5000;

/// Computes the cancellation penalty for a booking.
///
/// Pure function of policy + (now − check-in); surfaced to the caller but
/// not enforced by the ledger. Check-in is taken as midnight UTC of the
/// arrival day.
///
/// | Policy         | Inside window        | Outside window |
/// |----------------|----------------------|----------------|
/// | flexible       | nothing              | nothing        |
/// | moderate       | 50% of quoted total  | nothing        |
/// | strict         | 100% of quoted total | nothing        |
/// | non_refundable | 100% of quoted total | 100%           |
pub fn cancellation_penalty(
    policy: CancellationPolicy,
    cancellation_hours: i64,
    quoted_total: Money,
    now: DateTime<Utc>,
    check_in: NaiveDate,
) -> Money {
    if policy == CancellationPolicy::NonRefundable {
        return quoted_total;
    }

    let check_in_at = check_in.and_time(chrono::NaiveTime::MIN).and_utc();
    let hours_to_check_in = (check_in_at - now).num_hours();
    let inside_window = hours_to_check_in < cancellation_hours;

    if !inside_window {
        return Money::zero();
    }

    match policy {
        CancellationPolicy::Flexible => Money::zero(),
        CancellationPolicy::Moderate => {
            quoted_total.apply_rate(RateBps::from_bps(MODERATE_PENALTY_BPS))
        }
        CancellationPolicy::Strict => quoted_total,
        CancellationPolicy::NonRefundable => quoted_total,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
