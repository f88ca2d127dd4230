//! # Error Types
//!
//! Domain-specific error types for atrium-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  atrium-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule / lifecycle failures             │
//! │  └── ValidationError  - Malformed input, caught before the ledger      │
//! │                                                                         │
//! │  atrium-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  atrium-engine errors                                                  │
//! │  └── EngineError      - Core | Db, what callers match on               │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → caller              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (booking code, date, counts)
//! 3. Errors are enum variants, never String
//! 4. Pre-commit failures are side-effect free; callers may retry with
//!    different parameters

use chrono::NaiveDate;
use thiserror::Error;

use crate::types::BookingStatus;

// =============================================================================
// Restriction Rules
// =============================================================================

/// Which stay restriction a request breached. Carried inside
/// [`CoreError::RateRestrictionViolation`] so callers can explain the
/// rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestrictionRule {
    /// Stay shorter than the arrival day's minimum.
    MinStay { required: i64, requested: i64 },
    /// Stay longer than the arrival day's maximum.
    MaxStay { allowed: i64, requested: i64 },
    /// Arrival lands on a closed-to-arrival day.
    ClosedToArrival,
    /// Departure lands on a closed-to-departure day.
    ClosedToDeparture,
    /// A night in the span is stop-sell.
    StopSell,
}

impl std::fmt::Display for RestrictionRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RestrictionRule::MinStay {
                required,
                requested,
            } => write!(f, "minimum stay is {required} nights, requested {requested}"),
            RestrictionRule::MaxStay { allowed, requested } => {
                write!(f, "maximum stay is {allowed} nights, requested {requested}")
            }
            RestrictionRule::ClosedToArrival => write!(f, "closed to arrival"),
            RestrictionRule::ClosedToDeparture => write!(f, "closed to departure"),
            RestrictionRule::StopSell => write!(f, "stop-sell"),
        }
    }
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These represent business rule violations or lifecycle failures. All of
/// them are raised before - or instead of - any ledger mutation, except
/// [`CoreError::PaymentFailed`] which is surfaced post-commit, after the
/// compensating release has been applied.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Inventory exhausted on at least one night of the requested span.
    ///
    /// The all-or-nothing reserve guarantees no other night was decremented.
    #[error(
        "room type {room_type_id} not available on {date}: requested {requested}, available {available}"
    )]
    RoomNotAvailable {
        room_type_id: String,
        date: NaiveDate,
        requested: i64,
        available: i64,
    },

    /// A stay restriction (min/max stay, closed day, stop-sell) rejected the
    /// request before any inventory was touched.
    #[error("rate restriction violated on {date}: {rule}")]
    RateRestrictionViolation { date: NaiveDate, rule: RestrictionRule },

    /// The ledger shows availability but no physical room of the type is
    /// presently clean - check-in cannot assign a unit.
    #[error("no clean room of type {room_type_id} available for check-in")]
    NoCleanRoom { room_type_id: String },

    /// An illegal state-machine transition was attempted.
    #[error("booking {booking_id} is {from:?}, cannot transition to {to:?}")]
    BookingConflict {
        booking_id: String,
        from: BookingStatus,
        to: BookingStatus,
    },

    /// No-show cannot be assessed before the arrival day has begun.
    #[error("booking {booking_id} cannot be marked no-show before check-in on {check_in}")]
    NoShowBeforeCheckIn {
        booking_id: String,
        check_in: NaiveDate,
    },

    /// A failed settlement expired the pending hold: the booking was
    /// cancelled and its inventory released by the compensating path.
    #[error("payment failed for booking {booking_id}: {reason}")]
    PaymentFailed { booking_id: String, reason: String },

    /// Booking lookup by id or code found nothing.
    #[error("booking not found: {0}")]
    BookingNotFound(String),

    /// Validation error (wraps ValidationError).
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Caught before business logic runs; they never leave side effects.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// `check_out` must be strictly after `check_in` (at least one night).
    #[error("invalid date range: check-in {check_in} must be before check-out {check_out}")]
    InvalidDateRange {
        check_in: NaiveDate,
        check_out: NaiveDate,
    },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Party size exceeds the room type's cap.
    #[error("occupancy {requested} exceeds maximum of {max} for this room type")]
    OccupancyExceeded { requested: i64, max: i64 },

    /// Invalid format (e.g., invalid UUID, invalid booking code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::RoomNotAvailable {
            room_type_id: "deluxe".to_string(),
            date: "2024-06-02".parse().unwrap(),
            requested: 1,
            available: 0,
        };
        assert_eq!(
            err.to_string(),
            "room type deluxe not available on 2024-06-02: requested 1, available 0"
        );
    }

    #[test]
    fn test_restriction_rule_display() {
        let err = CoreError::RateRestrictionViolation {
            date: "2024-06-01".parse().unwrap(),
            rule: RestrictionRule::MinStay {
                required: 3,
                requested: 2,
            },
        };
        assert_eq!(
            err.to_string(),
            "rate restriction violated on 2024-06-01: minimum stay is 3 nights, requested 2"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "adults".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
