//! # atrium-core: Pure Business Logic for Atrium
//!
//! This crate is the **heart** of the inventory and reservation engine. It
//! contains all business rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Atrium Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Calling layer (HTTP controllers, out of scope)     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    atrium-engine                                │   │
//! │  │    book, cancel, check_in, check_out, no_show, payment hook    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ atrium-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  pricing  │  │ lifecycle │  │ validation│  │   │
//! │  │   │  Booking  │  │   Quote   │  │  states   │  │restriction│  │   │
//! │  │   │  Ledger   │  │precedence │  │ penalties │  │   checks  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    atrium-db (Database Layer)                   │   │
//! │  │        SQLite availability ledger, bookings, rooms              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (AvailabilityRecord, Booking, RoomType, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`pricing`] - The pricing calculator and quote itemization
//! - [`lifecycle`] - The booking state machine and penalty math
//! - [`validation`] - Input validation and stay-restriction checks
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - time is an input
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64)
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod lifecycle;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use atrium_core::Money` instead of
// `use atrium_core::money::Money`

pub use error::{CoreError, CoreResult, RestrictionRule, ValidationError};
pub use lifecycle::{cancellation_penalty, transition, TransitionEffect};
pub use money::Money;
pub use pricing::{price_stay, Occupancy, Quote, RateSource};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Prefix for human-speakable booking codes ("BK-XXXXXX").
///
/// Codes must be unique platform-wide and are collision-checked on
/// generation; the random suffix uses an alphabet without 0/O/1/I so they
/// survive being read out over the phone.
pub const BOOKING_CODE_PREFIX: &str = "BK-";

/// Length of the random alphanumeric suffix in a booking code.
pub const BOOKING_CODE_SUFFIX_LEN: usize = 6;

/// Longest stay the engine accepts, in nights.
///
/// Guards against typo'd year-long reservations locking up a span of
/// inventory; genuinely long stays are booked back-to-back.
pub const MAX_STAY_NIGHTS: i64 = 365;
