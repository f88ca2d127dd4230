//! # Repository Layer
//!
//! Data access repositories for all Atrium entities.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Repository Pattern                               │
//! │                                                                         │
//! │  atrium-engine                                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Repository (this layer) - owns SQL, returns atrium-core types          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (via sqlx)                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Transaction Convention
//! Plain reads and standalone writes take `&self` and run on the pool.
//! Mutations that must share an atomic boundary with other mutations (the
//! ledger reserve + booking insert, a status transition + room claim) are
//! associated functions taking `&mut SqliteConnection`, so the engine can
//! thread one transaction through all of them and commit or roll back as a
//! unit.

pub mod availability;
pub mod booking;
pub mod hotel;
pub mod room;

pub use availability::{AvailabilityRepository, DayDefaults, DayRateUpdate, ReserveOutcome};
pub use booking::{BookingRepository, SettledTotals};
pub use hotel::HotelRepository;
pub use room::RoomRepository;

// =============================================================================
// Test Support
// =============================================================================
