//! # Atrium Database Layer
//!
//! SQLite persistence for the Atrium reservation engine.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          atrium-db                                      │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────────────────┐  │
//! │  │   pool.rs    │  │ migrations.rs│  │        repository/           │  │
//! │  │  ──────────  │  │  ──────────  │  │  ──────────────────────────  │  │
//! │  │  Database    │  │  embedded    │  │  availability (the ledger)   │  │
//! │  │  DbConfig    │  │  SQL files   │  │  booking + payments          │  │
//! │  │  WAL, FKs    │  │              │  │  room / room types / rates   │  │
//! │  └──────────────┘  └──────────────┘  │  hotel settings              │  │
//! │                                      └──────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Storage Conventions
//! - TEXT UUIDs for primary keys, TEXT ISO dates, TEXT RFC3339 timestamps
//! - Integer cents for money, 0/1 integers for booleans
//! - Enums stored as snake_case TEXT
//!
//! All domain types live in `atrium-core`; this crate only knows how to
//! persist them and how to keep the ledger's derivation invariant true
//! inside every mutating statement.

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::{
    AvailabilityRepository, BookingRepository, DayDefaults, DayRateUpdate, HotelRepository,
    ReserveOutcome, RoomRepository, SettledTotals,
};
