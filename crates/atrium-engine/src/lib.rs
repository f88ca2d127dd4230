//! # Atrium Reservation Engine
//!
//! The orchestration layer of Atrium: composes the pure rules in
//! `atrium-core` with the availability ledger in `atrium-db` into the
//! operations callers invoke.
//!
//! ## Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          atrium-engine                                  │
//! │                                                                         │
//! │  Engine::book()            validate → quote → reserve+insert (one tx)  │
//! │  Engine::availability()    read-only calendar with resolved rates      │
//! │  Engine::confirm()         pending → confirmed                         │
//! │  Engine::cancel()          release span once, report penalty           │
//! │  Engine::check_in()        assign a clean physical room                │
//! │  Engine::check_out()       room → housekeeping, ledger untouched       │
//! │  Engine::mark_no_show()    terminal, ledger retained by design         │
//! │  Engine::on_payment_settled()  payment records + compensation          │
//! │                                                                         │
//! │  HoldSweeper               background expiry of lapsed pending holds   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Only this crate composes multi-repository transactions; the repositories
//! expose connection-taking functions exactly for that purpose.

pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod sweeper;

pub use engine::{BookingWithQuote, DayAvailability, Engine, StayRequest};
pub use error::{EngineError, EngineResult};
pub use lifecycle::CancellationOutcome;
pub use sweeper::{HoldSweeper, HoldSweeperHandle, SweeperConfig};
