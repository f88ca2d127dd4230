//! # Pending-Hold Sweeper
//!
//! Expires `pending` bookings whose hold window lapsed, returning their
//! inventory to the ledger through the same guarded release path as a
//! cancellation.
//!
//! ## Sweep Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       HoldSweeper Flow                                  │
//! │                                                                         │
//! │  Every poll interval:                                                   │
//! │                                                                         │
//! │  for each hotel:                                                        │
//! │      cutoff = now − hotel.pending_hold_minutes                         │
//! │                                                                         │
//! │      SELECT bookings WHERE status = 'pending'                          │
//! │         AND inventory_released = 0 AND created_at < cutoff             │
//! │                                                                         │
//! │      for each expired booking:                                         │
//! │          one transaction:                                              │
//! │            status pending → cancelled  (guarded - a concurrent        │
//! │               confirm() wins the race and the sweep skips it)          │
//! │            flip inventory_released, release the span                   │
//! │                                                                         │
//! │  Individual failures are logged and skipped; the next tick retries.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::engine::Engine;
use crate::error::EngineResult;

// =============================================================================
// Configuration
// =============================================================================

/// Sweeper configuration.
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    /// How often to scan for expired holds.
    pub poll_interval: Duration,
}

impl SweeperConfig {
    /// Sets the poll interval.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

impl Default for SweeperConfig {
    fn default() -> Self {
        SweeperConfig {
            poll_interval: Duration::from_secs(60),
        }
    }
}

// =============================================================================
// Sweeper
// =============================================================================

/// Background task expiring lapsed pending holds.
pub struct HoldSweeper {
    engine: Engine,
    config: SweeperConfig,
    shutdown_rx: mpsc::Receiver<()>,
}

/// Handle for controlling a running sweeper.
#[derive(Clone)]
pub struct HoldSweeperHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl HoldSweeperHandle {
    /// Triggers graceful shutdown. The sweeper finishes its current pass
    /// first.
    pub async fn shutdown(&self) {
        // A closed channel means the sweeper already stopped
        let _ = self.shutdown_tx.send(()).await;
    }
}

impl HoldSweeper {
    /// Creates a new sweeper and its control handle.
    pub fn new(engine: Engine, config: SweeperConfig) -> (Self, HoldSweeperHandle) {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let sweeper = HoldSweeper {
            engine,
            config,
            shutdown_rx,
        };
        let handle = HoldSweeperHandle { shutdown_tx };

        (sweeper, handle)
    }

    /// Runs the sweep loop. Spawn as a background task.
    pub async fn run(mut self) {
        info!(interval = ?self.config.poll_interval, "Hold sweeper starting");

        let mut interval = tokio::time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match self.run_once(Utc::now()).await {
                        Ok(0) => {}
                        Ok(expired) => info!(expired, "Sweep pass expired lapsed holds"),
                        Err(err) => warn!(%err, "Sweep pass failed"),
                    }
                }
                _ = self.shutdown_rx.recv() => {
                    info!("Hold sweeper shutting down");
                    break;
                }
            }
        }
    }

    /// One sweep pass at the given instant. Public so tests can drive the
    /// sweeper with a chosen clock instead of waiting out real holds.
    pub async fn run_once(&self, now: DateTime<Utc>) -> EngineResult<usize> {
        let db = self.engine.database();
        let mut expired_total = 0;

        for hotel in db.hotels().list().await? {
            let cutoff = now - chrono::Duration::minutes(hotel.pending_hold_minutes);
            let expired = db.bookings().find_expired_pending(&hotel.id, cutoff).await?;

            for booking in expired {
                match self.engine.expire_pending(&booking).await {
                    Ok(true) => {
                        info!(code = %booking.code, hotel = %hotel.id, "Expired pending hold");
                        expired_total += 1;
                    }
                    Ok(false) => {
                        // Confirmed or cancelled since the scan; skip
                    }
                    Err(err) => {
                        warn!(code = %booking.code, %err, "Failed to expire hold, will retry next pass");
                    }
                }
            }
        }

        Ok(expired_total)
    }
}
