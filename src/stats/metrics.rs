//! Statistics and metrics for the replay loop

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::replay::DriverPhase;

/// Live counters shared between the driver and observers
///
/// All updates are relaxed atomics; snapshots are eventually consistent.
#[derive(Debug)]
pub struct ReplayMetrics {
    started_at: Instant,
    phase: AtomicU8,
    records_broadcast: AtomicU64,
    records_skipped: AtomicU64,
    passes_completed: AtomicU64,
    position: AtomicU64,
    last_delivered: AtomicU64,
}

impl ReplayMetrics {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            phase: AtomicU8::new(DriverPhase::WaitingForSource as u8),
            records_broadcast: AtomicU64::new(0),
            records_skipped: AtomicU64::new(0),
            passes_completed: AtomicU64::new(0),
            position: AtomicU64::new(0),
            last_delivered: AtomicU64::new(0),
        }
    }

    pub fn set_phase(&self, phase: DriverPhase) {
        self.phase.store(phase as u8, Ordering::Relaxed);
    }

    pub fn phase(&self) -> DriverPhase {
        DriverPhase::from_u8(self.phase.load(Ordering::Relaxed))
    }

    /// Record a broadcast and how many viewers it reached
    pub fn record_broadcast(&self, delivered: usize) {
        self.records_broadcast.fetch_add(1, Ordering::Relaxed);
        self.last_delivered.store(delivered as u64, Ordering::Relaxed);
    }

    /// Record a row that was filtered out or could not be used
    pub fn record_skipped(&self) {
        self.records_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_pass(&self) {
        self.passes_completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Update the cursor position within the current pass
    pub fn set_position(&self, position: u64) {
        self.position.store(position, Ordering::Relaxed);
    }

    pub fn records_broadcast(&self) -> u64 {
        self.records_broadcast.load(Ordering::Relaxed)
    }

    pub fn records_skipped(&self) -> u64 {
        self.records_skipped.load(Ordering::Relaxed)
    }

    pub fn passes_completed(&self) -> u64 {
        self.passes_completed.load(Ordering::Relaxed)
    }

    /// Time since the metrics were created
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self, viewers: usize) -> ReplayStats {
        ReplayStats {
            phase: self.phase(),
            viewers,
            records_broadcast: self.records_broadcast(),
            records_skipped: self.records_skipped(),
            passes_completed: self.passes_completed(),
            position: self.position.load(Ordering::Relaxed),
            last_delivered: self.last_delivered.load(Ordering::Relaxed),
            uptime_secs: self.uptime().as_secs(),
        }
    }
}

impl Default for ReplayMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable snapshot of replay progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayStats {
    pub phase: DriverPhase,
    pub viewers: usize,
    pub records_broadcast: u64,
    pub records_skipped: u64,
    pub passes_completed: u64,
    /// Rows consumed in the current pass
    pub position: u64,
    /// Viewers reached by the most recent broadcast
    pub last_delivered: u64,
    pub uptime_secs: u64,
}
