/*!
 * Lock Statistics
 * Relaxed atomic counters for lock acquisition behaviour
 */

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Per-lock counters, updated by the lock itself
#[derive(Debug, Default)]
pub struct LockStats {
    acquisitions: AtomicU64,
    contended: AtomicU64,
    cancellations: AtomicU64,
}

/// Point-in-time copy of [`LockStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LockStatsSnapshot {
    pub acquisitions: u64,
    /// Acquisitions that had to wait for another owner
    pub contended: u64,
    pub cancellations: u64,
}

impl LockStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn record_acquire(&self, contended: bool) {
        self.acquisitions.fetch_add(1, Ordering::Relaxed);
        if contended {
            self.contended.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub(crate) fn record_cancel(&self) {
        self.cancellations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> LockStatsSnapshot {
        LockStatsSnapshot {
            acquisitions: self.acquisitions.load(Ordering::Relaxed),
            contended: self.contended.load(Ordering::Relaxed),
            cancellations: self.cancellations.load(Ordering::Relaxed),
        }
    }
}
