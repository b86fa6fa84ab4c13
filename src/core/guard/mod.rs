/*!
 * RAII Lock Guards
 *
 * Scoped ownership of tracked locks with automatic release.
 *
 * ## Guard Types
 *
 * - **HeldLock**: Ownership of a single `TrackedLock`
 * - **PairAcquisition**: Type-state walk through the A-then-B protocol
 *
 * ## Example
 *
 * ```rust
 * use sync_hazards::core::sync::{CancellationToken, OrderedDualLock};
 *
 * let locks = OrderedDualLock::new();
 * let cancel = CancellationToken::new();
 *
 * let pair = locks.begin().acquire_a(&cancel)?;
 * // pair.acquire_b() is the only way forward; B cannot be taken first
 * let pair = pair.acquire_b(&cancel)?;
 * assert!(pair.holds_both());
 * // Released B then A on drop
 * # Ok::<(), sync_hazards::SyncError>(())
 * ```
 */

mod lock;
mod pair;

pub use lock::HeldLock;
pub use pair::{DualLockState, HoldingA, HoldingAB, Idle, PairAcquisition, PairState, Released};

use std::thread::ThreadId;
use std::time::{Duration, Instant};

/// Guard metadata for observability
#[derive(Debug, Clone)]
pub struct GuardMetadata {
    pub resource_type: &'static str,
    pub creation_time: Instant,
    /// Thread that created the guard
    pub holder: ThreadId,
}

impl GuardMetadata {
    #[inline]
    pub fn new(resource_type: &'static str) -> Self {
        Self {
            resource_type,
            creation_time: Instant::now(),
            holder: std::thread::current().id(),
        }
    }

    #[inline]
    pub fn lifetime(&self) -> Duration {
        self.creation_time.elapsed()
    }

    #[inline]
    pub fn lifetime_micros(&self) -> u64 {
        self.lifetime().as_micros() as u64
    }
}
