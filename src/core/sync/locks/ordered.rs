/*!
 * Ordered Dual Lock
 *
 * Two locks that every combined-use operation acquires A first, then B.
 * Because no operation can hold B while waiting for A, two operations can
 * never each hold the lock the other is waiting for.
 */

use crate::core::errors::{SyncError, SyncResult};
use crate::core::guard::{HoldingAB, Idle, PairAcquisition};
use crate::core::limits::{LOCK_A, LOCK_B};
use crate::core::sync::{CancellationToken, TrackedLock};
use std::time::Duration;
use tracing::{debug, debug_span, error, warn};

/// A pair of locks with a fixed acquisition order
///
/// # Protocol
///
/// 1. Acquire A
/// 2. Preparatory pause while holding only A (`hold_delay`, cancellable)
/// 3. Acquire B
/// 4. Check that the current thread owns both
/// 5. Release B
/// 6. Release A
///
/// Every path out of the protocol, including cancellation and panics inside
/// the critical section, releases whatever is held.
pub struct OrderedDualLock {
    a: TrackedLock,
    b: TrackedLock,
    hold_delay: Duration,
}

impl OrderedDualLock {
    /// Lock pair with no preparatory pause
    pub fn new() -> Self {
        Self::with_hold_delay(Duration::ZERO)
    }

    /// Lock pair that pauses for `hold_delay` between taking A and requesting B
    pub fn with_hold_delay(hold_delay: Duration) -> Self {
        Self {
            a: TrackedLock::new(LOCK_A),
            b: TrackedLock::new(LOCK_B),
            hold_delay,
        }
    }

    #[inline]
    pub fn hold_delay(&self) -> Duration {
        self.hold_delay
    }

    /// First lock in the global order
    #[inline]
    pub fn lock_a(&self) -> &TrackedLock {
        &self.a
    }

    /// Second lock in the global order
    #[inline]
    pub fn lock_b(&self) -> &TrackedLock {
        &self.b
    }

    /// Start a step-by-step acquisition, A first
    #[inline]
    pub fn begin(&self) -> PairAcquisition<'_, Idle> {
        PairAcquisition::new(&self.a, &self.b)
    }

    /// First operation needing both locks
    pub fn op_a(&self, cancel: &CancellationToken) -> SyncResult<()> {
        self.with_both("op_a", cancel, |_| ())
    }

    /// Second operation needing both locks; follows the same order as `op_a`
    pub fn op_b(&self, cancel: &CancellationToken) -> SyncResult<()> {
        self.with_both("op_b", cancel, |_| ())
    }

    /// Run `critical` while holding both locks
    ///
    /// # Errors
    ///
    /// - `Cancelled` / `CancelledWhileHolding` if `cancel` fires while
    ///   blocked or pausing; held locks are released first
    /// - `AlreadyHeld` if the calling thread already owns A or B
    /// - `InvariantViolation` if the holding check fails
    pub fn with_both<F, R>(
        &self,
        operation: &'static str,
        cancel: &CancellationToken,
        critical: F,
    ) -> SyncResult<R>
    where
        F: FnOnce(&PairAcquisition<'_, HoldingAB>) -> R,
    {
        let _span = debug_span!("dual_lock", operation).entered();

        let pair = self
            .begin()
            .acquire_a(cancel)
            .and_then(|pair| pair.prepare(cancel, self.hold_delay))
            .and_then(|pair| pair.acquire_b(cancel))
            .map_err(|e| log_abort(operation, e))?;

        if let Err(e) = pair.verify() {
            error!(operation, error = %e, "Holding invariant violated");
            return Err(e);
        }

        let result = critical(&pair);
        let released = pair.release();
        debug!(
            operation,
            elapsed_us = released.elapsed.as_micros() as u64,
            "Released B then A"
        );
        Ok(result)
    }
}

fn log_abort(operation: &'static str, err: SyncError) -> SyncError {
    if err.is_cancellation() {
        warn!(operation, error = %err, "Operation cancelled; held locks released");
    } else {
        error!(operation, error = %err, "Operation failed");
    }
    err
}

impl Default for OrderedDualLock {
    fn default() -> Self {
        Self::new()
    }
}
