/*!
 * Tracked Lock
 *
 * Owner-aware, cancellable mutual exclusion built on parking_lot
 */

use crate::core::errors::{SyncError, SyncResult};
use crate::core::guard::HeldLock;
use crate::core::limits::CANCEL_POLL_INTERVAL;
use crate::core::sync::CancellationToken;
use crate::monitoring::{LockStats, LockStatsSnapshot};
use parking_lot::{Condvar, Mutex};
use std::thread::{self, ThreadId};
use tracing::{trace, warn};

/// Mutual exclusion that records which thread owns it
///
/// Unlike a plain mutex, a blocked `acquire` can be interrupted through a
/// [`CancellationToken`], and the owner can be queried with
/// [`is_held_by_current_thread`](Self::is_held_by_current_thread).
///
/// Acquisition order among waiters is unspecified.
pub struct TrackedLock {
    name: &'static str,
    owner: Mutex<Option<ThreadId>>,
    released: Condvar,
    stats: LockStats,
}

impl TrackedLock {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            owner: Mutex::new(None),
            released: Condvar::new(),
            stats: LockStats::new(),
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Block until the lock is free, then take ownership
    ///
    /// # Errors
    ///
    /// - `Cancelled` if `cancel` fires while waiting; nothing is held
    /// - `AlreadyHeld` if the calling thread already owns the lock
    pub fn acquire(&self, cancel: &CancellationToken) -> SyncResult<HeldLock<'_>> {
        let me = thread::current().id();
        let mut owner = self.owner.lock();

        if *owner == Some(me) {
            return Err(SyncError::AlreadyHeld { lock: self.name });
        }

        let mut contended = false;
        while owner.is_some() {
            contended = true;
            if cancel.is_cancelled() {
                return Err(self.abandon_wait());
            }
            self.released.wait_for(&mut owner, CANCEL_POLL_INTERVAL);
            // A cancelled waiter gives up even if the lock just became free
            if cancel.is_cancelled() {
                return Err(self.abandon_wait());
            }
        }

        *owner = Some(me);
        drop(owner);

        self.stats.record_acquire(contended);
        trace!(lock = self.name, contended, "Lock acquired");
        Ok(HeldLock::new(self))
    }

    /// Take ownership only if the lock is free right now
    pub fn try_acquire(&self) -> Option<HeldLock<'_>> {
        let mut owner = self.owner.lock();
        if owner.is_some() {
            return None;
        }
        *owner = Some(thread::current().id());
        drop(owner);

        self.stats.record_acquire(false);
        Some(HeldLock::new(self))
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.owner.lock().is_some()
    }

    #[inline]
    pub fn is_held_by_current_thread(&self) -> bool {
        *self.owner.lock() == Some(thread::current().id())
    }

    pub fn stats(&self) -> LockStatsSnapshot {
        self.stats.snapshot()
    }

    fn abandon_wait(&self) -> SyncError {
        self.stats.record_cancel();
        warn!(lock = self.name, "Cancelled while waiting for lock");
        SyncError::Cancelled { lock: self.name }
    }

    /// Clear ownership and wake one waiter; called from `HeldLock::drop`
    pub(crate) fn release_owner(&self) {
        *self.owner.lock() = None;
        self.released.notify_one();
    }
}

impl std::fmt::Debug for TrackedLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackedLock")
            .field("name", &self.name)
            .field("owner", &*self.owner.lock())
            .finish()
    }
}
