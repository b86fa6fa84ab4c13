/*!
 * Held Lock Guard
 *
 * Scoped ownership of a TrackedLock
 */

use super::GuardMetadata;
use crate::core::sync::TrackedLock;
use std::marker::PhantomData;
use tracing::trace;

/// Ownership of one [`TrackedLock`], released on drop
///
/// The guard is neither `Send` nor `Sync`: the lock records the acquiring
/// thread as its owner, so it must be released on that same thread.
pub struct HeldLock<'a> {
    lock: &'a TrackedLock,
    metadata: GuardMetadata,
    _not_send: PhantomData<*const ()>,
}

impl<'a> HeldLock<'a> {
    /// Wrap a lock the current thread has just become owner of
    pub(crate) fn new(lock: &'a TrackedLock) -> Self {
        Self {
            lock,
            metadata: GuardMetadata::new("tracked_lock"),
            _not_send: PhantomData,
        }
    }

    #[inline]
    pub fn lock_name(&self) -> &'static str {
        self.lock.name()
    }

    #[inline]
    pub fn metadata(&self) -> &GuardMetadata {
        &self.metadata
    }

    /// Whether the lock still records this thread as its owner
    #[inline]
    pub fn is_active(&self) -> bool {
        self.lock.is_held_by_current_thread()
    }

    /// Release explicitly; same as dropping the guard
    #[inline]
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for HeldLock<'_> {
    fn drop(&mut self) {
        self.lock.release_owner();
        trace!(
            lock = self.lock.name(),
            held_us = self.metadata.lifetime_micros(),
            "Lock released"
        );
    }
}

impl std::fmt::Debug for HeldLock<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeldLock")
            .field("lock", &self.lock.name())
            .field("holder", &self.metadata.holder)
            .finish()
    }
}
