/*!
 * Lock Pair Acquisition with Type-State Pattern
 *
 * Encodes the A-then-B acquisition protocol in the type system
 */

use super::lock::HeldLock;
use super::GuardMetadata;
use crate::core::errors::{SyncError, SyncResult};
use crate::core::sync::{CancellationToken, TrackedLock};
use serde::Serialize;
use std::marker::PhantomData;
use std::time::Duration;
use tracing::trace;

mod private {
    pub trait Sealed {}
}

/// Protocol state marker trait
pub trait PairState: private::Sealed {
    fn state() -> DualLockState;
}

/// Type marker: nothing held
pub struct Idle;
/// Type marker: lock A held, B not yet requested or pending
pub struct HoldingA;
/// Type marker: both locks held
pub struct HoldingAB;

impl private::Sealed for Idle {}
impl private::Sealed for HoldingA {}
impl private::Sealed for HoldingAB {}

impl PairState for Idle {
    fn state() -> DualLockState {
        DualLockState::Idle
    }
}

impl PairState for HoldingA {
    fn state() -> DualLockState {
        DualLockState::HoldingA
    }
}

impl PairState for HoldingAB {
    fn state() -> DualLockState {
        DualLockState::HoldingAB
    }
}

/// Runtime view of the protocol state, for logging and reports
///
/// There is no "holding B only" state: B is released before A.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DualLockState {
    Idle,
    HoldingA,
    HoldingAB,
    Released,
}

/// Terminal state of a completed acquisition
#[derive(Debug, Clone, Copy)]
pub struct Released {
    /// Time from the start of the acquisition to release
    pub elapsed: Duration,
}

impl Released {
    #[inline]
    pub fn state(&self) -> DualLockState {
        DualLockState::Released
    }
}

/// One walk through the ordered protocol over a lock pair
///
/// # Type States
///
/// - `PairAcquisition<Idle>`: nothing held, only `acquire_a` is available
/// - `PairAcquisition<HoldingA>`: A held, `prepare` and `acquire_b` available
/// - `PairAcquisition<HoldingAB>`: both held, critical section may run
///
/// Dropping the acquisition in any state releases B, then A. A failed
/// transition drops `self`, so a cancelled wait for B still releases A.
pub struct PairAcquisition<'a, S: PairState> {
    a: &'a TrackedLock,
    b: &'a TrackedLock,
    held_a: Option<HeldLock<'a>>,
    held_b: Option<HeldLock<'a>>,
    metadata: GuardMetadata,
    _state: PhantomData<S>,
}

impl<'a> PairAcquisition<'a, Idle> {
    /// Start a walk over `a` then `b`; the argument order is the global order
    pub(crate) fn new(a: &'a TrackedLock, b: &'a TrackedLock) -> Self {
        Self {
            a,
            b,
            held_a: None,
            held_b: None,
            metadata: GuardMetadata::new("lock_pair"),
            _state: PhantomData,
        }
    }

    /// Acquire A, blocking until available or cancelled
    pub fn acquire_a(mut self, cancel: &CancellationToken) -> SyncResult<PairAcquisition<'a, HoldingA>> {
        let held = self.a.acquire(cancel)?;
        self.held_a = Some(held);
        trace!(lock = self.a.name(), "Idle -> HoldingA");
        Ok(self.transition())
    }
}

impl<'a> PairAcquisition<'a, HoldingA> {
    /// Preparatory work while holding only A
    ///
    /// Pauses for `pause`, waking early if cancelled. On cancellation A is
    /// released before the error is returned.
    pub fn prepare(self, cancel: &CancellationToken, pause: Duration) -> SyncResult<Self> {
        if pause.is_zero() {
            return Ok(self);
        }
        match cancel.sleep(pause) {
            Ok(()) => Ok(self),
            Err(_) => Err(SyncError::CancelledWhileHolding { lock: self.a.name() }),
        }
    }

    /// Acquire B, blocking until available or cancelled
    pub fn acquire_b(mut self, cancel: &CancellationToken) -> SyncResult<PairAcquisition<'a, HoldingAB>> {
        let held = self.b.acquire(cancel)?;
        self.held_b = Some(held);
        trace!(lock = self.b.name(), "HoldingA -> HoldingAB");
        Ok(self.transition())
    }
}

impl<'a> PairAcquisition<'a, HoldingAB> {
    /// Whether the calling thread owns both locks
    #[inline]
    pub fn holds_both(&self) -> bool {
        self.a.is_held_by_current_thread() && self.b.is_held_by_current_thread()
    }

    /// Check the holding invariant before entering the critical section
    pub fn verify(&self) -> SyncResult<()> {
        if self.holds_both() {
            Ok(())
        } else {
            Err(SyncError::InvariantViolation(format!(
                "thread {:?} entered critical section without owning {} and {}",
                std::thread::current().id(),
                self.a.name(),
                self.b.name()
            )))
        }
    }

    /// Release B, then A
    pub fn release(mut self) -> Released {
        let elapsed = self.metadata.lifetime();
        self.release_in_order();
        trace!("HoldingAB -> Released");
        Released { elapsed }
    }
}

impl<'a, S: PairState> PairAcquisition<'a, S> {
    #[inline]
    pub fn state(&self) -> DualLockState {
        S::state()
    }

    #[inline]
    pub fn metadata(&self) -> &GuardMetadata {
        &self.metadata
    }

    /// Whether at least lock A is held
    #[inline]
    pub fn is_active(&self) -> bool {
        self.held_a.is_some()
    }

    fn transition<N: PairState>(mut self) -> PairAcquisition<'a, N> {
        PairAcquisition {
            a: self.a,
            b: self.b,
            held_a: self.held_a.take(),
            held_b: self.held_b.take(),
            metadata: self.metadata.clone(),
            _state: PhantomData,
        }
    }

    fn release_in_order(&mut self) {
        drop(self.held_b.take());
        drop(self.held_a.take());
    }
}

impl<S: PairState> Drop for PairAcquisition<'_, S> {
    fn drop(&mut self) {
        self.release_in_order();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_states() {
        let a = TrackedLock::new("a");
        let b = TrackedLock::new("b");
        let cancel = CancellationToken::new();

        let idle = PairAcquisition::new(&a, &b);
        assert_eq!(idle.state(), DualLockState::Idle);
        assert!(!idle.is_active());
        assert_eq!(idle.metadata().resource_type, "lock_pair");

        let holding_a = idle.acquire_a(&cancel).unwrap();
        assert_eq!(holding_a.state(), DualLockState::HoldingA);
        assert!(a.is_held_by_current_thread());
        assert!(!b.is_locked());

        let holding_ab = holding_a.acquire_b(&cancel).unwrap();
        assert_eq!(holding_ab.state(), DualLockState::HoldingAB);
        assert!(holding_ab.holds_both());
        assert!(holding_ab.verify().is_ok());

        let released = holding_ab.release();
        assert_eq!(released.state(), DualLockState::Released);
        assert!(!a.is_locked());
        assert!(!b.is_locked());
    }

    #[test]
    fn test_drop_in_holding_a_releases() {
        let a = TrackedLock::new("a");
        let b = TrackedLock::new("b");

        let holding_a = PairAcquisition::new(&a, &b)
            .acquire_a(&CancellationToken::new())
            .unwrap();
        drop(holding_a);

        assert!(!a.is_locked());
    }

    #[test]
    fn test_cancelled_prepare_releases_a() {
        let a = TrackedLock::new("a");
        let b = TrackedLock::new("b");
        let cancel = CancellationToken::new();

        let holding_a = PairAcquisition::new(&a, &b).acquire_a(&cancel).unwrap();
        cancel.cancel();

        let err = holding_a
            .prepare(&cancel, Duration::from_secs(30))
            .err()
            .unwrap();
        assert_eq!(err, SyncError::CancelledWhileHolding { lock: "a" });
        assert!(!a.is_locked());
    }
}
