/*!
 * Lock-Ordering Scenario
 *
 * Two operations needing the same two locks, first in opposite orders
 * (deadlocks), then in one global order (completes).
 */

use super::report::{LockOrderingReport, PairOutcome};
use super::{join_workers, spawn_worker, DemoConfig};
use crate::core::errors::{ScenarioError, SyncError, SyncResult};
use crate::core::limits::{LOCK_A, LOCK_B};
use crate::core::sync::{CancellationToken, CountdownLatch, OrderedDualLock, TrackedLock};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Two operations that each need both locks of a pair
pub trait DualLockOps: Send + Sync {
    /// Name used in reports
    fn protocol(&self) -> &'static str;
    fn op_a(&self, cancel: &CancellationToken) -> SyncResult<()>;
    fn op_b(&self, cancel: &CancellationToken) -> SyncResult<()>;
    fn locks(&self) -> (&TrackedLock, &TrackedLock);
}

impl DualLockOps for OrderedDualLock {
    fn protocol(&self) -> &'static str {
        "ordered"
    }

    fn op_a(&self, cancel: &CancellationToken) -> SyncResult<()> {
        OrderedDualLock::op_a(self, cancel)
    }

    fn op_b(&self, cancel: &CancellationToken) -> SyncResult<()> {
        OrderedDualLock::op_b(self, cancel)
    }

    fn locks(&self) -> (&TrackedLock, &TrackedLock) {
        (self.lock_a(), self.lock_b())
    }
}

/// The unfixed pair: `op_a` takes A then B, `op_b` takes B then A
///
/// With a pause after the first acquisition, running both concurrently
/// leaves each holding one lock while waiting for the other. Only the
/// cancellation token gets them out.
pub struct ReversedOrderDualLock {
    a: TrackedLock,
    b: TrackedLock,
    hold_delay: Duration,
}

impl ReversedOrderDualLock {
    pub fn with_hold_delay(hold_delay: Duration) -> Self {
        Self {
            a: TrackedLock::new(LOCK_A),
            b: TrackedLock::new(LOCK_B),
            hold_delay,
        }
    }

    fn run(
        first: &TrackedLock,
        second: &TrackedLock,
        pause: Duration,
        cancel: &CancellationToken,
    ) -> SyncResult<()> {
        let held_first = first.acquire(cancel)?;
        if cancel.sleep(pause).is_err() {
            return Err(SyncError::CancelledWhileHolding { lock: first.name() });
        }
        let held_second = second.acquire(cancel)?;
        held_second.release();
        held_first.release();
        Ok(())
    }
}

impl DualLockOps for ReversedOrderDualLock {
    fn protocol(&self) -> &'static str {
        "reversed"
    }

    fn op_a(&self, cancel: &CancellationToken) -> SyncResult<()> {
        Self::run(&self.a, &self.b, self.hold_delay, cancel)
    }

    fn op_b(&self, cancel: &CancellationToken) -> SyncResult<()> {
        Self::run(&self.b, &self.a, self.hold_delay, cancel)
    }

    fn locks(&self) -> (&TrackedLock, &TrackedLock) {
        (&self.a, &self.b)
    }
}

/// Run `op_a` and `op_b` concurrently under a watchdog
///
/// If both have not finished within `watchdog`, both are cancelled and the
/// function returns once both threads have exited. A deadlock is reported
/// only when every operation was cancelled while blocked on a lock; an
/// operation cancelled during its pause was still making progress.
pub fn run_pair<L>(locks: Arc<L>, watchdog: Duration) -> Result<PairOutcome, ScenarioError>
where
    L: DualLockOps + 'static,
{
    let latch = Arc::new(CountdownLatch::new(2));
    let cancel = CancellationToken::new();
    let start = Instant::now();

    let handles = [("op-a", true), ("op-b", false)]
        .into_iter()
        .map(|(name, first)| {
            let locks = locks.clone();
            let cancel = cancel.clone();
            let arrival = latch.arrive_on_drop();
            spawn_worker(format!("{}-{}", locks.protocol(), name), move || {
                let _arrival = arrival;
                if first {
                    locks.op_a(&cancel)
                } else {
                    locks.op_b(&cancel)
                }
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let watchdog_fired = !latch.wait_timeout(watchdog);
    if watchdog_fired {
        warn!(
            protocol = locks.protocol(),
            watchdog_ms = watchdog.as_millis() as u64,
            "Operations did not finish in time, cancelling"
        );
        cancel.cancel();
        latch.wait();
    }

    let results = join_workers(handles)?;
    let (lock_a, lock_b) = locks.locks();

    let deadlock_detected = watchdog_fired
        && results
            .iter()
            .all(|r| matches!(r, Err(SyncError::Cancelled { .. })));
    if deadlock_detected {
        warn!(
            protocol = locks.protocol(),
            "Deadlock detected: each operation was blocked on a lock"
        );
    }

    let outcome = PairOutcome {
        protocol: locks.protocol(),
        watchdog_fired,
        deadlock_detected,
        completed: results.iter().filter(|r| r.is_ok()).count(),
        cancelled: results
            .iter()
            .filter(|r| matches!(r, Err(e) if e.is_cancellation()))
            .count(),
        failed: results
            .iter()
            .filter(|r| matches!(r, Err(e) if !e.is_cancellation()))
            .count(),
        elapsed_ms: start.elapsed().as_millis() as u64,
        lock_a: lock_a.stats(),
        lock_b: lock_b.stats(),
    };
    info!(?outcome, "Lock pair finished");
    Ok(outcome)
}

/// Lock-ordering demonstration: reversed order first, then the fixed order
pub fn run_lock_ordering(config: &DemoConfig) -> Result<LockOrderingReport, ScenarioError> {
    info!(
        hold_delay_ms = config.hold_delay.as_millis() as u64,
        "Running lock-ordering scenario"
    );

    let naive = run_pair(
        Arc::new(ReversedOrderDualLock::with_hold_delay(config.hold_delay)),
        config.deadlock_watchdog,
    )?;

    // The ordered pair runs the two operations back to back
    let ordered = run_pair(
        Arc::new(OrderedDualLock::with_hold_delay(config.hold_delay)),
        config.deadlock_watchdog + config.hold_delay * 2,
    )?;

    Ok(LockOrderingReport {
        hold_delay_ms: config.hold_delay.as_millis() as u64,
        naive,
        ordered,
    })
}
