/*!
 * Lock Ordering Tests
 *
 * Deadlock freedom, mutual exclusion and cleanup for the ordered dual lock,
 * plus a self-check that the reversed-order pair really does deadlock.
 */

use pretty_assertions::assert_eq;
use sync_hazards::core::guard::DualLockState;
use sync_hazards::scenarios::{run_pair, ReversedOrderDualLock};
use sync_hazards::{CancellationToken, OrderedDualLock, SyncError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

/// Wait until `condition` holds, failing the test after `timeout`
fn wait_for(timeout: Duration, condition: impl Fn() -> bool) {
    let start = Instant::now();
    while !condition() {
        assert!(start.elapsed() < timeout, "condition not reached in {:?}", timeout);
        thread::sleep(Duration::from_millis(2));
    }
}

#[test]
fn test_many_operations_complete() {
    let locks = Arc::new(OrderedDualLock::with_hold_delay(Duration::from_millis(1)));
    let threads = 8;
    let rounds = 25;
    let barrier = Arc::new(Barrier::new(threads));
    let start = Instant::now();

    let handles: Vec<_> = (0..threads)
        .map(|i| {
            let locks = locks.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                let cancel = CancellationToken::new();
                barrier.wait();
                for round in 0..rounds {
                    if (i + round) % 2 == 0 {
                        locks.op_a(&cancel)?;
                    } else {
                        locks.op_b(&cancel)?;
                    }
                }
                Ok::<_, SyncError>(())
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), Ok(()));
    }

    assert!(start.elapsed() < Duration::from_secs(30));
    assert_eq!(locks.lock_a().stats().acquisitions, (threads * rounds) as u64);
    assert_eq!(locks.lock_b().stats().acquisitions, (threads * rounds) as u64);
    assert!(!locks.lock_a().is_locked());
    assert!(!locks.lock_b().is_locked());
}

#[test]
fn test_ordered_pair_does_not_deadlock() {
    let outcome = run_pair(
        Arc::new(OrderedDualLock::with_hold_delay(Duration::from_millis(100))),
        Duration::from_secs(5),
    )
    .unwrap();

    assert!(!outcome.watchdog_fired);
    assert!(!outcome.deadlock_detected);
    assert_eq!(outcome.completed, 2);
    assert_eq!(outcome.cancelled, 0);
    assert_eq!(outcome.lock_a.acquisitions, 2);
    // Operations queue for A; nobody ever waits on B while holding A
    assert_eq!(outcome.lock_b.contended, 0);
}

#[test]
fn test_reversed_pair_deadlocks_until_cancelled() {
    let locks = Arc::new(ReversedOrderDualLock::with_hold_delay(Duration::from_millis(150)));
    let outcome = run_pair(locks, Duration::from_millis(800)).unwrap();

    assert!(outcome.watchdog_fired);
    assert!(outcome.deadlock_detected);
    assert_eq!(outcome.completed, 0);
    assert_eq!(outcome.cancelled, 2);
    assert_eq!(outcome.failed, 0);
    assert_eq!(outcome.lock_a.cancellations + outcome.lock_b.cancellations, 2);
}

#[test]
fn test_critical_section_is_exclusive() {
    let locks = Arc::new(OrderedDualLock::new());
    let inside = Arc::new(AtomicUsize::new(0));
    let max_inside = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let locks = locks.clone();
            let inside = inside.clone();
            let max_inside = max_inside.clone();
            thread::spawn(move || {
                let cancel = CancellationToken::new();
                for _ in 0..200 {
                    let held = locks
                        .with_both("exclusive", &cancel, |pair| {
                            let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                            max_inside.fetch_max(now, Ordering::SeqCst);
                            let held = pair.holds_both();
                            thread::yield_now();
                            inside.fetch_sub(1, Ordering::SeqCst);
                            held
                        })
                        .unwrap();
                    assert!(held);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(max_inside.load(Ordering::SeqCst), 1);
}

#[test]
fn test_other_thread_never_holds_during_critical_section() {
    let locks = Arc::new(OrderedDualLock::new());
    let entered = Arc::new(Barrier::new(2));
    let checked = Arc::new(Barrier::new(2));

    let holder = {
        let locks = locks.clone();
        let entered = entered.clone();
        let checked = checked.clone();
        thread::spawn(move || {
            locks.with_both("holder", &CancellationToken::new(), |_| {
                entered.wait();
                checked.wait();
            })
        })
    };

    entered.wait();
    assert!(locks.lock_a().is_locked());
    assert!(locks.lock_b().is_locked());
    assert!(!locks.lock_a().is_held_by_current_thread());
    assert!(!locks.lock_b().is_held_by_current_thread());
    assert!(locks.lock_a().try_acquire().is_none());
    assert!(locks.lock_b().try_acquire().is_none());
    checked.wait();

    assert_eq!(holder.join().unwrap(), Ok(()));
}

#[test]
fn test_cancel_while_waiting_for_b_releases_a() {
    let locks = Arc::new(OrderedDualLock::new());
    let outside = CancellationToken::new();

    // Hold B directly so the operation blocks in HoldingA
    let held_b = locks.lock_b().acquire(&outside).unwrap();

    let cancel = CancellationToken::new();
    let worker = {
        let locks = locks.clone();
        let cancel = cancel.clone();
        thread::spawn(move || locks.op_a(&cancel))
    };

    wait_for(Duration::from_secs(5), || locks.lock_a().is_locked());
    assert!(!locks.lock_a().is_held_by_current_thread());

    cancel.cancel();
    assert_eq!(worker.join().unwrap(), Err(SyncError::Cancelled { lock: "b" }));

    // A was released on the way out
    assert!(!locks.lock_a().is_locked());
    let held_a = locks.lock_a().try_acquire();
    assert!(held_a.is_some());
    drop(held_a);

    drop(held_b);
    assert_eq!(locks.op_b(&CancellationToken::new()), Ok(()));
}

#[test]
fn test_cancel_during_preparation_releases_a() {
    let locks = Arc::new(OrderedDualLock::with_hold_delay(Duration::from_secs(30)));
    let cancel = CancellationToken::new();

    let worker = {
        let locks = locks.clone();
        let cancel = cancel.clone();
        thread::spawn(move || locks.op_a(&cancel))
    };

    wait_for(Duration::from_secs(5), || locks.lock_a().is_locked());
    cancel.cancel();

    assert_eq!(
        worker.join().unwrap(),
        Err(SyncError::CancelledWhileHolding { lock: "a" })
    );
    assert!(!locks.lock_a().is_locked());
    assert!(!locks.lock_b().is_locked());
}

#[test]
fn test_cancel_while_waiting_for_a_holds_nothing() {
    let locks = Arc::new(OrderedDualLock::new());
    let held_a = locks.lock_a().acquire(&CancellationToken::new()).unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();

    let worker = {
        let locks = locks.clone();
        let cancel = cancel.clone();
        thread::spawn(move || locks.op_b(&cancel))
    };

    assert_eq!(worker.join().unwrap(), Err(SyncError::Cancelled { lock: "a" }));
    assert!(!locks.lock_b().is_locked());
    drop(held_a);
}

#[test]
fn test_step_by_step_acquisition_states() {
    let locks = OrderedDualLock::new();
    let cancel = CancellationToken::new();

    let idle = locks.begin();
    assert_eq!(idle.state(), DualLockState::Idle);

    let holding_a = idle.acquire_a(&cancel).unwrap();
    assert_eq!(holding_a.state(), DualLockState::HoldingA);
    assert!(locks.lock_a().is_held_by_current_thread());
    assert!(!locks.lock_b().is_locked());

    let holding_ab = holding_a.acquire_b(&cancel).unwrap();
    assert_eq!(holding_ab.state(), DualLockState::HoldingAB);
    assert_eq!(holding_ab.verify(), Ok(()));

    assert_eq!(holding_ab.release().state(), DualLockState::Released);
    assert!(!locks.lock_a().is_locked());
    assert!(!locks.lock_b().is_locked());
}
