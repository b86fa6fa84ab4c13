/*!
 * Synchronized Counter Tests
 *
 * No lost updates and monotonic reads under concurrent increments
 */

use proptest::prelude::*;
use sync_hazards::{CounterStrategy, SynchronizedCounter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

fn run_workers(counter: &Arc<SynchronizedCounter>, threads: usize, increments: u64) {
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let counter = counter.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..increments {
                    counter.increment();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_ten_workers_million_increments() {
    let counter = Arc::new(SynchronizedCounter::new());
    run_workers(&counter, 10, 1_000_000);
    assert_eq!(counter.get(), 10_000_000);
}

#[test]
fn test_atomic_strategy_no_lost_updates() {
    let counter = Arc::new(SynchronizedCounter::with_strategy(CounterStrategy::Atomic));
    run_workers(&counter, 8, 50_000);
    assert_eq!(counter.get(), 400_000);
}

#[test]
fn test_value_never_decreases() {
    for strategy in [CounterStrategy::Mutex, CounterStrategy::Atomic] {
        let counter = Arc::new(SynchronizedCounter::with_strategy(strategy));
        let done = Arc::new(AtomicBool::new(false));

        let reader = {
            let counter = counter.clone();
            let done = done.clone();
            thread::spawn(move || {
                let mut last = 0;
                let mut samples = 0u64;
                loop {
                    let finished = done.load(Ordering::Acquire);
                    let now = counter.get();
                    assert!(
                        now >= last,
                        "{:?} counter went from {} to {}",
                        strategy,
                        last,
                        now
                    );
                    last = now;
                    samples += 1;
                    if finished {
                        break;
                    }
                }
                samples
            })
        };

        run_workers(&counter, 4, 100_000);
        done.store(true, Ordering::Release);

        let samples = reader.join().unwrap();
        assert!(samples > 0);
        assert_eq!(counter.get(), 400_000, "strategy {:?}", strategy);
    }
}

#[test]
fn test_get_without_increments() {
    let counter = SynchronizedCounter::new();
    assert_eq!(counter.get(), 0);
    assert_eq!(counter.get(), 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_final_value_is_threads_times_increments(
        threads in 1usize..8,
        increments in 0u64..2_000,
        atomic in any::<bool>(),
    ) {
        let strategy = if atomic { CounterStrategy::Atomic } else { CounterStrategy::Mutex };
        let counter = Arc::new(SynchronizedCounter::with_strategy(strategy));
        run_workers(&counter, threads, increments);
        prop_assert_eq!(counter.get(), threads as u64 * increments);
    }
}
