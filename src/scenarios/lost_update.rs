/*!
 * Lost-Update Scenario
 *
 * Many workers incrementing one counter, with and without mutual exclusion
 */

use super::report::{CounterOutcome, LostUpdateReport};
use super::{join_workers, spawn_worker, DemoConfig};
use crate::core::errors::ScenarioError;
use crate::core::sync::{CountdownLatch, SynchronizedCounter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Counter shared between workers
pub trait SharedCounter: Send + Sync {
    fn increment(&self);
    fn get(&self) -> u64;
}

impl SharedCounter for SynchronizedCounter {
    #[inline]
    fn increment(&self) {
        SynchronizedCounter::increment(self)
    }

    #[inline]
    fn get(&self) -> u64 {
        SynchronizedCounter::get(self)
    }
}

/// Counter whose increment is a separate load and store
///
/// Memory-safe, but two threads can load the same value and both store
/// value + 1, collapsing two increments into one.
#[derive(Debug, Default)]
pub struct RacyCounter {
    value: AtomicU64,
}

impl RacyCounter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SharedCounter for RacyCounter {
    #[inline]
    fn increment(&self) {
        let current = self.value.load(Ordering::Relaxed);
        self.value.store(current + 1, Ordering::Relaxed);
    }

    #[inline]
    fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Run `threads` workers each incrementing `counter` `increments` times
///
/// Returns the counter value after every worker has counted down the latch
/// and been joined.
pub fn hammer<C>(counter: Arc<C>, threads: usize, increments: u64) -> Result<u64, ScenarioError>
where
    C: SharedCounter + 'static,
{
    let latch = Arc::new(CountdownLatch::new(threads));

    let handles = (0..threads)
        .map(|i| {
            let counter = counter.clone();
            let arrival = latch.arrive_on_drop();
            spawn_worker(format!("counter-worker-{}", i), move || {
                let _arrival = arrival;
                for _ in 0..increments {
                    counter.increment();
                }
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    latch.wait();
    join_workers(handles)?;
    Ok(counter.get())
}

/// Lost-update demonstration: racy counter first, then the fixed one
pub fn run_lost_update(config: &DemoConfig) -> Result<LostUpdateReport, ScenarioError> {
    let expected = config.expected_total()?;
    info!(
        threads = config.threads,
        increments = config.increments_per_thread,
        expected,
        "Running lost-update scenario"
    );

    let start = Instant::now();
    let racy = hammer(
        Arc::new(RacyCounter::new()),
        config.threads,
        config.increments_per_thread,
    )?;
    let unsynchronized = CounterOutcome::new(expected, racy);
    if unsynchronized.lost > 0 {
        warn!(
            observed = racy,
            lost = unsynchronized.lost,
            "Unsynchronized counter lost updates"
        );
    }

    let synced = hammer(
        Arc::new(SynchronizedCounter::with_strategy(config.counter_strategy)),
        config.threads,
        config.increments_per_thread,
    )?;
    let synchronized = CounterOutcome::new(expected, synced);
    info!(
        observed = synced,
        strategy = ?config.counter_strategy,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Synchronized counter finished"
    );

    Ok(LostUpdateReport {
        threads: config.threads,
        increments_per_thread: config.increments_per_thread,
        expected,
        unsynchronized,
        synchronized,
        strategy: config.counter_strategy,
    })
}
