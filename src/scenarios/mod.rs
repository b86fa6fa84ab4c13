/*!
 * Demonstration Scenarios
 *
 * Driver glue: spawns named worker threads, waits on a completion latch and
 * reports what happened.
 */

mod config;
mod deadlock;
mod lost_update;
mod report;

pub use config::{
    DemoConfig, COUNTER_STRATEGY_ENV, HOLD_MS_ENV, INCREMENTS_ENV, REPORT_JSON_ENV, THREADS_ENV,
    WATCHDOG_MS_ENV,
};
pub use deadlock::{run_lock_ordering, run_pair, DualLockOps, ReversedOrderDualLock};
pub use lost_update::{hammer, run_lost_update, RacyCounter, SharedCounter};
pub use report::{CounterOutcome, LockOrderingReport, LostUpdateReport, PairOutcome};

use crate::core::errors::ScenarioError;
use std::thread::{self, JoinHandle};

/// A spawned, named worker thread
pub struct Worker<T> {
    name: String,
    handle: JoinHandle<T>,
}

/// Spawn a named worker thread
pub fn spawn_worker<F, T>(name: String, work: F) -> Result<Worker<T>, ScenarioError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    thread::Builder::new()
        .name(name.clone())
        .spawn(work)
        .map(|handle| Worker {
            name: name.clone(),
            handle,
        })
        .map_err(|source| ScenarioError::Spawn { name, source })
}

/// Join every worker, returning their results in spawn order
pub fn join_workers<T>(workers: Vec<Worker<T>>) -> Result<Vec<T>, ScenarioError> {
    workers
        .into_iter()
        .map(|worker| {
            worker
                .handle
                .join()
                .map_err(|_| ScenarioError::WorkerPanicked(worker.name))
        })
        .collect()
}
