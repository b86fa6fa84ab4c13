/*!
 * Scenario Reports
 * Serializable results of the demonstration runs
 */

use crate::core::sync::CounterStrategy;
use crate::monitoring::LockStatsSnapshot;
use serde::Serialize;

/// Final value of one counter after all workers joined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CounterOutcome {
    pub observed: u64,
    /// Increments missing from `observed`
    pub lost: u64,
}

impl CounterOutcome {
    pub fn new(expected: u64, observed: u64) -> Self {
        Self {
            observed,
            lost: expected.saturating_sub(observed),
        }
    }
}

/// Result of the lost-update scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LostUpdateReport {
    pub threads: usize,
    pub increments_per_thread: u64,
    pub expected: u64,
    pub unsynchronized: CounterOutcome,
    pub synchronized: CounterOutcome,
    pub strategy: CounterStrategy,
}

impl LostUpdateReport {
    /// The synchronized counter saw every increment
    #[inline]
    pub fn synchronized_exact(&self) -> bool {
        self.synchronized.observed == self.expected
    }
}

/// How two concurrent dual-lock operations ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairOutcome {
    pub protocol: &'static str,
    /// The watchdog expired before both operations finished
    pub watchdog_fired: bool,
    /// Both operations were cancelled while blocked on a lock
    pub deadlock_detected: bool,
    pub completed: usize,
    pub cancelled: usize,
    pub failed: usize,
    pub elapsed_ms: u64,
    pub lock_a: LockStatsSnapshot,
    pub lock_b: LockStatsSnapshot,
}

/// Result of the lock-ordering scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LockOrderingReport {
    pub hold_delay_ms: u64,
    pub naive: PairOutcome,
    pub ordered: PairOutcome,
}
