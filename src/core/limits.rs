/*!
 * Demonstration Limits and Constants
 *
 * Defaults for the workload sizes and the timing glue used by the driver.
 */

use std::time::Duration;

// =============================================================================
// LOST-UPDATE SCENARIO
// =============================================================================

/// Default number of concurrent workers
pub const DEFAULT_WORKER_THREADS: usize = 10;

/// Default increments issued by each worker
pub const DEFAULT_INCREMENTS_PER_THREAD: u64 = 1_000_000;

// =============================================================================
// LOCK-ORDERING SCENARIO
// =============================================================================

/// Pause taken while holding lock A before requesting lock B
/// Long enough that two reversed-order operations both grab their first lock
pub const DEFAULT_HOLD_DELAY: Duration = Duration::from_millis(500);

/// How long the driver waits on the naive scenario before declaring a deadlock
pub const DEFAULT_DEADLOCK_WATCHDOG: Duration = Duration::from_secs(2);

/// Interval at which a blocked lock waiter re-checks its cancellation token
/// [PERF] Bounds cancellation latency without busy-waiting
pub const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(5);

// =============================================================================
// LOCK NAMES
// =============================================================================

/// Name of the first lock in the global order
pub const LOCK_A: &str = "a";

/// Name of the second lock in the global order
pub const LOCK_B: &str = "b";
