/*!
 * Synchronization Primitives
 *
 * The two hazard fixes and the plumbing around them:
 * - `SynchronizedCounter`: no lost updates under concurrent increments
 * - `OrderedDualLock`: no circular wait between operations needing two locks
 * - `CancellationToken`: interrupts blocked lock waits and pauses
 * - `CountdownLatch`: completion barrier for worker threads
 *
 * # Lock Ordering
 *
 * Whenever an operation holds more than one lock, it acquires them in one
 * global order and releases in reverse. `OrderedDualLock` enforces this with
 * a type-state acquisition; see `core::guard::PairAcquisition`.
 */

mod cancel;
mod latch;
mod locks;

pub use cancel::{CancellationToken, Interrupted};
pub use latch::{CountdownLatch, LatchArrival};
pub use locks::{CounterStrategy, OrderedDualLock, SynchronizedCounter, TrackedLock};
