/*!
 * Lock-Based Synchronization Primitives
 *
 * - Synchronized counter (mutex or atomic read-modify-write)
 * - Tracked lock (owner-aware, cancellable mutex)
 * - Ordered dual lock (two locks under one global acquisition order)
 */

mod counter;
mod ordered;
mod tracked;

// Re-export public API
pub use counter::{CounterStrategy, SynchronizedCounter};
pub use ordered::OrderedDualLock;
pub use tracked::TrackedLock;
