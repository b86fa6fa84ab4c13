/*!
 * Core Module
 * Synchronization primitives, guards and error handling
 */

pub mod errors;
pub mod guard;
pub mod limits;
pub mod sync;

// Re-export for convenience
pub use errors::*;
pub use guard::{DualLockState, GuardMetadata, HeldLock, PairAcquisition};
pub use sync::{
    CancellationToken, CounterStrategy, CountdownLatch, OrderedDualLock, SynchronizedCounter,
    TrackedLock,
};
