/*!
 * Sync Hazards Library
 * Lost-update and lock-ordering hazards, with the primitives that fix them
 */

pub mod core;
pub mod monitoring;
pub mod scenarios;

// Re-exports
pub use crate::core::errors::*;
pub use crate::core::sync::{
    CancellationToken, CounterStrategy, CountdownLatch, OrderedDualLock, SynchronizedCounter,
    TrackedLock,
};
pub use monitoring::init_tracing;
pub use scenarios::{DemoConfig, LockOrderingReport, LostUpdateReport};
