/*!
 * Monitoring
 * Tracing setup and lock statistics
 */

mod stats;
mod tracer;

pub use stats::{LockStats, LockStatsSnapshot};
pub use tracer::{init_tracing, TRACE_JSON_ENV};
