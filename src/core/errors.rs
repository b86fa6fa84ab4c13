/*!
 * Error Types
 * Centralized error handling with thiserror and miette
 */

use miette::Diagnostic;
use thiserror::Error;

/// Result type for lock and counter operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors raised by the synchronization primitives
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum SyncError {
    #[error("Cancelled while waiting for lock {lock}")]
    #[diagnostic(
        code(sync::cancelled),
        help("The operation was interrupted. Any lock it already held has been released.")
    )]
    Cancelled { lock: &'static str },

    #[error("Cancelled during preparatory work while holding lock {lock}")]
    #[diagnostic(
        code(sync::cancelled_while_holding),
        help("The operation was interrupted before its critical section. Lock {lock} has been released.")
    )]
    CancelledWhileHolding { lock: &'static str },

    #[error("Lock {lock} is already held by the current thread")]
    #[diagnostic(
        code(sync::already_held),
        help("Locks are not reentrant. Release the existing guard before acquiring again.")
    )]
    AlreadyHeld { lock: &'static str },

    #[error("Holding invariant violated: {0}")]
    #[diagnostic(
        code(sync::invariant_violation),
        help("A critical section ran without owning both locks. This indicates a bug in the lock protocol.")
    )]
    InvariantViolation(String),
}

impl SyncError {
    /// Whether the error came from a cancellation signal
    #[inline]
    pub fn is_cancellation(&self) -> bool {
        matches!(
            self,
            SyncError::Cancelled { .. } | SyncError::CancelledWhileHolding { .. }
        )
    }
}

/// Configuration errors for the demonstration driver
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    #[diagnostic(
        code(config::invalid_value),
        help("Check the environment variable. Numeric options must be non-negative integers.")
    )]
    InvalidValue { key: &'static str, value: String },

    #[error("Worker thread count must be at least 1")]
    #[diagnostic(code(config::no_workers))]
    NoWorkers,

    #[error("Workload overflows the counter: {threads} threads x {increments} increments")]
    #[diagnostic(
        code(config::workload_overflow),
        help("Reduce HAZARDS_THREADS or HAZARDS_INCREMENTS.")
    )]
    WorkloadOverflow { threads: usize, increments: u64 },

    #[error("Deadlock watchdog ({watchdog_ms} ms) must be longer than the hold delay ({hold_ms} ms)")]
    #[diagnostic(
        code(config::watchdog_too_short),
        help("Raise HAZARDS_WATCHDOG_MS above HAZARDS_HOLD_MS so both operations reach their second lock.")
    )]
    WatchdogTooShort { watchdog_ms: u64, hold_ms: u64 },
}

/// Errors from running a demonstration scenario
#[derive(Error, Debug, Diagnostic)]
pub enum ScenarioError {
    #[error("Failed to spawn worker thread {name}")]
    #[diagnostic(code(scenario::spawn_failed))]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Worker thread {0} panicked")]
    #[diagnostic(
        code(scenario::worker_panicked),
        help("Locks held by the worker were released during unwinding.")
    )]
    WorkerPanicked(String),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}
