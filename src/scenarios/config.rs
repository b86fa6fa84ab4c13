/*!
 * Demonstration Configuration
 *
 * Workload sizes and timing glue for the driver, read from the environment
 */

use crate::core::errors::ConfigError;
use crate::core::limits::{
    DEFAULT_DEADLOCK_WATCHDOG, DEFAULT_HOLD_DELAY, DEFAULT_INCREMENTS_PER_THREAD,
    DEFAULT_WORKER_THREADS,
};
use crate::core::sync::CounterStrategy;
use serde::Serialize;
use std::str::FromStr;
use std::time::Duration;

pub const THREADS_ENV: &str = "HAZARDS_THREADS";
pub const INCREMENTS_ENV: &str = "HAZARDS_INCREMENTS";
pub const HOLD_MS_ENV: &str = "HAZARDS_HOLD_MS";
pub const WATCHDOG_MS_ENV: &str = "HAZARDS_WATCHDOG_MS";
pub const COUNTER_STRATEGY_ENV: &str = "HAZARDS_COUNTER_STRATEGY";
pub const REPORT_JSON_ENV: &str = "HAZARDS_REPORT_JSON";

/// Driver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DemoConfig {
    /// Concurrent workers in the lost-update scenario
    pub threads: usize,
    /// Increments issued by each worker
    pub increments_per_thread: u64,
    pub counter_strategy: CounterStrategy,
    /// Pause while holding the first lock
    #[serde(with = "millis")]
    pub hold_delay: Duration,
    /// Wait before declaring the naive lock scenario deadlocked
    #[serde(with = "millis")]
    pub deadlock_watchdog: Duration,
    /// Print reports as JSON on stdout
    pub report_json: bool,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            threads: DEFAULT_WORKER_THREADS,
            increments_per_thread: DEFAULT_INCREMENTS_PER_THREAD,
            counter_strategy: CounterStrategy::default(),
            hold_delay: DEFAULT_HOLD_DELAY,
            deadlock_watchdog: DEFAULT_DEADLOCK_WATCHDOG,
            report_json: false,
        }
    }
}

impl DemoConfig {
    /// Small workload with short pauses, for quick runs and tests
    pub fn quick() -> Self {
        Self {
            threads: 4,
            increments_per_thread: 10_000,
            hold_delay: Duration::from_millis(100),
            deadlock_watchdog: Duration::from_millis(600),
            ..Self::default()
        }
    }

    /// Defaults overridden by any `HAZARDS_*` environment variables that are set
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let config = Self {
            threads: env_or(THREADS_ENV, defaults.threads)?,
            increments_per_thread: env_or(INCREMENTS_ENV, defaults.increments_per_thread)?,
            counter_strategy: env_or(COUNTER_STRATEGY_ENV, defaults.counter_strategy)?,
            hold_delay: env_or(HOLD_MS_ENV, defaults.hold_delay.as_millis() as u64)
                .map(Duration::from_millis)?,
            deadlock_watchdog: env_or(
                WATCHDOG_MS_ENV,
                defaults.deadlock_watchdog.as_millis() as u64,
            )
            .map(Duration::from_millis)?,
            report_json: env_flag(REPORT_JSON_ENV),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject workloads the counter cannot represent and watchdogs that
    /// would fire during the pause
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threads == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.deadlock_watchdog <= self.hold_delay {
            return Err(ConfigError::WatchdogTooShort {
                watchdog_ms: self.deadlock_watchdog.as_millis() as u64,
                hold_ms: self.hold_delay.as_millis() as u64,
            });
        }
        self.expected_total().map(|_| ())
    }

    /// Threads x increments, or an overflow error
    pub fn expected_total(&self) -> Result<u64, ConfigError> {
        u64::try_from(self.threads)
            .ok()
            .and_then(|threads| threads.checked_mul(self.increments_per_thread))
            .ok_or(ConfigError::WorkloadOverflow {
                threads: self.threads,
                increments: self.increments_per_thread,
            })
    }
}

fn env_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
        Err(_) => Ok(default),
    }
}

fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false)
}

mod millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }
}
