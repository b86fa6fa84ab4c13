/*!
 * Cancellation Tokens
 *
 * Cooperative interruption for threads blocked on locks or pausing
 */

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

struct CancelState {
    cancelled: AtomicBool,
    mutex: Mutex<()>,
    condvar: Condvar,
}

/// Shared cancellation flag
///
/// Cloning yields a handle to the same flag. Once cancelled a token stays
/// cancelled.
///
/// # Example
///
/// ```
/// use sync_hazards::core::sync::CancellationToken;
/// use std::time::Duration;
///
/// let token = CancellationToken::new();
/// let worker_token = token.clone();
///
/// token.cancel();
/// assert!(worker_token.sleep(Duration::from_secs(60)).is_err());
/// ```
#[derive(Clone)]
pub struct CancellationToken {
    state: Arc<CancelState>,
}

/// Returned by [`CancellationToken::sleep`] when the pause was interrupted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interrupted;

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            state: Arc::new(CancelState {
                cancelled: AtomicBool::new(false),
                mutex: Mutex::new(()),
                condvar: Condvar::new(),
            }),
        }
    }

    /// Signal cancellation and wake every sleeper
    pub fn cancel(&self) {
        self.state.cancelled.store(true, Ordering::Release);
        // Taking the mutex orders the store against a sleeper's check-then-wait
        let _guard = self.state.mutex.lock();
        self.state.condvar.notify_all();
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::Acquire)
    }

    /// Pause for `duration`, returning early if cancelled
    ///
    /// A duration too long to form a deadline pauses until cancelled.
    pub fn sleep(&self, duration: Duration) -> Result<(), Interrupted> {
        let deadline = Instant::now().checked_add(duration);
        let mut guard = self.state.mutex.lock();

        loop {
            if self.is_cancelled() {
                return Err(Interrupted);
            }
            match deadline {
                Some(deadline) => {
                    if Instant::now() >= deadline {
                        return Ok(());
                    }
                    self.state.condvar.wait_until(&mut guard, deadline);
                }
                None => self.state.condvar.wait(&mut guard),
            }
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_sleep_completes() {
        let token = CancellationToken::new();
        let start = Instant::now();
        assert!(token.sleep(Duration::from_millis(20)).is_ok());
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_cancel_wakes_sleeper() {
        let token = CancellationToken::new();
        let sleeper = token.clone();

        let handle = thread::spawn(move || {
            let start = Instant::now();
            (sleeper.sleep(Duration::from_secs(30)), start.elapsed())
        });

        thread::sleep(Duration::from_millis(50));
        token.cancel();

        let (result, elapsed) = handle.join().unwrap();
        assert_eq!(result, Err(Interrupted));
        assert!(elapsed < Duration::from_secs(5));
    }

    #[test]
    fn test_unbounded_sleep_waits_for_cancel() {
        let token = CancellationToken::new();
        let sleeper = token.clone();

        let handle = thread::spawn(move || sleeper.sleep(Duration::MAX));

        thread::sleep(Duration::from_millis(30));
        assert!(!handle.is_finished());
        token.cancel();

        assert_eq!(handle.join().unwrap(), Err(Interrupted));
    }

    #[test]
    fn test_cancel_is_sticky() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        token.cancel();
        token.cancel();
        assert!(token.clone().is_cancelled());
        assert_eq!(token.sleep(Duration::ZERO), Err(Interrupted));
    }
}
