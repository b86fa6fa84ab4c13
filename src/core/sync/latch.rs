/*!
 * Countdown Latch
 *
 * Completion barrier built on parking_lot::Condvar
 */

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Blocks waiters until a known number of arrivals have counted down
///
/// # Example
///
/// ```
/// use sync_hazards::core::sync::CountdownLatch;
/// use std::sync::Arc;
/// use std::thread;
///
/// let latch = Arc::new(CountdownLatch::new(2));
/// for _ in 0..2 {
///     let latch = latch.clone();
///     thread::spawn(move || latch.count_down());
/// }
/// latch.wait();
/// assert_eq!(latch.count(), 0);
/// ```
pub struct CountdownLatch {
    remaining: Mutex<usize>,
    condvar: Condvar,
}

impl CountdownLatch {
    pub fn new(count: usize) -> Self {
        Self {
            remaining: Mutex::new(count),
            condvar: Condvar::new(),
        }
    }

    /// Record one arrival. Extra arrivals past zero are ignored.
    pub fn count_down(&self) {
        let mut remaining = self.remaining.lock();
        if *remaining == 0 {
            return;
        }
        *remaining -= 1;
        if *remaining == 0 {
            self.condvar.notify_all();
        }
    }

    /// Arrivals still outstanding
    #[inline]
    pub fn count(&self) -> usize {
        *self.remaining.lock()
    }

    /// Block until the count reaches zero
    pub fn wait(&self) {
        let mut remaining = self.remaining.lock();
        while *remaining > 0 {
            self.condvar.wait(&mut remaining);
        }
    }

    /// Block until the count reaches zero or `timeout` elapses
    ///
    /// Returns `true` if the latch opened. A timeout too long to form a
    /// deadline behaves like [`wait`](Self::wait).
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            self.wait();
            return true;
        };

        let mut remaining = self.remaining.lock();
        while *remaining > 0 {
            if self.condvar.wait_until(&mut remaining, deadline).timed_out() {
                return *remaining == 0;
            }
        }
        true
    }

    /// Guard that counts down when dropped, on every exit path
    pub fn arrive_on_drop(self: &Arc<Self>) -> LatchArrival {
        LatchArrival {
            latch: Arc::clone(self),
        }
    }
}

/// Counts its latch down on drop
pub struct LatchArrival {
    latch: Arc<CountdownLatch>,
}

impl Drop for LatchArrival {
    fn drop(&mut self) {
        self.latch.count_down();
    }
}
