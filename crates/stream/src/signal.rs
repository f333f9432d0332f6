//! Cooperative stop signal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

/// Shared stop flag, settable from any thread.
///
/// The controller only ever sleeps through [`StopSignal::wait_for`], so a
/// stop request wakes it immediately instead of waiting out the polling
/// interval. Checking [`StopSignal::is_stopped`] is lock-free.
#[derive(Clone)]
pub struct StopSignal {
    inner: Arc<Inner>,
}

struct Inner {
    stopped: AtomicBool,
    lock: Mutex<()>,
    cv: Condvar,
}

impl StopSignal {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                stopped: AtomicBool::new(false),
                lock: Mutex::new(()),
                cv: Condvar::new(),
            }),
        }
    }

    /// Request shutdown. Idempotent; wakes every waiting thread.
    pub fn request_stop(&self) {
        self.inner.stopped.store(true, Ordering::SeqCst);
        let _guard = self.inner.lock.lock().expect("stop signal mutex poisoned");
        self.inner.cv.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::SeqCst)
    }

    /// Sleep for up to `duration`, returning early if stop is requested.
    ///
    /// Returns true when the signal is stopped.
    pub fn wait_for(&self, duration: Duration) -> bool {
        if self.is_stopped() {
            return true;
        }
        let guard = self.inner.lock.lock().expect("stop signal mutex poisoned");
        let (_guard, _timeout) = self
            .inner
            .cv
            .wait_timeout_while(guard, duration, |_| !self.is_stopped())
            .expect("stop signal mutex poisoned");
        self.is_stopped()
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}
