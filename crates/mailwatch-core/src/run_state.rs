//! Shared stop flag.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

/// Run flag shared between the supervisor handle and its worker.
///
/// Once stopped it stays stopped. Every task blocked in
/// [`stopped`](Self::stopped) wakes up.
#[derive(Debug, Default)]
pub struct RunState {
    stopped: AtomicBool,
    notify: Notify,
}

impl RunState {
    /// Creates a running state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true once [`stop`](Self::stop) has been called.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Flips the flag and wakes every waiter. Idempotent.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }

    /// Completes once the state is stopped.
    ///
    /// Cancel-safe; the waiter is registered before the flag is checked so
    /// a concurrent [`stop`](Self::stop) is never missed.
    pub async fn stopped(&self) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.is_stopped() {
                return;
            }
            notified.await;
        }
    }
}
