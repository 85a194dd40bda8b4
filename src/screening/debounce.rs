//! Trailing-edge debounce for filter-input handling
//!
//! Filter boxes fire on every keystroke; recomputing the view each time is
//! wasted work. The debouncer delays an action and drops it if a newer one
//! arrives first. Scheduling a new action always cancels the pending timer,
//! so a debouncer can never fire twice for one burst of input.

use parking_lot::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;

/// One debounce timer; create one per input source.
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

/// Observed default for the dragon-table filter inputs.
pub const DEFAULT_FILTER_DEBOUNCE: Duration = Duration::from_millis(300);

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    /// Schedule `action` to run after the delay, replacing any action still
    /// waiting. Must be called from within a tokio runtime.
    pub fn call<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let delay = self.delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action();
        });

        if let Some(previous) = self.pending.lock().replace(handle) {
            previous.abort();
        }
    }

    /// Drop any pending action without running it.
    pub fn cancel(&self) {
        if let Some(previous) = self.pending.lock().take() {
            previous.abort();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
