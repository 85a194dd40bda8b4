//! Cancellable repeat-until-predicate scheduling primitive
//!
//! One unit of work runs at a time; the next run is scheduled only after
//! the previous one completes, so slow responses delay the cadence instead
//! of piling up overlapping requests. `cancel()` interrupts the inter-run
//! sleep but never an in-flight unit: cancellation takes effect as soon as
//! the current unit (if any) resolves.

use parking_lot::Mutex;
use std::future::Future;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Handle to a spawned polling loop.
pub struct Poller {
    cancelled: Arc<AtomicBool>,
    wake: Arc<Notify>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Poller {
    /// Spawn a loop that runs `unit`, then sleeps `interval`, until the unit
    /// returns `ControlFlow::Break` or the poller is cancelled.
    pub fn spawn<F, Fut>(interval: Duration, mut unit: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ControlFlow<()>> + Send,
    {
        let cancelled = Arc::new(AtomicBool::new(false));
        let wake = Arc::new(Notify::new());

        let flag = cancelled.clone();
        let sleeper = wake.clone();
        let handle = tokio::spawn(async move {
            loop {
                if flag.load(Ordering::SeqCst) {
                    break;
                }

                if let ControlFlow::Break(()) = unit().await {
                    break;
                }

                if flag.load(Ordering::SeqCst) {
                    break;
                }

                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = sleeper.notified() => break,
                }
            }
        });

        Self {
            cancelled,
            wake,
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Stop rescheduling. The in-flight unit, if any, runs to completion.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.wake.notify_waiters();
    }

    /// True once the loop has exited (by predicate or cancellation).
    pub fn is_finished(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .map_or(true, |handle| handle.is_finished())
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.cancel();
    }
}
