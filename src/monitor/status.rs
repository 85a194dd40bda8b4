//! Generic update-status watcher
//!
//! The dashboard shows a badge with the backend's overall update state
//! ("updating..." vs. "last updated at ..."). While an update is in flight
//! this polls `/api/update/status` on its own, slower cadence than the
//! historical-job monitor; the two intervals are independent contracts.

use crate::api::types::UpdateStatus;
use crate::api::MarketApi;
use crate::error::Result;
use crate::monitor::poller::Poller;
use parking_lot::{Mutex, RwLock};
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tracing::error;

type StatusCallback = Box<dyn Fn(&UpdateStatus) + Send + Sync>;

/// Polls the generic update-status endpoint until the backend reports
/// not-updating, or until the first poll error (fail-fast, no retries).
pub struct StatusWatcher {
    api: Arc<dyn MarketApi>,
    poll_interval: Duration,
    last: Arc<RwLock<Option<UpdateStatus>>>,
    poller: Mutex<Option<Poller>>,
}

impl StatusWatcher {
    /// Observed cadence for the status badge.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);

    pub fn new(api: Arc<dyn MarketApi>, poll_interval: Duration) -> Self {
        Self {
            api,
            poll_interval,
            last: Arc::new(RwLock::new(None)),
            poller: Mutex::new(None),
        }
    }

    /// One-shot status check, used on page load before any watching starts.
    pub async fn check_once(&self) -> Result<UpdateStatus> {
        let status = self.api.update_status().await?;
        *self.last.write() = Some(status.clone());
        Ok(status)
    }

    /// Most recent status snapshot seen.
    pub fn current(&self) -> Option<UpdateStatus> {
        self.last.read().clone()
    }

    /// Begin polling, delivering each snapshot to `on_status`. Replaces any
    /// previous watch so a watcher never runs two loops.
    pub fn watch<F>(&self, on_status: F)
    where
        F: Fn(&UpdateStatus) + Send + Sync + 'static,
    {
        let api = self.api.clone();
        let last = self.last.clone();
        let on_status: Arc<StatusCallback> = Arc::new(Box::new(on_status));

        let unit = move || {
            let api = api.clone();
            let last = last.clone();
            let on_status = on_status.clone();
            async move {
                match api.update_status().await {
                    Ok(status) => {
                        *last.write() = Some(status.clone());
                        on_status(&status);
                        if status.is_updating {
                            ControlFlow::Continue(())
                        } else {
                            ControlFlow::Break(())
                        }
                    }
                    Err(e) => {
                        error!("Update status poll failed, watch ceased: {}", e);
                        ControlFlow::Break(())
                    }
                }
            }
        };

        let poller = Poller::spawn(self.poll_interval, unit);
        if let Some(stale) = self.poller.lock().replace(poller) {
            stale.cancel();
        }
    }

    /// Stop watching. The in-flight poll, if any, completes first.
    pub fn cancel(&self) {
        if let Some(poller) = self.poller.lock().as_ref() {
            poller.cancel();
        }
    }
}
