//! Update-job monitoring
//!
//! Drives the start/stop/poll protocol for the server-side historical-data
//! refresh job and exposes progress snapshots through an event callback.
//! Poll errors are terminal: the loop surfaces the failure once and stops
//! rather than retrying, matching the backend's contract.

pub mod poller;
pub mod status;

use crate::api::types::JobProgress;
use crate::api::MarketApi;
use crate::error::{AppError, Result};
use parking_lot::{Mutex, RwLock};
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

pub use poller::Poller;
pub use status::StatusWatcher;

/// Lifecycle of the monitored job as seen by this client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    Idle,
    Starting,
    Running,
    Completed,
    Failed,
    Stopped,
}

impl JobPhase {
    /// Terminal phases are restartable; only an active job blocks `start`.
    fn is_active(self) -> bool {
        matches!(self, JobPhase::Starting | JobPhase::Running)
    }
}

/// Events delivered to the rendering callback
#[derive(Debug, Clone)]
pub enum MonitorEvent {
    /// A progress snapshot while the job is still running
    Progress(JobProgress),
    /// The job reported completion; final snapshot attached
    Completed(JobProgress),
    /// A poll request failed; polling has ceased
    Failed(String),
    /// Polling ceased because `stop()` was called
    Stopped,
}

type EventCallback = Box<dyn Fn(&MonitorEvent) + Send + Sync>;

struct MonitorInner {
    phase: RwLock<JobPhase>,
    last_progress: RwLock<Option<JobProgress>>,
    on_event: RwLock<Option<EventCallback>>,
}

impl MonitorInner {
    fn emit(&self, event: MonitorEvent) {
        if let Some(callback) = self.on_event.read().as_ref() {
            callback(&event);
        }
    }

    /// Move to `to` only if still in `from`; a stop that raced the last
    /// in-flight poll must not be overwritten by the poll's outcome.
    fn transition(&self, from: JobPhase, to: JobPhase) -> bool {
        let mut phase = self.phase.write();
        if *phase == from {
            *phase = to;
            true
        } else {
            false
        }
    }
}

/// Monitor for the long-running historical-data refresh job.
///
/// One instance owns at most one poll loop; starting cancels any stale
/// loop before spawning a new one.
pub struct UpdateJobMonitor {
    api: Arc<dyn MarketApi>,
    poll_interval: Duration,
    inner: Arc<MonitorInner>,
    poller: Mutex<Option<Poller>>,
}

impl UpdateJobMonitor {
    /// Observed cadence for the historical-data job.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

    pub fn new(api: Arc<dyn MarketApi>, poll_interval: Duration) -> Self {
        Self {
            api,
            poll_interval,
            inner: Arc::new(MonitorInner {
                phase: RwLock::new(JobPhase::Idle),
                last_progress: RwLock::new(None),
                on_event: RwLock::new(None),
            }),
            poller: Mutex::new(None),
        }
    }

    /// Register the callback that receives monitor events
    pub fn set_event_callback<F>(&self, callback: F)
    where
        F: Fn(&MonitorEvent) + Send + Sync + 'static,
    {
        *self.inner.on_event.write() = Some(Box::new(callback));
    }

    pub fn phase(&self) -> JobPhase {
        *self.inner.phase.read()
    }

    pub fn is_running(&self) -> bool {
        self.phase().is_active()
    }

    /// Most recent progress snapshot, if any poll has succeeded
    pub fn last_progress(&self) -> Option<JobProgress> {
        self.inner.last_progress.read().clone()
    }

    /// Ask the server to start the job and begin polling its progress.
    ///
    /// Fails with [`AppError::AlreadyRunning`] while a job is starting or
    /// running. A rejected start request leaves the monitor idle.
    pub async fn start(&self) -> Result<()> {
        {
            let mut phase = self.inner.phase.write();
            if phase.is_active() {
                return Err(AppError::AlreadyRunning);
            }
            *phase = JobPhase::Starting;
        }

        info!("UpdateJobMonitor::start - requesting historical data update");

        if let Err(e) = self.api.start_update().await {
            self.inner.transition(JobPhase::Starting, JobPhase::Idle);
            return Err(e);
        }

        // A stop() issued while the start request was in flight has already
        // moved the phase to Stopped; it must not be clobbered and no poll
        // loop may spawn after it.
        if !self.inner.transition(JobPhase::Starting, JobPhase::Running) {
            info!("UpdateJobMonitor::start - stop requested before start completed");
            return Ok(());
        }

        *self.inner.last_progress.write() = None;
        self.spawn_poll_loop();
        Ok(())
    }

    /// Ask the server to stop the job and cease polling.
    ///
    /// The stop request is best-effort: its failure is logged, never fatal.
    /// Local polling always stops once the in-flight poll completes.
    pub async fn stop(&self) -> Result<()> {
        if !self.phase().is_active() {
            warn!("UpdateJobMonitor::stop called while no job is running");
            return Ok(());
        }

        if let Some(poller) = self.poller.lock().as_ref() {
            poller.cancel();
        }

        if self.inner.transition(JobPhase::Running, JobPhase::Stopped)
            || self.inner.transition(JobPhase::Starting, JobPhase::Stopped)
        {
            self.inner.emit(MonitorEvent::Stopped);
        }

        if let Err(e) = self.api.stop_update().await {
            warn!("Stop request failed (polling ceased regardless): {}", e);
        }

        Ok(())
    }

    fn spawn_poll_loop(&self) {
        let api = self.api.clone();
        let inner = self.inner.clone();

        let unit = move || {
            let api = api.clone();
            let inner = inner.clone();
            async move {
                match api.update_progress().await {
                    Ok(progress) => {
                        *inner.last_progress.write() = Some(progress.clone());

                        if progress.is_running {
                            inner.emit(MonitorEvent::Progress(progress));
                            ControlFlow::Continue(())
                        } else {
                            if inner.transition(JobPhase::Running, JobPhase::Completed) {
                                info!(
                                    "Historical data update completed, {} stocks updated",
                                    progress.updated_count
                                );
                                inner.emit(MonitorEvent::Completed(progress));
                            }
                            ControlFlow::Break(())
                        }
                    }
                    Err(e) => {
                        if inner.transition(JobPhase::Running, JobPhase::Failed) {
                            error!("Progress poll failed, polling ceased: {}", e);
                            inner.emit(MonitorEvent::Failed(e.to_string()));
                        }
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted backend: serves queued progress snapshots, then keeps
    /// repeating the last one.
    struct ScriptedApi {
        start_ok: bool,
        stop_ok: bool,
        start_delay: Duration,
        progress: Mutex<VecDeque<std::result::Result<JobProgress, String>>>,
        start_calls: AtomicUsize,
        stop_calls: AtomicUsize,
        poll_calls: AtomicUsize,
    }

    impl ScriptedApi {
        fn new(script: Vec<std::result::Result<JobProgress, String>>) -> Self {
            Self {
                start_ok: true,
                stop_ok: true,
                start_delay: Duration::from_millis(0),
                progress: Mutex::new(script.into()),
                start_calls: AtomicUsize::new(0),
                stop_calls: AtomicUsize::new(0),
                poll_calls: AtomicUsize::new(0),
            }
        }

        fn running(index: u32) -> JobProgress {
            JobProgress {
                is_running: true,
                current_index: index,
                total_stocks: 10,
                current_stock: Some(format!("stock-{}", index)),
                ..JobProgress::default()
            }
        }

        fn finished(updated: u32) -> JobProgress {
            JobProgress {
                is_running: false,
                updated_count: updated,
                ..JobProgress::default()
            }
        }
    }

    #[async_trait]
    impl MarketApi for ScriptedApi {
        async fn sectors(&self) -> Result<Vec<SectorSummary>> {
            Err(AppError::Internal("not scripted".to_string()))
        }

        async fn sector_details(&self, _sector_id: i64) -> Result<SectorDetails> {
            Err(AppError::Internal("not scripted".to_string()))
        }

        async fn sector_history(&self, _sector_id: i64) -> Result<SectorHistory> {
            Err(AppError::Internal("not scripted".to_string()))
        }

        async fn money_flow(&self, _code: &str) -> Result<MoneyFlow> {
            Err(AppError::Internal("not scripted".to_string()))
        }

        async fn start_update(&self) -> Result<()> {
            self.start_calls.fetch_add(1, Ordering::SeqCst);
            if !self.start_delay.is_zero() {
                tokio::time::sleep(self.start_delay).await;
            }
            if self.start_ok {
                Ok(())
            } else {
                Err(AppError::Api("updater unavailable".to_string()))
            }
        }

        async fn stop_update(&self) -> Result<()> {
            self.stop_calls.fetch_add(1, Ordering::SeqCst);
            if self.stop_ok {
                Ok(())
            } else {
                Err(AppError::Api("stop rejected".to_string()))
            }
        }

        async fn update_progress(&self) -> Result<JobProgress> {
            self.poll_calls.fetch_add(1, Ordering::SeqCst);
            let mut script = self.progress.lock();
            let next = if script.len() > 1 {
                script.pop_front().unwrap()
            } else {
                script.front().cloned().unwrap_or(Ok(JobProgress::default()))
            };
            next.map_err(AppError::Api)
        }

        async fn update_status(&self) -> Result<UpdateStatus> {
            Err(AppError::Internal("not scripted".to_string()))
        }
    }

    fn monitor(api: Arc<ScriptedApi>) -> UpdateJobMonitor {
        UpdateJobMonitor::new(api, Duration::from_millis(5))
    }

    #[tokio::test]
    async fn test_double_start_is_rejected_with_one_loop() {
        let api = Arc::new(ScriptedApi::new(vec![Ok(ScriptedApi::running(1))]));
        let monitor = monitor(api.clone());

        monitor.start().await.unwrap();
        let err = monitor.start().await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyRunning));

        // Exactly one start request went out, one loop is polling
        assert_eq!(api.start_calls.load(Ordering::SeqCst), 1);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(monitor.is_running());

        monitor.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_completion_allows_restart() {
        let api = Arc::new(ScriptedApi::new(vec![
            Ok(ScriptedApi::running(1)),
            Ok(ScriptedApi::finished(42)),
        ]));
        let monitor = monitor(api.clone());

        let events: Arc<Mutex<Vec<MonitorEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        monitor.set_event_callback(move |event| sink.lock().push(event.clone()));

        monitor.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(monitor.phase(), JobPhase::Completed);
        let seen = events.lock();
        assert!(matches!(seen.first(), Some(MonitorEvent::Progress(_))));
        match seen.last() {
            Some(MonitorEvent::Completed(progress)) => {
                assert_eq!(progress.updated_count, 42);
                assert!(progress.error_logs.is_empty());
            }
            other => panic!("expected Completed, got {:?}", other),
        }
        drop(seen);

        // Property: after is_running:false the next start succeeds
        monitor.start().await.unwrap();
        assert_eq!(api.start_calls.load(Ordering::SeqCst), 2);
        monitor.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_poll_error_is_terminal_not_retried() {
        let api = Arc::new(ScriptedApi::new(vec![
            Ok(ScriptedApi::running(1)),
            Err("progress endpoint down".to_string()),
        ]));
        let monitor = monitor(api.clone());

        let failures = Arc::new(AtomicUsize::new(0));
        let counter = failures.clone();
        monitor.set_event_callback(move |event| {
            if matches!(event, MonitorEvent::Failed(_)) {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        monitor.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(monitor.phase(), JobPhase::Failed);
        assert_eq!(failures.load(Ordering::SeqCst), 1);

        // No retry after the failing poll
        let polls = api.poll_calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(api.poll_calls.load(Ordering::SeqCst), polls);
    }

    #[tokio::test]
    async fn test_stop_ceases_polling_and_hits_stop_endpoint() {
        let api = Arc::new(ScriptedApi::new(vec![Ok(ScriptedApi::running(1))]));
        let monitor = monitor(api.clone());

        monitor.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        monitor.stop().await.unwrap();

        assert_eq!(monitor.phase(), JobPhase::Stopped);
        assert_eq!(api.stop_calls.load(Ordering::SeqCst), 1);

        let polls = api.poll_calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(api.poll_calls.load(Ordering::SeqCst), polls);

        // Stopped is restartable
        monitor.start().await.unwrap();
        monitor.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_stop_request_failure_is_not_fatal() {
        let api = Arc::new(ScriptedApi {
            stop_ok: false,
            ..ScriptedApi::new(vec![Ok(ScriptedApi::running(1))])
        });
        let monitor = monitor(api.clone());

        monitor.start().await.unwrap();
        monitor.stop().await.unwrap();

        assert_eq!(monitor.phase(), JobPhase::Stopped);
        assert!(!monitor.is_running());
    }

    #[tokio::test]
    async fn test_stop_during_slow_start_is_not_clobbered() {
        let api = Arc::new(ScriptedApi {
            start_delay: Duration::from_millis(40),
            ..ScriptedApi::new(vec![Ok(ScriptedApi::running(1))])
        });
        let monitor = Arc::new(monitor(api.clone()));

        let starter = monitor.clone();
        let start = tokio::spawn(async move { starter.start().await });

        // Stop while the start request is still in flight
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(monitor.phase(), JobPhase::Starting);
        monitor.stop().await.unwrap();
        assert_eq!(monitor.phase(), JobPhase::Stopped);

        // The completing start must not revive the job or spawn a loop
        start.await.unwrap().unwrap();
        assert_eq!(monitor.phase(), JobPhase::Stopped);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(api.poll_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_rejected_start_leaves_monitor_idle() {
        let api = Arc::new(ScriptedApi {
            start_ok: false,
            ..ScriptedApi::new(vec![])
        });
        let monitor = monitor(api.clone());

        let err = monitor.start().await.unwrap_err();
        assert!(matches!(err, AppError::Api(_)));
        assert_eq!(monitor.phase(), JobPhase::Idle);
        assert_eq!(api.poll_calls.load(Ordering::SeqCst), 0);
    }
}
