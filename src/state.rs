//! Application state management

use crate::api::types::SectorDetails;
use crate::api::{HttpMarketApi, MarketApi};
use crate::config::AppConfig;
use crate::error::Result;
use crate::monitor::{StatusWatcher, UpdateJobMonitor};
use crate::screening::ScreeningEngine;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;

/// State shared across the dashboard session.
///
/// The screening engine sits behind a lock so every mutation is serialized
/// through one owner; the monitors are internally synchronized and the
/// sector cache is concurrent.
pub struct AppState {
    /// Backend API client
    pub api: Arc<dyn MarketApi>,

    /// Dragon-table screening engine
    pub screening: RwLock<ScreeningEngine>,

    /// Monitor for the historical-data refresh job
    pub update_job: UpdateJobMonitor,

    /// Watcher for the generic update-status badge
    pub update_status: StatusWatcher,

    /// Fundamentals snapshots by sector id, so re-selecting a sector does
    /// not refetch
    pub sector_cache: DashMap<i64, SectorDetails>,

    /// Active configuration
    pub config: AppConfig,
}

impl AppState {
    /// Build state against the configured backend
    pub fn new(config: AppConfig) -> Result<Self> {
        let api: Arc<dyn MarketApi> = Arc::new(HttpMarketApi::new(
            &config.api_base_url,
            config.http_timeout(),
        )?);
        tracing::info!("API client ready for {}", config.api_base_url);
        Ok(Self::with_api(api, config))
    }

    /// Build state with an injected API implementation (tests, sandboxes)
    pub fn with_api(api: Arc<dyn MarketApi>, config: AppConfig) -> Self {
        Self {
            screening: RwLock::new(ScreeningEngine::new(config.filter_policy)),
            update_job: UpdateJobMonitor::new(api.clone(), config.job_poll_interval()),
            update_status: StatusWatcher::new(api.clone(), config.status_poll_interval()),
            sector_cache: DashMap::new(),
            api,
            config,
        }
    }

    /// Cached fundamentals snapshot for a sector, if one was loaded
    pub fn cached_sector(&self, sector_id: i64) -> Option<SectorDetails> {
        self.sector_cache.get(&sector_id).map(|entry| entry.clone())
    }

    /// Drop every cached sector snapshot (after a data refresh completes,
    /// cached fundamentals may be stale)
    pub fn invalidate_sector_cache(&self) {
        self.sector_cache.clear();
        tracing::info!("Sector snapshot cache invalidated");
    }
}
