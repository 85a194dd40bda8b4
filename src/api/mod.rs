//! Remote dashboard API adapter

pub mod http;
pub mod types;

use crate::error::Result;
use async_trait::async_trait;
use types::*;

pub use http::HttpMarketApi;

/// Client-side view of the dashboard backend.
///
/// The backend is a collaborator with a fixed JSON contract; everything in
/// the crate talks to it through this trait so tests can substitute a
/// scripted implementation.
#[async_trait]
pub trait MarketApi: Send + Sync {
    /// List all sectors
    async fn sectors(&self) -> Result<Vec<SectorSummary>>;

    /// Fundamentals snapshot for one sector
    async fn sector_details(&self, sector_id: i64) -> Result<SectorDetails>;

    /// Per-day close history for one sector
    async fn sector_history(&self, sector_id: i64) -> Result<SectorHistory>;

    /// Money-flow series for one stock
    async fn money_flow(&self, code: &str) -> Result<MoneyFlow>;

    /// Start the historical-data refresh job
    async fn start_update(&self) -> Result<()>;

    /// Ask the server to stop the refresh job
    async fn stop_update(&self) -> Result<()>;

    /// Poll the refresh job's progress
    async fn update_progress(&self) -> Result<JobProgress>;

    /// Poll the generic update status
    async fn update_status(&self) -> Result<UpdateStatus>;
}
