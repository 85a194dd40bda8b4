//! Wire types shared with the dashboard backend

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A sector as listed in the sector picker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectorSummary {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub stock_count: u32,
}

/// One stock's fundamentals row in the dragon table.
///
/// Every metric is optional: the server omits figures a company has not
/// reported, and the screening engine must treat those as absent rather
/// than zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockFundamentals {
    pub code: String,
    pub name: String,
    pub market_value: Option<f64>,
    pub revenue: Option<f64>,
    pub net_profit: Option<f64>,
    pub gross_margin: Option<f64>,
    pub debt_ratio: Option<f64>,
}

/// Fundamentals snapshot for a whole sector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectorDetails {
    pub sector_name: String,
    pub report_date: String,
    pub stocks: Vec<StockFundamentals>,
}

/// One stock on one trading day, as served by the history endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyStock {
    pub code: String,
    pub name: String,
    pub close: Option<f64>,
    pub change: Option<f64>,
    #[serde(default)]
    pub amount_str: Option<String>,
}

/// All stocks of a sector on one trading day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySnapshot {
    pub stocks: Vec<DailyStock>,
    #[serde(default)]
    pub total_amount: f64,
    #[serde(default)]
    pub total_amount_str: Option<String>,
}

/// Per-day close history for a sector, keyed by trade date.
///
/// `dates` is ordered oldest first; `daily_changes` holds one snapshot
/// per entry in `dates`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectorHistory {
    pub dates: Vec<String>,
    pub daily_changes: HashMap<String, DailySnapshot>,
}

/// Money-flow volume series for a single stock, split by order size.
///
/// Volumes are in units of 10k CNY as served; `StockService` converts
/// them for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoneyFlow {
    pub dates: Vec<String>,
    pub buy_sm_vol: Vec<f64>,
    pub sell_sm_vol: Vec<f64>,
    pub buy_md_vol: Vec<f64>,
    pub sell_md_vol: Vec<f64>,
    pub buy_lg_vol: Vec<f64>,
    pub sell_lg_vol: Vec<f64>,
    pub buy_elg_vol: Vec<f64>,
    pub sell_elg_vol: Vec<f64>,
    pub net_mf_vol: Vec<f64>,
}

/// Progress snapshot of the historical-data refresh job.
///
/// Produced server-side; the monitor only reads successive snapshots.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobProgress {
    pub is_running: bool,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub current_index: u32,
    #[serde(default)]
    pub total_stocks: u32,
    #[serde(default)]
    pub current_stock: Option<String>,
    #[serde(default)]
    pub updated_count: u32,
    #[serde(default)]
    pub error_logs: Vec<String>,
}

/// Snapshot from the generic update-status endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatus {
    pub is_updating: bool,
    #[serde(default)]
    pub last_update_time: Option<DateTime<Utc>>,
}
