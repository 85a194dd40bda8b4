//! Sector Service
//!
//! Sector listing and search, dragon-table loading, and the browse-tab
//! stock list with cumulative gains since the first charted day.

use crate::api::types::{SectorHistory, SectorSummary};
use crate::error::Result;
use crate::state::AppState;
use serde::Serialize;
use tracing::info;

/// Outcome of loading a sector into the screening engine
#[derive(Debug, Clone, Serialize)]
pub struct SectorLoadResult {
    pub sector_id: i64,
    pub sector_name: String,
    pub report_date: String,
    pub stock_count: usize,
    /// True when served from the snapshot cache instead of the backend
    pub from_cache: bool,
}

/// One row of the browse-tab stock list
#[derive(Debug, Clone, Serialize)]
pub struct StockChange {
    pub code: String,
    pub name: String,
    /// Cumulative gain since the first charted day, percent
    pub change: Option<f64>,
    pub amount_str: Option<String>,
}

/// Sector service for business logic
pub struct SectorService;

impl SectorService {
    /// List all sectors
    pub async fn list_sectors(state: &AppState) -> Result<Vec<SectorSummary>> {
        info!("SectorService::list_sectors");
        state.api.sectors().await
    }

    /// Case-insensitive substring search over sector names. An empty query
    /// matches everything.
    pub fn search_sectors(sectors: &[SectorSummary], query: &str) -> Vec<SectorSummary> {
        let query = query.trim().to_lowercase();
        sectors
            .iter()
            .filter(|sector| query.is_empty() || sector.name.to_lowercase().contains(&query))
            .cloned()
            .collect()
    }

    /// Load a sector's fundamentals into the screening engine, consulting
    /// the snapshot cache first. The engine's filter policy decides whether
    /// filter/sort state survives the switch.
    pub async fn load_sector(state: &AppState, sector_id: i64) -> Result<SectorLoadResult> {
        info!("SectorService::load_sector - sector_id={}", sector_id);

        let (details, from_cache) = match state.cached_sector(sector_id) {
            Some(details) => (details, true),
            None => {
                let details = state.api.sector_details(sector_id).await?;
                state.sector_cache.insert(sector_id, details.clone());
                (details, false)
            }
        };

        let result = SectorLoadResult {
            sector_id,
            sector_name: details.sector_name.clone(),
            report_date: details.report_date.clone(),
            stock_count: details.stocks.len(),
            from_cache,
        };

        state.screening.write().load_dataset(details.stocks);
        Ok(result)
    }

    /// Stock list for a sector with cumulative gain since the first charted
    /// day, sorted largest gain first.
    pub async fn stocks_with_change(
        state: &AppState,
        sector_id: i64,
    ) -> Result<Vec<StockChange>> {
        info!("SectorService::stocks_with_change - sector_id={}", sector_id);

        let history = state.api.sector_history(sector_id).await?;
        Ok(Self::cumulative_changes(&history))
    }

    /// Cumulative gain per stock: latest close vs. first-day close, in
    /// percent rounded to two decimals. A stock without both closes falls
    /// back to the server-provided daily change.
    pub fn cumulative_changes(history: &SectorHistory) -> Vec<StockChange> {
        let (first_date, latest_date) = match (history.dates.first(), history.dates.last()) {
            (Some(first), Some(latest)) => (first, latest),
            _ => return Vec::new(),
        };

        let first_day = history.daily_changes.get(first_date);
        let latest_day = match history.daily_changes.get(latest_date) {
            Some(day) => day,
            None => return Vec::new(),
        };

        let mut rows: Vec<StockChange> = latest_day
            .stocks
            .iter()
            .map(|stock| {
                let base = first_day
                    .and_then(|day| day.stocks.iter().find(|s| s.code == stock.code))
                    .and_then(|s| s.close);

                let change = match (base, stock.close) {
                    (Some(base), Some(current)) if base != 0.0 => {
                        Some((((current - base) / base * 100.0) * 100.0).round() / 100.0)
                    }
                    _ => stock.change,
                };

                StockChange {
                    code: stock.code.clone(),
                    name: stock.name.clone(),
                    change,
                    amount_str: stock.amount_str.clone(),
                }
            })
            .collect();

        rows.sort_by(|a, b| {
            let a_key = a.change.unwrap_or(f64::NEG_INFINITY);
            let b_key = b.change.unwrap_or(f64::NEG_INFINITY);
            b_key.total_cmp(&a_key)
        });

        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::*;
    use crate::api::MarketApi;
    use crate::config::AppConfig;
    use crate::error::AppError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct SectorApi {
        details_calls: AtomicUsize,
    }

    #[async_trait]
    impl MarketApi for SectorApi {
        async fn sectors(&self) -> Result<Vec<SectorSummary>> {
            Ok(vec![
                SectorSummary {
                    id: 1,
                    name: "Semiconductors".to_string(),
                    stock_count: 2,
                },
                SectorSummary {
                    id: 2,
                    name: "Baijiu".to_string(),
                    stock_count: 1,
                },
            ])
        }

        async fn sector_details(&self, sector_id: i64) -> Result<SectorDetails> {
            self.details_calls.fetch_add(1, Ordering::SeqCst);
            Ok(SectorDetails {
                sector_name: format!("sector-{}", sector_id),
                report_date: "2025-03-31".to_string(),
                stocks: vec![
                    StockFundamentals {
                        code: "000001".to_string(),
                        name: "alpha".to_string(),
                        market_value: Some(100.0),
                        revenue: Some(50.0),
                        net_profit: None,
                        gross_margin: None,
                        debt_ratio: None,
                    },
                    StockFundamentals {
                        code: "000002".to_string(),
                        name: "beta".to_string(),
                        market_value: Some(200.0),
                        revenue: Some(10.0),
                        net_profit: None,
                        gross_margin: None,
                        debt_ratio: None,
                    },
                ],
            })
        }

        async fn sector_history(&self, _sector_id: i64) -> Result<SectorHistory> {
            Err(AppError::Internal("not scripted".to_string()))
        }

        async fn money_flow(&self, _code: &str) -> Result<MoneyFlow> {
            Err(AppError::Internal("not scripted".to_string()))
        }

        async fn start_update(&self) -> Result<()> {
            Err(AppError::Internal("not scripted".to_string()))
        }

        async fn stop_update(&self) -> Result<()> {
            Err(AppError::Internal("not scripted".to_string()))
        }

        async fn update_progress(&self) -> Result<JobProgress> {
            Err(AppError::Internal("not scripted".to_string()))
        }

        async fn update_status(&self) -> Result<UpdateStatus> {
            Err(AppError::Internal("not scripted".to_string()))
        }
    }

    fn test_api() -> Arc<SectorApi> {
        Arc::new(SectorApi {
            details_calls: AtomicUsize::new(0),
        })
    }

    fn test_state(api: Arc<SectorApi>) -> AppState {
        AppState::with_api(api, AppConfig::default())
    }

    fn day(stocks: Vec<(&str, Option<f64>, Option<f64>)>) -> DailySnapshot {
        DailySnapshot {
            stocks: stocks
                .into_iter()
                .map(|(code, close, change)| DailyStock {
                    code: code.to_string(),
                    name: code.to_string(),
                    close,
                    change,
                    amount_str: None,
                })
                .collect(),
            total_amount: 0.0,
            total_amount_str: None,
        }
    }

    #[test]
    fn test_search_sectors_is_case_insensitive_substring() {
        let sectors = vec![
            SectorSummary {
                id: 1,
                name: "New Energy Vehicles".to_string(),
                stock_count: 5,
            },
            SectorSummary {
                id: 2,
                name: "Photovoltaics".to_string(),
                stock_count: 3,
            },
        ];

        let hits = SectorService::search_sectors(&sectors, "energy");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 1);

        assert_eq!(SectorService::search_sectors(&sectors, "").len(), 2);
        assert_eq!(SectorService::search_sectors(&sectors, "  VOLT ").len(), 1);
        assert!(SectorService::search_sectors(&sectors, "banking").is_empty());
    }

    #[tokio::test]
    async fn test_load_sector_feeds_engine_and_caches() {
        let api = test_api();
        let state = test_state(api.clone());

        let result = SectorService::load_sector(&state, 7).await.unwrap();
        assert_eq!(result.sector_name, "sector-7");
        assert_eq!(result.stock_count, 2);
        assert!(!result.from_cache);

        // Engine now holds the snapshot, default sort market_value desc
        let view = state.screening.read().compute_view();
        assert_eq!(view[0].code, "000002");

        // Second load is served from cache, no refetch
        let again = SectorService::load_sector(&state, 7).await.unwrap();
        assert!(again.from_cache);
        assert_eq!(api.details_calls.load(Ordering::SeqCst), 1);

        state.invalidate_sector_cache();
        let fresh = SectorService::load_sector(&state, 7).await.unwrap();
        assert!(!fresh.from_cache);
        assert_eq!(api.details_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_sticky_filters_apply_to_newly_loaded_sector() {
        let state = test_state(test_api());
        state
            .screening
            .write()
            .set_filter("revenue", Some("20"))
            .unwrap();

        SectorService::load_sector(&state, 1).await.unwrap();
        let view = state.screening.read().compute_view();
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].code, "000001");
    }

    #[test]
    fn test_cumulative_changes_vs_first_day() {
        let mut daily_changes = HashMap::new();
        daily_changes.insert(
            "2025-01-02".to_string(),
            day(vec![("A", Some(10.0), Some(0.0)), ("B", Some(20.0), Some(0.0))]),
        );
        daily_changes.insert(
            "2025-01-10".to_string(),
            day(vec![
                ("A", Some(11.0), Some(1.0)),
                ("B", Some(18.0), Some(-2.0)),
                ("C", None, Some(3.5)),
            ]),
        );
        let history = SectorHistory {
            dates: vec!["2025-01-02".to_string(), "2025-01-10".to_string()],
            daily_changes,
        };

        let rows = SectorService::cumulative_changes(&history);
        assert_eq!(rows.len(), 3);
        // A: +10%, C falls back to its daily change, B: -10%
        assert_eq!(rows[0].code, "A");
        assert_eq!(rows[0].change, Some(10.0));
        assert_eq!(rows[1].code, "C");
        assert_eq!(rows[1].change, Some(3.5));
        assert_eq!(rows[2].code, "B");
        assert_eq!(rows[2].change, Some(-10.0));
    }

    #[test]
    fn test_cumulative_changes_empty_history() {
        let history = SectorHistory {
            dates: Vec::new(),
            daily_changes: HashMap::new(),
        };
        assert!(SectorService::cumulative_changes(&history).is_empty());
    }
}
