//! Stock Service
//!
//! Per-stock money-flow series, converted from the wire's 10k-CNY volume
//! units into 100M CNY for display.

use crate::api::types::MoneyFlow;
use crate::error::Result;
use crate::state::AppState;
use serde::Serialize;
use tracing::info;

const WIRE_UNITS_PER_100M: f64 = 100_000.0;

/// Money-flow series shaped for the three flow panels, in 100M CNY
#[derive(Debug, Clone, Serialize)]
pub struct MoneyFlowView {
    pub dates: Vec<String>,
    pub buy_small: Vec<f64>,
    pub sell_small: Vec<f64>,
    pub buy_medium: Vec<f64>,
    pub sell_medium: Vec<f64>,
    pub buy_large: Vec<f64>,
    pub sell_large: Vec<f64>,
    pub buy_extra_large: Vec<f64>,
    pub sell_extra_large: Vec<f64>,
    pub net_inflow: Vec<f64>,
}

/// Stock service for business logic
pub struct StockService;

impl StockService {
    /// Fetch and convert the money-flow series for one stock
    pub async fn money_flow(state: &AppState, code: &str) -> Result<MoneyFlowView> {
        info!("StockService::money_flow - code={}", code);

        let flow = state.api.money_flow(code).await?;
        Ok(Self::to_view(flow))
    }

    /// Convert wire volumes to 100M CNY
    pub fn to_view(flow: MoneyFlow) -> MoneyFlowView {
        fn convert(series: Vec<f64>) -> Vec<f64> {
            series.into_iter().map(|v| v / WIRE_UNITS_PER_100M).collect()
        }

        MoneyFlowView {
            dates: flow.dates,
            buy_small: convert(flow.buy_sm_vol),
            sell_small: convert(flow.sell_sm_vol),
            buy_medium: convert(flow.buy_md_vol),
            sell_medium: convert(flow.sell_md_vol),
            buy_large: convert(flow.buy_lg_vol),
            sell_large: convert(flow.sell_lg_vol),
            buy_extra_large: convert(flow.buy_elg_vol),
            sell_extra_large: convert(flow.sell_elg_vol),
            net_inflow: convert(flow.net_mf_vol),
        }
    }
}
