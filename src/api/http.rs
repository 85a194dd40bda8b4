//! HTTP implementation of [`MarketApi`] against the dashboard backend

use crate::api::types::*;
use crate::api::MarketApi;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// reqwest-backed API client
#[derive(Debug)]
pub struct HttpMarketApi {
    client: Client,
    base_url: Url,
}

impl HttpMarketApi {
    /// Build a client against the given base URL, e.g. `http://127.0.0.1:5000/`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AppError::Config(format!("Invalid API base URL '{}': {}", base_url, e)))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(AppError::Http)?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| AppError::Config(format!("Invalid API path '{}': {}", path, e)))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.endpoint(path)?;
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.json().await?)
    }

    async fn post_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.endpoint(path)?;
        let response = self.client.post(url).send().await?.error_for_status()?;
        Ok(response.json().await?)
    }
}

/// Reject a `success: false` envelope with the server's message.
fn check_success(success: bool, message: Option<String>) -> Result<()> {
    if success {
        Ok(())
    } else {
        Err(AppError::Api(
            message.unwrap_or_else(|| "request failed".to_string()),
        ))
    }
}

#[async_trait]
impl MarketApi for HttpMarketApi {
    async fn sectors(&self) -> Result<Vec<SectorSummary>> {
        #[derive(Deserialize)]
        struct SectorsResponse {
            success: bool,
            message: Option<String>,
            #[serde(default)]
            sectors: Vec<SectorSummary>,
        }

        let result: SectorsResponse = self.get_json("api/get_sectors").await?;
        check_success(result.success, result.message)?;
        Ok(result.sectors)
    }

    async fn sector_details(&self, sector_id: i64) -> Result<SectorDetails> {
        #[derive(Deserialize)]
        struct DetailsResponse {
            success: bool,
            message: Option<String>,
            sector_name: Option<String>,
            report_date: Option<String>,
            #[serde(default)]
            stocks: Vec<StockFundamentals>,
        }

        let result: DetailsResponse = self
            .get_json(&format!("api/get_sector_details/{}", sector_id))
            .await?;
        check_success(result.success, result.message)?;

        Ok(SectorDetails {
            sector_name: result
                .sector_name
                .ok_or_else(|| AppError::Api("missing sector_name in response".to_string()))?,
            report_date: result.report_date.unwrap_or_default(),
            stocks: result.stocks,
        })
    }

    async fn sector_history(&self, sector_id: i64) -> Result<SectorHistory> {
        #[derive(Deserialize)]
        struct HistoryResponse {
            success: bool,
            message: Option<String>,
            #[serde(default)]
            dates: Vec<String>,
            #[serde(default)]
            daily_changes: HashMap<String, DailySnapshot>,
        }

        let result: HistoryResponse = self
            .get_json(&format!("api/get_sector_stocks_with_change/{}", sector_id))
            .await?;
        check_success(result.success, result.message)?;

        Ok(SectorHistory {
            dates: result.dates,
            daily_changes: result.daily_changes,
        })
    }

    async fn money_flow(&self, code: &str) -> Result<MoneyFlow> {
        #[derive(Deserialize)]
        struct MoneyFlowResponse {
            success: bool,
            message: Option<String>,
            #[serde(flatten)]
            flow: Option<MoneyFlow>,
        }

        let result: MoneyFlowResponse =
            self.get_json(&format!("api/get_money_flow/{}", code)).await?;
        check_success(result.success, result.message)?;

        result
            .flow
            .ok_or_else(|| AppError::Api("missing money-flow series in response".to_string()))
    }

    async fn start_update(&self) -> Result<()> {
        #[derive(Deserialize)]
        struct StartResponse {
            success: bool,
            message: Option<String>,
        }

        let result: StartResponse = self.post_json("api/update_historical_data").await?;
        check_success(result.success, result.message)
    }

    async fn stop_update(&self) -> Result<()> {
        #[derive(Deserialize)]
        struct StopResponse {
            success: bool,
            message: Option<String>,
        }

        let result: StopResponse = self.post_json("api/stop_update").await?;
        check_success(result.success, result.message)
    }

    async fn update_progress(&self) -> Result<JobProgress> {
        self.get_json("api/update_progress").await
    }

    async fn update_status(&self) -> Result<UpdateStatus> {
        #[derive(Deserialize)]
        struct StatusResponse {
            success: bool,
            message: Option<String>,
            #[serde(default)]
            is_updating: bool,
            #[serde(default)]
            last_update_time: Option<chrono::DateTime<chrono::Utc>>,
        }

        let result: StatusResponse = self.get_json("api/update/status").await?;
        check_success(result.success, result.message)?;

        Ok(UpdateStatus {
            is_updating: result.is_updating,
            last_update_time: result.last_update_time,
        })
    }
}
