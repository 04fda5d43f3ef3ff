//! Live provider backed by the upstream stock-info backend.
//!
//! The upstream is the data-collection service that owns the yfinance
//! scraping and its own staging cache. This adapter speaks its small HTTP
//! surface:
//! - `GET /saved_stock_info?category=<c>[&refresh=true]`
//! - `GET /commit_refresh`
//! - `POST /api/update_flag` with `{"symbol", "flag"}`
//! - `GET /get_chart_data?symbol=<s>`

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use async_trait::async_trait;

use super::provider::{ProviderError, StockDataProvider};
use super::{CategoryPayload, ChartData};

// ============================================================================
// Constants
// ============================================================================

/// Category data endpoint
const STOCK_INFO_ENDPOINT: &str = "/saved_stock_info";

/// Refresh commit endpoint
const COMMIT_REFRESH_ENDPOINT: &str = "/commit_refresh";

/// Owned-flag update endpoint
const UPDATE_FLAG_ENDPOINT: &str = "/api/update_flag";

/// Candlestick history endpoint
const CHART_ENDPOINT: &str = "/get_chart_data";

/// Retry hint when the upstream rate-limits without a Retry-After header
const RATE_LIMIT_RETRY_SECS: u64 = 60;

// ============================================================================
// Live API Provider
// ============================================================================

/// Provider that forwards every operation to the upstream backend.
pub struct LiveApiProvider {
    /// Upstream base URL without a trailing slash
    base_url: String,
    /// HTTP client
    client: reqwest::Client,
}

impl LiveApiProvider {
    /// Create a provider for the given upstream base URL.
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Create from config.
    pub fn from_config(config: &ticker_common::DataConfig) -> Self {
        Self::new(config.upstream_url.clone(), config.request_timeout_secs)
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Map a non-success upstream status to a provider error.
    async fn error_for_status(response: reqwest::Response) -> ProviderError {
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .or(Some(RATE_LIMIT_RETRY_SECS));
            return ProviderError::RateLimited { retry_after_secs };
        }

        let body = response.text().await.unwrap_or_default();

        match status.as_u16() {
            400 => ProviderError::InvalidRequest(body),
            404 => ProviderError::DataNotAvailable(body),
            _ => ProviderError::Upstream(format!("HTTP {}: {}", status, body)),
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, ProviderError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Network("request timeout".into())
            } else if e.is_connect() {
                ProviderError::Network("connection failed".into())
            } else {
                ProviderError::Network(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            return Err(Self::error_for_status(response).await);
        }

        Ok(response)
    }
}

#[async_trait]
impl StockDataProvider for LiveApiProvider {
    fn name(&self) -> &str {
        "live-api"
    }

    async fn fetch_category(
        &self,
        category: &str,
        refresh: bool,
    ) -> Result<CategoryPayload, ProviderError> {
        debug!(category = %category, refresh, "fetching category from upstream");

        let mut request = self
            .client
            .get(self.url(STOCK_INFO_ENDPOINT))
            .query(&[("category", category)]);
        if refresh {
            request = request.query(&[("refresh", "true")]);
        }

        let response = self.send(request).await?;
        let payload: CategoryPayload = response.json().await.map_err(|e| {
            ProviderError::Upstream(format!("malformed category payload: {}", e))
        })?;

        Ok(payload)
    }

    async fn commit_refresh(&self) -> Result<bool, ProviderError> {
        debug!("committing refresh at upstream");

        let request = self.client.get(self.url(COMMIT_REFRESH_ENDPOINT));
        let response = self.send(request).await?;
        let outcome: SuccessResponse = response.json().await.map_err(|e| {
            ProviderError::Upstream(format!("malformed commit response: {}", e))
        })?;

        Ok(outcome.success)
    }

    async fn update_flag(&self, symbol: &str, flag: bool) -> Result<bool, ProviderError> {
        debug!(symbol = %symbol, flag, "forwarding flag update to upstream");

        let request = self
            .client
            .post(self.url(UPDATE_FLAG_ENDPOINT))
            .json(&serde_json::json!({ "symbol": symbol, "flag": flag }));
        let response = self.send(request).await?;
        let outcome: SuccessResponse = response.json().await.map_err(|e| {
            ProviderError::Upstream(format!("malformed flag response: {}", e))
        })?;

        Ok(outcome.success)
    }

    async fn chart_data(&self, symbol: &str) -> Result<ChartData, ProviderError> {
        debug!(symbol = %symbol, "fetching chart data from upstream");

        let request = self
            .client
            .get(self.url(CHART_ENDPOINT))
            .query(&[("symbol", symbol)]);
        let response = self.send(request).await?;
        let chart: ChartData = response.json().await.map_err(|e| {
            ProviderError::Upstream(format!("malformed chart payload: {}", e))
        })?;

        if chart.labels.is_empty() {
            return Err(ProviderError::DataNotAvailable(format!(
                "no chart history for {}",
                symbol
            )));
        }

        Ok(chart)
    }
}

// ============================================================================
// Response Types
// ============================================================================

/// `{"success": bool}` acknowledgement used by the mutation endpoints.
#[derive(Debug, Deserialize)]
struct SuccessResponse {
    #[serde(default)]
    success: bool,
}
