//! HTTP routes for the dashboard service.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, Json},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::data::{ProviderError, StockRecord, OWNED_CATEGORY};
use crate::views;
use crate::DashboardState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub refresh: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CalendarQuery {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub refresh: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StockInfoQuery {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub refresh: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChartQuery {
    #[serde(default)]
    pub symbol: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateFlagRequest {
    pub symbol: String,
    pub flag: bool,
}

/// Wire shape of `/saved_stock_info`, matching the upstream contract.
#[derive(Debug, Serialize)]
pub struct StockInfoResponse {
    pub data: Vec<StockRecord>,
    pub last_updated: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub mode: String,
    pub provider: String,
    pub cached_categories: usize,
}

/// Query flags arrive as strings; anything but a case-insensitive "true"
/// is off.
fn truthy(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

fn provider_status(error: &ProviderError) -> StatusCode {
    StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::BAD_GATEWAY)
}

// ============================================================================
// Page Handlers
// ============================================================================

/// Watchlist home page. A refresh here re-fetches every category and
/// commits the refresh upstream.
pub async fn watchlist_page(
    State(state): State<Arc<DashboardState>>,
    Query(query): Query<PageQuery>,
) -> Html<String> {
    let refreshed = truthy(query.refresh.as_deref());
    if refreshed {
        state.aggregator.refresh_all().await;
    }
    let categories = state.aggregator.fetch_all(false).await;
    Html(views::watchlist::render(&categories, refreshed))
}

pub async fn portfolio_page(
    State(state): State<Arc<DashboardState>>,
    Query(query): Query<PageQuery>,
) -> Html<String> {
    let refreshed = truthy(query.refresh.as_deref());
    let owned = state.aggregator.category(OWNED_CATEGORY, refreshed).await;
    Html(views::portfolio::render(&owned, refreshed))
}

pub async fn etfs_page(
    State(state): State<Arc<DashboardState>>,
    Query(query): Query<PageQuery>,
) -> Html<String> {
    let refreshed = truthy(query.refresh.as_deref());
    let etfs = state
        .aggregator
        .category(state.aggregator.etf_category(), refreshed)
        .await;
    Html(views::etfs::render(&etfs, refreshed))
}

pub async fn movers_page(
    State(state): State<Arc<DashboardState>>,
    Query(query): Query<PageQuery>,
) -> Html<String> {
    let refreshed = truthy(query.refresh.as_deref());
    let merged = state.aggregator.merged(refreshed).await;
    Html(views::movers::render(&merged, refreshed))
}

pub async fn rsi_page(
    State(state): State<Arc<DashboardState>>,
    Query(query): Query<PageQuery>,
) -> Html<String> {
    let refreshed = truthy(query.refresh.as_deref());
    let merged = state.aggregator.merged(refreshed).await;
    Html(views::rsi::render(&merged, refreshed))
}

pub async fn volatility_page(
    State(state): State<Arc<DashboardState>>,
    Query(query): Query<PageQuery>,
) -> Html<String> {
    let refreshed = truthy(query.refresh.as_deref());
    let merged = state.aggregator.merged(refreshed).await;
    Html(views::volatility::render(&merged, refreshed))
}

pub async fn pe_page(
    State(state): State<Arc<DashboardState>>,
    Query(query): Query<PageQuery>,
) -> Html<String> {
    let refreshed = truthy(query.refresh.as_deref());
    let merged = state.aggregator.merged(refreshed).await;
    Html(views::pe::render(
        &merged,
        state.aggregator.categories(),
        refreshed,
    ))
}

pub async fn calendar_page(
    State(state): State<Arc<DashboardState>>,
    Query(query): Query<CalendarQuery>,
) -> Html<String> {
    let refreshed = truthy(query.refresh.as_deref());
    let merged = state.aggregator.merged(refreshed).await;

    let today = chrono::Local::now().date_naive();
    let anchor = query
        .date
        .as_deref()
        .and_then(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
        .unwrap_or(today);

    Html(views::calendar::render(&merged, anchor, today, refreshed))
}

// ============================================================================
// JSON Handlers
// ============================================================================

/// Compat endpoint with the upstream wire contract, served from the
/// aggregator's cache.
pub async fn saved_stock_info(
    State(state): State<Arc<DashboardState>>,
    Query(query): Query<StockInfoQuery>,
) -> Result<Json<StockInfoResponse>, StatusCode> {
    let category = match query.category.as_deref() {
        Some(c) if !c.is_empty() => c,
        _ => return Err(StatusCode::BAD_REQUEST),
    };

    let refresh = truthy(query.refresh.as_deref());
    let data = state.aggregator.category(category, refresh).await;

    Ok(Json(StockInfoResponse {
        data: data.stocks,
        last_updated: data.last_updated,
    }))
}

pub async fn update_flag(
    State(state): State<Arc<DashboardState>>,
    Json(request): Json<UpdateFlagRequest>,
) -> Result<Json<SuccessResponse>, StatusCode> {
    if request.symbol.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    match state.aggregator.update_flag(&request.symbol, request.flag).await {
        Ok(success) => Ok(Json(SuccessResponse { success })),
        Err(e) => {
            tracing::error!(symbol = %request.symbol, error = %e, "Flag update failed");
            Err(provider_status(&e))
        }
    }
}

pub async fn get_chart_data(
    State(state): State<Arc<DashboardState>>,
    Query(query): Query<ChartQuery>,
) -> Result<Json<crate::data::ChartData>, StatusCode> {
    let symbol = match query.symbol.as_deref() {
        Some(s) if !s.is_empty() => s,
        _ => return Err(StatusCode::BAD_REQUEST),
    };

    match state.aggregator.chart_data(symbol).await {
        Ok(chart) => Ok(Json(chart)),
        Err(e) => {
            tracing::warn!(symbol = %symbol, error = %e, "Chart data unavailable");
            Err(provider_status(&e))
        }
    }
}

/// Health check endpoint
pub async fn health(State(state): State<Arc<DashboardState>>) -> Json<HealthResponse> {
    let stats = state.aggregator.cache_stats();
    Json(HealthResponse {
        status: "ok".to_string(),
        mode: state.config.data.mode.to_string(),
        provider: state.aggregator.provider_name().to_string(),
        cached_categories: stats.total_entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthy() {
        assert!(truthy(Some("true")));
        assert!(truthy(Some("TRUE")));
        assert!(!truthy(Some("1")));
        assert!(!truthy(Some("false")));
        assert!(!truthy(None));
    }

    #[test]
    fn test_provider_status_mapping() {
        assert_eq!(
            provider_status(&ProviderError::RateLimited {
                retry_after_secs: None
            }),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            provider_status(&ProviderError::DataNotAvailable("no data".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            provider_status(&ProviderError::Network("timeout".to_string())),
            StatusCode::BAD_GATEWAY
        );
    }
}
