//! Ticker Dashboard Library
//!
//! Server-rendered stock watchlist dashboard over a pluggable market-data
//! source (live backend or static snapshot files).
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                  ticker-dashboard (Rust Service)                 │
//! │                            :8080                                 │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌───────────────┐  ┌────────────────┐  ┌─────────────────────┐  │
//! │  │  Data         │  │  Watchlist     │  │  HTML Views +       │  │
//! │  │  Providers    │→ │  Aggregator    │→ │  JSON Compat Routes │  │
//! │  └───────────────┘  └────────────────┘  └─────────────────────┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The aggregator fans out per-category fetches, caches results, and
//! degrades failed categories to empty lists so pages always render.
//! Views classify each stock (RSI band, move size, P/E posture) into the
//! colors the dashboard is organized around.

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod classify;
pub mod data;
pub mod routes;
pub mod views;

use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use ticker_common::{Config, Error, Result};

use crate::data::WatchlistAggregator;

/// Dashboard service state
pub struct DashboardState {
    /// Configuration
    pub config: Config,
    /// Category fetcher and cache
    pub aggregator: Arc<WatchlistAggregator>,
}

impl DashboardState {
    /// Create a new dashboard state
    pub fn new(config: Config) -> Self {
        let aggregator = Arc::new(WatchlistAggregator::from_config(&config));
        Self { config, aggregator }
    }
}

/// Main dashboard service
pub struct DashboardService {
    state: Arc<DashboardState>,
}

impl DashboardService {
    /// Create a new dashboard service
    pub fn new(config: Config) -> Self {
        let state = Arc::new(DashboardState::new(config));
        Self { state }
    }

    /// Start the dashboard service
    pub async fn start(self) -> Result<()> {
        let host = self.state.config.server.host.clone();
        let port = self.state.config.server.port;

        // JSON endpoints keep the upstream wire contract and allow
        // cross-origin reads.
        let api = Router::new()
            .route("/saved_stock_info", get(routes::saved_stock_info))
            .route("/get_chart_data", get(routes::get_chart_data))
            .route("/api/update_flag", post(routes::update_flag))
            .route("/health", get(routes::health))
            .layer(CorsLayer::permissive());

        let app = Router::new()
            .route("/", get(routes::watchlist_page))
            .route("/watchlist", get(routes::watchlist_page))
            .route("/portfolio", get(routes::portfolio_page))
            .route("/etfs", get(routes::etfs_page))
            .route("/movers", get(routes::movers_page))
            .route("/rsi", get(routes::rsi_page))
            .route("/volatility", get(routes::volatility_page))
            .route("/pe", get(routes::pe_page))
            .route("/calendar", get(routes::calendar_page))
            .merge(api)
            .with_state(self.state.clone());

        // Start the background cache refresher when configured.
        let interval_minutes = self.state.config.data.refresh_interval_minutes;
        if interval_minutes > 0 {
            let refresh_state = self.state.clone();
            tokio::spawn(async move {
                run_refresh_loop(refresh_state, interval_minutes).await;
            });
        }

        // Start HTTP server
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .map_err(|e| Error::Config(format!("invalid listen address {}:{}: {}", host, port, e)))?;
        tracing::info!(address = %addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

/// Periodically refresh every category so an always-on deployment keeps
/// the cache warm without manual refresh clicks.
async fn run_refresh_loop(state: Arc<DashboardState>, interval_minutes: u64) {
    let period = std::time::Duration::from_secs(interval_minutes * 60);
    let mut ticker = tokio::time::interval(period);
    // The first tick completes immediately; data is fetched on demand
    // anyway, so skip it.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        tracing::info!(interval_minutes, "Running scheduled refresh");
        state.aggregator.refresh_all().await;
    }
}
