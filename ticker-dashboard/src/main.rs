//! Ticker Dashboard - server-rendered stock watchlist views over a live
//! backend or a static snapshot tree.

use anyhow::Result;
use ticker_common::config::Config;
use ticker_common::logging::init_logging;
use ticker_dashboard::DashboardService;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration (file, then environment overrides)
    let config = Config::load_with_env()?;

    // Initialize logging
    init_logging(
        &config.observability.log_level,
        &config.observability.log_format,
    );

    tracing::info!("Ticker Dashboard v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        mode = %config.data.mode,
        categories = config.data.categories.len(),
        "Data source configured"
    );

    // Start the dashboard service
    let service = DashboardService::new(config);
    service.start().await?;

    Ok(())
}
