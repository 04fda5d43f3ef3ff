//! Watchlist aggregation over a data provider.
//!
//! Owns the provider, the category cache, and the configured category
//! list. Every view goes through here; provider failures degrade to empty
//! categories with an issue marker instead of propagating, so a dead
//! upstream never takes a page down.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use ticker_common::{Config, DataSourceMode};

use super::cache::{CacheStats, CategoryCache};
use super::provider::{ProviderError, StockDataProvider};
use super::{
    CategoryData, ChartData, FetchIssue, LiveApiProvider, SnapshotProvider, StockRecord,
    OWNED_CATEGORY,
};

// ============================================================================
// Merged Stocks
// ============================================================================

/// Every configured category flattened into one deduplicated list.
#[derive(Debug, Clone, Default)]
pub struct MergedStocks {
    /// Unique stocks, first occurrence wins, category order preserved
    pub stocks: Vec<StockRecord>,
    /// First non-empty source timestamp
    pub last_updated: Option<String>,
    /// At least one category fetch was rate-limited
    pub rate_limited: bool,
    /// At least one category fetch failed for another reason
    pub failed: bool,
}

// ============================================================================
// Aggregator
// ============================================================================

/// Category fetcher and cache shared by every page and API route.
pub struct WatchlistAggregator {
    /// Data source (live backend or static snapshot)
    provider: Arc<dyn StockDataProvider>,
    /// Fetched categories, kept until invalidated
    cache: CategoryCache,
    /// Stock categories in display order
    categories: Vec<String>,
    /// ETF category, served separately from the stock list
    etf_category: String,
}

impl WatchlistAggregator {
    /// Create with an explicit provider (used by tests).
    pub fn new(
        provider: Arc<dyn StockDataProvider>,
        categories: Vec<String>,
        etf_category: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            cache: CategoryCache::new(),
            categories,
            etf_category: etf_category.into(),
        }
    }

    /// Create from config, choosing the provider by data source mode.
    pub fn from_config(config: &Config) -> Self {
        let provider: Arc<dyn StockDataProvider> = match config.data.mode {
            DataSourceMode::Live => Arc::new(LiveApiProvider::from_config(&config.data)),
            DataSourceMode::Static => Arc::new(SnapshotProvider::from_config(&config.data)),
        };

        info!(
            provider = provider.name(),
            categories = config.data.categories.len(),
            "initialized watchlist aggregator"
        );

        Self::new(
            provider,
            config.data.categories.clone(),
            config.data.etf_category.clone(),
        )
    }

    /// Configured stock categories in display order.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Configured ETF category name.
    pub fn etf_category(&self) -> &str {
        &self.etf_category
    }

    /// Name of the backing provider.
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Cache statistics for the health endpoint.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Fetch one category, serving from cache unless `refresh` is set.
    ///
    /// Provider errors are logged and degrade to an empty result carrying
    /// the fetch issue. Degraded results are not cached, so the next
    /// request retries the source.
    pub async fn category(&self, name: &str, refresh: bool) -> CategoryData {
        if !refresh {
            if let Some(cached) = self.cache.get(name) {
                debug!(category = %name, "serving category from cache");
                return cached;
            }
        }

        match self.provider.fetch_category(name, refresh).await {
            Ok(payload) => {
                let data = CategoryData::from_payload(name, payload);
                debug!(
                    category = %name,
                    stocks = data.stocks.len(),
                    "fetched category"
                );
                self.cache.set(name, data.clone());
                data
            }
            Err(e) => {
                warn!(category = %name, error = %e, "category fetch failed");
                let issue = if e.is_rate_limited() {
                    FetchIssue::RateLimited
                } else {
                    FetchIssue::Failed
                };
                CategoryData::empty_with_issue(name, issue)
            }
        }
    }

    /// Fetch every configured stock category concurrently.
    ///
    /// Output preserves configured category order regardless of which
    /// fetch finishes first.
    pub async fn fetch_all(&self, refresh: bool) -> Vec<CategoryData> {
        join_all(self.categories.iter().map(|name| self.category(name, refresh))).await
    }

    /// All stock categories flattened into one deduplicated list.
    ///
    /// A symbol appearing in several categories keeps its first
    /// occurrence. The owned list holds records whose `category` field
    /// still names their home category, so attribution survives the
    /// merge.
    pub async fn merged(&self, refresh: bool) -> MergedStocks {
        let categories = self.fetch_all(refresh).await;
        merge_categories(&categories)
    }

    /// Refresh every category at the source, then commit the cycle.
    ///
    /// Returns whether the upstream acknowledged the commit. Static
    /// sources always report `false`.
    pub async fn refresh_all(&self) -> bool {
        let refreshed = self.fetch_all(true).await;
        let fetched = refreshed.iter().filter(|c| c.issue.is_none()).count();
        info!(
            fetched,
            total = refreshed.len(),
            "refresh cycle fetched categories"
        );

        match self.provider.commit_refresh().await {
            Ok(committed) => {
                info!(committed, "refresh cycle committed");
                committed
            }
            Err(e) => {
                warn!(error = %e, "refresh commit failed");
                false
            }
        }
    }

    /// Flag or unflag a symbol as owned.
    ///
    /// On an accepted change the owned category and every cached category
    /// holding the symbol are invalidated, since the source moves the
    /// record between lists.
    pub async fn update_flag(&self, symbol: &str, flag: bool) -> Result<bool, ProviderError> {
        let accepted = self.provider.update_flag(symbol, flag).await?;

        if accepted {
            for category in self.cache.stats().categories {
                let holds_symbol = self
                    .cache
                    .get(&category)
                    .map(|data| data.stocks.iter().any(|s| s.symbol == symbol))
                    .unwrap_or(false);
                if holds_symbol {
                    self.cache.invalidate(&category);
                }
            }
            self.cache.invalidate(OWNED_CATEGORY);
            info!(symbol = %symbol, flag, "flag update applied");
        } else {
            debug!(symbol = %symbol, flag, "flag update not applied by source");
        }

        Ok(accepted)
    }

    /// Candlestick history for the chart popup.
    pub async fn chart_data(&self, symbol: &str) -> Result<ChartData, ProviderError> {
        self.provider.chart_data(symbol).await
    }
}

/// Merge fetched categories into one deduplicated stock list.
fn merge_categories(categories: &[CategoryData]) -> MergedStocks {
    let mut merged = MergedStocks::default();
    let mut seen = std::collections::HashSet::new();

    for category in categories {
        match category.issue {
            Some(FetchIssue::RateLimited) => merged.rate_limited = true,
            Some(FetchIssue::Failed) => merged.failed = true,
            None => {}
        }

        if merged.last_updated.is_none() {
            merged.last_updated = category
                .last_updated
                .as_ref()
                .filter(|ts| !ts.is_empty())
                .cloned();
        }

        for stock in &category.stocks {
            if seen.insert(stock.symbol.clone()) {
                merged.stocks.push(stock.clone());
            }
        }
    }

    merged
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CategoryPayload;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct MockProvider {
        payloads: HashMap<String, CategoryPayload>,
        failing: Vec<String>,
        rate_limited: Vec<String>,
        fetch_count: AtomicU32,
        flag_accepted: bool,
    }

    impl MockProvider {
        fn new() -> Self {
            Self {
                payloads: HashMap::new(),
                failing: Vec::new(),
                rate_limited: Vec::new(),
                fetch_count: AtomicU32::new(0),
                flag_accepted: true,
            }
        }

        fn with_category(mut self, name: &str, symbols: &[(&str, Option<&str>)]) -> Self {
            let data = symbols
                .iter()
                .map(|(symbol, home)| StockRecord {
                    symbol: symbol.to_string(),
                    category: home.map(str::to_string),
                    ..Default::default()
                })
                .collect();
            self.payloads.insert(
                name.to_string(),
                CategoryPayload {
                    category: Some(name.to_string()),
                    data,
                    last_updated: Some(format!("{} timestamp", name)),
                },
            );
            self
        }

        fn fetches(&self) -> u32 {
            self.fetch_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StockDataProvider for MockProvider {
        fn name(&self) -> &str {
            "mock"
        }

        async fn fetch_category(
            &self,
            category: &str,
            _refresh: bool,
        ) -> Result<CategoryPayload, ProviderError> {
            self.fetch_count.fetch_add(1, Ordering::SeqCst);

            if self.rate_limited.iter().any(|c| c == category) {
                return Err(ProviderError::RateLimited {
                    retry_after_secs: Some(5),
                });
            }
            if self.failing.iter().any(|c| c == category) {
                return Err(ProviderError::Network("mock outage".into()));
            }

            self.payloads
                .get(category)
                .cloned()
                .ok_or_else(|| ProviderError::DataNotAvailable(category.to_string()))
        }

        async fn commit_refresh(&self) -> Result<bool, ProviderError> {
            Ok(true)
        }

        async fn update_flag(&self, _symbol: &str, _flag: bool) -> Result<bool, ProviderError> {
            Ok(self.flag_accepted)
        }

        async fn chart_data(&self, symbol: &str) -> Result<ChartData, ProviderError> {
            Err(ProviderError::DataNotAvailable(symbol.to_string()))
        }
    }

    fn aggregator_with(
        provider: Arc<MockProvider>,
        categories: &[&str],
    ) -> WatchlistAggregator {
        WatchlistAggregator::new(
            provider,
            categories.iter().map(|s| s.to_string()).collect(),
            "ETFs",
        )
    }

    #[tokio::test]
    async fn test_category_served_from_cache() {
        let mock = Arc::new(MockProvider::new().with_category("Owned", &[("AAPL", None)]));
        let agg = aggregator_with(mock.clone(), &["Owned"]);

        let first = agg.category("Owned", false).await;
        assert_eq!(first.stocks.len(), 1);

        let second = agg.category("Owned", false).await;
        assert_eq!(second.stocks.len(), 1);

        // Provider only hit once; the second call was a cache hit.
        assert_eq!(mock.fetches(), 1);
    }

    #[tokio::test]
    async fn test_refresh_bypasses_cache() {
        let mock = Arc::new(MockProvider::new().with_category("Owned", &[("AAPL", None)]));
        let agg = aggregator_with(mock.clone(), &["Owned"]);

        agg.category("Owned", false).await;
        agg.category("Owned", true).await;

        assert_eq!(mock.fetches(), 2);
    }

    #[tokio::test]
    async fn test_failed_fetch_degrades_and_is_not_cached() {
        let mut provider = MockProvider::new();
        provider.failing.push("Healthcare".to_string());
        let mock = Arc::new(provider);
        let agg = aggregator_with(mock.clone(), &["Healthcare"]);

        let degraded = agg.category("Healthcare", false).await;
        assert!(degraded.stocks.is_empty());
        assert_eq!(degraded.issue, Some(FetchIssue::Failed));

        // Second request retries the provider instead of caching failure.
        agg.category("Healthcare", false).await;
        assert_eq!(mock.fetches(), 2);
    }

    #[tokio::test]
    async fn test_rate_limited_fetch_marks_issue() {
        let mut provider = MockProvider::new();
        provider.rate_limited.push("ETFs".to_string());
        let agg = aggregator_with(Arc::new(provider), &["ETFs"]);

        let degraded = agg.category("ETFs", false).await;
        assert!(degraded.is_rate_limited());
    }

    #[tokio::test]
    async fn test_fetch_all_preserves_category_order() {
        let mock = Arc::new(
            MockProvider::new()
                .with_category("Owned", &[("AAPL", Some("Information Technology"))])
                .with_category("Information Technology", &[("MSFT", None)])
                .with_category("Healthcare", &[("JNJ", None)]),
        );
        let agg = aggregator_with(mock, &["Owned", "Information Technology", "Healthcare"]);

        let all = agg.fetch_all(false).await;
        let names: Vec<&str> = all.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(names, vec!["Owned", "Information Technology", "Healthcare"]);
    }

    #[tokio::test]
    async fn test_merged_dedupes_first_seen() {
        let mock = Arc::new(
            MockProvider::new()
                .with_category("Owned", &[("AAPL", Some("Information Technology"))])
                .with_category("Information Technology", &[("AAPL", None), ("MSFT", None)]),
        );
        let agg = aggregator_with(mock, &["Owned", "Information Technology"]);

        let merged = agg.merged(false).await;
        let symbols: Vec<&str> = merged.stocks.iter().map(|s| s.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAPL", "MSFT"]);

        // First occurrence wins: AAPL keeps its owned-list record.
        assert_eq!(
            merged.stocks[0].category.as_deref(),
            Some("Information Technology")
        );
        assert_eq!(merged.last_updated.as_deref(), Some("Owned timestamp"));
    }

    #[tokio::test]
    async fn test_merged_flags_partial_failures() {
        let mut provider = MockProvider::new().with_category("Owned", &[("AAPL", None)]);
        provider.rate_limited.push("Healthcare".to_string());
        let agg = aggregator_with(Arc::new(provider), &["Owned", "Healthcare"]);

        let merged = agg.merged(false).await;
        assert_eq!(merged.stocks.len(), 1);
        assert!(merged.rate_limited);
        assert!(!merged.failed);
    }

    #[tokio::test]
    async fn test_update_flag_invalidates_affected_categories() {
        let mock = Arc::new(
            MockProvider::new()
                .with_category("Owned", &[("MSFT", Some("Information Technology"))])
                .with_category("Information Technology", &[("AAPL", None)])
                .with_category("Healthcare", &[("JNJ", None)]),
        );
        let agg = aggregator_with(mock, &["Owned", "Information Technology", "Healthcare"]);

        agg.fetch_all(false).await;
        assert_eq!(agg.cache_stats().total_entries, 3);

        let accepted = agg.update_flag("AAPL", true).await.unwrap();
        assert!(accepted);

        // Owned and the symbol's category dropped; Healthcare untouched.
        let stats = agg.cache_stats();
        assert_eq!(stats.categories, vec!["Healthcare"]);
    }
}
