//! Static provider backed by pre-generated snapshot files.
//!
//! The site build writes one payload file per category under
//! `<snapshot_dir>/data/<category>.json` and ships the collector's cache
//! file alongside it. This provider serves whichever of the two it finds,
//! so the dashboard stays browsable with no backend running.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use async_trait::async_trait;

use super::provider::{ProviderError, StockDataProvider};
use super::{CategoryPayload, ChartData, StockRecord};

// ============================================================================
// Snapshot Provider
// ============================================================================

/// Provider that reads category data from the static site build.
///
/// Lookup order for a category:
/// 1. `<snapshot_dir>/data/<category>.json` payload file
/// 2. cache file entry `stocks:saved_stock_info:<category>`
///    (the ETF category uses `etfs:saved_stock_info:v2`)
/// 3. legacy cache entry `category_<category>`
/// 4. legacy top-level `categories` map
pub struct SnapshotProvider {
    /// Directory holding the static build (`data/*.json` lives below it)
    snapshot_dir: PathBuf,
    /// Collector cache file bundled with the build
    cache_file: PathBuf,
    /// Category served from the ETF cache key
    etf_category: String,
}

impl SnapshotProvider {
    pub fn new(
        snapshot_dir: impl Into<PathBuf>,
        cache_file: impl Into<PathBuf>,
        etf_category: impl Into<String>,
    ) -> Self {
        Self {
            snapshot_dir: snapshot_dir.into(),
            cache_file: cache_file.into(),
            etf_category: etf_category.into(),
        }
    }

    /// Create from config.
    pub fn from_config(config: &ticker_common::DataConfig) -> Self {
        Self::new(
            &config.snapshot_dir,
            &config.cache_file,
            &config.etf_category,
        )
    }

    /// Cache key for a category in the collector cache file.
    fn cache_key(&self, category: &str) -> String {
        if category == self.etf_category {
            "etfs:saved_stock_info:v2".to_string()
        } else {
            format!("stocks:saved_stock_info:{}", category)
        }
    }

    async fn read_json(path: &Path) -> Result<Option<Value>, ProviderError> {
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ProviderError::Upstream(format!(
                    "reading {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let value = serde_json::from_str(&raw).map_err(|e| {
            ProviderError::Upstream(format!("parsing {}: {}", path.display(), e))
        })?;
        Ok(Some(value))
    }

    /// Look the category up in the bundled cache file.
    async fn from_cache_file(&self, category: &str) -> Result<Option<CategoryPayload>, ProviderError> {
        let Some(doc) = Self::read_json(&self.cache_file).await? else {
            return Ok(None);
        };

        let entry = doc
            .get(self.cache_key(category))
            .or_else(|| doc.get(format!("category_{}", category)))
            .or_else(|| doc.get("categories").and_then(|m| m.get(category)));

        let Some(entry) = entry else {
            return Ok(None);
        };

        let mut payload = parse_entry(entry.clone())?;

        // Entries stored as bare arrays inherit the file-level timestamp.
        if payload.last_updated.is_none() {
            payload.last_updated = doc
                .get("last_updated")
                .and_then(Value::as_str)
                .map(str::to_string);
        }

        Ok(Some(payload))
    }
}

/// Parse a cache entry that is either a bare stock array or a wrapped
/// payload object.
fn parse_entry(entry: Value) -> Result<CategoryPayload, ProviderError> {
    if entry.is_array() {
        let data: Vec<StockRecord> = serde_json::from_value(entry)
            .map_err(|e| ProviderError::Upstream(format!("malformed cache entry: {}", e)))?;
        return Ok(CategoryPayload {
            category: None,
            data,
            last_updated: None,
        });
    }

    serde_json::from_value(entry)
        .map_err(|e| ProviderError::Upstream(format!("malformed cache entry: {}", e)))
}

#[async_trait]
impl StockDataProvider for SnapshotProvider {
    fn name(&self) -> &str {
        "snapshot"
    }

    async fn fetch_category(
        &self,
        category: &str,
        _refresh: bool,
    ) -> Result<CategoryPayload, ProviderError> {
        let payload_path = self
            .snapshot_dir
            .join("data")
            .join(format!("{}.json", category));

        if let Some(value) = Self::read_json(&payload_path).await? {
            debug!(category = %category, path = %payload_path.display(), "serving category from payload file");
            return serde_json::from_value(value).map_err(|e| {
                ProviderError::Upstream(format!("parsing {}: {}", payload_path.display(), e))
            });
        }

        if let Some(payload) = self.from_cache_file(category).await? {
            debug!(category = %category, "serving category from cache file");
            return Ok(payload);
        }

        Err(ProviderError::DataNotAvailable(format!(
            "no snapshot data for category {}",
            category
        )))
    }

    async fn commit_refresh(&self) -> Result<bool, ProviderError> {
        // Nothing to commit; snapshots are rebuilt offline.
        Ok(false)
    }

    async fn update_flag(&self, _symbol: &str, _flag: bool) -> Result<bool, ProviderError> {
        // Snapshots are immutable; report the update as not applied.
        Ok(false)
    }

    async fn chart_data(&self, symbol: &str) -> Result<ChartData, ProviderError> {
        Err(ProviderError::DataNotAvailable(format!(
            "chart history for {} is not part of the static build",
            symbol
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider_in(dir: &Path) -> SnapshotProvider {
        SnapshotProvider::new(
            dir.join("site/html"),
            dir.join("cache/stock_data.json"),
            "ETFs",
        )
    }

    #[tokio::test]
    async fn test_payload_file_wins() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("site/html/data");
        std::fs::create_dir_all(&data_dir).unwrap();
        std::fs::write(
            data_dir.join("Healthcare.json"),
            r#"{"category":"Healthcare","updated_at":"10/14 06:00 AM CT","items":[{"Symbol":"JNJ"}]}"#,
        )
        .unwrap();

        let provider = provider_in(dir.path());
        let payload = provider.fetch_category("Healthcare", false).await.unwrap();
        assert_eq!(payload.data.len(), 1);
        assert_eq!(payload.data[0].symbol, "JNJ");
        assert_eq!(payload.last_updated.as_deref(), Some("10/14 06:00 AM CT"));
    }

    #[tokio::test]
    async fn test_cache_file_prefixed_key() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("cache")).unwrap();
        std::fs::write(
            dir.path().join("cache/stock_data.json"),
            r#"{
                "last_updated": "10/14 02:00 PM CT",
                "stocks:saved_stock_info:Energy & Utilities": [{"Symbol":"XOM"}],
                "etfs:saved_stock_info:v2": [{"Symbol":"SPY"}]
            }"#,
        )
        .unwrap();

        let provider = provider_in(dir.path());

        let payload = provider
            .fetch_category("Energy & Utilities", false)
            .await
            .unwrap();
        assert_eq!(payload.data[0].symbol, "XOM");
        assert_eq!(payload.last_updated.as_deref(), Some("10/14 02:00 PM CT"));

        let etfs = provider.fetch_category("ETFs", false).await.unwrap();
        assert_eq!(etfs.data[0].symbol, "SPY");
    }

    #[tokio::test]
    async fn test_cache_file_legacy_keys() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("cache")).unwrap();
        std::fs::write(
            dir.path().join("cache/stock_data.json"),
            r#"{
                "category_Owned": {"data":[{"Symbol":"AAPL"}],"last_updated":"10/13 04:00 PM CT"},
                "categories": {"Industrials": [{"Symbol":"CAT"}]}
            }"#,
        )
        .unwrap();

        let provider = provider_in(dir.path());

        let owned = provider.fetch_category("Owned", false).await.unwrap();
        assert_eq!(owned.data[0].symbol, "AAPL");
        assert_eq!(owned.last_updated.as_deref(), Some("10/13 04:00 PM CT"));

        let industrials = provider.fetch_category("Industrials", false).await.unwrap();
        assert_eq!(industrials.data[0].symbol, "CAT");
    }

    #[tokio::test]
    async fn test_missing_category_is_not_available() {
        let dir = tempfile::tempdir().unwrap();
        let provider = provider_in(dir.path());

        let err = provider.fetch_category("Healthcare", false).await.unwrap_err();
        assert!(matches!(err, ProviderError::DataNotAvailable(_)));
    }

    #[tokio::test]
    async fn test_mutations_are_inert() {
        let dir = tempfile::tempdir().unwrap();
        let provider = provider_in(dir.path());

        assert!(!provider.update_flag("AAPL", true).await.unwrap());
        assert!(!provider.commit_refresh().await.unwrap());
        assert!(provider.chart_data("AAPL").await.is_err());
    }
}
