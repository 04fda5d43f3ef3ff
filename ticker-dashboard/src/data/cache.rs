//! In-memory cache of fetched category data.
//!
//! Entries have no TTL: the upstream controls data freshness through its
//! own refresh cycle, so a category stays cached until a refresh request
//! or a flag update invalidates it.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;

use super::CategoryData;

/// Cache entry with the local fetch time
#[derive(Debug, Clone)]
struct CacheEntry {
    data: CategoryData,
    fetched_at: DateTime<Utc>,
}

/// Category data cache
pub struct CategoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl CategoryCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Get a cached category.
    pub fn get(&self, category: &str) -> Option<CategoryData> {
        let entries = self.entries.read().ok()?;
        entries.get(category).map(|entry| entry.data.clone())
    }

    /// Cache a category result.
    pub fn set(&self, category: &str, data: CategoryData) {
        let entry = CacheEntry {
            data,
            fetched_at: Utc::now(),
        };

        if let Ok(mut entries) = self.entries.write() {
            entries.insert(category.to_string(), entry);
        }
    }

    /// Drop one category so the next request refetches it.
    pub fn invalidate(&self, category: &str) {
        if let Ok(mut entries) = self.entries.write() {
            entries.remove(category);
        }
    }

    /// Drop everything.
    pub fn clear_all(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.read().ok();
        let (total, categories, oldest) = entries
            .map(|e| {
                let mut categories: Vec<String> = e.keys().cloned().collect();
                categories.sort();
                let oldest = e.values().map(|entry| entry.fetched_at).min();
                (e.len(), categories, oldest)
            })
            .unwrap_or_default();

        CacheStats {
            total_entries: total,
            categories,
            oldest_fetch: oldest,
        }
    }
}

impl Default for CategoryCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub total_entries: usize,
    pub categories: Vec<String>,
    pub oldest_fetch: Option<DateTime<Utc>>,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::StockRecord;

    fn make_category(name: &str, symbols: &[&str]) -> CategoryData {
        CategoryData {
            category: name.to_string(),
            stocks: symbols
                .iter()
                .map(|s| StockRecord {
                    symbol: s.to_string(),
                    ..Default::default()
                })
                .collect(),
            last_updated: Some("10/14 02:00 PM CT".to_string()),
            issue: None,
        }
    }

    #[test]
    fn test_cache_set_get() {
        let cache = CategoryCache::new();
        cache.set("Owned", make_category("Owned", &["AAPL", "MSFT"]));

        let cached = cache.get("Owned");
        assert!(cached.is_some());
        assert_eq!(cached.unwrap().stocks.len(), 2);
    }

    #[test]
    fn test_cache_miss() {
        let cache = CategoryCache::new();
        assert!(cache.get("Healthcare").is_none());
    }

    #[test]
    fn test_cache_invalidate() {
        let cache = CategoryCache::new();
        cache.set("Owned", make_category("Owned", &["AAPL"]));
        cache.set("Healthcare", make_category("Healthcare", &["JNJ"]));

        cache.invalidate("Owned");

        assert!(cache.get("Owned").is_none());
        assert!(cache.get("Healthcare").is_some());
    }

    #[test]
    fn test_cache_stats() {
        let cache = CategoryCache::new();
        cache.set("Owned", make_category("Owned", &["AAPL"]));
        cache.set("ETFs", make_category("ETFs", &["SPY"]));

        let stats = cache.stats();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.categories, vec!["ETFs", "Owned"]);
        assert!(stats.oldest_fetch.is_some());
    }
}
