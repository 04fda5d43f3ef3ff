//! Stock data provider abstraction.
//!
//! A provider answers category queries from a concrete source. Two
//! implementations exist: [`super::LiveApiProvider`] hits the upstream
//! stock-info backend over HTTP, [`super::SnapshotProvider`] reads the
//! pre-generated snapshot files produced by the site build.

use async_trait::async_trait;

use super::{CategoryPayload, ChartData};

// ============================================================================
// Provider Errors
// ============================================================================

/// Errors surfaced by data providers.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Network failure reaching the source
    #[error("network error: {0}")]
    Network(String),

    /// Upstream rejected the request with a rate limit
    #[error("rate limited{}", retry_hint(.retry_after_secs))]
    RateLimited { retry_after_secs: Option<u64> },

    /// The source has no data for the request
    #[error("data not available: {0}")]
    DataNotAvailable(String),

    /// The provider does not support this operation
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// The request itself was malformed
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The source returned something unusable
    #[error("upstream error: {0}")]
    Upstream(String),
}

fn retry_hint(secs: &Option<u64>) -> String {
    match secs {
        Some(secs) => format!(", retry after {}s", secs),
        None => String::new(),
    }
}

impl ProviderError {
    /// Whether retrying the same request later could succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::RateLimited { .. } | Self::Upstream(_)
        )
    }

    /// Whether this is a rate-limit rejection.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// HTTP status to report when the error crosses the service boundary.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Network(_) => 502,
            Self::RateLimited { .. } => 429,
            Self::DataNotAvailable(_) => 404,
            Self::Unsupported(_) => 501,
            Self::InvalidRequest(_) => 400,
            Self::Upstream(_) => 502,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            Self::Network(err.to_string())
        } else {
            Self::Upstream(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        Self::Upstream(format!("malformed payload: {}", err))
    }
}

// ============================================================================
// Provider Trait
// ============================================================================

/// Uniform interface over the live backend and static snapshots.
///
/// Implementations must be `Send + Sync` so the aggregator can fan out
/// category fetches concurrently.
#[async_trait]
pub trait StockDataProvider: Send + Sync {
    /// Provider name for logs and the health endpoint.
    fn name(&self) -> &str;

    /// Fetch one category's payload.
    ///
    /// With `refresh` set the source is asked for fresh data instead of
    /// whatever it already holds. Static sources ignore the flag.
    async fn fetch_category(
        &self,
        category: &str,
        refresh: bool,
    ) -> Result<CategoryPayload, ProviderError>;

    /// Persist the outcome of a refresh cycle at the source.
    ///
    /// The live backend stages refreshed categories and atomically swaps
    /// them in on commit. Returns whether the commit took effect.
    async fn commit_refresh(&self) -> Result<bool, ProviderError>;

    /// Flag or unflag a symbol as owned. Returns whether the source
    /// accepted the change.
    async fn update_flag(&self, symbol: &str, flag: bool) -> Result<bool, ProviderError>;

    /// Candlestick history for the chart popup.
    async fn chart_data(&self, symbol: &str) -> Result<ChartData, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProviderError::Network("connection refused".to_string());
        assert_eq!(err.to_string(), "network error: connection refused");

        let err = ProviderError::RateLimited {
            retry_after_secs: Some(30),
        };
        assert_eq!(err.to_string(), "rate limited, retry after 30s");

        let err = ProviderError::RateLimited {
            retry_after_secs: None,
        };
        assert_eq!(err.to_string(), "rate limited");
    }

    #[test]
    fn test_error_recoverability() {
        assert!(ProviderError::Network("x".to_string()).is_recoverable());
        assert!(ProviderError::RateLimited {
            retry_after_secs: None
        }
        .is_recoverable());
        assert!(ProviderError::Upstream("x".to_string()).is_recoverable());
        assert!(!ProviderError::DataNotAvailable("x".to_string()).is_recoverable());
        assert!(!ProviderError::InvalidRequest("x".to_string()).is_recoverable());
        assert!(!ProviderError::Unsupported("x".to_string()).is_recoverable());
    }

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            ProviderError::RateLimited {
                retry_after_secs: None
            }
            .status_code(),
            429
        );
        assert_eq!(
            ProviderError::DataNotAvailable("x".to_string()).status_code(),
            404
        );
        assert_eq!(
            ProviderError::InvalidRequest("x".to_string()).status_code(),
            400
        );
        assert_eq!(ProviderError::Network("x".to_string()).status_code(), 502);
    }

    #[test]
    fn test_provider_is_object_safe() {
        fn assert_object_safe(_: &dyn StockDataProvider) {}
        let _ = assert_object_safe;
    }
}
