//! Market data module for the watchlist dashboard.
//!
//! Provides category data fetching, caching, and aggregation over two
//! interchangeable sources:
//! - **Live**: the upstream stock-info backend (`/saved_stock_info`)
//! - **Static**: pre-generated snapshot files from the site build
//!
//! Upstream payloads are loosely shaped; field names vary across producer
//! versions (`Symbol` vs `symbol`, `RSI` vs `rsi`) and numeric fields may
//! arrive as numbers, numeric strings, `"N/A"`, or null. The types here
//! absorb all of that so the rest of the service works with one schema.

mod aggregator;
mod api;
mod cache;
mod provider;
mod snapshot;

pub use aggregator::{MergedStocks, WatchlistAggregator};
pub use api::LiveApiProvider;
pub use cache::{CacheStats, CategoryCache};
pub use provider::{ProviderError, StockDataProvider};
pub use snapshot::SnapshotProvider;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Category holding flagged stocks. The source moves records here when a
/// stock is flagged; the record's own `category` field keeps naming its
/// home category so it can move back.
pub const OWNED_CATEGORY: &str = "Owned";

// ============================================================================
// Core Data Types
// ============================================================================

/// Earnings announcement timing tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EarningsTiming {
    /// Before market open
    #[serde(rename = "BMO")]
    BeforeOpen,
    /// After market close
    #[serde(rename = "AMC")]
    AfterClose,
    /// To be announced
    #[default]
    #[serde(rename = "TBA", other)]
    Unknown,
}

impl std::fmt::Display for EarningsTiming {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BeforeOpen => write!(f, "BMO"),
            Self::AfterClose => write!(f, "AMC"),
            Self::Unknown => write!(f, "TBA"),
        }
    }
}

/// A single watchlist entry as produced by the upstream backend.
///
/// Serialization uses the upstream's canonical field names so the compat
/// JSON endpoint emits the same wire shape it consumes. Deserialization
/// accepts every known alias.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StockRecord {
    #[serde(rename = "Symbol", alias = "symbol", default)]
    pub symbol: String,

    #[serde(rename = "Name", alias = "name", default)]
    pub name: Option<String>,

    /// Market capitalization in millions of dollars.
    #[serde(
        rename = "Market Cap",
        alias = "marketCap",
        default,
        deserialize_with = "lenient_f64"
    )]
    pub market_cap: Option<f64>,

    #[serde(rename = "Open", default, deserialize_with = "lenient_f64")]
    pub open: Option<f64>,

    #[serde(rename = "High", default, deserialize_with = "lenient_f64")]
    pub high: Option<f64>,

    #[serde(rename = "Low", default, deserialize_with = "lenient_f64")]
    pub low: Option<f64>,

    #[serde(rename = "Close", default, deserialize_with = "lenient_f64")]
    pub close: Option<f64>,

    #[serde(rename = "Price Change", default, deserialize_with = "lenient_f64")]
    pub price_change: Option<f64>,

    #[serde(rename = "Percent Change", default, deserialize_with = "lenient_f64")]
    pub percent_change: Option<f64>,

    #[serde(rename = "RSI", alias = "rsi", default, deserialize_with = "lenient_f64")]
    pub rsi: Option<f64>,

    /// Previous session's RSI.
    #[serde(rename = "yRSI", default, deserialize_with = "lenient_f64")]
    pub y_rsi: Option<f64>,

    /// Hourly-interval RSI.
    #[serde(rename = "RSI1H", default, deserialize_with = "lenient_f64")]
    pub rsi_1h: Option<f64>,

    /// Average True Range as a percent of price.
    #[serde(rename = "ATR_Percent", default, deserialize_with = "lenient_f64")]
    pub atr_percent: Option<f64>,

    #[serde(
        rename = "Trailing PE",
        alias = "trailingPE",
        default,
        deserialize_with = "lenient_f64"
    )]
    pub trailing_pe: Option<f64>,

    #[serde(
        rename = "Forward PE",
        alias = "forwardPE",
        default,
        deserialize_with = "lenient_f64"
    )]
    pub forward_pe: Option<f64>,

    #[serde(rename = "EV/EBITDA", default, deserialize_with = "lenient_f64")]
    pub ev_ebitda: Option<f64>,

    #[serde(rename = "fiftyTwoWeekHigh", default, deserialize_with = "lenient_f64")]
    pub fifty_two_week_high: Option<f64>,

    #[serde(rename = "fiftyTwoWeekLow", default, deserialize_with = "lenient_f64")]
    pub fifty_two_week_low: Option<f64>,

    /// Earnings date as `MM-DD-YYYY`, when known.
    #[serde(rename = "earningsDate", default)]
    pub earnings_date: Option<String>,

    #[serde(rename = "earningsTiming", default)]
    pub earnings_timing: Option<EarningsTiming>,

    /// Owned-watchlist marker.
    #[serde(default)]
    pub flag: bool,

    #[serde(default)]
    pub category: Option<String>,

    /// Industry for stocks; sub-category for ETFs.
    #[serde(default)]
    pub industry: Option<String>,

    #[serde(rename = "stock_description", default)]
    pub description: Option<String>,

    /// Company logo URL.
    #[serde(rename = "stockUrl", default)]
    pub logo_url: Option<String>,

    #[serde(rename = "exchangeName", default)]
    pub exchange: Option<String>,

    #[serde(rename = "dividendYield", default, deserialize_with = "lenient_f64")]
    pub dividend_yield: Option<f64>,

    #[serde(rename = "totalRevenue", default, deserialize_with = "lenient_f64")]
    pub total_revenue: Option<f64>,

    #[serde(rename = "netIncomeToCommon", default, deserialize_with = "lenient_f64")]
    pub net_income: Option<f64>,

    #[serde(rename = "profitMargins", default, deserialize_with = "lenient_f64")]
    pub profit_margins: Option<f64>,
}

impl StockRecord {
    /// Display name, falling back to the symbol when unnamed.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.symbol,
        }
    }

    /// Market cap for sorting; missing values sort last.
    pub fn market_cap_or_zero(&self) -> f64 {
        self.market_cap.unwrap_or(0.0)
    }

    /// Industry label with the upstream's placeholder for missing values.
    pub fn industry_label(&self) -> &str {
        match self.industry.as_deref() {
            Some(industry) if !industry.is_empty() => industry,
            _ => "Uncategorized",
        }
    }

    /// Parse the earnings date field (`MM-DD-YYYY`).
    pub fn parsed_earnings_date(&self) -> Option<NaiveDate> {
        let raw = self.earnings_date.as_deref()?;
        NaiveDate::parse_from_str(raw, "%m-%d-%Y").ok()
    }

    /// Earnings timing with the upstream's TBA default.
    pub fn timing(&self) -> EarningsTiming {
        self.earnings_timing.unwrap_or_default()
    }
}

/// Category payload wire shape.
///
/// Accepts both producer variants: the live endpoint's
/// `{ "data": [...], "last_updated": "..." }` and the static build's
/// `{ "category": "...", "updated_at": "...", "items": [...] }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(alias = "items", default)]
    pub data: Vec<StockRecord>,

    #[serde(alias = "updated_at", default)]
    pub last_updated: Option<String>,
}

/// Why a category fetch yielded no data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchIssue {
    /// Upstream rejected the request with a rate limit.
    RateLimited,
    /// Any other fetch failure.
    Failed,
}

/// A fetched category: the stocks, the upstream timestamp, and the fetch
/// outcome. Failures degrade to an empty stock list with `issue` set.
#[derive(Debug, Clone)]
pub struct CategoryData {
    /// Category name as requested.
    pub category: String,
    /// Stock records in upstream order.
    pub stocks: Vec<StockRecord>,
    /// Opaque display timestamp from the source (e.g. `10/14 02:00 PM CT`).
    pub last_updated: Option<String>,
    /// Set when the fetch failed and this is a degraded empty result.
    pub issue: Option<FetchIssue>,
}

impl CategoryData {
    /// Build from a parsed wire payload.
    pub fn from_payload(category: &str, payload: CategoryPayload) -> Self {
        Self {
            category: category.to_string(),
            stocks: payload.data,
            last_updated: payload.last_updated,
            issue: None,
        }
    }

    /// Degraded empty result for a failed fetch.
    pub fn empty_with_issue(category: &str, issue: FetchIssue) -> Self {
        Self {
            category: category.to_string(),
            stocks: Vec::new(),
            last_updated: None,
            issue: Some(issue),
        }
    }

    /// True when the fetch was rejected with a rate limit.
    pub fn is_rate_limited(&self) -> bool {
        self.issue == Some(FetchIssue::RateLimited)
    }
}

/// Candlestick series for the chart popup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    #[serde(rename = "companyName", default)]
    pub company_name: String,
}

// ============================================================================
// Lenient Deserialization
// ============================================================================

/// Deserialize a numeric field that may arrive as a number, a numeric
/// string, `"N/A"`, or null. Anything non-numeric becomes `None`.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Text(String),
        Other(serde_json::Value),
    }

    let value = match Option::<Raw>::deserialize(deserializer)? {
        None => None,
        Some(Raw::Num(n)) if n.is_finite() => Some(n),
        Some(Raw::Num(_)) => None,
        Some(Raw::Text(s)) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        Some(Raw::Other(_)) => None,
    };
    Ok(value)
}
