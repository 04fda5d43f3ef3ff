//! Volatility page: high-ATR names split by hourly RSI extremes.

use crate::classify::{format_one_decimal, RsiBand};
use crate::data::{MergedStocks, StockRecord};

use super::{empty_state, last_updated_line, merged_issue_banner, page_shell, stock_row, NavPage};

/// Daily range threshold, as a percentage of price, below which a stock
/// is not interesting for this page.
const MIN_ATR_PERCENT: f64 = 2.0;

const NO_STOCKS: &str = "No stocks in this category.";

/// Render the volatility page from the merged watchlist.
pub fn render(merged: &MergedStocks, refreshed: bool) -> String {
    let mut volatile: Vec<&StockRecord> = merged
        .stocks
        .iter()
        .filter(|s| {
            s.atr_percent
                .is_some_and(|atr| atr.is_finite() && atr >= MIN_ATR_PERCENT)
        })
        .collect();
    volatile.sort_by(|a, b| {
        b.atr_percent
            .unwrap_or(0.0)
            .total_cmp(&a.atr_percent.unwrap_or(0.0))
    });

    let oversold: Vec<&StockRecord> = volatile
        .iter()
        .copied()
        .filter(|s| s.rsi_1h.is_some_and(|r| r.is_finite() && r <= 30.0))
        .collect();
    let overbought: Vec<&StockRecord> = volatile
        .iter()
        .copied()
        .filter(|s| s.rsi_1h.is_some_and(|r| r.is_finite() && r >= 70.0))
        .collect();

    let mut body = String::new();
    body.push_str("<div class=\"page-head\"><h1>Volatility</h1><div class=\"page-tools\"><a class=\"refresh-btn\" href=\"/volatility?refresh=true\">Refresh</a></div></div>\n");

    if refreshed {
        body.push_str("<div class=\"updated-note\">Fetched fresh data from the source.</div>\n");
    }

    body.push_str(&merged_issue_banner(merged, "/volatility?refresh=true"));

    body.push_str("<div class=\"panel-grid\">\n");
    body.push_str(&panel("Oversold 1h (RSI-1h \u{2264} 30)", &oversold));
    body.push_str(&panel("Overbought 1h (RSI-1h \u{2265} 70)", &overbought));
    body.push_str("</div>\n");

    body.push_str(&last_updated_line(merged.last_updated.as_deref()));

    page_shell("Volatility", NavPage::Volatility, &body)
}

fn panel(title: &str, stocks: &[&StockRecord]) -> String {
    let mut out = String::new();
    out.push_str(&format!("<section class=\"panel\"><h2>{}</h2>\n", title));
    if stocks.is_empty() {
        out.push_str(&empty_state(NO_STOCKS));
    } else {
        for stock in stocks {
            out.push_str(&stock_row(stock, &badges(stock)));
        }
    }
    out.push_str("</section>\n");
    out
}

fn badges(stock: &StockRecord) -> String {
    let atr = match stock.atr_percent {
        Some(v) if v.is_finite() => format!("{:.2}%", v),
        _ => "N/A".to_string(),
    };
    let band = RsiBand::from_rsi(stock.rsi_1h);
    format!(
        "<span class=\"badge badge-atr\">{}</span><span class=\"badge {}\">{}</span>",
        atr,
        band.css_class(),
        format_one_decimal(stock.rsi_1h)
    )
}
