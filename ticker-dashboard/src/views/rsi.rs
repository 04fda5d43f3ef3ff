//! RSI analysis page: level panels plus day-over-day transitions against
//! yesterday's RSI.

use crate::classify::{format_one_decimal, RsiBand};
use crate::data::{MergedStocks, StockRecord};

use super::{empty_state, last_updated_line, merged_issue_banner, page_shell, stock_row, NavPage};

const NO_STOCKS: &str = "No stocks in this category.";

/// Render the RSI page from the merged watchlist.
pub fn render(merged: &MergedStocks, refreshed: bool) -> String {
    let with_rsi: Vec<&StockRecord> = merged
        .stocks
        .iter()
        .filter(|s| s.rsi.is_some_and(f64::is_finite))
        .collect();

    let oversold = sorted_by_cap(with_rsi.iter().filter(|s| rsi(s) <= 30.0));
    let overbought = sorted_by_cap(with_rsi.iter().filter(|s| rsi(s) >= 70.0));

    // Transition panels need yesterday's value too.
    let with_yesterday: Vec<&&StockRecord> = with_rsi
        .iter()
        .filter(|s| s.y_rsi.is_some_and(f64::is_finite))
        .collect();

    let entering_oversold = sorted_by_cap(
        with_yesterday
            .iter()
            .copied()
            .filter(|s| yesterday(s) > 30.0 && rsi(s) > 30.0 && rsi(s) <= 35.0),
    );
    let exiting_oversold = sorted_by_cap(
        with_yesterday
            .iter()
            .copied()
            .filter(|s| yesterday(s) <= 30.0 && rsi(s) > 30.0),
    );
    let exiting_overbought = sorted_by_cap(
        with_yesterday
            .iter()
            .copied()
            .filter(|s| yesterday(s) >= 70.0 && rsi(s) < 70.0),
    );

    let mut body = String::new();
    body.push_str("<div class=\"page-head\"><h1>RSI Analysis</h1><div class=\"page-tools\"><a class=\"refresh-btn\" href=\"/rsi?refresh=true\">Refresh</a></div></div>\n");

    if refreshed {
        body.push_str("<div class=\"updated-note\">Fetched fresh data from the source.</div>\n");
    }

    body.push_str(&merged_issue_banner(merged, "/rsi?refresh=true"));

    body.push_str("<div class=\"panel-grid\">\n");
    body.push_str(&panel("Oversold (RSI \u{2264} 30)", &oversold));
    body.push_str(&panel("Overbought (RSI \u{2265} 70)", &overbought));
    body.push_str(&panel("Entering Oversold (RSI 30\u{2013}35)", &entering_oversold));
    body.push_str(&panel("Exiting Oversold", &exiting_oversold));
    body.push_str(&panel("Exiting Overbought", &exiting_overbought));
    body.push_str("</div>\n");

    body.push_str(&last_updated_line(merged.last_updated.as_deref()));

    page_shell("RSI Analysis", NavPage::Rsi, &body)
}

fn rsi(stock: &StockRecord) -> f64 {
    stock.rsi.unwrap_or(f64::NAN)
}

fn yesterday(stock: &StockRecord) -> f64 {
    stock.y_rsi.unwrap_or(f64::NAN)
}

/// Largest companies first; missing market caps sink to the bottom.
fn sorted_by_cap<'a>(stocks: impl Iterator<Item = &'a &'a StockRecord>) -> Vec<&'a StockRecord> {
    let mut out: Vec<&StockRecord> = stocks.copied().collect();
    out.sort_by(|a, b| b.market_cap_or_zero().total_cmp(&a.market_cap_or_zero()));
    out
}

fn panel(title: &str, stocks: &[&StockRecord]) -> String {
    let mut out = String::new();
    out.push_str(&format!("<section class=\"panel\"><h2>{}</h2>\n", title));
    if stocks.is_empty() {
        out.push_str(&empty_state(NO_STOCKS));
    } else {
        for stock in stocks {
            let band = RsiBand::from_rsi(stock.rsi);
            let badge = format!(
                "<span class=\"badge {}\">{}</span>",
                band.css_class(),
                format_one_decimal(stock.rsi)
            );
            out.push_str(&stock_row(stock, &badge));
        }
    }
    out.push_str("</section>\n");
    out
}
