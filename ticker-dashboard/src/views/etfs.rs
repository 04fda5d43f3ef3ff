//! ETFs page: the ETF category grouped by sub-category.
//!
//! ETFs reuse the stock record shape with the sub-category stored in the
//! `industry` field. The table is narrower than the watchlist: no symbol
//! column (the ticker renders as a chip next to the name) and a combined
//! signed move instead of separate change columns.

use crate::classify::{
    format_market_cap, format_rsi, format_signed_change, format_value, RsiBand,
};
use crate::data::{CategoryData, StockRecord};

use super::{
    empty_state, escape_html, fetch_issue_banner, last_updated_line, page_shell, ticker_chip,
    NavPage,
};

const ETF_HEADERS: [&str; 8] = [
    "Name",
    "Market Cap",
    "Open",
    "High",
    "Low",
    "Close",
    "Change",
    "RSI",
];

/// Render the ETFs page.
pub fn render(etfs: &CategoryData, refreshed: bool) -> String {
    let mut body = String::new();

    body.push_str(&format!(
        "<div class=\"page-head\"><h1>{}</h1><div class=\"page-tools\"><a class=\"refresh-btn\" href=\"/etfs?refresh=true\">Refresh</a></div></div>\n",
        escape_html(&etfs.category)
    ));

    if refreshed {
        body.push_str("<div class=\"updated-note\">Fetched fresh data from the source.</div>\n");
    }

    body.push_str(&fetch_issue_banner(etfs.issue, "/etfs?refresh=true"));

    if etfs.stocks.is_empty() {
        if etfs.issue.is_none() {
            body.push_str(&empty_state("No ETF data available."));
        }
    } else {
        for (sub_category, members) in group_by_sub_category(&etfs.stocks) {
            body.push_str(&format!(
                "<h3 class=\"industry-title\">{}</h3>\n",
                escape_html(sub_category)
            ));
            body.push_str(&sub_category_table(&members));
        }
    }

    body.push_str(&last_updated_line(etfs.last_updated.as_deref()));

    page_shell("ETFs", NavPage::Etfs, &body)
}

fn group_by_sub_category(etfs: &[StockRecord]) -> Vec<(&str, Vec<&StockRecord>)> {
    let mut groups: Vec<(&str, Vec<&StockRecord>)> = Vec::new();
    for etf in etfs {
        let sub_category = etf.industry_label();
        match groups.iter_mut().find(|(name, _)| *name == sub_category) {
            Some((_, members)) => members.push(etf),
            None => groups.push((sub_category, vec![etf])),
        }
    }
    groups
}

fn sub_category_table(etfs: &[&StockRecord]) -> String {
    let mut out = String::new();
    out.push_str("<div class=\"table-wrap\"><table><thead><tr>");
    for header in ETF_HEADERS {
        out.push_str(&format!("<th>{}</th>", header));
    }
    out.push_str("</tr></thead><tbody>\n");
    for etf in etfs {
        out.push_str(&etf_row(etf));
    }
    out.push_str("</tbody></table></div>\n");
    out
}

fn etf_row(etf: &StockRecord) -> String {
    let mut out = String::new();
    out.push_str("<tr>");

    out.push_str("<td class=\"name-cell\">");
    out.push_str(&super::logo_img(etf));
    out.push_str(&format!(
        "<a class=\"symbol-link\" href=\"#\" data-chart-symbol=\"{}\">{}</a>",
        escape_html(&etf.symbol),
        escape_html(etf.display_name())
    ));
    out.push_str(&ticker_chip(&etf.symbol));
    out.push_str("</td>");

    out.push_str(&format!(
        "<td class=\"num\">{}</td>",
        format_market_cap(etf.market_cap)
    ));
    out.push_str(&format!("<td class=\"num\">{}</td>", format_value(etf.open)));
    out.push_str(&format!("<td class=\"num\">{}</td>", format_value(etf.high)));
    out.push_str(&format!("<td class=\"num\">{}</td>", format_value(etf.low)));
    out.push_str(&format!("<td class=\"num\">{}</td>", format_value(etf.close)));

    let change_class = match etf.percent_change {
        Some(pct) if pct > 0.0 => "metric-change-up",
        Some(pct) if pct < 0.0 => "metric-change-down",
        _ => "metric-change-flat",
    };
    out.push_str(&format!(
        "<td class=\"num\"><span class=\"{}\">{}</span></td>",
        change_class,
        format_signed_change(etf.price_change, etf.percent_change)
    ));

    let band = RsiBand::from_rsi(etf.rsi);
    if band.background_color().is_empty() {
        out.push_str(&format!("<td class=\"num\">{}</td>", format_rsi(etf.rsi)));
    } else {
        out.push_str(&format!(
            "<td class=\"num\"><span class=\"badge\" style=\"background-color:{}\">{}</span></td>",
            band.background_color(),
            format_rsi(etf.rsi)
        ));
    }

    out.push_str("</tr>\n");
    out
}
