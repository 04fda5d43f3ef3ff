//! Market movers page: top gainers and decliners across the whole
//! watchlist.

use crate::classify::{
    change_color, format_change, format_percent_change, format_rsi, format_value, RsiBand,
};
use crate::data::{MergedStocks, StockRecord};

use super::{
    empty_state, escape_html, flag_star, info_button, last_updated_line, logo_img,
    merged_issue_banner, page_shell, NavPage,
};

const MOVER_HEADERS: [&str; 5] = ["Company Name", "Price", "% Change", "Change", "RSI"];

const NO_DATA: &str = "No market data available for this category.";

/// Render the movers page from the merged watchlist.
pub fn render(merged: &MergedStocks, refreshed: bool) -> String {
    let mut movers: Vec<&StockRecord> = merged
        .stocks
        .iter()
        .filter(|s| s.percent_change.is_some_and(f64::is_finite))
        .collect();

    let mut gainers: Vec<&StockRecord> = movers
        .iter()
        .copied()
        .filter(|s| s.percent_change.unwrap_or(0.0) > 0.0)
        .collect();
    gainers.sort_by(|a, b| {
        b.percent_change
            .unwrap_or(0.0)
            .total_cmp(&a.percent_change.unwrap_or(0.0))
    });

    movers.retain(|s| s.percent_change.unwrap_or(0.0) < 0.0);
    movers.sort_by(|a, b| {
        a.percent_change
            .unwrap_or(0.0)
            .total_cmp(&b.percent_change.unwrap_or(0.0))
    });
    let decliners = movers;

    let mut body = String::new();
    body.push_str("<div class=\"page-head\"><h1>Market Movers</h1><div class=\"page-tools\"><a class=\"refresh-btn\" href=\"/movers?refresh=true\">Refresh</a></div></div>\n");

    if refreshed {
        body.push_str("<div class=\"updated-note\">Fetched fresh data from the source.</div>\n");
    }

    body.push_str(&merged_issue_banner(merged, "/movers?refresh=true"));

    body.push_str("<section class=\"category-block\"><h2>Top Gainers</h2>\n");
    body.push_str(&movers_table(&gainers));
    body.push_str("</section>\n");

    body.push_str("<section class=\"category-block\"><h2>Top Decliners</h2>\n");
    body.push_str(&movers_table(&decliners));
    body.push_str("</section>\n");

    body.push_str(&last_updated_line(merged.last_updated.as_deref()));

    page_shell("Market Movers", NavPage::Movers, &body)
}

fn movers_table(stocks: &[&StockRecord]) -> String {
    if stocks.is_empty() {
        return empty_state(NO_DATA);
    }

    let mut out = String::new();
    out.push_str("<div class=\"table-wrap\"><table><thead><tr>");
    for header in MOVER_HEADERS {
        out.push_str(&format!("<th>{}</th>", header));
    }
    out.push_str("</tr></thead><tbody>\n");
    for stock in stocks {
        out.push_str(&mover_row(stock));
    }
    out.push_str("</tbody></table></div>\n");
    out
}

fn mover_row(stock: &StockRecord) -> String {
    let mut out = String::new();
    out.push_str("<tr>");

    out.push_str("<td class=\"name-cell\">");
    out.push_str(&flag_star(&stock.symbol, stock.flag));
    out.push_str(&info_button(stock, true));
    out.push_str(&logo_img(stock));
    out.push_str(&format!(
        "<a class=\"symbol-link\" href=\"#\" data-chart-symbol=\"{}\">{}</a>",
        escape_html(&stock.symbol),
        escape_html(stock.display_name())
    ));
    out.push_str("</td>");

    out.push_str(&format!("<td class=\"num\">{}</td>", format_value(stock.close)));

    let move_color = change_color(stock.percent_change);
    out.push_str(&colored_td(
        move_color,
        &format_percent_change(stock.percent_change),
    ));
    out.push_str(&colored_td(move_color, &format_change(stock.price_change)));

    let rsi_color = RsiBand::from_rsi(stock.rsi).background_color();
    out.push_str(&colored_td(rsi_color, &format_rsi(stock.rsi)));

    out.push_str("</tr>\n");
    out
}

fn colored_td(color: &str, text: &str) -> String {
    if color.is_empty() {
        format!("<td class=\"num\">{}</td>", escape_html(text))
    } else {
        format!(
            "<td class=\"num colored-cell\" style=\"background-color:{}\">{}</td>",
            color,
            escape_html(text)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stock(symbol: &str, pct: Option<f64>) -> StockRecord {
        StockRecord {
            symbol: symbol.to_string(),
            name: Some(format!("{} Corp", symbol)),
            close: Some(50.0),
            price_change: pct.map(|p| p / 2.0),
            percent_change: pct,
            rsi: Some(48.0),
            ..Default::default()
        }
    }

    fn merged(stocks: Vec<StockRecord>) -> MergedStocks {
        MergedStocks {
            stocks,
            last_updated: Some("10/14 02:00 PM CT".to_string()),
            rate_limited: false,
            failed: false,
        }
    }

    #[test]
    fn test_gainers_sorted_descending() {
        let html = render(
            &merged(vec![
                stock("MID", Some(2.0)),
                stock("TOP", Some(8.0)),
                stock("LOW", Some(0.5)),
            ]),
            false,
        );

        let top = html.find("TOP Corp").unwrap();
        let mid = html.find("MID Corp").unwrap();
        let low = html.find("LOW Corp").unwrap();
        assert!(top < mid && mid < low);
    }

    #[test]
    fn test_decliners_sorted_ascending() {
        let html = render(
            &merged(vec![stock("A", Some(-1.0)), stock("B", Some(-6.0))]),
            false,
        );

        // Worst decliner renders first.
        let a = html.find("A Corp").unwrap();
        let b = html.find("B Corp").unwrap();
        assert!(b < a);
    }

    #[test]
    fn test_invalid_percent_change_excluded() {
        let html = render(&merged(vec![stock("NAN", None), stock("OK", Some(1.0))]), false);
        assert!(!html.contains("NAN Corp"));
        assert!(html.contains("OK Corp"));
    }

    #[test]
    fn test_empty_sections_show_message() {
        let html = render(&merged(vec![stock("FLAT", Some(0.0))]), false);
        // Zero movers are in neither table.
        assert_eq!(html.matches(NO_DATA).count(), 2);
    }
}
