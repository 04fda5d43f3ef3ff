//! Watchlist page: every configured category as sortable tables.
//!
//! The owned category renders as a single table; every other category is
//! grouped by industry with a sub-heading per group. Groups keep the
//! order industries first appear in the payload, which the source has
//! already sorted by market cap.

use crate::classify::{
    change_color, format_change, format_market_cap, format_percent_change, format_rsi,
    format_value, RsiBand,
};
use crate::data::{CategoryData, FetchIssue, StockRecord, OWNED_CATEGORY};

use super::{
    escape_html, flag_star, info_button, last_updated_line, logo_img, page_shell, symbol_link,
    NavPage,
};

pub(crate) const TABLE_HEADERS: [&str; 10] = [
    "Company Name",
    "Symbol",
    "Market Cap",
    "Open",
    "High",
    "Low",
    "Close",
    "Change",
    "% Change",
    "RSI",
];

/// Render the watchlist page over every configured category.
pub fn render(categories: &[CategoryData], refreshed: bool) -> String {
    let mut body = String::new();

    body.push_str("<div class=\"page-head\"><h1>Stock Watchlist</h1><div class=\"page-tools\">");
    body.push_str(
        "<input class=\"search-box\" id=\"stock-search\" type=\"search\" placeholder=\"Search symbol or name\">",
    );
    body.push_str("<a class=\"refresh-btn\" href=\"/?refresh=true\">Refresh</a>");
    body.push_str("</div></div>\n");

    if refreshed {
        body.push_str("<div class=\"updated-note\">Fetched fresh data from the source.</div>\n");
    }

    body.push_str(&categories_issue_banner(categories, "/?refresh=true"));

    for category in categories {
        body.push_str(&render_category(category));
    }

    let last_updated = categories
        .iter()
        .find_map(|c| c.last_updated.as_deref().filter(|ts| !ts.is_empty()));
    body.push_str(&last_updated_line(last_updated));

    page_shell("Watchlist", NavPage::Watchlist, &body)
}

/// One shared banner for the whole page; rate limiting outranks other
/// failures when categories degraded differently.
pub(crate) fn categories_issue_banner(categories: &[CategoryData], retry_href: &str) -> String {
    let mut issue = None;
    for category in categories {
        match category.issue {
            Some(FetchIssue::RateLimited) => {
                issue = Some(FetchIssue::RateLimited);
                break;
            }
            Some(FetchIssue::Failed) => issue = Some(FetchIssue::Failed),
            None => {}
        }
    }
    super::fetch_issue_banner(issue, retry_href)
}

fn render_category(category: &CategoryData) -> String {
    // Empty categories disappear rather than rendering a bare heading.
    if category.stocks.is_empty() {
        return String::new();
    }

    let mut out = String::new();
    out.push_str("<section class=\"category-block\">");
    out.push_str(&format!("<h2>{}</h2>\n", escape_html(&category.category)));

    if category.category == OWNED_CATEGORY {
        out.push_str(&category_table(&category.stocks));
    } else {
        for (industry, stocks) in group_by_industry(&category.stocks) {
            out.push_str(&format!(
                "<h3 class=\"industry-title\">{}</h3>\n",
                escape_html(industry)
            ));
            out.push_str(&table_of(&stocks));
        }
    }

    out.push_str("</section>\n");
    out
}

/// Ten-column stock table. Shared with the portfolio page.
pub(crate) fn category_table(stocks: &[StockRecord]) -> String {
    table_of(&stocks.iter().collect::<Vec<_>>())
}

fn table_of(stocks: &[&StockRecord]) -> String {
    let mut out = String::new();
    out.push_str("<div class=\"table-wrap\"><table><thead><tr>");
    for header in TABLE_HEADERS {
        out.push_str(&format!("<th>{}</th>", header));
    }
    out.push_str("</tr></thead><tbody>\n");
    for stock in stocks {
        out.push_str(&table_row(stock));
    }
    out.push_str("</tbody></table></div>\n");
    out
}

fn table_row(stock: &StockRecord) -> String {
    let mut out = String::new();

    let search_key = format!("{} {}", stock.symbol, stock.display_name()).to_lowercase();
    out.push_str(&format!(
        "<tr data-search=\"{}\">",
        escape_html(&search_key)
    ));

    out.push_str("<td class=\"name-cell\">");
    out.push_str(&flag_star(&stock.symbol, stock.flag));
    out.push_str(&info_button(stock, false));
    out.push_str(&logo_img(stock));
    out.push_str(&format!("<span>{}</span>", escape_html(stock.display_name())));
    out.push_str("</td>");

    out.push_str(&format!("<td>{}</td>", symbol_link(&stock.symbol)));
    out.push_str(&format!(
        "<td class=\"num\">{}</td>",
        format_market_cap(stock.market_cap)
    ));
    out.push_str(&format!("<td class=\"num\">{}</td>", format_value(stock.open)));
    out.push_str(&format!("<td class=\"num\">{}</td>", format_value(stock.high)));
    out.push_str(&format!("<td class=\"num\">{}</td>", format_value(stock.low)));
    out.push_str(&format!("<td class=\"num\">{}</td>", format_value(stock.close)));

    // Both move columns color by the percent change.
    let move_color = change_color(stock.percent_change);
    out.push_str(&colored_td(move_color, &format_change(stock.price_change)));
    out.push_str(&colored_td(
        move_color,
        &format_percent_change(stock.percent_change),
    ));

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

/// Group stocks by industry, keeping first-appearance order for both the
/// groups and their members.
fn group_by_industry(stocks: &[StockRecord]) -> Vec<(&str, Vec<&StockRecord>)> {
    let mut groups: Vec<(&str, Vec<&StockRecord>)> = Vec::new();

    for stock in stocks {
        let industry = stock.industry_label();
        match groups.iter_mut().find(|(name, _)| *name == industry) {
            Some((_, members)) => members.push(stock),
            None => groups.push((industry, vec![stock])),
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stock(symbol: &str, industry: Option<&str>) -> StockRecord {
        StockRecord {
            symbol: symbol.to_string(),
            name: Some(format!("{} Inc.", symbol)),
            industry: industry.map(str::to_string),
            close: Some(100.0),
            percent_change: Some(2.0),
            rsi: Some(50.0),
            ..Default::default()
        }
    }

    fn category(name: &str, stocks: Vec<StockRecord>) -> CategoryData {
        CategoryData {
            category: name.to_string(),
            stocks,
            last_updated: Some("10/14 02:00 PM CT".to_string()),
            issue: None,
        }
    }

    #[test]
    fn test_owned_renders_single_table() {
        let html = render(
            &[category("Owned", vec![stock("AAPL", Some("Tech"))])],
            false,
        );
        assert!(html.contains("<h2>Owned</h2>"));
        assert!(!html.contains("industry-title"));
        assert!(html.contains("data-chart-symbol=\"AAPL\""));
        assert!(html.contains("Last updated: 10/14 02:00 PM CT"));
    }

    #[test]
    fn test_other_categories_group_by_industry() {
        let html = render(
            &[category(
                "Healthcare",
                vec![
                    stock("JNJ", Some("Drug Manufacturers")),
                    stock("UNH", Some("Healthcare Plans")),
                    stock("PFE", Some("Drug Manufacturers")),
                ],
            )],
            false,
        );

        let drug = html.find("Drug Manufacturers").unwrap();
        let plans = html.find("Healthcare Plans").unwrap();
        assert!(drug < plans);

        // Missing industries fall back to a placeholder group.
        let html = render(&[category("Healthcare", vec![stock("XYZ", None)])], false);
        assert!(html.contains("Uncategorized"));
    }

    #[test]
    fn test_empty_category_is_skipped() {
        let html = render(
            &[
                category("Owned", vec![]),
                category("Healthcare", vec![stock("JNJ", Some("Drug Manufacturers"))]),
            ],
            false,
        );
        assert!(!html.contains("<h2>Owned</h2>"));
        assert!(html.contains("<h2>Healthcare</h2>"));
    }

    #[test]
    fn test_move_cells_share_percent_color() {
        let mut record = stock("AAPL", Some("Tech"));
        record.price_change = Some(-1.0);
        record.percent_change = Some(-3.5);
        let html = render(&[category("Owned", vec![record])], false);

        // -3.5% is the second down bucket for both move columns.
        assert_eq!(html.matches("background-color:#FF6347").count(), 2);
    }

    #[test]
    fn test_rate_limited_category_shows_banner() {
        let mut degraded = category("Healthcare", vec![]);
        degraded.issue = Some(FetchIssue::RateLimited);
        let html = render(&[degraded], false);
        assert!(html.contains("rate-limited"));
        assert!(html.contains("/?refresh=true"));
    }
}
