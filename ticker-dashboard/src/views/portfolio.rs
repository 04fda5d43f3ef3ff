//! Portfolio page: the owned category on its own.

use crate::data::CategoryData;

use super::watchlist::{categories_issue_banner, category_table};
use super::{empty_state, last_updated_line, page_shell, NavPage};

const EMPTY_PORTFOLIO: &str =
    "Your portfolio is empty. Add stocks from the Watchlist by clicking the star icon.";

/// Render the portfolio page from the owned category.
pub fn render(owned: &CategoryData, refreshed: bool) -> String {
    let mut body = String::new();

    body.push_str("<div class=\"page-head\"><h1>Portfolio</h1><div class=\"page-tools\">");
    body.push_str(
        "<input class=\"search-box\" id=\"stock-search\" type=\"search\" placeholder=\"Search symbol or name\">",
    );
    body.push_str("<a class=\"refresh-btn\" href=\"/portfolio?refresh=true\">Refresh</a>");
    body.push_str("</div></div>\n");

    if refreshed {
        body.push_str("<div class=\"updated-note\">Fetched fresh data from the source.</div>\n");
    }

    body.push_str(&categories_issue_banner(
        std::slice::from_ref(owned),
        "/portfolio?refresh=true",
    ));

    if owned.stocks.is_empty() {
        if owned.issue.is_none() {
            body.push_str(&empty_state(EMPTY_PORTFOLIO));
        }
    } else {
        body.push_str(&category_table(&owned.stocks));
    }

    body.push_str(&last_updated_line(owned.last_updated.as_deref()));

    page_shell("Portfolio", NavPage::Portfolio, &body)
}
