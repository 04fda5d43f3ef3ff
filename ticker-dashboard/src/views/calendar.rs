//! Earnings calendar: a Monday-to-Friday week grid of upcoming earnings
//! announcements, split per day into before-open and after-close slots.

use chrono::{Datelike, Duration, NaiveDate};

use crate::classify::{format_one_decimal, format_signed_change, RsiBand};
use crate::data::{EarningsTiming, MergedStocks, StockRecord};

use super::{
    escape_html, info_button, last_updated_line, logo_img, merged_issue_banner, page_shell,
    price_label, NavPage,
};

const DAY_NAMES: [&str; 5] = ["Mon", "Tue", "Wed", "Thu", "Fri"];

/// Render the calendar for the week containing `anchor`. `today` is
/// passed in so the highlight is testable.
pub fn render(
    merged: &MergedStocks,
    anchor: NaiveDate,
    today: NaiveDate,
    refreshed: bool,
) -> String {
    let monday = week_start(anchor);
    let friday = monday + Duration::days(4);

    let prev = anchor - Duration::days(7);
    let next = anchor + Duration::days(7);

    let mut body = String::new();
    body.push_str("<div class=\"page-head\"><h1>Earnings Calendar</h1><div class=\"page-tools\">");
    body.push_str(&format!(
        "<a class=\"refresh-btn\" href=\"/calendar?date={}&amp;refresh=true\">Refresh</a>",
        anchor.format("%Y-%m-%d")
    ));
    body.push_str("</div></div>\n");

    if refreshed {
        body.push_str("<div class=\"updated-note\">Fetched fresh data from the source.</div>\n");
    }

    body.push_str(&merged_issue_banner(
        merged,
        &format!("/calendar?date={}&refresh=true", anchor.format("%Y-%m-%d")),
    ));

    body.push_str(&format!(
        "<div class=\"calendar-head\"><div class=\"week-range\">{} - {}, {}</div><div class=\"calendar-nav\"><a class=\"refresh-btn\" href=\"/calendar?date={}\">&larr; Previous</a><a class=\"refresh-btn\" href=\"/calendar?date={}\">Next &rarr;</a></div></div>\n",
        monday.format("%b %-d"),
        friday.format("%b %-d"),
        friday.format("%Y"),
        prev.format("%Y-%m-%d"),
        next.format("%Y-%m-%d"),
    ));

    body.push_str("<div class=\"calendar-grid\">\n");
    for offset in 0..5 {
        let day = monday + Duration::days(offset);
        body.push_str(&day_cell(merged, day, today, DAY_NAMES[offset as usize]));
    }
    body.push_str("</div>\n");

    body.push_str(&last_updated_line(merged.last_updated.as_deref()));

    page_shell("Earnings Calendar", NavPage::Calendar, &body)
}

/// Monday of the week containing `date`; a Sunday anchor belongs to the
/// week that ended the day before.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

fn day_cell(merged: &MergedStocks, day: NaiveDate, today: NaiveDate, name: &str) -> String {
    let reporting: Vec<&StockRecord> = merged
        .stocks
        .iter()
        .filter(|s| s.parsed_earnings_date() == Some(day))
        .collect();

    let before: Vec<&&StockRecord> = reporting
        .iter()
        .filter(|s| s.timing() == EarningsTiming::BeforeOpen)
        .collect();
    let after: Vec<&&StockRecord> = reporting
        .iter()
        .filter(|s| s.timing() == EarningsTiming::AfterClose)
        .collect();

    let class = if day == today {
        "calendar-day today"
    } else {
        "calendar-day"
    };

    let mut out = format!(
        "<div class=\"{}\"><div class=\"day-label\">{} <span>{}</span></div>",
        class,
        name,
        day.format("%b %-d")
    );

    if !before.is_empty() {
        out.push_str("<div class=\"timing-title\">Before Hours</div>");
        for stock in &before {
            out.push_str(&earning_item(stock, "Before Hours"));
        }
    }
    if !after.is_empty() {
        out.push_str("<div class=\"timing-title\">After Hours</div>");
        for stock in &after {
            out.push_str(&earning_item(stock, "After Hours"));
        }
    }

    out.push_str("</div>\n");
    out
}

fn earning_item(stock: &StockRecord, slot: &str) -> String {
    let change_class = match stock.percent_change {
        Some(pct) if pct > 0.0 => "metric-change-up",
        Some(pct) if pct < 0.0 => "metric-change-down",
        _ => "metric-change-flat",
    };
    let band = RsiBand::from_rsi(stock.rsi);

    format!(
        "<div class=\"earning-item\" data-chart-symbol=\"{sym}\" title=\"{sym} - {slot}\"><span class=\"earning-left\">{info}{logo}<span class=\"earning-name\">{name}</span></span><span class=\"earning-right\"><span>{price}</span><span class=\"{cls}\">{change}</span><span class=\"rsi-chip {band}\">RSI {rsi}</span></span></div>",
        sym = escape_html(&stock.symbol),
        slot = slot,
        info = info_button(stock, false),
        logo = logo_img(stock),
        name = escape_html(stock.display_name()),
        price = escape_html(&price_label(stock.close)),
        cls = change_class,
        change = escape_html(&format_signed_change(stock.price_change, stock.percent_change)),
        band = band.css_class(),
        rsi = format_one_decimal(stock.rsi),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn reporter(symbol: &str, earnings: &str, timing: EarningsTiming) -> StockRecord {
        StockRecord {
            symbol: symbol.to_string(),
            name: Some(format!("{} Corp", symbol)),
            earnings_date: Some(earnings.to_string()),
            earnings_timing: Some(timing),
            close: Some(88.0),
            rsi: Some(44.0),
            ..Default::default()
        }
    }

    fn merged(stocks: Vec<StockRecord>) -> MergedStocks {
        MergedStocks {
            stocks,
            last_updated: None,
            rate_limited: false,
            failed: false,
        }
    }

    #[test]
    fn test_week_start() {
        // 2024-10-16 is a Wednesday.
        assert_eq!(week_start(date(2024, 10, 16)), date(2024, 10, 14));
        // Monday maps to itself.
        assert_eq!(week_start(date(2024, 10, 14)), date(2024, 10, 14));
        // Sunday belongs to the week that just ended.
        assert_eq!(week_start(date(2024, 10, 20)), date(2024, 10, 14));
    }

    #[test]
    fn test_week_window_filters_reports() {
        let html = render(
            &merged(vec![
                reporter("IN", "10-15-2024", EarningsTiming::BeforeOpen),
                reporter("OUT", "10-22-2024", EarningsTiming::BeforeOpen),
            ]),
            date(2024, 10, 16),
            date(2024, 10, 16),
            false,
        );
        assert!(html.contains("IN Corp"));
        assert!(!html.contains("OUT Corp"));
    }

    #[test]
    fn test_timing_sections() {
        let html = render(
            &merged(vec![
                reporter("PRE", "10-15-2024", EarningsTiming::BeforeOpen),
                reporter("POST", "10-15-2024", EarningsTiming::AfterClose),
                reporter("TBA", "10-15-2024", EarningsTiming::Unknown),
            ]),
            date(2024, 10, 16),
            date(2024, 10, 16),
            false,
        );
        assert!(html.contains("Before Hours"));
        assert!(html.contains("After Hours"));
        let pre = html.find("PRE Corp").unwrap();
        let post = html.find("POST Corp").unwrap();
        assert!(pre < post);
        // Unscheduled timings are not shown.
        assert!(!html.contains("TBA Corp"));
    }

    #[test]
    fn test_today_highlight_and_nav_links() {
        let html = render(
            &merged(Vec::new()),
            date(2024, 10, 16),
            date(2024, 10, 16),
            false,
        );
        assert_eq!(html.matches("calendar-day today").count(), 1);
        assert!(html.contains("/calendar?date=2024-10-09"));
        assert!(html.contains("/calendar?date=2024-10-23"));
        assert!(html.contains("Oct 14 - Oct 18, 2024"));
    }

    #[test]
    fn test_other_week_has_no_highlight() {
        let html = render(
            &merged(Vec::new()),
            date(2024, 10, 23),
            date(2024, 10, 16),
            false,
        );
        assert!(!html.contains("calendar-day today"));
    }
}
