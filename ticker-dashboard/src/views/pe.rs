//! P/E analysis page: a log-log scatter of market cap against forward
//! P/E, grouped into one colored series per category, plus the list of
//! names that cannot be plotted.
//!
//! The chart is plain inline SVG. Points carry `data-chart-symbol` so
//! the shared client script opens the candlestick popup on click, and a
//! `<title>` child supplies the hover tooltip.

use crate::data::{MergedStocks, StockRecord, OWNED_CATEGORY};

use super::{escape_html, last_updated_line, merged_issue_banner, page_shell, NavPage};

const ALL_POSITIVE: &str = "All stocks have a positive Forward P/E.";

/// Series colors, assigned per category in configured order.
const SERIES_COLORS: [&str; 9] = [
    "#5470c6", "#91cc75", "#fac858", "#ee6666", "#73c0de", "#3ba272", "#fc8452", "#9a60b4",
    "#ea7ccc",
];

const SVG_WIDTH: f64 = 960.0;
const SVG_HEIGHT: f64 = 520.0;
const PAD_LEFT: f64 = 64.0;
const PAD_RIGHT: f64 = 24.0;
const PAD_TOP: f64 = 28.0;
const PAD_BOTTOM: f64 = 54.0;

struct SeriesPoint<'a> {
    stock: &'a StockRecord,
    cap_billions: f64,
    forward_pe: f64,
}

/// Render the P/E page. `categories` is the configured category order;
/// the owned list is a view over the others so it gets no series of its
/// own.
pub fn render(merged: &MergedStocks, categories: &[String], refreshed: bool) -> String {
    let mut series: Vec<(&str, Vec<SeriesPoint>)> = categories
        .iter()
        .map(String::as_str)
        .filter(|name| *name != OWNED_CATEGORY)
        .map(|name| (name, Vec::new()))
        .collect();

    let mut unplottable: Vec<&StockRecord> = Vec::new();

    for stock in &merged.stocks {
        let cap = stock.market_cap.filter(|c| c.is_finite() && *c > 0.0);
        let pe = stock.forward_pe.filter(|p| p.is_finite() && *p > 0.0);
        match (cap, pe) {
            (Some(cap), Some(pe)) => {
                // A record whose category is not a configured series is
                // dropped from the chart, not listed as negative.
                if let Some(slot) = series
                    .iter_mut()
                    .find(|(name, _)| Some(*name) == stock.category.as_deref())
                {
                    slot.1.push(SeriesPoint {
                        stock,
                        cap_billions: cap / 1000.0,
                        forward_pe: pe,
                    });
                }
            }
            _ => unplottable.push(stock),
        }
    }

    unplottable.sort_by(|a, b| b.market_cap_or_zero().total_cmp(&a.market_cap_or_zero()));

    let mut body = String::new();
    body.push_str("<div class=\"page-head\"><h1>P/E Analysis</h1><div class=\"page-tools\"><a class=\"refresh-btn\" href=\"/pe?refresh=true\">Refresh</a></div></div>\n");

    if refreshed {
        body.push_str("<div class=\"updated-note\">Fetched fresh data from the source.</div>\n");
    }

    body.push_str(&merged_issue_banner(merged, "/pe?refresh=true"));

    body.push_str("<div class=\"scatter-wrap\"><h2>Market Cap vs. Forward P/E Ratio</h2>\n");
    body.push_str(&legend(&series));
    body.push_str(&scatter_svg(&series));
    body.push_str("</div>\n");

    body.push_str("<section class=\"negative-panel\"><h2>Negative or Missing Forward P/E</h2><ul>");
    if unplottable.is_empty() {
        body.push_str(&format!("<li>{}</li>", ALL_POSITIVE));
    } else {
        for stock in &unplottable {
            body.push_str(&format!(
                "<li>{} ({})</li>",
                escape_html(stock.display_name()),
                escape_html(&stock.symbol)
            ));
        }
    }
    body.push_str("</ul></section>\n");

    body.push_str(&last_updated_line(merged.last_updated.as_deref()));

    page_shell("P/E Analysis", NavPage::Pe, &body)
}

fn legend(series: &[(&str, Vec<SeriesPoint>)]) -> String {
    let mut out = String::from("<div class=\"scatter-legend\">");
    for (i, (name, points)) in series.iter().enumerate() {
        if points.is_empty() {
            continue;
        }
        out.push_str(&format!(
            "<span class=\"legend-item\"><span class=\"legend-swatch\" style=\"background:{}\"></span>{}</span>",
            series_color(i),
            escape_html(name)
        ));
    }
    out.push_str("</div>\n");
    out
}

fn series_color(index: usize) -> &'static str {
    SERIES_COLORS[index % SERIES_COLORS.len()]
}

fn scatter_svg(series: &[(&str, Vec<SeriesPoint>)]) -> String {
    let points: Vec<&SeriesPoint> = series.iter().flat_map(|(_, pts)| pts).collect();
    if points.is_empty() {
        return super::empty_state("No stocks with a positive Forward P/E to plot.");
    }

    // Decade-snapped log bounds keep gridlines on powers of ten.
    let (x_min, x_max) = log_bounds(points.iter().map(|p| p.cap_billions));
    let (y_min, y_max) = log_bounds(points.iter().map(|p| p.forward_pe));

    let plot_w = SVG_WIDTH - PAD_LEFT - PAD_RIGHT;
    let plot_h = SVG_HEIGHT - PAD_TOP - PAD_BOTTOM;
    let x_of = |v: f64| PAD_LEFT + (v.log10() - x_min) / (x_max - x_min) * plot_w;
    let y_of = |v: f64| PAD_TOP + (y_max - v.log10()) / (y_max - y_min) * plot_h;

    let mut out = format!(
        "<svg class=\"scatter\" viewBox=\"0 0 {w} {h}\" width=\"100%\" role=\"img\" aria-label=\"Market cap versus forward P/E\">",
        w = SVG_WIDTH,
        h = SVG_HEIGHT
    );

    // Gridlines and axis labels at each decade.
    let mut k = x_min.ceil() as i32;
    while f64::from(k) <= x_max {
        let x = x_of(10f64.powi(k));
        out.push_str(&format!(
            "<line x1=\"{x:.1}\" y1=\"{top}\" x2=\"{x:.1}\" y2=\"{bottom}\" stroke=\"#2c3744\"/>",
            top = PAD_TOP,
            bottom = PAD_TOP + plot_h
        ));
        out.push_str(&format!(
            "<text x=\"{x:.1}\" y=\"{y}\" fill=\"#94a3b2\" font-size=\"12\" text-anchor=\"middle\">{}</text>",
            cap_axis_label(10f64.powi(k)),
            y = PAD_TOP + plot_h + 18.0
        ));
        k += 1;
    }
    let mut k = y_min.ceil() as i32;
    while f64::from(k) <= y_max {
        let y = y_of(10f64.powi(k));
        out.push_str(&format!(
            "<line x1=\"{left}\" y1=\"{y:.1}\" x2=\"{right}\" y2=\"{y:.1}\" stroke=\"#2c3744\"/>",
            left = PAD_LEFT,
            right = PAD_LEFT + plot_w
        ));
        out.push_str(&format!(
            "<text x=\"{x}\" y=\"{yt:.1}\" fill=\"#94a3b2\" font-size=\"12\" text-anchor=\"end\">{}</text>",
            trim_zeros(10f64.powi(k)),
            x = PAD_LEFT - 8.0,
            yt = y + 4.0
        ));
        k += 1;
    }

    // Axis names.
    out.push_str(&format!(
        "<text x=\"{x:.1}\" y=\"{y}\" fill=\"#94a3b2\" font-size=\"13\" text-anchor=\"middle\">Market Cap (Billions)</text>",
        x = PAD_LEFT + plot_w / 2.0,
        y = SVG_HEIGHT - 12.0
    ));
    out.push_str(&format!(
        "<text x=\"16\" y=\"{y:.1}\" fill=\"#94a3b2\" font-size=\"13\" text-anchor=\"middle\" transform=\"rotate(-90 16 {y:.1})\">Forward P/E</text>",
        y = PAD_TOP + plot_h / 2.0
    ));

    for (i, (_, pts)) in series.iter().enumerate() {
        for point in pts {
            out.push_str(&format!(
                "<circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"4\" fill=\"{}\" data-chart-symbol=\"{}\"><title>{}</title></circle>",
                x_of(point.cap_billions),
                y_of(point.forward_pe),
                series_color(i),
                escape_html(&point.stock.symbol),
                escape_html(&tooltip(point))
            ));
        }
    }

    out.push_str("</svg>\n");
    out
}

/// Log10 bounds snapped outward to whole decades, widened when the data
/// spans less than one decade.
fn log_bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        let l = v.log10();
        if l < min {
            min = l;
        }
        if l > max {
            max = l;
        }
    }
    let (mut lo, mut hi) = (min.floor(), max.ceil());
    if lo == hi {
        lo -= 1.0;
        hi += 1.0;
    }
    (lo, hi)
}

fn cap_axis_label(billions: f64) -> String {
    if billions >= 1000.0 {
        format!("{}T", trim_zeros(billions / 1000.0))
    } else {
        format!("{}B", trim_zeros(billions))
    }
}

fn trim_zeros(v: f64) -> String {
    format!("{}", v)
}

fn tooltip(point: &SeriesPoint) -> String {
    let cap = if point.cap_billions >= 1000.0 {
        format!("${:.2}T", point.cap_billions / 1000.0)
    } else {
        format!("${:.2}B", point.cap_billions)
    };
    format!(
        "{} ({})\nMarket Cap: {}\nForward P/E: {:.2}",
        point.stock.display_name(),
        point.stock.symbol,
        cap,
        point.forward_pe
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stock(symbol: &str, category: &str, cap: Option<f64>, pe: Option<f64>) -> StockRecord {
        StockRecord {
            symbol: symbol.to_string(),
            name: Some(format!("{} Co", symbol)),
            category: Some(category.to_string()),
            market_cap: cap,
            forward_pe: pe,
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

    fn categories() -> Vec<String> {
        vec![
            "Owned".to_string(),
            "Healthcare".to_string(),
            "Industrials".to_string(),
        ]
    }

    #[test]
    fn test_positive_pe_plotted_with_tooltip() {
        let html = render(
            &merged(vec![stock("PLT", "Healthcare", Some(2_500_000.0), Some(21.5))]),
            &categories(),
            false,
        );
        assert!(html.contains("data-chart-symbol=\"PLT\""));
        assert!(html.contains("Market Cap: $2.50T"));
        assert!(html.contains("Forward P/E: 21.50"));
        assert!(html.contains(ALL_POSITIVE));
    }

    #[test]
    fn test_negative_pe_listed_by_cap() {
        let html = render(
            &merged(vec![
                stock("SMALL", "Healthcare", Some(5_000.0), Some(-3.0)),
                stock("BIG", "Industrials", Some(900_000.0), None),
            ]),
            &categories(),
            false,
        );
        assert!(!html.contains("data-chart-symbol=\"SMALL\""));
        let big = html.find("BIG Co (BIG)").unwrap();
        let small = html.find("SMALL Co (SMALL)").unwrap();
        assert!(big < small);
        assert!(!html.contains(ALL_POSITIVE));
    }

    #[test]
    fn test_legend_lists_only_populated_series() {
        let html = render(
            &merged(vec![stock("HOME", "Healthcare", Some(10_000.0), Some(15.0))]),
            &categories(),
            false,
        );
        assert!(html.contains(">Healthcare</span>"));
        // No entry for the owned list, nor for a series without points.
        assert!(!html.contains(">Owned</span>"));
        assert!(!html.contains(">Industrials</span>"));
    }

    #[test]
    fn test_unknown_category_dropped_from_chart() {
        let html = render(
            &merged(vec![stock("ETF1", "Uncategorized", Some(10_000.0), Some(12.0))]),
            &categories(),
            false,
        );
        assert!(!html.contains("data-chart-symbol=\"ETF1\""));
        // Valid P/E, so it is not in the negative list either.
        assert!(html.contains(ALL_POSITIVE));
    }
}
