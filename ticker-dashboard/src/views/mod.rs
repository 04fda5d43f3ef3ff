//! Server-rendered HTML views.
//!
//! Every page is assembled server-side into a complete document; the only
//! client script is the interaction layer (popups, chart canvas, flag
//! toggles, table search) embedded as a constant. Views never fail: they
//! render whatever the aggregator hands them, surfacing fetch issues as
//! dismissible banners.

pub mod calendar;
pub mod etfs;
pub mod movers;
pub mod pe;
pub mod portfolio;
pub mod rsi;
pub mod volatility;
pub mod watchlist;

use crate::classify::{forward_pe_color, format_market_cap, format_value, trailing_pe_color};
use crate::data::{FetchIssue, MergedStocks, StockRecord};

// ============================================================================
// Navigation
// ============================================================================

/// Pages reachable from the nav bar, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavPage {
    Watchlist,
    Portfolio,
    Etfs,
    Movers,
    Rsi,
    Volatility,
    Pe,
    Calendar,
}

impl NavPage {
    pub const ALL: [NavPage; 8] = [
        NavPage::Watchlist,
        NavPage::Portfolio,
        NavPage::Etfs,
        NavPage::Movers,
        NavPage::Rsi,
        NavPage::Volatility,
        NavPage::Pe,
        NavPage::Calendar,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Watchlist => "Watchlist",
            Self::Portfolio => "Portfolio",
            Self::Etfs => "ETFs",
            Self::Movers => "Market Movers",
            Self::Rsi => "RSI Analysis",
            Self::Volatility => "Volatility",
            Self::Pe => "P/E Analysis",
            Self::Calendar => "Earnings Calendar",
        }
    }

    pub fn href(&self) -> &'static str {
        match self {
            Self::Watchlist => "/",
            Self::Portfolio => "/portfolio",
            Self::Etfs => "/etfs",
            Self::Movers => "/movers",
            Self::Rsi => "/rsi",
            Self::Volatility => "/volatility",
            Self::Pe => "/pe",
            Self::Calendar => "/calendar",
        }
    }
}

// ============================================================================
// Page Shell
// ============================================================================

/// Wrap a rendered body in the document shell: head, stylesheet, nav bar,
/// popup containers and the client script.
pub(crate) fn page_shell(title: &str, active: NavPage, body: &str) -> String {
    let mut out = String::with_capacity(body.len() + 8 * 1024);

    out.push_str("<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">\n");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    out.push_str(&format!("<title>{} | Ticker</title>\n", escape_html(title)));
    out.push_str(STYLESHEET);
    out.push_str("</head><body>\n");
    out.push_str(&render_nav(active));
    out.push_str("<main class=\"shell\">\n");
    out.push_str(body);
    out.push_str("</main>\n");
    out.push_str(POPUP_CONTAINERS);
    out.push_str(CLIENT_SCRIPT);
    out.push_str("</body></html>\n");
    out
}

fn render_nav(active: NavPage) -> String {
    let mut out = String::new();
    out.push_str("<nav class=\"topnav\"><span class=\"brand\">Ticker</span><div class=\"nav-links\">");
    for page in NavPage::ALL {
        let class = if page == active { "nav-link active" } else { "nav-link" };
        out.push_str(&format!(
            "<a class=\"{}\" href=\"{}\">{}</a>",
            class,
            page.href(),
            page.label()
        ));
    }
    out.push_str("</div></nav>\n");
    out
}

// ============================================================================
// Shared Fragments
// ============================================================================

pub(crate) fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Source timestamp footnote, empty when the source carries none.
pub(crate) fn last_updated_line(last_updated: Option<&str>) -> String {
    match last_updated {
        Some(ts) if !ts.is_empty() => format!(
            "<div class=\"updated-note\">Last updated: {}</div>\n",
            escape_html(ts)
        ),
        _ => String::new(),
    }
}

/// Dismissible banner for a degraded category fetch, with a retry link.
pub(crate) fn fetch_issue_banner(issue: Option<FetchIssue>, retry_href: &str) -> String {
    let message = match issue {
        Some(FetchIssue::RateLimited) => {
            "Market data is temporarily rate-limited by the provider. Showing what is available."
        }
        Some(FetchIssue::Failed) => "Market data is currently unavailable.",
        None => return String::new(),
    };

    format!(
        "<div class=\"banner\"><span>{}</span><span class=\"banner-actions\"><a class=\"banner-retry\" href=\"{}\">Retry</a><button class=\"banner-dismiss\" type=\"button\">&times;</button></span></div>\n",
        message,
        escape_html(retry_href)
    )
}

/// Banner for merged multi-category fetches; rate limiting wins over
/// plain failures when both occurred.
pub(crate) fn merged_issue_banner(merged: &MergedStocks, retry_href: &str) -> String {
    let issue = if merged.rate_limited {
        Some(FetchIssue::RateLimited)
    } else if merged.failed {
        Some(FetchIssue::Failed)
    } else {
        None
    };
    fetch_issue_banner(issue, retry_href)
}

/// Owned-flag star button; the client script posts the toggle.
pub(crate) fn flag_star(symbol: &str, flagged: bool) -> String {
    let class = if flagged { "star-btn flagged" } else { "star-btn" };
    format!(
        "<button class=\"{}\" type=\"button\" data-symbol=\"{}\" data-flagged=\"{}\" aria-label=\"Toggle portfolio flag\">&#9733;</button>",
        class,
        escape_html(symbol),
        flagged
    )
}

/// Symbol cell content; the client script opens the chart popup.
pub(crate) fn symbol_link(symbol: &str) -> String {
    format!(
        "<a class=\"symbol-link\" href=\"#\" data-chart-symbol=\"{0}\">{0}</a>",
        escape_html(symbol)
    )
}

pub(crate) fn ticker_chip(symbol: &str) -> String {
    format!("<span class=\"ticker-chip\">{}</span>", escape_html(symbol))
}

/// Company logo if the record carries one.
pub(crate) fn logo_img(stock: &StockRecord) -> String {
    match stock.logo_url.as_deref() {
        Some(url) if !url.is_empty() => format!(
            "<img class=\"stock-logo\" src=\"{}\" alt=\"\" loading=\"lazy\" onerror=\"this.style.display='none'\">",
            escape_html(url)
        ),
        _ => String::new(),
    }
}

/// Detail-popup trigger carrying the stock's metrics as data attributes.
///
/// The client script assembles the popup from whatever attributes are
/// present; `extended` adds the fundamental metrics shown on the movers
/// and RSI pages.
pub(crate) fn info_button(stock: &StockRecord, extended: bool) -> String {
    let mut out = String::from("<button class=\"info-btn\" type=\"button\" aria-label=\"Details\"");

    push_attr(&mut out, "data-stock-name", stock.display_name());
    push_attr(&mut out, "data-symbol", &stock.symbol);
    push_attr(
        &mut out,
        "data-fifty-two-week-high",
        &format_value(stock.fifty_two_week_high),
    );
    push_attr(
        &mut out,
        "data-fifty-two-week-low",
        &format_value(stock.fifty_two_week_low),
    );
    push_attr(&mut out, "data-current-price", &format_value(stock.close));
    if let Some(date) = stock.earnings_date.as_deref() {
        push_attr(&mut out, "data-earnings-date", date);
    }
    push_attr(&mut out, "data-trailing-pe", &format_value(stock.trailing_pe));
    push_attr(&mut out, "data-forward-pe", &format_value(stock.forward_pe));
    push_attr(&mut out, "data-ev-ebitda", &format_value(stock.ev_ebitda));
    push_attr(
        &mut out,
        "data-trailing-pe-color",
        trailing_pe_color(stock.trailing_pe),
    );
    push_attr(
        &mut out,
        "data-forward-pe-color",
        forward_pe_color(stock.forward_pe, stock.trailing_pe),
    );
    if let Some(url) = stock.logo_url.as_deref() {
        push_attr(&mut out, "data-url", url);
    }

    if extended {
        push_attr(&mut out, "data-market-cap", &format_market_cap(stock.market_cap));
        push_attr(
            &mut out,
            "data-dividend-yield",
            &format_value(stock.dividend_yield),
        );
        push_attr(
            &mut out,
            "data-total-revenue",
            &format_market_cap(stock.total_revenue),
        );
        push_attr(&mut out, "data-net-income", &format_market_cap(stock.net_income));
        push_attr(
            &mut out,
            "data-profit-margins",
            &format_value(stock.profit_margins),
        );
    }

    if let Some(description) = stock.description.as_deref() {
        push_attr(&mut out, "title", description);
    }

    out.push_str(">&#9432;</button>");
    out
}

fn push_attr(out: &mut String, name: &str, value: &str) {
    if value.is_empty() {
        return;
    }
    out.push_str(&format!(" {}=\"{}\"", name, escape_html(value)));
}

/// Section used by several pages for "nothing here" panels.
pub(crate) fn empty_state(message: &str) -> String {
    format!("<p class=\"empty-state\">{}</p>\n", escape_html(message))
}

pub(crate) fn price_label(close: Option<f64>) -> String {
    match close {
        Some(c) if c.is_finite() => format!("${:.2}", c),
        _ => "N/A".to_string(),
    }
}

/// Compact list row used by the RSI and volatility panels: company block
/// with industry subline, price and daily move, ticker chip, then any
/// page-specific badges.
pub(crate) fn stock_row(stock: &StockRecord, badges: &str) -> String {
    let change_class = match stock.percent_change {
        Some(pct) if pct > 0.0 => "metric-change-up",
        Some(pct) if pct < 0.0 => "metric-change-down",
        _ => "metric-change-flat",
    };

    let mut out = String::new();
    out.push_str(&format!(
        "<div class=\"stock-row\" data-chart-symbol=\"{}\">",
        escape_html(&stock.symbol)
    ));

    out.push_str("<div class=\"company-block\">");
    out.push_str(&info_button(stock, true));
    out.push_str(&logo_img(stock));
    out.push_str(&format!(
        "<div class=\"company-meta\"><div class=\"company-name\">{}</div><div class=\"industry-sub\">{}</div></div>",
        escape_html(stock.display_name()),
        escape_html(stock.industry.as_deref().unwrap_or("\u{2014}"))
    ));
    out.push_str("</div>");

    out.push_str(&format!(
        "<div class=\"metric-block\"><div class=\"metric-price\">{}</div><div class=\"{}\">{}</div></div>",
        escape_html(&price_label(stock.close)),
        change_class,
        escape_html(&crate::classify::format_signed_change(
            stock.price_change,
            stock.percent_change
        ))
    ));

    out.push_str(&ticker_chip(&stock.symbol));
    out.push_str(badges);
    out.push_str("</div>\n");
    out
}

// ============================================================================
// Stylesheet
// ============================================================================

const STYLESHEET: &str = "<style>:root{--bg:#11161d;--panel:#1a212b;--panel2:#202a36;--ink:#e8edf2;--muted:#94a3b2;--line:#2c3744;--accent:#4da3ff;--up:#32CD32;--down:#FF6347;--chip:#2a3542;--gold:#ffd600}*{box-sizing:border-box}body{margin:0;background:var(--bg);color:var(--ink);font-family:\"Segoe UI\",\"Helvetica Neue\",Arial,sans-serif;font-size:15px}a{color:var(--accent)}.topnav{display:flex;align-items:center;gap:18px;padding:10px 18px;background:var(--panel);border-bottom:1px solid var(--line);position:sticky;top:0;z-index:5}.brand{font-weight:700;letter-spacing:.06em;text-transform:uppercase;color:var(--accent)}.nav-links{display:flex;gap:4px;flex-wrap:wrap}.nav-link{padding:6px 10px;border-radius:8px;text-decoration:none;color:var(--muted);font-size:.9rem}.nav-link:hover{background:var(--panel2);color:var(--ink)}.nav-link.active{background:var(--panel2);color:var(--ink);font-weight:600}.shell{max-width:1500px;margin:0 auto;padding:18px 16px 40px}.page-head{display:flex;align-items:center;justify-content:space-between;gap:12px;flex-wrap:wrap;margin:6px 0 14px}.page-head h1{margin:0;font-size:1.4rem}.page-tools{display:flex;align-items:center;gap:10px}.search-box{background:var(--panel);border:1px solid var(--line);color:var(--ink);border-radius:8px;padding:7px 10px;min-width:220px}.refresh-btn{background:var(--panel2);border:1px solid var(--line);color:var(--ink);border-radius:8px;padding:7px 12px;text-decoration:none;font-size:.88rem}.refresh-btn:hover{border-color:var(--accent)}.updated-note{color:var(--muted);font-size:.82rem;margin:10px 2px}.banner{display:flex;justify-content:space-between;align-items:center;gap:10px;background:#3a2b16;border:1px solid #8a6320;color:#ffd9a0;border-radius:10px;padding:10px 14px;margin:0 0 14px}.banner-actions{display:flex;align-items:center;gap:10px}.banner-retry{color:#ffd9a0;font-weight:600}.banner-dismiss{background:none;border:none;color:#ffd9a0;font-size:1.1rem;cursor:pointer}.category-block{margin:0 0 26px}.category-block h2{font-size:1.12rem;margin:18px 0 8px;border-bottom:1px solid var(--line);padding-bottom:6px}.industry-title{font-size:.95rem;color:var(--muted);margin:14px 0 6px}.table-wrap{overflow-x:auto;background:var(--panel);border:1px solid var(--line);border-radius:12px}table{width:100%;border-collapse:collapse;min-width:860px}thead th{text-align:left;font-size:.78rem;letter-spacing:.05em;text-transform:uppercase;color:var(--muted);padding:9px 10px;border-bottom:1px solid var(--line);background:var(--panel2);position:sticky;top:0}tbody td{padding:8px 10px;border-bottom:1px solid var(--line);white-space:nowrap;font-size:.9rem}tbody tr:last-child td{border-bottom:none}tbody tr:hover{background:var(--panel2)}td.num{font-variant-numeric:tabular-nums}.name-cell{display:flex;align-items:center;gap:8px;min-width:220px;white-space:normal}.stock-logo{width:20px;height:20px;border-radius:4px;object-fit:contain;background:#fff}.symbol-link{font-weight:600;text-decoration:none}.ticker-chip{display:inline-block;background:var(--chip);border-radius:6px;padding:2px 7px;font-size:.78rem;letter-spacing:.04em}.star-btn{background:none;border:none;font-size:1.05rem;cursor:pointer;color:#5b6674}.star-btn.flagged{color:var(--gold)}.info-btn{background:none;border:none;color:var(--accent);font-size:1rem;cursor:pointer}.colored-cell{color:#10151b;border-radius:4px;font-weight:600}.empty-state{color:var(--muted);background:var(--panel);border:1px dashed var(--line);border-radius:10px;padding:18px;text-align:center}.panel-grid{display:grid;grid-template-columns:repeat(auto-fit,minmax(320px,1fr));gap:14px}.panel{background:var(--panel);border:1px solid var(--line);border-radius:12px;padding:12px 14px}.panel h2{margin:2px 0 10px;font-size:1.02rem}.stock-row{display:flex;align-items:center;justify-content:space-between;gap:10px;padding:8px 2px;border-bottom:1px solid var(--line)}.stock-row:last-child{border-bottom:none}.company-block{display:flex;align-items:center;gap:9px;min-width:0}.company-meta{min-width:0}.company-name{font-weight:600;white-space:nowrap;overflow:hidden;text-overflow:ellipsis;max-width:230px}.industry-sub{color:var(--muted);font-size:.78rem}.metric-block{text-align:right;white-space:nowrap}.metric-price{font-weight:600}.metric-change-up{color:var(--up);font-size:.82rem}.metric-change-down{color:var(--down);font-size:.82rem}.metric-change-flat{color:var(--muted);font-size:.82rem}.badge{display:inline-block;min-width:44px;text-align:center;border-radius:8px;padding:4px 8px;font-weight:700;font-size:.82rem;color:#10151b;background:var(--chip)}.badge.rsi-oversold{background:#FF6347}.badge.rsi-low{background:#FFA500}.badge.rsi-neutral{background:#94a3b2}.badge.rsi-high{background:#ffd600}.badge.rsi-overbought{background:#98FB98}.badge-atr{background:#b58cff}.calendar-head{display:flex;align-items:center;justify-content:space-between;margin:4px 0 12px}.week-range{font-weight:600}.calendar-nav{display:flex;gap:8px}.calendar-grid{display:grid;grid-template-columns:repeat(5,1fr);gap:10px}.calendar-day{background:var(--panel);border:1px solid var(--line);border-radius:12px;padding:10px;min-height:160px}.calendar-day.today{border-color:var(--accent);box-shadow:0 0 0 1px var(--accent)}.day-label{font-weight:700;font-size:.86rem;margin-bottom:8px}.day-label span{color:var(--muted);font-weight:400}.timing-title{color:var(--muted);font-size:.72rem;text-transform:uppercase;letter-spacing:.05em;margin:8px 0 4px}.earning-item{display:flex;align-items:center;justify-content:space-between;gap:6px;padding:5px 0;border-bottom:1px dashed var(--line);font-size:.84rem}.earning-item:last-child{border-bottom:none}.earning-left{display:flex;align-items:center;gap:6px;min-width:0}.earning-right{display:flex;align-items:center;gap:6px;white-space:nowrap}.earning-name{white-space:nowrap;overflow:hidden;text-overflow:ellipsis;max-width:130px}.rsi-chip{border-radius:6px;padding:1px 6px;font-size:.74rem;font-weight:700;color:#10151b}.rsi-chip.rsi-oversold{background:#FF6347}.rsi-chip.rsi-low{background:#FFA500}.rsi-chip.rsi-neutral{background:#94a3b2}.rsi-chip.rsi-high{background:#ffd600}.rsi-chip.rsi-overbought{background:#98FB98}.scatter-wrap{background:var(--panel);border:1px solid var(--line);border-radius:12px;padding:14px}.scatter-legend{display:flex;flex-wrap:wrap;gap:10px;margin-bottom:8px;font-size:.82rem}.legend-item{display:flex;align-items:center;gap:5px;color:var(--muted)}.legend-swatch{width:10px;height:10px;border-radius:3px;display:inline-block}.negative-panel{margin-top:16px}.negative-panel ul{margin:8px 0 0;padding-left:22px;color:var(--muted)}.overlay{display:none;position:fixed;inset:0;background:rgba(8,12,18,.72);z-index:30;align-items:center;justify-content:center}.overlay.open{display:flex}.popup{background:var(--panel);border:1px solid var(--line);border-radius:14px;max-width:560px;width:92%;max-height:84vh;overflow-y:auto;padding:16px 18px;position:relative}.popup h3{margin:0 42px 10px 0;font-size:1.08rem}.popup-close{position:absolute;top:10px;right:12px;background:none;border:none;color:var(--muted);font-size:1.3rem;cursor:pointer}.popup-row{display:flex;justify-content:space-between;gap:12px;padding:6px 0;border-bottom:1px solid var(--line);font-size:.9rem}.popup-row span:first-child{color:var(--muted)}.popup-desc{margin-top:10px;color:var(--muted);font-size:.86rem;line-height:1.45}.range-bar{position:relative;height:6px;background:var(--chip);border-radius:4px;margin:18px 6px 6px}.range-marker{position:absolute;top:-7px;width:12px;height:12px;background:var(--accent);transform:translateX(-50%) rotate(45deg);border-radius:2px}.range-labels{display:flex;justify-content:space-between;color:var(--muted);font-size:.78rem;margin:2px 6px 0}.chart-canvas{width:100%;height:320px;background:var(--panel2);border-radius:8px}.chart-status{color:var(--muted);padding:8px 2px;font-size:.86rem}@media (max-width:900px){.calendar-grid{grid-template-columns:1fr}.company-name{max-width:150px}}</style>\n";

// ============================================================================
// Popup Containers + Client Script
// ============================================================================

const POPUP_CONTAINERS: &str = "<div class=\"overlay\" id=\"info-overlay\"><div class=\"popup\"><button class=\"popup-close\" type=\"button\" data-close=\"info-overlay\">&times;</button><div id=\"info-popup-body\"></div></div></div>\n<div class=\"overlay\" id=\"chart-overlay\"><div class=\"popup\"><button class=\"popup-close\" type=\"button\" data-close=\"chart-overlay\">&times;</button><h3 id=\"chart-title\"></h3><div class=\"chart-status\" id=\"chart-status\"></div><canvas class=\"chart-canvas\" id=\"chart-canvas\" width=\"920\" height=\"480\"></canvas></div></div>\n";

const CLIENT_SCRIPT: &str = r#"<script>
(() => {
  function esc(s) {
    return String(s).replace(/&/g, '&amp;').replace(/</g, '&lt;').replace(/>/g, '&gt;').replace(/"/g, '&quot;');
  }

  function openOverlay(id) { document.getElementById(id).classList.add('open'); }
  function closeOverlay(id) { document.getElementById(id).classList.remove('open'); }

  document.querySelectorAll('.overlay').forEach(overlay => {
    overlay.addEventListener('click', e => { if (e.target === overlay) overlay.classList.remove('open'); });
  });
  document.querySelectorAll('[data-close]').forEach(btn => {
    btn.addEventListener('click', () => closeOverlay(btn.getAttribute('data-close')));
  });

  // --- banner dismiss ---
  document.querySelectorAll('.banner-dismiss').forEach(btn => {
    btn.addEventListener('click', () => btn.closest('.banner').remove());
  });

  // --- portfolio flag toggle ---
  document.querySelectorAll('.star-btn').forEach(btn => {
    btn.addEventListener('click', async () => {
      const symbol = btn.getAttribute('data-symbol');
      const flag = btn.getAttribute('data-flagged') !== 'true';
      btn.disabled = true;
      try {
        const r = await fetch('/api/update_flag', {
          method: 'POST',
          headers: { 'Content-Type': 'application/json' },
          body: JSON.stringify({ symbol: symbol, flag: flag })
        });
        const payload = await r.json();
        if (payload.success) { location.reload(); return; }
        console.error('Flag update rejected for', symbol);
      } catch (err) {
        console.error('Flag update failed', err);
      }
      btn.disabled = false;
    });
  });

  // --- table search ---
  const search = document.getElementById('stock-search');
  if (search) {
    search.addEventListener('input', () => {
      const needle = search.value.trim().toLowerCase();
      document.querySelectorAll('tr[data-search]').forEach(row => {
        row.style.display = row.getAttribute('data-search').includes(needle) ? '' : 'none';
      });
    });
  }

  // --- detail popup ---
  function popupRow(label, value, color) {
    if (!value) return '';
    const style = color ? ' style="color:' + esc(color) + '"' : '';
    return '<div class="popup-row"><span>' + esc(label) + '</span><span' + style + '>' + esc(value) + '</span></div>';
  }

  document.querySelectorAll('.info-btn').forEach(btn => {
    btn.addEventListener('click', e => {
      e.stopPropagation();
      const d = name => btn.getAttribute('data-' + name) || '';
      let html = '<h3>' + esc(d('stock-name') || d('symbol'));
      if (d('earnings-date')) html += ' <small>(Earnings: ' + esc(d('earnings-date')) + ')</small>';
      html += '</h3>';

      const low = parseFloat(d('fifty-two-week-low').replace(/,/g, ''));
      const high = parseFloat(d('fifty-two-week-high').replace(/,/g, ''));
      const price = parseFloat(d('current-price').replace(/,/g, ''));
      if (isFinite(low) && isFinite(high) && isFinite(price) && high > low) {
        const pos = Math.min(100, Math.max(0, ((price - low) / (high - low)) * 100));
        html += '<div class="range-bar"><div class="range-marker" style="left:' + pos.toFixed(1) + '%"></div></div>';
        html += '<div class="range-labels"><span>52W Low ' + esc(d('fifty-two-week-low')) + '</span><span>' + esc(d('current-price')) + '</span><span>52W High ' + esc(d('fifty-two-week-high')) + '</span></div>';
      }

      html += popupRow('Trailing P/E', d('trailing-pe'), d('trailing-pe-color'));
      html += popupRow('Forward P/E', d('forward-pe'), d('forward-pe-color'));
      html += popupRow('EV/EBITDA', d('ev-ebitda'), '');
      html += popupRow('Market Cap', d('market-cap'), '');
      html += popupRow('Dividend Yield', d('dividend-yield'), '');
      html += popupRow('Total Revenue', d('total-revenue'), '');
      html += popupRow('Net Income', d('net-income'), '');
      html += popupRow('Profit Margins', d('profit-margins'), '');

      const desc = btn.getAttribute('title');
      if (desc) html += '<p class="popup-desc">' + esc(desc) + '</p>';

      document.getElementById('info-popup-body').innerHTML = html;
      openOverlay('info-overlay');
    });
  });

  // --- chart popup ---
  function drawCandles(canvas, data) {
    const ctx = canvas.getContext('2d');
    const w = canvas.width, h = canvas.height;
    ctx.clearRect(0, 0, w, h);

    const n = data.close.length;
    if (!n) return;
    let min = Infinity, max = -Infinity;
    for (let i = 0; i < n; i++) {
      if (data.low[i] < min) min = data.low[i];
      if (data.high[i] > max) max = data.high[i];
    }
    if (!(max > min)) { max = min + 1; }

    const padL = 56, padR = 12, padT = 14, padB = 26;
    const plotW = w - padL - padR, plotH = h - padT - padB;
    const y = v => padT + (max - v) / (max - min) * plotH;
    const step = plotW / n;
    const bodyW = Math.max(2, Math.min(14, step * 0.6));

    ctx.strokeStyle = '#2c3744';
    ctx.fillStyle = '#94a3b2';
    ctx.font = '12px sans-serif';
    for (let g = 0; g <= 4; g++) {
      const value = min + (max - min) * g / 4;
      const gy = y(value);
      ctx.beginPath(); ctx.moveTo(padL, gy); ctx.lineTo(w - padR, gy); ctx.stroke();
      ctx.fillText(value.toFixed(2), 4, gy + 4);
    }

    for (let i = 0; i < n; i++) {
      const cx = padL + step * (i + 0.5);
      const up = data.close[i] >= data.open[i];
      ctx.strokeStyle = up ? '#32CD32' : '#FF6347';
      ctx.fillStyle = ctx.strokeStyle;
      ctx.beginPath(); ctx.moveTo(cx, y(data.high[i])); ctx.lineTo(cx, y(data.low[i])); ctx.stroke();
      const top = y(Math.max(data.open[i], data.close[i]));
      const bottom = y(Math.min(data.open[i], data.close[i]));
      ctx.fillRect(cx - bodyW / 2, top, bodyW, Math.max(1, bottom - top));
    }

    const labelEvery = Math.max(1, Math.floor(n / 8));
    ctx.fillStyle = '#94a3b2';
    for (let i = 0; i < n; i += labelEvery) {
      const cx = padL + step * (i + 0.5);
      ctx.fillText(String(data.labels[i] || ''), cx - 18, h - 8);
    }
  }

  document.querySelectorAll('[data-chart-symbol]').forEach(link => {
    link.addEventListener('click', async e => {
      e.preventDefault();
      const symbol = link.getAttribute('data-chart-symbol');
      const title = document.getElementById('chart-title');
      const status = document.getElementById('chart-status');
      const canvas = document.getElementById('chart-canvas');
      title.textContent = symbol;
      status.textContent = 'Loading chart data...';
      canvas.getContext('2d').clearRect(0, 0, canvas.width, canvas.height);
      openOverlay('chart-overlay');
      try {
        const r = await fetch('/get_chart_data?symbol=' + encodeURIComponent(symbol));
        if (!r.ok) throw new Error('HTTP ' + r.status);
        const data = await r.json();
        title.textContent = data.companyName ? data.companyName + ' (' + symbol + ')' : symbol;
        status.textContent = '';
        drawCandles(canvas, data);
      } catch (err) {
        status.textContent = 'Failed to load chart data.';
      }
    });
  });
})();
</script>
"#;

// ============================================================================
// Tests
// ============================================================================
