//! Classification and display formatting for stock metrics.
//!
//! Everything here feeds the renderers: RSI bands, percent-change
//! intensity buckets, P/E comparison colors, and the `N/A`-tolerant
//! numeric formatters. Colors are the hex values the stylesheet pairs
//! with; band thresholds are shared by every view so a cell background
//! and a chip class never disagree.

// ============================================================================
// RSI Bands
// ============================================================================

/// RSI classification band.
///
/// Bands partition the RSI axis: `(-inf, 30]` oversold, `(30, 35]` low,
/// `(35, 65)` neutral, `[65, 70)` high, `[70, inf)` overbought. Missing
/// RSI is neutral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RsiBand {
    Oversold,
    Low,
    Neutral,
    High,
    Overbought,
}

impl RsiBand {
    /// Classify an RSI value.
    pub fn from_rsi(rsi: Option<f64>) -> Self {
        let Some(value) = rsi else {
            return Self::Neutral;
        };

        if value <= 30.0 {
            Self::Oversold
        } else if value <= 35.0 {
            Self::Low
        } else if value < 65.0 {
            Self::Neutral
        } else if value < 70.0 {
            Self::High
        } else {
            Self::Overbought
        }
    }

    /// Cell background for RSI columns. Neutral cells stay unstyled.
    pub fn background_color(&self) -> &'static str {
        match self {
            Self::Oversold => "#FF6347",
            Self::Low => "#FFA500",
            Self::Neutral => "",
            Self::High => "#ffd600",
            Self::Overbought => "#98FB98",
        }
    }

    /// Chip class for the calendar and analysis views.
    pub fn css_class(&self) -> &'static str {
        match self {
            Self::Oversold => "rsi-oversold",
            Self::Low => "rsi-low",
            Self::Neutral => "rsi-neutral",
            Self::High => "rsi-high",
            Self::Overbought => "rsi-overbought",
        }
    }
}

// ============================================================================
// Percent-Change Buckets
// ============================================================================

const DOWN_COLORS: [&str; 4] = ["#808080", "#FFA07A", "#FF6347", "#B30000"];
const UP_COLORS: [&str; 4] = ["#808080", "#98FB98", "#32CD32", "#008000"];

/// Intensity bucket for a percent change magnitude.
///
/// Step function of `|pct|` with breakpoints at 1, 3 and 6: index 0 below
/// 1%, then 1, 2 and 3 as the move grows.
pub fn change_bucket(pct: f64) -> usize {
    let magnitude = pct.abs();
    if magnitude < 1.0 {
        0
    } else if magnitude < 3.0 {
        1
    } else if magnitude < 6.0 {
        2
    } else {
        3
    }
}

/// Cell color for a percent change. Sub-1% moves and missing values are
/// the same gray in both directions.
pub fn change_color(pct: Option<f64>) -> &'static str {
    let Some(value) = pct else {
        return DOWN_COLORS[0];
    };

    let bucket = change_bucket(value);
    if value < 0.0 {
        DOWN_COLORS[bucket]
    } else {
        UP_COLORS[bucket]
    }
}

// ============================================================================
// P/E Colors
// ============================================================================

/// Trailing P/E cell color: red when there are no trailing earnings.
pub fn trailing_pe_color(trailing: Option<f64>) -> &'static str {
    match trailing {
        Some(_) => "",
        None => "#FF6347",
    }
}

/// Forward P/E cell color, judged against the trailing P/E.
///
/// Red when the forward estimate is missing or negative, or when there is
/// no trailing value to compare with. Green when earnings are expected to
/// grow (forward below trailing), yellow when they are expected to
/// shrink, unstyled when flat.
pub fn forward_pe_color(forward: Option<f64>, trailing: Option<f64>) -> &'static str {
    let Some(forward) = forward else {
        return "#FF6347";
    };
    if forward < 0.0 {
        return "#FF6347";
    }
    let Some(trailing) = trailing else {
        return "#FF6347";
    };

    if forward < trailing {
        "#32CD32"
    } else if forward > trailing {
        "#ffd600"
    } else {
        ""
    }
}

// ============================================================================
// Formatters
// ============================================================================

/// Humanize a market cap given in millions of dollars.
///
/// `3_400_000` million reads `3.40T`, `550_000` reads `550.00B`, anything
/// under a billion reads in millions. Zero and missing read `N/A`.
pub fn format_market_cap(millions: Option<f64>) -> String {
    let Some(value) = millions else {
        return "N/A".to_string();
    };

    if value >= 1_000_000.0 {
        format!("{:.2}T", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("{:.2}B", value / 1_000.0)
    } else if value > 0.0 {
        format!("{:.2}M", value)
    } else {
        "N/A".to_string()
    }
}

/// Two decimals with thousands separators, `N/A` when missing.
pub fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) => with_thousands_separators(format!("{:.2}", v)),
        None => "N/A".to_string(),
    }
}

/// Two decimals, `N/A` when missing.
pub fn format_change(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => "N/A".to_string(),
    }
}

/// Two decimals with a percent sign, `N/A` when missing.
pub fn format_percent_change(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}%", v),
        None => "N/A".to_string(),
    }
}

/// RSI to two decimals, `N/A` when missing.
pub fn format_rsi(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => "N/A".to_string(),
    }
}

/// One decimal, `N/A` when missing. Used by the compact RSI chips.
pub fn format_one_decimal(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.1}", v),
        None => "N/A".to_string(),
    }
}

/// Combined signed move, e.g. `+1.23 (+0.45%)`.
pub fn format_signed_change(change: Option<f64>, pct: Option<f64>) -> String {
    match (change, pct) {
        (Some(change), Some(pct)) => {
            format!("{}{:.2} ({}{:.2}%)", sign_prefix(change), change, sign_prefix(pct), pct)
        }
        _ => "N/A".to_string(),
    }
}

fn sign_prefix(value: f64) -> &'static str {
    if value >= 0.0 {
        "+"
    } else {
        ""
    }
}

/// Insert `,` separators into the integer digits of a formatted number.
fn with_thousands_separators(formatted: String) -> String {
    let (number, fraction) = match formatted.split_once('.') {
        Some((int_part, fraction)) => (int_part, Some(fraction)),
        None => (formatted.as_str(), None),
    };
    let (sign, digits) = match number.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", number),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match fraction {
        Some(fraction) => format!("{}{}.{}", sign, grouped, fraction),
        None => format!("{}{}", sign, grouped),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rsi_band_thresholds() {
        assert_eq!(RsiBand::from_rsi(Some(25.0)), RsiBand::Oversold);
        assert_eq!(RsiBand::from_rsi(Some(30.0)), RsiBand::Oversold);
        assert_eq!(RsiBand::from_rsi(Some(31.0)), RsiBand::Low);
        assert_eq!(RsiBand::from_rsi(Some(35.0)), RsiBand::Low);
        assert_eq!(RsiBand::from_rsi(Some(35.1)), RsiBand::Neutral);
        assert_eq!(RsiBand::from_rsi(Some(50.0)), RsiBand::Neutral);
        assert_eq!(RsiBand::from_rsi(Some(64.9)), RsiBand::Neutral);
        assert_eq!(RsiBand::from_rsi(Some(65.0)), RsiBand::High);
        assert_eq!(RsiBand::from_rsi(Some(66.0)), RsiBand::High);
        assert_eq!(RsiBand::from_rsi(Some(69.9)), RsiBand::High);
        assert_eq!(RsiBand::from_rsi(Some(70.0)), RsiBand::Overbought);
        assert_eq!(RsiBand::from_rsi(Some(72.0)), RsiBand::Overbought);
        assert_eq!(RsiBand::from_rsi(None), RsiBand::Neutral);
    }

    #[test]
    fn test_rsi_band_colors() {
        assert_eq!(RsiBand::Oversold.background_color(), "#FF6347");
        assert_eq!(RsiBand::Low.background_color(), "#FFA500");
        assert_eq!(RsiBand::Neutral.background_color(), "");
        assert_eq!(RsiBand::High.background_color(), "#ffd600");
        assert_eq!(RsiBand::Overbought.background_color(), "#98FB98");
    }

    #[test]
    fn test_rsi_band_classes() {
        assert_eq!(RsiBand::from_rsi(Some(72.0)).css_class(), "rsi-overbought");
        assert_eq!(RsiBand::from_rsi(Some(66.0)).css_class(), "rsi-high");
        assert_eq!(RsiBand::from_rsi(Some(28.0)).css_class(), "rsi-oversold");
        assert_eq!(RsiBand::from_rsi(Some(33.0)).css_class(), "rsi-low");
        assert_eq!(RsiBand::from_rsi(Some(50.0)).css_class(), "rsi-neutral");
    }

    #[test]
    fn test_change_bucket_breakpoints() {
        assert_eq!(change_bucket(0.0), 0);
        assert_eq!(change_bucket(0.99), 0);
        assert_eq!(change_bucket(1.0), 1);
        assert_eq!(change_bucket(2.99), 1);
        assert_eq!(change_bucket(3.0), 2);
        assert_eq!(change_bucket(-5.5), 2);
        assert_eq!(change_bucket(5.99), 2);
        assert_eq!(change_bucket(6.0), 3);
        assert_eq!(change_bucket(-12.0), 3);
    }

    #[test]
    fn test_change_colors() {
        assert_eq!(change_color(None), "#808080");
        assert_eq!(change_color(Some(0.0)), "#808080");
        assert_eq!(change_color(Some(0.5)), "#808080");
        assert_eq!(change_color(Some(-0.5)), "#808080");

        assert_eq!(change_color(Some(1.5)), "#98FB98");
        assert_eq!(change_color(Some(4.0)), "#32CD32");
        assert_eq!(change_color(Some(7.2)), "#008000");

        assert_eq!(change_color(Some(-1.5)), "#FFA07A");
        assert_eq!(change_color(Some(-5.5)), "#FF6347");
        assert_eq!(change_color(Some(-9.0)), "#B30000");
    }

    #[test]
    fn test_trailing_pe_color() {
        assert_eq!(trailing_pe_color(None), "#FF6347");
        assert_eq!(trailing_pe_color(Some(18.4)), "");
    }

    #[test]
    fn test_forward_pe_color() {
        assert_eq!(forward_pe_color(None, Some(20.0)), "#FF6347");
        assert_eq!(forward_pe_color(Some(-3.0), Some(20.0)), "#FF6347");
        assert_eq!(forward_pe_color(Some(15.0), None), "#FF6347");
        assert_eq!(forward_pe_color(Some(15.0), Some(20.0)), "#32CD32");
        assert_eq!(forward_pe_color(Some(25.0), Some(20.0)), "#ffd600");
        assert_eq!(forward_pe_color(Some(20.0), Some(20.0)), "");
    }

    #[test]
    fn test_format_market_cap() {
        assert_eq!(format_market_cap(Some(3_400_000.0)), "3.40T");
        assert_eq!(format_market_cap(Some(1_000_000.0)), "1.00T");
        assert_eq!(format_market_cap(Some(550_000.0)), "550.00B");
        assert_eq!(format_market_cap(Some(1_000.0)), "1.00B");
        assert_eq!(format_market_cap(Some(999.99)), "999.99M");
        assert_eq!(format_market_cap(Some(42.5)), "42.50M");
        assert_eq!(format_market_cap(Some(0.0)), "N/A");
        assert_eq!(format_market_cap(None), "N/A");
    }

    #[test]
    fn test_format_value_thousands() {
        assert_eq!(format_value(Some(1234.5)), "1,234.50");
        assert_eq!(format_value(Some(1_234_567.891)), "1,234,567.89");
        assert_eq!(format_value(Some(987.0)), "987.00");
        assert_eq!(format_value(Some(-9876.5)), "-9,876.50");
        assert_eq!(format_value(None), "N/A");
    }

    #[test]
    fn test_simple_formatters() {
        assert_eq!(format_change(Some(1.234)), "1.23");
        assert_eq!(format_change(None), "N/A");
        assert_eq!(format_percent_change(Some(-2.345)), "-2.35%");
        assert_eq!(format_percent_change(None), "N/A");
        assert_eq!(format_rsi(Some(54.321)), "54.32");
        assert_eq!(format_rsi(None), "N/A");
        assert_eq!(format_one_decimal(Some(54.37)), "54.4");
        assert_eq!(format_one_decimal(None), "N/A");
    }

    #[test]
    fn test_format_signed_change() {
        assert_eq!(
            format_signed_change(Some(1.23), Some(0.45)),
            "+1.23 (+0.45%)"
        );
        assert_eq!(
            format_signed_change(Some(-2.5), Some(-1.1)),
            "-2.50 (-1.10%)"
        );
        assert_eq!(format_signed_change(None, Some(1.0)), "N/A");
        assert_eq!(format_signed_change(Some(1.0), None), "N/A");
    }
}
