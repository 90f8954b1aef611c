// Cell parsing for the loader and number formatting for the tables.
use num_format::{Locale, ToFormattedString};

/// A non-negative, finite quantity such as demand, stock or cost.
///
/// Thousands separators and surrounding whitespace are tolerated. Any
/// alphabetic character rejects the cell, which keeps `NaN`, `inf` and unit
/// suffixes out of the dataset.
pub fn parse_quantity(s: Option<&str>) -> Option<f64> {
    let cleaned: String = s?.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() || cleaned.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

pub fn parse_week(s: Option<&str>) -> Option<u32> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    // Columnar exports sometimes write integer weeks as `12.0`.
    let s = s.strip_suffix(".0").unwrap_or(s);
    s.parse::<u32>().ok()
}

/// Trimmed, non-empty text cell.
pub fn clean_text(s: Option<&str>) -> Option<String> {
    let s = s?.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Arithmetic mean; 0 for no values so derived thresholds stay defined.
pub fn mean<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Fixed decimals with `en` thousands separators, e.g. `1,234,567.89`.
pub fn format_number(n: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, n.abs());
    let (whole, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let grouped = whole
        .parse::<u64>()
        .map(|w| w.to_formatted_string(&Locale::en))
        .unwrap_or_else(|_| whole.to_string());
    // No sign on values that round to zero.
    let sign = if n < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        "-"
    } else {
        ""
    };
    if frac.is_empty() {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{}", sign, grouped, frac)
    }
}

/// Row and alert counts with thousands separators.
pub fn format_count(n: usize) -> String {
    n.to_formatted_string(&Locale::en)
}
