// Cell parsing for station logger files, the descriptive statistics shared
// by the analysis stages, and number formatting for console output.
use chrono::{NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};

/// Timestamp layouts accepted in region sources, tried in order.
const TIMESTAMP_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Read a sensor cell. Station loggers leave blanks, `NaN` or `n/a` in
/// gaps and these come back as `None`; thousands separators are dropped and
/// exponent notation (`1.2e3`) is kept.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let cell = s?.trim();
    let is_text = cell
        .chars()
        .any(|c| c.is_ascii_alphabetic() && !matches!(c, 'e' | 'E'));
    if cell.is_empty() || is_text {
        return None;
    }
    cell.replace(',', "").parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a 0/1 maintenance flag. Any non-zero number counts as set.
pub fn parse_flag_safe(s: Option<&str>) -> Option<bool> {
    parse_f64_safe(s).map(|v| v != 0.0)
}

pub fn parse_timestamp_safe(s: Option<&str>) -> Option<NaiveDateTime> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ts);
        }
    }
    // Date-only values are read as midnight.
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

pub fn mean(v: &[f64]) -> Option<f64> {
    if v.is_empty() {
        return None;
    }
    let sum: f64 = v.iter().copied().sum();
    Some(sum / v.len() as f64)
}

/// Sample standard deviation (n - 1 denominator); undefined below two values.
pub fn std_dev(v: &[f64]) -> Option<f64> {
    if v.len() < 2 {
        return None;
    }
    let m = mean(v)?;
    let ss: f64 = v.iter().map(|x| (x - m).powi(2)).sum();
    Some((ss / (v.len() - 1) as f64).sqrt())
}

pub fn max(v: &[f64]) -> Option<f64> {
    v.iter().copied().reduce(f64::max)
}

pub fn min(v: &[f64]) -> Option<f64> {
    v.iter().copied().reduce(f64::min)
}

pub fn median(v: Vec<f64>) -> Option<f64> {
    quantile(v, 0.5)
}

/// Quantile with linear interpolation between the two closest ranks
/// (`pos = q * (n - 1)`).
///
/// We accept `Vec<f64>` by value so the function can sort in-place without
/// cloning at the call site.
pub fn quantile(mut v: Vec<f64>, q: f64) -> Option<f64> {
    if v.is_empty() {
        return None;
    }
    v.sort_by(f64::total_cmp);
    let pos = q.clamp(0.0, 1.0) * (v.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(v[lo] + (v[hi] - v[lo]) * frac)
}

pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Render an optional statistic for export; undefined values become empty cells.
pub fn format_opt(v: Option<f64>, decimals: usize) -> String {
    match v {
        Some(x) => format!("{:.*}", decimals, x),
        None => String::new(),
    }
}

/// Metric value for the recommendation table, grouped by thousands
/// (`1,234,567.89`).
pub fn format_number(n: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, n.abs());
    let (whole, frac) = match fixed.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (fixed.as_str(), None),
    };
    let mut out = whole
        .parse::<u64>()
        .map(|w| w.to_formatted_string(&Locale::en))
        .unwrap_or_else(|_| whole.to_string());
    if let Some(f) = frac {
        out.push('.');
        out.push_str(f);
    }
    if n < 0.0 {
        format!("-{}", out)
    } else {
        out
    }
}

/// Row counts in load and cleaning messages.
pub fn format_int<T: ToFormattedString>(n: T) -> String {
    n.to_formatted_string(&Locale::en)
}
