const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Sentinel shown for values that could not be derived.
pub const NOT_AVAILABLE: &str = "N/A";

/// Round half away from zero to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Parse a byte count as reported. Integral text is taken as-is; decimal text
/// is truncated toward zero. Anything else is `None`.
pub fn parse_bytes(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<i64>() {
        return Some(n);
    }
    raw.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(|f| f.trunc() as i64)
}

/// `used / quota * 100` rounded to two decimals, only when the quota is positive.
pub fn usage_percentage(used: Option<i64>, quota: Option<i64>) -> Option<f64> {
    match (used, quota) {
        (Some(used), Some(quota)) if quota > 0 => Some(round2(used as f64 / quota as f64 * 100.0)),
        _ => None,
    }
}

/// Bytes expressed in GiB, two decimals. Zero stays zero; negatives are rejected.
pub fn bytes_to_gb(bytes: Option<i64>) -> Option<f64> {
    match bytes {
        Some(0) => Some(0.0),
        Some(b) if b > 0 => Some(round2(b as f64 / BYTES_PER_GB)),
        _ => None,
    }
}

/// Render a number without trailing zeros: `10`, `1.5`, `12.34`.
pub fn format_number(value: f64) -> String {
    let text = format!("{:.2}", value);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

pub fn format_percent(value: Option<f64>) -> String {
    value
        .map(|v| format!("{}%", format_number(v)))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

pub fn format_gb(value: Option<f64>) -> String {
    value
        .map(|v| format!("{} GB", format_number(v)))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

pub fn format_unread(value: Option<u64>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub fn text_or_na(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or(NOT_AVAILABLE)
}

/// Returns "[████░░░░░░░░]" where █ = used portion, ░ = free portion.
/// Width is the number of block characters inside the brackets.
pub fn format_usage_bar(used_percent: f64, width: usize) -> String {
    let used_percent = used_percent.clamp(0.0, 100.0);
    let used_blocks = ((used_percent / 100.0) * width as f64).round() as usize;
    let free_blocks = width.saturating_sub(used_blocks);

    format!("[{}{}]", "█".repeat(used_blocks), "░".repeat(free_blocks))
}
