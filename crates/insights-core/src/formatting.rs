/// Format a count with thousands separators.
///
/// # Examples
///
/// ```
/// use insights_core::formatting::format_count;
///
/// assert_eq!(format_count(0), "0");
/// assert_eq!(format_count(1234), "1,234");
/// assert_eq!(format_count(1234567), "1,234,567");
/// ```
pub fn format_count(value: u64) -> String {
    group_thousands(&value.to_string())
}

/// Format `value` with exactly `decimals` fractional digits.
///
/// Non-finite inputs render as zero.
///
/// ```
/// use insights_core::formatting::format_fixed;
///
/// assert_eq!(format_fixed(2.345, 1), "2.3");
/// assert_eq!(format_fixed(12.0, 0), "12");
/// assert_eq!(format_fixed(f64::NAN, 2), "0.00");
/// ```
pub fn format_fixed(value: f64, decimals: usize) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    format!("{:.prec$}", value, prec = decimals)
}

/// Calculate `(part / whole) * 100`.
///
/// Returns `0.0` if `whole` is zero to avoid division by zero.
///
/// ```
/// use insights_core::formatting::percentage;
///
/// assert!((percentage(50.0, 200.0) - 25.0).abs() < 1e-9);
/// assert_eq!(percentage(3.0, 0.0), 0.0);
/// ```
pub fn percentage(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    (part / whole) * 100.0
}

/// Render an hour of the day (0-23) as a 12-hour clock label.
///
/// ```
/// use insights_core::formatting::format_hour_12;
///
/// assert_eq!(format_hour_12(0), "12 am");
/// assert_eq!(format_hour_12(9), "9 am");
/// assert_eq!(format_hour_12(12), "12 pm");
/// assert_eq!(format_hour_12(23), "11 pm");
/// ```
pub fn format_hour_12(hour: u32) -> String {
    match hour {
        0 => "12 am".to_string(),
        12 => "12 pm".to_string(),
        h if h < 12 => format!("{} am", h),
        h => format!("{} pm", h - 12),
    }
}

/// Label for "how long since the last activity".
///
/// ```
/// use insights_core::formatting::format_last_activity;
///
/// assert_eq!(format_last_activity(None), "Never");
/// assert_eq!(format_last_activity(Some(0)), "Today");
/// assert_eq!(format_last_activity(Some(1)), "Yesterday");
/// assert_eq!(format_last_activity(Some(12)), "12 days ago");
/// ```
pub fn format_last_activity(days_ago: Option<i64>) -> String {
    match days_ago {
        None => "Never".to_string(),
        Some(0) => "Today".to_string(),
        Some(1) => "Yesterday".to_string(),
        Some(days) => format!("{} days ago", days),
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let remainder = s.len() % 3;
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i != 0 && i % 3 == remainder {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────
