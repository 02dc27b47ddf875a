//! Hour formatting for CLI output.

/// 8.5 → "08:30"
pub fn hours_to_hhmm(hours: f64) -> String {
    let total = (hours * 60.0).round() as i64;
    let sign = if total < 0 { "-" } else { "" };
    let m = total.abs();
    format!("{}{:02}:{:02}", sign, m / 60, m % 60)
}

pub fn fmt_hours(hours: f64) -> String {
    format!("{hours:.2}")
}
