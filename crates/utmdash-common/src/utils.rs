//! Shared formatting helpers for report output.

/// Formats a count with thousands separators, e.g. `12,345`.
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Formats a fraction in `[0, 1]` as a percentage with one decimal.
pub fn format_rate(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

/// Formats a signed percentage change, e.g. `+12.5%` or `-3%`.
pub fn format_diff(diff: f64) -> String {
    let sign = if diff > 0.0 { "+" } else { "" };
    if diff.fract() == 0.0 {
        format!("{sign}{diff:.0}%")
    } else {
        format!("{sign}{diff:.1}%")
    }
}

/// Truncates a string to a maximum number of characters with ellipsis.
pub fn truncate_string(input: &str, max_length: usize) -> String {
    if input.chars().count() <= max_length {
        input.to_string()
    } else {
        let kept: String = input.chars().take(max_length.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
