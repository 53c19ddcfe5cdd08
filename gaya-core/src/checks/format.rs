//! Number formatting shared by check messages and renderers.

/// Formats a count with thousands separators, e.g. `1,000`.
pub fn format_count(value: impl Into<u128>) -> String {
    let digits = value.into().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Formats a signed delta with an explicit sign, e.g. `+200` or `-500`.
pub fn format_delta(delta: i128) -> String {
    let sign = if delta < 0 { '-' } else { '+' };
    format!("{}{}", sign, format_count(delta.unsigned_abs()))
}

/// Formats a fraction as a percentage with one decimal, e.g. `12.5%`.
pub fn format_pct(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}
