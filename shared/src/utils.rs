// Small helpers shared across crates.

/// Turns an instrument id such as `BTC/USDT` into a file-name friendly
/// `BTC_USDT`. Anything that is not ASCII alphanumeric, `-` or `.` becomes `_`.
pub fn sanitize_instrument(instrument: &str) -> String {
    instrument
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
        .collect()
}

/// Fixed-precision price formatting used in signal messages.
pub fn format_price(value: f64, decimals: usize) -> String {
    format!("{:.decimals$}", value, decimals = decimals)
}
