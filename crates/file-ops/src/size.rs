const UNITS: [&str; 9] = ["B", "kB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

/// Formats a byte count with SI units and three significant digits.
///
/// Trailing zeros are dropped: `1000` is `"1 kB"`, `1536` is `"1.54 kB"`.
pub fn pretty_size(bytes: u64) -> String {
    if bytes < 1 {
        return "0 B".to_string();
    }

    let n = bytes as f64;
    let exponent = ((n.log10() / 3.0).floor() as usize).min(UNITS.len() - 1);
    let scaled = n / 1000f64.powi(exponent as i32);

    format!("{} {}", three_significant(scaled), UNITS[exponent])
}

/// Rounds to three significant digits and prints without trailing zeros.
fn three_significant(value: f64) -> f64 {
    let digits = value.abs().log10().floor() as i32 + 1;
    let decimals = (3 - digits).max(0) as usize;
    let rounded = format!("{value:.decimals$}");
    rounded.parse().unwrap_or(value)
}
