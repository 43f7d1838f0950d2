/// Format large numbers with k/M/B suffixes.
///
/// The band is picked after rounding, so values just under a boundary move
/// up a band instead of printing as `1000k`.
pub fn format_compact(val: f64) -> String {
    let abs = val.abs();
    let sign = if val <= -0.5 { "-" } else { "" };

    let plain = abs.round();
    if plain < 1_000.0 {
        return format!("{sign}{plain:.0}");
    }
    let thousands = (abs / 1_000.0).round();
    if thousands < 1_000.0 {
        return format!("{sign}{thousands:.0}k");
    }
    let millions = (abs / 100_000.0).round() / 10.0;
    if millions < 1_000.0 {
        return format!("{sign}{millions:.1}M");
    }
    format!("{sign}{:.1}B", abs / 1_000_000_000.0)
}

/// One decimal place, or `n/a` for values that could not be computed.
pub fn format_percent(val: Option<f64>) -> String {
    match val {
        Some(v) if v.is_finite() => format!("{v:.1}%"),
        _ => "n/a".to_string(),
    }
}
