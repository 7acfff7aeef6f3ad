use std::time::Duration;

pub(crate) fn format_rate(v: f64) -> String {
    if v.is_finite() {
        format!("{v:.0}")
    } else {
        "0".to_string()
    }
}

/// Renders a single rounded component in one of: us, ms, s, m.
pub(crate) fn format_duration(d: Duration) -> String {
    const NS_PER_US: u128 = 1_000;
    const NS_PER_MS: u128 = 1_000_000;
    const NS_PER_S: u128 = 1_000_000_000;
    const NS_PER_M: u128 = 60 * NS_PER_S;

    fn round_div(value: u128, unit: u128) -> u128 {
        // Round to nearest integer (ties round up).
        (value + (unit / 2)) / unit
    }

    let total_ns = d.as_nanos();

    if total_ns >= 10 * NS_PER_M {
        return format!("{}m", round_div(total_ns, NS_PER_M));
    }
    if total_ns >= NS_PER_S {
        return format!("{}s", round_div(total_ns, NS_PER_S));
    }
    if total_ns >= NS_PER_MS {
        return format!("{}ms", round_div(total_ns, NS_PER_MS));
    }
    format!("{}us", round_div(total_ns, NS_PER_US))
}

pub(crate) fn format_duration_from_micros_opt(us: Option<f64>) -> String {
    match us {
        Some(us) if us.is_finite() && us >= 0.0 => {
            if us >= 1_000_000.0 {
                format!("{:.2}s", us / 1_000_000.0)
            } else if us >= 1_000.0 {
                format!("{:.2}ms", us / 1_000.0)
            } else {
                format!("{us:.0}us")
            }
        }
        _ => "-".to_string(),
    }
}
