/// Byte count with a binary unit, e.g. `1.50 MiB`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", size, UNITS[unit])
}

/// Microsecond span in the largest unit that keeps it readable.
pub fn format_micros(micros: u64) -> String {
    match micros {
        0..=999 => format!("{}us", micros),
        1_000..=999_999 => format!("{:.1}ms", micros as f64 / 1_000.0),
        _ => format!("{:.2}s", micros as f64 / 1_000_000.0),
    }
}
