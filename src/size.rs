const UNITS: [&str; 5] = ["b", "Kb", "Mb", "Gb", "Tb"];

/// Format a byte count with one decimal place in the largest unit that keeps
/// the magnitude below 1024. Tb is the last unit and is never scaled further.
pub fn format_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    let mut unit = 0;

    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    format!("{:.1}{}", size, UNITS[unit])
}
