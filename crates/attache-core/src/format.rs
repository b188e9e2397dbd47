//! Human-readable byte sizes for attachment rows.

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Format a byte count with binary prefixes: `0 B`, whole bytes below 1024,
/// otherwise one decimal place. The unit index is the largest k with
/// `bytes / 1024^k >= 1`, capped at the unit list.
pub fn human_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }
    let k = (((bytes as f64).ln() / 1024f64.ln()).floor() as usize).min(UNITS.len() - 1);
    if k == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", bytes as f64 / 1024f64.powi(k as i32), UNITS[k])
    }
}
