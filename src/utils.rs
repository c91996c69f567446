use std::time::Duration;

// Constants
pub const CHART_WINDOW_SIZE: usize = 10;
pub const NETWORK_HISTORY_SIZE: usize = 60;
pub const SCROLLBACK_LIMIT: usize = 5000;
pub const PAGE_SIZE: usize = 10;
pub const MANUAL_REFRESH_COOLDOWN: Duration = Duration::from_millis(500);
pub const PROCESS_NAME_MAX_LEN: usize = 30;
pub const FILE_NAME_MAX_LEN: usize = 48;
pub const DEVICE_NAME_MAX_LEN: usize = 24;

const BYTE_UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

/// Format a byte count with binary-prefix units, keeping at most two decimals
/// and dropping trailing zeros ("1 KB", "1.5 KB", "0 Bytes").
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < BYTE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{} {}", trim_decimals(&format!("{:.2}", value)), BYTE_UNITS[unit])
}

/// Format a byte rate as "<bytes>/s".
pub fn format_rate(bytes_per_second: f64) -> String {
    if !bytes_per_second.is_finite() || bytes_per_second <= 0.0 {
        return "0 Bytes/s".to_string();
    }
    format!("{}/s", format_bytes(bytes_per_second.round() as u64))
}

/// Format uptime seconds as `Nd Nh Nm`; leftover seconds are truncated.
pub fn format_uptime(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3600;
    let minutes = (seconds % 3600) / 60;
    format!("{}d {}h {}m", days, hours, minutes)
}

fn trim_decimals(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// Clamp a percentage into the 0..=1 ratio used by bar indicators.
pub fn bar_ratio(percent: f64) -> f64 {
    if percent.is_nan() {
        return 0.0;
    }
    (percent / 100.0).clamp(0.0, 1.0)
}

/// Truncate string to specified length with ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Replace control characters so server-supplied names cannot drive the terminal.
pub fn display_safe(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_control() { '?' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_bytes_with_binary_units() {
        assert_eq!(format_bytes(0), "0 Bytes");
        assert_eq!(format_bytes(512), "512 Bytes");
        assert_eq!(format_bytes(1024), "1 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1024 * 1024 * 3 + 1024 * 256), "3.25 MB");
        assert_eq!(format_bytes(1024u64.pow(4) * 2048), "2048 TB");
    }

    #[test]
    fn formats_uptime_truncating_seconds() {
        assert_eq!(format_uptime(90061), "1d 1h 1m");
        assert_eq!(format_uptime(59), "0d 0h 0m");
        assert_eq!(format_uptime(3600 * 49 + 120), "2d 1h 2m");
    }

    #[test]
    fn formats_rates() {
        assert_eq!(format_rate(0.0), "0 Bytes/s");
        assert_eq!(format_rate(-5.0), "0 Bytes/s");
        assert_eq!(format_rate(2048.0), "2 KB/s");
    }

    #[test]
    fn clamps_bar_ratio() {
        assert_eq!(bar_ratio(50.0), 0.5);
        assert_eq!(bar_ratio(150.0), 1.0);
        assert_eq!(bar_ratio(-3.0), 0.0);
        assert_eq!(bar_ratio(f64::NAN), 0.0);
    }

    #[test]
    fn truncates_on_char_boundaries() {
        assert_eq!(truncate_string("short", 10), "short");
        assert_eq!(truncate_string("ёжикёжикёжик", 6), "ёжи...");
    }

    #[test]
    fn masks_control_characters() {
        assert_eq!(display_safe("a\x1b[2Jb"), "a?[2Jb");
        assert_eq!(display_safe("plain.txt"), "plain.txt");
    }
}
