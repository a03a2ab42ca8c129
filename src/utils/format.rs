use std::time::Duration;

/// Formats a countdown as `MM:SS`, rounding partial seconds up so the display
/// only reads `00:00` once the session is over.
pub fn format_mmss(remaining: Duration) -> String {
    let mut total = remaining.as_secs();
    if remaining.subsec_nanos() > 0 {
        total += 1;
    }
    format!("{:02}:{:02}", total / 60, total % 60)
}

pub fn format_minutes(total_seconds: u64) -> String {
    let minutes = total_seconds / 60;
    let hours = minutes / 60;
    if hours > 0 {
        format!("{hours}h {}m", minutes % 60)
    } else {
        format!("{minutes}m")
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn render_progress_bar(progress: f64, width: usize) -> String {
    let filled = ((progress.clamp(0.0, 1.0)) * width as f64).round() as usize;
    let empty = width.saturating_sub(filled);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(empty))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_mmss() {
        assert_eq!(format_mmss(Duration::from_secs(600)), "10:00");
        assert_eq!(format_mmss(Duration::from_secs(61)), "01:01");
        assert_eq!(format_mmss(Duration::from_millis(100)), "00:01");
        assert_eq!(format_mmss(Duration::ZERO), "00:00");
    }

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(300), "5m");
        assert_eq!(format_minutes(5400), "1h 30m");
        assert_eq!(format_minutes(59), "0m");
    }

    #[test]
    fn test_render_progress_bar() {
        assert_eq!(render_progress_bar(0.5, 10), "[#####-----]");
        assert_eq!(render_progress_bar(0.0, 4), "[----]");
        assert_eq!(render_progress_bar(2.0, 4), "[####]");
    }
}
