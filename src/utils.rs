//! Small helpers shared across the pipeline: relative ages, log truncation
//! and output directory checks.

use chrono::Duration;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

use crate::error::Result;

/// Render elapsed time the way listing pages do.
///
/// Whole hours win once there is at least one; otherwise whole minutes are
/// shown. Negative durations (timestamps in the future) count as zero.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(format_age(Duration::minutes(125)), "2 hours ago");
/// assert_eq!(format_age(Duration::minutes(45)), "45 minutes ago");
/// ```
pub fn format_age(elapsed: Duration) -> String {
    let seconds = elapsed.num_seconds().max(0);
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    if hours > 0 {
        format!("{} hours ago", hours)
    } else {
        format!("{} minutes ago", minutes)
    }
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (on a character boundary) with
/// `"…(+N bytes)"` appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and removes a probe file.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<()> {
    fs::create_dir_all(path).await?;
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Output directory is writable");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_age_hours() {
        assert_eq!(format_age(Duration::minutes(125)), "2 hours ago");
        assert_eq!(format_age(Duration::minutes(60)), "1 hours ago");
        assert_eq!(format_age(Duration::hours(30)), "30 hours ago");
    }

    #[test]
    fn test_format_age_minutes() {
        assert_eq!(format_age(Duration::minutes(45)), "45 minutes ago");
        assert_eq!(format_age(Duration::seconds(59)), "0 minutes ago");
        assert_eq!(format_age(Duration::seconds(3599)), "59 minutes ago");
    }

    #[test]
    fn test_format_age_future_is_zero() {
        assert_eq!(format_age(Duration::minutes(-10)), "0 minutes ago");
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundary() {
        let result = truncate_for_log("héllo", 2);
        assert_eq!(result, "h…(+5 bytes)");
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_directory() {
        let dir = std::env::temp_dir().join(format!("headline_digest_probe_{}", std::process::id()));
        let path = dir.to_string_lossy().to_string();
        ensure_writable_dir(&path).await.unwrap();
        assert!(dir.is_dir());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
