//! Session snapshots on disk.
//!
//! Files are grouped by the session's UTC start date:
//! `{json_output_dir}/{YYYY-MM-DD}/{site}_{HHMMSS}.json`.

use crate::error::Result;
use crate::models::SessionReport;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Path a report will be written to under `json_output_dir`.
pub fn session_path(report: &SessionReport, json_output_dir: &str) -> PathBuf {
    Path::new(json_output_dir)
        .join(report.started_at.format("%Y-%m-%d").to_string())
        .join(format!(
            "{}_{}.json",
            report.site,
            report.started_at.format("%H%M%S")
        ))
}

/// Write a [`SessionReport`] as pretty JSON, creating directories as needed.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir, site = %report.site))]
pub async fn write_session(report: &SessionReport, json_output_dir: &str) -> Result<PathBuf> {
    let json = serde_json::to_string_pretty(report)?;
    let path = session_path(report, json_output_dir);

    if let Some(dir) = path.parent() {
        if let Err(e) = fs::create_dir_all(dir).await {
            error!(dir = %dir.display(), error = %e, "Failed to create JSON dir");
            return Err(e.into());
        }
    }

    fs::write(&path, json).await?;
    info!(path = %path.display(), articles = report.articles.len(), "Wrote session JSON");
    Ok(path)
}
