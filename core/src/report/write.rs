use std::path::{Path, PathBuf};

use crate::error::ReportError;

use super::model::RunReport;

pub const LATEST_REPORT_FILE: &str = "latest.json";

/// `localci-report-<UTC timestamp>-<short run id>.json`
pub fn report_file_name(report: &RunReport) -> String {
    format!(
        "localci-report-{}-{}.json",
        report.started_at.format("%Y%m%dT%H%M%SZ"),
        report.short_id()
    )
}

/// Persist `report` as pretty JSON under `dir` and return the file path.
/// With `write_latest`, the same content also replaces `latest.json`.
pub async fn write_report(
    report: &RunReport,
    dir: &Path,
    write_latest: bool,
) -> Result<PathBuf, ReportError> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| ReportError::Io { path, source }
    };

    tokio::fs::create_dir_all(dir).await.map_err(io_err(dir))?;

    let mut body = serde_json::to_vec_pretty(report)?;
    body.push(b'\n');

    let path = dir.join(report_file_name(report));
    tokio::fs::write(&path, &body).await.map_err(io_err(&path))?;

    if write_latest {
        // replace via rename, never a partially written file
        let latest = dir.join(LATEST_REPORT_FILE);
        let staging = dir.join(format!(".{LATEST_REPORT_FILE}.tmp"));
        tokio::fs::write(&staging, &body).await.map_err(io_err(&staging))?;
        tokio::fs::rename(&staging, &latest).await.map_err(io_err(&latest))?;
    }

    tracing::info!(path = %path.display(), "report written");
    Ok(path)
}
