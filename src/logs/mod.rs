use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::core::ReportKind;
use crate::store::ExportOutcome;

#[derive(Debug, Serialize)]
struct ExportLog {
    schema_version: &'static str,
    tool_version: String,
    command: &'static str,
    started_at: String,
    finished_at: String,
    status: String,
    kind: ReportKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    matched: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct FlushFailureLog {
    schema_version: &'static str,
    tool_version: String,
    command: &'static str,
    at: String,
    data_file: String,
    report_count: usize,
    error: String,
}

pub fn write_export_log(
    log_dir: &Path,
    started_at: OffsetDateTime,
    finished_at: OffsetDateTime,
    kind: ReportKind,
    result: std::result::Result<&ExportOutcome, String>,
) -> Result<PathBuf> {
    let (status, path, matched, error) = match result {
        Ok(outcome) => (
            "ok",
            Some(outcome.path.display().to_string()),
            Some(outcome.matched),
            None,
        ),
        Err(e) => ("error", None, None, Some(e)),
    };

    let log = ExportLog {
        schema_version: "1.0",
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
        command: "export",
        started_at: rfc3339(started_at),
        finished_at: rfc3339(finished_at),
        status: status.to_string(),
        kind,
        path,
        matched,
        error,
    };
    write_log(log_dir, "export", finished_at, &log)
}

pub fn write_flush_failure_log(
    log_dir: &Path,
    at: OffsetDateTime,
    data_file: &Path,
    report_count: usize,
    error: &str,
) -> Result<PathBuf> {
    let log = FlushFailureLog {
        schema_version: "1.0",
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
        command: "add",
        at: rfc3339(at),
        data_file: data_file.display().to_string(),
        report_count,
        error: error.to_string(),
    };
    write_log(log_dir, "flush-failure", at, &log)
}

fn write_log<T: Serialize>(
    log_dir: &Path,
    prefix: &str,
    at: OffsetDateTime,
    log: &T,
) -> Result<PathBuf> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory: {}", log_dir.display()))?;

    let pid = std::process::id();
    let ts = at.unix_timestamp_nanos();
    let path = log_dir.join(format!("{prefix}-{pid}-{ts}.json"));

    let body = serde_json::to_string_pretty(log).context("failed to encode log")?;
    std::fs::write(&path, format!("{body}\n"))
        .with_context(|| format!("failed to write log: {}", path.display()))?;
    Ok(path)
}

fn rfc3339(at: OffsetDateTime) -> String {
    at.format(&Rfc3339)
        .unwrap_or_else(|_| "unknown".to_string())
}
