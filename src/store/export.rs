use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use time::OffsetDateTime;
use time::macros::format_description;

use crate::core::{Report, ReportKind};
use crate::error::ReportError;

const SEPARATOR: &str = "----------------------------------------";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutcome {
    pub path: PathBuf,
    pub matched: usize,
}

/// `report_<kind>_<YYYY-MM-DD_HH-MM-SS>.txt`. Two exports of the same kind
/// within one second share a name; the later one overwrites.
pub fn export_file_name(kind: ReportKind, generated_at: OffsetDateTime) -> String {
    let ts = generated_at
        .format(format_description!(
            "[year]-[month]-[day]_[hour]-[minute]-[second]"
        ))
        .unwrap_or_else(|_| generated_at.unix_timestamp().to_string());
    format!("report_{}_{ts}.txt", kind.slug())
}

pub fn render_export<'a>(
    kind: ReportKind,
    generated_at: OffsetDateTime,
    reports: impl IntoIterator<Item = &'a Report>,
) -> (String, usize) {
    let mut out = String::new();
    let _ = writeln!(out, "{} report generated on {}", kind.label(), generated_at.date());
    let _ = writeln!(out, "{SEPARATOR}");

    let mut matched = 0usize;
    for report in reports.into_iter().filter(|r| r.kind() == kind) {
        let _ = writeln!(out, "{}", report.render_summary());
        matched += 1;
    }
    (out, matched)
}

pub fn write_export(
    dir: &Path,
    kind: ReportKind,
    generated_at: OffsetDateTime,
    reports: &[Report],
) -> Result<ExportOutcome, ReportError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| ReportError::io("failed to create export directory", dir, e))?;

    let path = dir.join(export_file_name(kind, generated_at));
    let (body, matched) = render_export(kind, generated_at, reports);
    std::fs::write(&path, body)
        .map_err(|e| ReportError::io("failed to write export file", &path, e))?;

    Ok(ExportOutcome { path, matched })
}
