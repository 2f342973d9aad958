use anyhow::Error;
use std::io::{self, Write};
use time::Date;
use time::macros::format_description;
use unicode_width::UnicodeWidthChar;

use crate::core::{Report, Severity};
use crate::store::ReportStore;

#[derive(Debug, Clone)]
pub struct UiConfig {
    pub color: bool,
    pub max_table_rows: usize,
    pub quiet: bool,
    pub verbose: bool,
}

impl UiConfig {
    pub fn plain() -> Self {
        Self {
            color: false,
            max_table_rows: usize::MAX,
            quiet: false,
            verbose: false,
        }
    }
}

pub fn eprintln_error(err: &Error) {
    let mut stderr = io::stderr().lock();
    let _ = writeln!(stderr, "error:");
    let _ = writeln!(stderr, "  {err}");

    let mut causes = err.chain().skip(1).peekable();
    if causes.peek().is_some() {
        let _ = writeln!(stderr, "caused by:");
        for cause in causes {
            let _ = writeln!(stderr, "  - {cause}");
        }
    }

    let _ = writeln!(stderr, "next:");
    let _ = writeln!(
        stderr,
        "  - see `faultdesk --help` for the available commands and options"
    );
}

pub fn eprintln_warning(message: &str) {
    let _ = writeln!(io::stderr().lock(), "warning: {message}");
}

pub fn eprintln_verbose(cfg: &UiConfig, message: &str) {
    if cfg.verbose && !cfg.quiet {
        let _ = writeln!(io::stderr().lock(), "[faultdesk] {message}");
    }
}

/// `YYYY/MM/DD`, the same shape users type dates in.
pub fn format_input_date(date: Date) -> String {
    date.format(format_description!("[year]/[month]/[day]"))
        .unwrap_or_else(|_| date.to_string())
}

pub fn print_reports(out: &mut dyn Write, reports: &[&Report], cfg: &UiConfig) {
    if reports.is_empty() {
        let _ = writeln!(out, "No matching reports.");
        return;
    }

    let no_w = reports.len().to_string().len().max(2);
    let kind_w = "Software".len();
    let sev_w = "MEDIUM".len();
    let date_w = "YYYY-MM-DD".len();
    let id_w = reports
        .iter()
        .map(|r| visible_width_ansi(r.equipment_id()))
        .max()
        .unwrap_or(0)
        .clamp("EQUIPMENT".len(), 24);

    let _ = writeln!(
        out,
        "{}  {}  {}  {}  {}  SUMMARY",
        pad_start_display("#", no_w),
        pad_end_display("KIND", kind_w),
        pad_end_display("SEVERITY", sev_w.max("SEVERITY".len())),
        pad_end_display("DATE", date_w),
        pad_end_display("EQUIPMENT", id_w),
    );

    let rows = reports.len().min(cfg.max_table_rows);
    for (idx, report) in reports.iter().take(rows).enumerate() {
        let no = pad_start_display(&(idx + 1).to_string(), no_w);
        let kind = pad_end_display(report.kind().label(), kind_w);
        let sev = pad_end_ansi(
            &format_severity(report.severity(), cfg.color),
            sev_w.max("SEVERITY".len()),
        );
        let date = pad_end_display(&report.date().to_string(), date_w);
        let id = pad_end_display(&truncate_end(report.equipment_id(), id_w), id_w);
        let _ = writeln!(
            out,
            "{no}  {kind}  {sev}  {date}  {id}  {}",
            report.render_summary()
        );
    }

    if reports.len() > rows {
        let _ = writeln!(out, "... and {} more", reports.len() - rows);
    }
}

/// Every known equipment id with the severities reported against it.
pub fn print_id_overview(out: &mut dyn Write, store: &ReportStore, cfg: &UiConfig) {
    let ids = store.distinct_equipment_ids();
    if ids.is_empty() {
        let _ = writeln!(out, "No reports recorded yet.");
        return;
    }
    for id in ids {
        let severities: Vec<String> = store
            .severities_for(id)
            .into_iter()
            .map(|s| format_severity(s, cfg.color))
            .collect();
        let _ = writeln!(out, "{id}  ({})", severities.join(", "));
    }
}

pub fn print_date_range(out: &mut dyn Write, range: Option<(Date, Date)>) {
    match range {
        Some((earliest, latest)) => {
            let _ = writeln!(
                out,
                "Reports span {} to {}",
                format_input_date(earliest),
                format_input_date(latest)
            );
        }
        None => {
            let _ = writeln!(out, "No reports recorded yet.");
        }
    }
}

pub fn format_severity(severity: Severity, color: bool) -> String {
    let s = severity.as_str();
    if !color {
        return s.to_string();
    }

    let code = match severity {
        Severity::High => "31",
        Severity::Medium => "33",
        Severity::Low => "32",
    };
    format!("\x1b[{code}m{s}\x1b[0m")
}

fn truncate_end(s: &str, max_width: usize) -> String {
    if visible_width_ansi(s) <= max_width {
        return s.to_string();
    }
    let mut out = String::new();
    let mut width = 0usize;
    for ch in s.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if width + w + 1 > max_width {
            break;
        }
        out.push(ch);
        width += w;
    }
    out.push('…');
    out
}

fn pad_end_ansi(s: &str, width: usize) -> String {
    let w = visible_width_ansi(s);
    if w >= width {
        return s.to_string();
    }
    format!("{s}{}", " ".repeat(width - w))
}

fn pad_end_display(s: &str, width: usize) -> String {
    pad_end_ansi(s, width)
}

fn pad_start_display(s: &str, width: usize) -> String {
    let w = visible_width_ansi(s);
    if w >= width {
        return s.to_string();
    }
    format!("{}{}", " ".repeat(width - w), s)
}

fn visible_width_ansi(s: &str) -> usize {
    let mut width: usize = 0;
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            let _ = chars.next();
            for ch2 in chars.by_ref() {
                if ch2 == 'm' {
                    break;
                }
            }
            continue;
        }
        width = width.saturating_add(UnicodeWidthChar::width(ch).unwrap_or(0));
    }
    width
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{HardwareReport, ReportHeader, SerialNumber};
    use time::macros::date;

    fn report(id: &str) -> Report {
        Report::Hardware(HardwareReport {
            header: ReportHeader {
                equipment_id: id.to_string(),
                description: "fan noise".to_string(),
                severity: Severity::Low,
                date: date!(2024 - 01 - 10),
            },
            component_type: "fan".to_string(),
            serial_number: SerialNumber::new(42).unwrap(),
            needs_replacement: false,
        })
    }

    #[test]
    fn colored_severity_has_plain_width() {
        let s = format_severity(Severity::Medium, true);
        assert!(s.contains("\x1b[33m"));
        assert_eq!(visible_width_ansi(&s), "MEDIUM".len());
    }

    #[test]
    fn print_reports_respects_row_limit() {
        let a = report("EQ1");
        let b = report("EQ2");
        let c = report("EQ3");
        let cfg = UiConfig {
            max_table_rows: 2,
            ..UiConfig::plain()
        };
        let mut out = Vec::new();
        print_reports(&mut out, &[&a, &b, &c], &cfg);
        let s = String::from_utf8(out).unwrap();
        assert!(s.contains("EQ1-fan noise-LOW-2024-01-10-fan-42-No"), "{s}");
        assert!(!s.contains("EQ3-fan"), "{s}");
        assert!(s.contains("... and 1 more"), "{s}");
    }

    #[test]
    fn date_range_uses_slash_format() {
        let mut out = Vec::new();
        print_date_range(&mut out, Some((date!(2024 - 01 - 10), date!(2024 - 02 - 01))));
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Reports span 2024/01/10 to 2024/02/01\n"
        );
    }

    #[test]
    fn truncate_end_marks_cut() {
        assert_eq!(truncate_end("abcdef", 4), "abc…");
        assert_eq!(truncate_end("abc", 4), "abc");
    }
}
