use std::path::{Path, PathBuf};

use anyhow::Result;
use time::OffsetDateTime;

use crate::core::{Report, ReportKind};
use crate::error::ReportError;
use crate::store::{ExportOutcome, ReportStore, StoreOptions};

#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub store: StoreOptions,
    pub log_dir: PathBuf,
}

/// A finished export and the operation log that records it.
#[derive(Debug)]
pub struct ExportRun {
    pub outcome: ExportOutcome,
    pub log_path: PathBuf,
}

/// The report store plus the side effects that go with each operation:
/// operation logs for exports and failed flushes.
#[derive(Debug)]
pub struct Engine {
    store: ReportStore,
    log_dir: PathBuf,
}

impl Engine {
    /// Loads the database. A database that cannot be read never stops
    /// startup: it is moved aside and the engine starts empty, with the
    /// returned warning describing what happened.
    pub fn open(opts: EngineOptions) -> (Self, Option<String>) {
        let EngineOptions { store, log_dir } = opts;
        match ReportStore::open(store.clone()) {
            Ok(store) => (Self { store, log_dir }, None),
            Err(err) => {
                let store = ReportStore::empty(store);
                let kept = match store.database().quarantine() {
                    Ok(Some(moved)) => format!("; the unreadable file was kept at {}", moved.display()),
                    Ok(None) => String::new(),
                    Err(e) => format!("; it could not be moved aside either ({e})"),
                };
                let warning = format!(
                    "could not load reports ({}); starting with an empty collection{kept}",
                    error_chain(&err)
                );
                (Self { store, log_dir }, Some(warning))
            }
        }
    }

    pub fn store(&self) -> &ReportStore {
        &self.store
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Adds and flushes a report. When the flush fails the report stays in
    /// memory, a flush-failure log is written, and the error names that log
    /// (or carries the log's own failure when it could not be written).
    pub fn add_report(&mut self, report: Report) -> Result<()> {
        let Err(err) = self.store.add_report(report) else {
            return Ok(());
        };
        let logged = crate::logs::write_flush_failure_log(
            &self.log_dir,
            OffsetDateTime::now_utc(),
            self.store.database().path(),
            self.store.len(),
            &error_chain(&err),
        );
        Err(with_log_note(err, logged))
    }

    /// Exports one kind of report and records the run in an operation log.
    /// A log that cannot be written fails the command, even when the
    /// export file itself was written.
    pub fn export(&self, kind: ReportKind) -> Result<ExportRun> {
        let started_at = OffsetDateTime::now_utc();
        let result = self.store.export_reports(kind);
        let finished_at = OffsetDateTime::now_utc();
        let logged = crate::logs::write_export_log(
            &self.log_dir,
            started_at,
            finished_at,
            kind,
            result.as_ref().map_err(error_chain),
        );
        match (result, logged) {
            (Ok(outcome), Ok(log_path)) => Ok(ExportRun { outcome, log_path }),
            (Ok(outcome), Err(log_err)) => Err(log_err.context(format!(
                "{} was written but its operation log could not be",
                outcome.path.display()
            ))),
            (Err(err), logged) => Err(with_log_note(err, logged)),
        }
    }
}

fn with_log_note(err: ReportError, logged: Result<PathBuf>) -> anyhow::Error {
    let note = match logged {
        Ok(log_path) => format!("failure logged to {}", log_path.display()),
        Err(log_err) => format!("the failure log could not be written either ({log_err:#})"),
    };
    anyhow::Error::new(err).context(note)
}

fn error_chain(err: &ReportError) -> String {
    let mut s = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        s.push_str(": ");
        s.push_str(&cause.to_string());
        source = cause.source();
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate;

    fn options(root: &Path) -> EngineOptions {
        EngineOptions {
            store: StoreOptions {
                data_file: root.join("data/reports.json"),
                export_dir: root.join("reports"),
            },
            log_dir: root.join("logs"),
        }
    }

    fn sample() -> Report {
        let header = validate::header("EQ1", "fan noise", "low", "2024/01/10").unwrap();
        validate::hardware_report(header, "fan", "42", false).unwrap()
    }

    fn log_files(dir: &Path, prefix: &str) -> usize {
        std::fs::read_dir(dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .filter(|e| e.file_name().to_string_lossy().starts_with(prefix))
                    .count()
            })
            .unwrap_or(0)
    }

    #[test]
    fn unreadable_database_is_quarantined() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("data")).unwrap();
        std::fs::write(dir.path().join("data/reports.json"), "not json").unwrap();

        let (engine, warning) = Engine::open(options(dir.path()));
        assert!(engine.store().is_empty());
        let warning = warning.expect("warning");
        assert!(warning.contains("reports.json.corrupt"), "{warning}");
        assert!(dir.path().join("data/reports.json.corrupt").exists());
    }

    #[test]
    fn clean_start_has_no_warning() {
        let dir = tempfile::tempdir().unwrap();
        let (engine, warning) = Engine::open(options(dir.path()));
        assert!(warning.is_none());
        assert!(engine.store().is_empty());
    }

    #[test]
    fn export_writes_an_operation_log() {
        let dir = tempfile::tempdir().unwrap();
        let (mut engine, _) = Engine::open(options(dir.path()));
        engine.add_report(sample()).unwrap();
        let run = engine.export(ReportKind::Hardware).unwrap();
        assert_eq!(run.outcome.matched, 1);
        assert!(run.log_path.starts_with(engine.log_dir()));
        assert_eq!(log_files(engine.log_dir(), "export-"), 1);
    }

    #[test]
    fn failed_flush_writes_an_operation_log() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("data"), "").unwrap();
        let (mut engine, _) = Engine::open(options(dir.path()));
        let err = engine.add_report(sample()).unwrap_err();
        assert!(format!("{err:#}").contains("failure logged to"), "{err:#}");
        assert_eq!(engine.store().len(), 1);
        assert_eq!(log_files(engine.log_dir(), "flush-failure-"), 1);
        assert_eq!(crate::exit::exit_code(&err), 10);
    }

    #[test]
    fn failed_flush_reports_unwritable_log_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("data"), "").unwrap();
        std::fs::write(dir.path().join("logs"), "").unwrap();
        let (mut engine, _) = Engine::open(options(dir.path()));
        let err = engine.add_report(sample()).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("could not be written either"), "{msg}");
        assert!(msg.contains("failed to create log directory"), "{msg}");
        assert!(err.downcast_ref::<ReportError>().is_some());
        assert_eq!(crate::exit::exit_code(&err), 10);
    }

    #[test]
    fn export_fails_when_its_log_cannot_be_written() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("logs"), "").unwrap();
        let (engine, _) = Engine::open(options(dir.path()));
        let err = engine.export(ReportKind::Software).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("operation log could not be"), "{msg}");
        let exported = std::fs::read_dir(engine.store().export_dir()).unwrap().count();
        assert_eq!(exported, 1);
    }
}
