use std::path::{Path, PathBuf};

use time::{Date, OffsetDateTime};

use crate::codec::ReportDatabase;
use crate::core::{Report, ReportKind, Severity};
use crate::error::ReportError;

mod export;

pub use export::{ExportOutcome, export_file_name, render_export};

#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub data_file: PathBuf,
    pub export_dir: PathBuf,
}

/// Owns the report collection. Every mutation is flushed to the database
/// before returning.
#[derive(Debug)]
pub struct ReportStore {
    reports: Vec<Report>,
    database: ReportDatabase,
    export_dir: PathBuf,
}

impl ReportStore {
    pub fn open(opts: StoreOptions) -> Result<Self, ReportError> {
        let mut store = Self::empty(opts);
        store.reports = store.database.load()?;
        Ok(store)
    }

    pub fn empty(opts: StoreOptions) -> Self {
        Self {
            reports: Vec::new(),
            database: ReportDatabase::new(opts.data_file),
            export_dir: opts.export_dir,
        }
    }

    pub fn database(&self) -> &ReportDatabase {
        &self.database
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// Appends and flushes. A failed flush is returned but the report stays
    /// in memory, so the collection is ahead of disk until the next save.
    pub fn add_report(&mut self, report: Report) -> Result<(), ReportError> {
        self.reports.push(report);
        self.database.save(&self.reports)
    }

    pub fn find_by_equipment_id(&self, id: &str) -> Vec<&Report> {
        self.reports
            .iter()
            .filter(|r| r.equipment_id() == id)
            .collect()
    }

    pub fn find_by_severity(&self, level: Severity) -> Vec<&Report> {
        self.reports
            .iter()
            .filter(|r| r.severity() == level)
            .collect()
    }

    pub fn find_since(&self, date: Date) -> Vec<&Report> {
        self.reports.iter().filter(|r| r.date() >= date).collect()
    }

    /// Unique ids in first-seen order.
    pub fn distinct_equipment_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for report in &self.reports {
            let id = report.equipment_id();
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }

    pub fn severities_for(&self, id: &str) -> Vec<Severity> {
        self.find_by_equipment_id(id)
            .into_iter()
            .map(Report::severity)
            .collect()
    }

    pub fn earliest_date(&self) -> Option<Date> {
        self.reports.iter().map(Report::date).min()
    }

    pub fn latest_date(&self) -> Option<Date> {
        self.reports.iter().map(Report::date).max()
    }

    pub fn date_range(&self) -> Option<(Date, Date)> {
        Some((self.earliest_date()?, self.latest_date()?))
    }

    pub fn export_reports(&self, kind: ReportKind) -> Result<ExportOutcome, ReportError> {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        self.export_reports_at(kind, now)
    }

    pub fn export_reports_at(
        &self,
        kind: ReportKind,
        generated_at: OffsetDateTime,
    ) -> Result<ExportOutcome, ReportError> {
        export::write_export(&self.export_dir, kind, generated_at, &self.reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{HardwareReport, ReportHeader, SerialNumber, SoftwareReport, Version};
    use time::macros::{date, datetime};

    fn options(root: &Path) -> StoreOptions {
        StoreOptions {
            data_file: root.join("data/reports.json"),
            export_dir: root.join("reports"),
        }
    }

    fn hardware(id: &str, severity: Severity, date: Date) -> Report {
        Report::Hardware(HardwareReport {
            header: ReportHeader {
                equipment_id: id.to_string(),
                description: "fan noise".to_string(),
                severity,
                date,
            },
            component_type: "fan".to_string(),
            serial_number: SerialNumber::new(42).unwrap(),
            needs_replacement: false,
        })
    }

    fn software(id: &str, severity: Severity, date: Date) -> Report {
        Report::Software(SoftwareReport {
            header: ReportHeader {
                equipment_id: id.to_string(),
                description: "crash".to_string(),
                severity,
                date,
            },
            operating_system: "Linux".to_string(),
            software_name: "app".to_string(),
            version: Version::try_from("1.0.0".to_string()).unwrap(),
        })
    }

    #[test]
    fn fresh_store_is_empty_everywhere() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::open(options(dir.path())).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.earliest_date(), None);
        assert_eq!(store.latest_date(), None);
        assert_eq!(store.date_range(), None);
        assert!(store.distinct_equipment_ids().is_empty());
        assert!(store.find_by_equipment_id("EQ1").is_empty());
        assert!(store.find_by_severity(Severity::High).is_empty());
        assert!(store.find_since(date!(1970 - 01 - 01)).is_empty());
    }

    #[test]
    fn mixed_reports_for_one_equipment() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ReportStore::open(options(dir.path())).unwrap();
        let hw = hardware("EQ1", Severity::Low, date!(2024 - 01 - 10));
        let sw = software("EQ1", Severity::High, date!(2024 - 02 - 01));
        store.add_report(hw.clone()).unwrap();
        store.add_report(sw.clone()).unwrap();

        assert_eq!(store.find_by_equipment_id("EQ1"), vec![&hw, &sw]);
        assert_eq!(store.earliest_date(), Some(date!(2024 - 01 - 10)));
        assert_eq!(store.latest_date(), Some(date!(2024 - 02 - 01)));

        let at = datetime!(2024-03-01 12:00:00 UTC);
        let outcome = store.export_reports_at(ReportKind::Hardware, at).unwrap();
        assert_eq!(outcome.matched, 1);
        let body = std::fs::read_to_string(&outcome.path).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Hardware report generated on 2024-03-01");
        assert_eq!(lines[2], hw.render_summary());
    }

    #[test]
    fn equipment_id_match_is_exact() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ReportStore::open(options(dir.path())).unwrap();
        store
            .add_report(hardware("EQ1", Severity::Low, date!(2024 - 01 - 10)))
            .unwrap();
        assert!(store.find_by_equipment_id("eq1").is_empty());
        assert!(store.find_by_equipment_id("EQ").is_empty());
        assert_eq!(store.find_by_equipment_id("EQ1").len(), 1);
    }

    #[test]
    fn queries_are_repeatable_and_ordered() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ReportStore::open(options(dir.path())).unwrap();
        store
            .add_report(hardware("B", Severity::High, date!(2024 - 05 - 01)))
            .unwrap();
        store
            .add_report(software("A", Severity::Low, date!(2024 - 01 - 01)))
            .unwrap();
        store
            .add_report(hardware("B", Severity::High, date!(2024 - 03 - 01)))
            .unwrap();
        store
            .add_report(software("C", Severity::High, date!(2024 - 03 - 01)))
            .unwrap();

        let high = store.find_by_severity(Severity::High);
        assert_eq!(high.len(), 3);
        assert_eq!(high, store.find_by_severity(Severity::High));
        assert!(store.find_by_severity(Severity::Medium).is_empty());

        let since: Vec<&str> = store
            .find_since(date!(2024 - 03 - 01))
            .into_iter()
            .map(Report::equipment_id)
            .collect();
        assert_eq!(since, vec!["B", "B", "C"]);
        assert!(store.find_since(date!(2024 - 05 - 02)).is_empty());

        assert_eq!(store.distinct_equipment_ids(), vec!["B", "A", "C"]);
        assert_eq!(
            store.severities_for("B"),
            vec![Severity::High, Severity::High]
        );
        assert_eq!(
            store.date_range(),
            Some((date!(2024 - 01 - 01), date!(2024 - 05 - 01)))
        );
    }

    #[test]
    fn reopening_restores_the_collection() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ReportStore::open(options(dir.path())).unwrap();
        store
            .add_report(hardware("EQ1", Severity::Low, date!(2024 - 01 - 10)))
            .unwrap();
        store
            .add_report(software("EQ2", Severity::Medium, date!(2024 - 01 - 11)))
            .unwrap();

        let reopened = ReportStore::open(options(dir.path())).unwrap();
        assert_eq!(reopened.reports(), store.reports());
    }

    #[test]
    fn failed_flush_keeps_report_in_memory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("data"), "").unwrap();
        let mut store = ReportStore::empty(options(dir.path()));
        let err = store
            .add_report(hardware("EQ1", Severity::Low, date!(2024 - 01 - 10)))
            .unwrap_err();
        assert!(matches!(err, ReportError::Io { .. }));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn export_filters_by_kind_and_same_second_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ReportStore::open(options(dir.path())).unwrap();
        store
            .add_report(software("EQ1", Severity::High, date!(2024 - 02 - 01)))
            .unwrap();
        let at = datetime!(2024-03-01 12:00:00 UTC);

        let first = store.export_reports_at(ReportKind::Software, at).unwrap();
        store
            .add_report(software("EQ2", Severity::Low, date!(2024 - 02 - 02)))
            .unwrap();
        let second = store.export_reports_at(ReportKind::Software, at).unwrap();

        assert_eq!(first.path, second.path);
        assert_eq!(second.matched, 2);
        let body = std::fs::read_to_string(&second.path).unwrap();
        assert_eq!(body.lines().count(), 4);

        let hw = store.export_reports_at(ReportKind::Hardware, at).unwrap();
        assert_eq!(hw.matched, 0);
        assert_ne!(hw.path, second.path);
    }

    #[test]
    fn export_fails_when_directory_cannot_be_created() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("reports"), "").unwrap();
        let store = ReportStore::empty(options(dir.path()));
        assert!(matches!(
            store.export_reports(ReportKind::Hardware),
            Err(ReportError::Io { .. })
        ));
    }
}
