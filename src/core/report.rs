use serde::{Deserialize, Serialize};
use std::fmt;
use time::Date;

use crate::core::{SerialNumber, Severity, Version};

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

const FIELD_DELIMITER: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Hardware,
    Software,
}

impl ReportKind {
    pub const fn label(self) -> &'static str {
        match self {
            ReportKind::Hardware => "Hardware",
            ReportKind::Software => "Software",
        }
    }

    pub const fn slug(self) -> &'static str {
        match self {
            ReportKind::Hardware => "hardware",
            ReportKind::Software => "software",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Fields shared by every report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportHeader {
    pub equipment_id: String,
    pub description: String,
    pub severity: Severity,
    #[serde(with = "iso_date")]
    pub date: Date,
}

impl ReportHeader {
    fn summary_fields(&self) -> [String; 4] {
        [
            self.equipment_id.clone(),
            self.description.clone(),
            self.severity.to_string(),
            self.date.to_string(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareReport {
    pub header: ReportHeader,
    pub component_type: String,
    pub serial_number: SerialNumber,
    pub needs_replacement: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftwareReport {
    pub header: ReportHeader,
    pub operating_system: String,
    pub software_name: String,
    pub version: Version,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Report {
    Hardware(HardwareReport),
    Software(SoftwareReport),
}

impl Report {
    pub fn header(&self) -> &ReportHeader {
        match self {
            Report::Hardware(r) => &r.header,
            Report::Software(r) => &r.header,
        }
    }

    pub fn kind(&self) -> ReportKind {
        match self {
            Report::Hardware(_) => ReportKind::Hardware,
            Report::Software(_) => ReportKind::Software,
        }
    }

    pub fn equipment_id(&self) -> &str {
        &self.header().equipment_id
    }

    pub fn description(&self) -> &str {
        &self.header().description
    }

    pub fn severity(&self) -> Severity {
        self.header().severity
    }

    pub fn date(&self) -> Date {
        self.header().date
    }

    /// Dash-joined line used in exports and listings: the common fields
    /// first, then the variant fields in declaration order.
    pub fn render_summary(&self) -> String {
        let mut fields: Vec<String> = self.header().summary_fields().into();
        match self {
            Report::Hardware(r) => {
                fields.push(r.component_type.clone());
                fields.push(r.serial_number.to_string());
                fields.push(if r.needs_replacement { "Yes" } else { "No" }.to_string());
            }
            Report::Software(r) => {
                fields.push(r.operating_system.clone());
                fields.push(r.software_name.clone());
                fields.push(r.version.to_string());
            }
        }
        fields.join(FIELD_DELIMITER)
    }
}
