mod report;
mod severity;
mod values;

pub use report::{HardwareReport, Report, ReportHeader, ReportKind, SoftwareReport};
pub use severity::Severity;
pub use values::{SerialNumber, Version};
