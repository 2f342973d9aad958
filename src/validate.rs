//! Parsers that turn raw user input into validated domain values.

use time::Date;
use time::macros::format_description;

use crate::core::{
    HardwareReport, Report, ReportHeader, ReportKind, SerialNumber, Severity, SoftwareReport,
    Version,
};
use crate::error::{ReportError, SerialNumberIssue};

pub fn parse_severity(raw: &str) -> Result<Severity, ReportError> {
    raw.parse()
}

pub fn parse_serial_number(raw: &str) -> Result<SerialNumber, ReportError> {
    let invalid = |reason| ReportError::InvalidSerialNumber {
        raw: raw.to_string(),
        reason,
    };

    let trimmed = raw.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(SerialNumberIssue::NotAnInteger));
    }
    if negative || digits.bytes().all(|b| b == b'0') {
        return Err(invalid(SerialNumberIssue::NotPositive));
    }
    // Any digit string left here is positive, so a failed parse can only mean overflow.
    let n = digits
        .parse::<u32>()
        .map_err(|_| invalid(SerialNumberIssue::TooLarge))?;
    SerialNumber::new(n).ok_or_else(|| invalid(SerialNumberIssue::NotPositive))
}

pub fn parse_version(raw: &str) -> Result<Version, ReportError> {
    Version::try_from(raw.to_string())
}

/// Strict `YYYY/MM/DD`.
pub fn parse_date(raw: &str) -> Result<Date, ReportError> {
    Date::parse(raw.trim(), format_description!("[year]/[month]/[day]")).map_err(|_| {
        ReportError::InvalidDateFormat {
            raw: raw.to_string(),
        }
    })
}

pub fn parse_equipment_id(raw: &str) -> Result<String, ReportError> {
    let id = raw.trim();
    if id.is_empty() {
        return Err(ReportError::EmptyField {
            field: "equipment id",
        });
    }
    Ok(id.to_string())
}

pub fn parse_yes_no(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "y" | "yes" | "s" | "si" | "true" | "1"
    )
}

pub fn parse_kind(raw: &str) -> Option<ReportKind> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "hw" | "hardware" => Some(ReportKind::Hardware),
        "2" | "sw" | "software" => Some(ReportKind::Software),
        _ => None,
    }
}

pub fn header(
    equipment_id: &str,
    description: &str,
    severity: &str,
    date: &str,
) -> Result<ReportHeader, ReportError> {
    Ok(ReportHeader {
        equipment_id: parse_equipment_id(equipment_id)?,
        description: description.trim().to_string(),
        severity: parse_severity(severity)?,
        date: parse_date(date)?,
    })
}

pub fn hardware_report(
    header: ReportHeader,
    component_type: &str,
    serial_number: &str,
    needs_replacement: bool,
) -> Result<Report, ReportError> {
    Ok(Report::Hardware(HardwareReport {
        header,
        component_type: component_type.trim().to_string(),
        serial_number: parse_serial_number(serial_number)?,
        needs_replacement,
    }))
}

pub fn software_report(
    header: ReportHeader,
    operating_system: &str,
    software_name: &str,
    version: &str,
) -> Result<Report, ReportError> {
    Ok(Report::Software(SoftwareReport {
        header,
        operating_system: operating_system.trim().to_string(),
        software_name: software_name.trim().to_string(),
        version: parse_version(version)?,
    }))
}
