use std::path::PathBuf;

/// Every failure the report core can produce.
///
/// The validation kinds abort a single input operation. `Io` covers the
/// database, export files and operation logs.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("invalid severity: {raw:?} (expected HIGH, MEDIUM or LOW)")]
    InvalidSeverity { raw: String },

    #[error("invalid serial number: {raw:?} ({reason})")]
    InvalidSerialNumber {
        raw: String,
        reason: SerialNumberIssue,
    },

    #[error("invalid version: {raw:?} (expected A.B.C where A, B and C are numbers)")]
    InvalidVersionFormat { raw: String },

    #[error("invalid date: {raw:?} (expected YYYY/MM/DD)")]
    InvalidDateFormat { raw: String },

    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    #[error("{context}: {}", .path.display())]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialNumberIssue {
    NotAnInteger,
    NotPositive,
    TooLarge,
}

impl std::fmt::Display for SerialNumberIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SerialNumberIssue::NotAnInteger => "must be a whole number",
            SerialNumberIssue::NotPositive => "must be a positive integer",
            SerialNumberIssue::TooLarge => "is too large",
        })
    }
}

impl ReportError {
    pub fn io(context: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ReportError::Io {
            context,
            path: path.into(),
            source,
        }
    }

    /// True for the kinds caused by bad user input rather than the environment.
    pub fn is_validation(&self) -> bool {
        !matches!(self, ReportError::Io { .. })
    }
}
