use std::fmt;

use crate::error::ReportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    InvalidArgs,
    StorageFailed,
}

impl ExitCode {
    pub const fn as_i32(self) -> i32 {
        match self {
            ExitCode::Success => 0,
            ExitCode::InvalidArgs => 2,
            ExitCode::StorageFailed => 10,
        }
    }
}

#[derive(Debug)]
pub struct ExitError {
    pub code: ExitCode,
    pub err: anyhow::Error,
}

impl ExitError {
    pub fn new(code: ExitCode, err: anyhow::Error) -> Self {
        Self { code, err }
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.err.fmt(f)
    }
}

impl std::error::Error for ExitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.err.as_ref())
    }
}

pub fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(exit) = err.downcast_ref::<ExitError>() {
        return exit.code.as_i32();
    }
    if let Some(report_err) = err.downcast_ref::<ReportError>() {
        if report_err.is_validation() {
            return ExitCode::InvalidArgs.as_i32();
        }
    }
    ExitCode::StorageFailed.as_i32()
}

pub fn invalid_args(message: impl Into<String>) -> anyhow::Error {
    ExitError::new(ExitCode::InvalidArgs, anyhow::anyhow!(message.into())).into()
}

pub fn invalid_args_err(err: anyhow::Error) -> anyhow::Error {
    ExitError::new(ExitCode::InvalidArgs, err).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_map_to_invalid_args() {
        let err = anyhow::Error::new(ReportError::InvalidSeverity {
            raw: "urgent".to_string(),
        });
        assert_eq!(exit_code(&err), 2);
    }

    #[test]
    fn io_errors_map_to_storage_failed() {
        let err = anyhow::Error::new(ReportError::io(
            "failed to write export file",
            "reports/x.txt",
            std::io::Error::other("disk full"),
        ));
        assert_eq!(exit_code(&err), 10);
    }

    #[test]
    fn explicit_exit_error_wins() {
        assert_eq!(exit_code(&invalid_args("bad flag")), 2);
        assert_eq!(exit_code(&anyhow::anyhow!("other")), 10);
    }
}
