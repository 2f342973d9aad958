use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ReportError, SerialNumberIssue};

static VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]+\.[0-9]+\.[0-9]+$").expect("version pattern is a valid regex")
});

/// Component serial number. Always greater than zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct SerialNumber(u32);

impl SerialNumber {
    pub fn new(value: u32) -> Option<Self> {
        (value > 0).then_some(Self(value))
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for SerialNumber {
    type Error = ReportError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        SerialNumber::new(value).ok_or(ReportError::InvalidSerialNumber {
            raw: value.to_string(),
            reason: SerialNumberIssue::NotPositive,
        })
    }
}

impl From<SerialNumber> for u32 {
    fn from(value: SerialNumber) -> Self {
        value.0
    }
}

impl fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Software version in `A.B.C` form, kept exactly as entered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version(String);

impl Version {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Version {
    type Error = ReportError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if VERSION_PATTERN.is_match(&value) {
            Ok(Self(value))
        } else {
            Err(ReportError::InvalidVersionFormat { raw: value })
        }
    }
}

impl From<Version> for String {
    fn from(value: Version) -> Self {
        value.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
