//! On-disk database for the report collection.
//!
//! The whole collection is rewritten on every save. Writes go to a sibling
//! `.tmp` file that is renamed over the database, so an interrupted save
//! leaves the previous file in place.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::Report;
use crate::error::ReportError;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize)]
struct DatabaseRef<'a> {
    schema_version: u32,
    reports: &'a [Report],
}

#[derive(Debug, Deserialize)]
struct DatabaseOwned {
    schema_version: u32,
    reports: Vec<Report>,
}

#[derive(Debug, Clone)]
pub struct ReportDatabase {
    path: PathBuf,
}

impl ReportDatabase {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Vec<Report>, ReportError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ReportError::io("failed to read report database", &self.path, e)),
        };

        let db: DatabaseOwned = serde_json::from_str(&raw).map_err(|e| {
            ReportError::io(
                "report database is not valid",
                &self.path,
                io::Error::new(io::ErrorKind::InvalidData, e),
            )
        })?;
        if db.schema_version != SCHEMA_VERSION {
            return Err(ReportError::io(
                "unsupported report database version",
                &self.path,
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "schema_version {} (supported: {SCHEMA_VERSION})",
                        db.schema_version
                    ),
                ),
            ));
        }
        Ok(db.reports)
    }

    pub fn save(&self, reports: &[Report]) -> Result<(), ReportError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| ReportError::io("failed to create data directory", parent, e))?;
        }

        let body = serde_json::to_string_pretty(&DatabaseRef {
            schema_version: SCHEMA_VERSION,
            reports,
        })
        .map_err(|e| {
            ReportError::io(
                "failed to encode report database",
                &self.path,
                io::Error::new(io::ErrorKind::InvalidData, e),
            )
        })?;

        let temp_path = self.sibling("tmp");
        let written = fs::File::create(&temp_path).and_then(|mut file| {
            file.write_all(body.as_bytes())?;
            file.write_all(b"\n")?;
            file.sync_all()
        });
        if let Err(e) = written {
            discard_temp(&temp_path);
            return Err(ReportError::io("failed to write temporary file", &temp_path, e));
        }

        if let Err(e) = fs::rename(&temp_path, &self.path) {
            discard_temp(&temp_path);
            return Err(ReportError::io(
                "failed to replace report database",
                &self.path,
                e,
            ));
        }
        Ok(())
    }

    /// Moves an unreadable database aside so a fresh one can be written
    /// without destroying it. Returns the new location, if there was a file.
    ///
    /// The first copy goes to `<file>.corrupt`; later ones to `<file>.corrupt.1`,
    /// `<file>.corrupt.2` and so on. An earlier copy is never replaced.
    pub fn quarantine(&self) -> Result<Option<PathBuf>, ReportError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let dest = self.free_quarantine_path();
        fs::rename(&self.path, &dest)
            .map_err(|e| ReportError::io("failed to move unreadable database aside", &dest, e))?;
        Ok(Some(dest))
    }

    fn free_quarantine_path(&self) -> PathBuf {
        let first = self.sibling("corrupt");
        if !first.exists() {
            return first;
        }
        (1u32..)
            .map(|n| self.sibling(&format!("corrupt.{n}")))
            .find(|candidate| !candidate.exists())
            .unwrap_or(first)
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".");
        name.push(suffix);
        self.path.with_file_name(name)
    }
}

/// Removes a temporary file left by a failed save. Only regular files are
/// touched, so a directory squatting on the name is left alone.
fn discard_temp(path: &Path) {
    if path.is_file() {
        let _ = fs::remove_file(path);
    }
}
