//! Append-only log of named routes.
//!
//! One JSON object per line. Records are never rewritten; listing returns them
//! in the order they were appended. A log that does not exist yet is an empty
//! list.

use crate::error::StoreError;
use crate::instance::Point;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Name used when a route is saved without one
pub const DEFAULT_ROUTE_NAME: &str = "Untitled Route";

/// A persisted route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedRoute {
    pub name: String,
    pub route: Vec<Point>,
    /// RFC 3339 timestamp of when the record was appended
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<String>,
}

impl SavedRoute {
    pub fn new(name: &str, route: Vec<Point>) -> Self {
        SavedRoute {
            name: name.to_string(),
            route,
            saved_at: None,
        }
    }
}

/// JSON Lines route log on disk
#[derive(Debug, Clone)]
pub struct RouteStore {
    path: PathBuf,
}

impl RouteStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        RouteStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record to the end of the log
    pub fn append(&self, record: &SavedRoute) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut line = serde_json::to_string(record).map_err(StoreError::Encode)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.flush()?;

        log::debug!("appended route '{}' ({} points) to {:?}", record.name, record.route.len(), self.path);
        Ok(())
    }

    /// All records in append order
    pub fn list(&self) -> Result<Vec<SavedRoute>, StoreError> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut routes = Vec::new();
        for (i, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let record = serde_json::from_str(line)
                .map_err(|source| StoreError::Corrupt { line: i + 1, source })?;
            routes.push(record);
        }

        Ok(routes)
    }
}
