//! Append-only log of data requests submitted through the client portal.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A client's data request. Only `name`, `purpose` and `delivery` are
/// required; everything else is passed through as given.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortalRequest {
    pub name: String,
    #[serde(default)]
    pub cnpj: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    pub purpose: String,
    /// Free-text purpose when the form's "Other" option was picked
    #[serde(default, alias = "purposeOther")]
    pub purpose_other: Option<String>,
    /// Requested tier filter, e.g. `OURO` or `GOLD`
    #[serde(default)]
    pub classification: Option<String>,
    /// `API` or `Batch`
    pub delivery: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub selected_satellites: Option<Vec<serde_json::Value>>,
}

/// JSON-lines file receiving one line per request.
#[derive(Debug, Clone)]
pub struct RequestLog {
    path: PathBuf,
}

impl RequestLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `request` as one JSON line and return the log path.
    pub fn persist_request(&self, request: &PortalRequest) -> Result<PathBuf> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let mut line = serde_json::to_vec(request)?;
        line.push(b'\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(&line)?;

        log::info!("portal request received: {} - {}", request.name, request.purpose);
        Ok(self.path.clone())
    }
}
