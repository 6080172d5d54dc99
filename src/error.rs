use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias used across the pipeline.
pub type Result<T> = std::result::Result<T, OrbitError>;

/// Failures that abort a pipeline run or a query.
///
/// Value-level problems (non-numeric cells, unparseable dates, NaN/Inf) are
/// never represented here: they are normalised to defaults where they are read.
#[derive(Debug, Error)]
pub enum OrbitError {
    #[error("no dataset found; searched: {}", display_paths(.searched))]
    DatasetNotFound { searched: Vec<PathBuf> },

    #[error("tier model artifact missing at {}", .path.display())]
    ModelArtifactMissing { path: PathBuf },

    #[error("failed to parse '{}': {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("training failed: {0}")]
    Training(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl OrbitError {
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Soft failure of the column resolver. Callers log it and fall back to a
/// default; it never aborts a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no column matches {sought:?}; available: {available:?}")]
pub struct ColumnUnresolvable {
    pub sought: Vec<String>,
    pub available: Vec<String>,
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
