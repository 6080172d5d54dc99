//! Configuration for the classification pipeline

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{OrbitError, Result};
use crate::model::ARTIFACT_FILE;

/// Environment variable overriding [`OrbitConfig::data_dir`].
pub const DATA_DIR_ENV: &str = "ORBITHUB_DATA_DIR";

/// Main configuration. Relative paths are resolved against `data_dir`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitConfig {
    pub data_dir: PathBuf,
    /// Raw dataset files, most preferred first
    pub raw_candidates: Vec<PathBuf>,
    /// Semicolon-delimited feed of satellites awaiting classification
    pub pending_feed: PathBuf,
    /// Persisted classified table
    pub snapshot: PathBuf,
    /// Append-only JSON-lines log of portal requests
    pub request_log: PathBuf,
    pub models_dir: PathBuf,
    pub training: TrainingConfig,
    pub query: QueryConfig,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            raw_candidates: vec![
                PathBuf::from("raw/UCS-Satellite-Database 5-1-2023.xlsx"),
                PathBuf::from("raw/satellites.parquet"),
                PathBuf::from("raw/satcat.csv"),
                PathBuf::from("../satcat.csv"),
            ],
            pending_feed: PathBuf::from("raw/pending_satellites.csv"),
            snapshot: PathBuf::from("processed/satellites_classified.csv"),
            request_log: PathBuf::from("processed/portal_requests.jsonl"),
            models_dir: PathBuf::from("models"),
            training: TrainingConfig::default(),
            query: QueryConfig::default(),
        }
    }
}

/// Clustering parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub clusters: usize,
    /// Independent k-means restarts; the lowest inertia is kept
    pub n_init: usize,
    pub max_iter: usize,
    /// Convergence threshold, relative to the mean feature variance
    pub tolerance: f64,
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            clusters: 3,
            n_init: 10,
            max_iter: 300,
            tolerance: 1e-4,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Rows returned when a caller does not ask for a limit (0 = unlimited)
    pub default_limit: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self { default_limit: 50 }
    }
}

impl OrbitConfig {
    /// Load from a TOML file, or defaults when `path` is `None`, then apply
    /// the environment override.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let text = fs::read_to_string(path).map_err(|e| {
                    OrbitError::Config(format!("reading {}: {e}", path.display()))
                })?;
                toml::from_str(&text).map_err(|e| {
                    OrbitError::Config(format!("parsing {}: {e}", path.display()))
                })?
            }
            None => OrbitConfig::default(),
        };
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            config.data_dir = PathBuf::from(dir);
        }
        config.validate()?;
        Ok(config)
    }

    /// Same settings rooted at another data directory.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.raw_candidates.is_empty() {
            return Err(OrbitError::Config("raw_candidates must not be empty".into()));
        }
        if self.training.clusters == 0 {
            return Err(OrbitError::Config("training.clusters must be positive".into()));
        }
        Ok(())
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir.join(path)
        }
    }

    pub fn raw_candidate_paths(&self) -> Vec<PathBuf> {
        self.raw_candidates.iter().map(|p| self.resolve(p)).collect()
    }

    pub fn pending_feed_path(&self) -> PathBuf {
        self.resolve(&self.pending_feed)
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.resolve(&self.snapshot)
    }

    pub fn request_log_path(&self) -> PathBuf {
        self.resolve(&self.request_log)
    }

    pub fn model_path(&self) -> PathBuf {
        self.resolve(&self.models_dir).join(ARTIFACT_FILE)
    }
}
