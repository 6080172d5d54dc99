//! Tier model: preprocessing + k-means partition + cluster → tier mapping.
//!
//! ```text
//!  FeatureVector[] ──► Preprocessor ──► KMeans ──► cluster id ──► LabelMap ──► Tier
//!                      (impute, scale,             (nearest        (ranked by mean
//!                       one-hot)                    centroid)       composite score)
//! ```
//!
//! Training happens offline; the fitted artifact is persisted as JSON and
//! read back for inference.

pub mod kmeans;
pub mod labels;
pub mod preprocess;
pub mod rng;

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::TrainingConfig;
use crate::error::{OrbitError, Result};
use crate::features::{FeatureDefaults, FeatureVector};
use kmeans::KMeans;
use labels::{LabelMap, Tier, assign_labels, composite_scores};
use preprocess::Preprocessor;

/// Bumped whenever the persisted layout changes.
pub const ARTIFACT_VERSION: u32 = 1;

/// File name of the artifact inside the models directory.
pub const ARTIFACT_FILE: &str = "tier_model.json";

/// The persisted, immutable result of a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierModel {
    pub version: u32,
    pub trained_at: DateTime<Utc>,
    pub training_rows: usize,
    pub preprocessor: Preprocessor,
    pub kmeans: KMeans,
    pub label_map: LabelMap,
    pub defaults: FeatureDefaults,
}

impl TierModel {
    /// Fit the preprocessing transform and the partition, then rank clusters
    /// by mean composite score to build the label map.
    pub fn train(features: &[FeatureVector], cfg: &TrainingConfig) -> Result<Self> {
        let preprocessor = Preprocessor::fit(features);
        let transformed = preprocessor.transform(features);
        let kmeans = KMeans::fit(&transformed, cfg)?;

        let clusters = kmeans.predict(&transformed);
        let scores = composite_scores(features);
        let label_map = assign_labels(&clusters, &scores);

        log::info!(
            "trained tier model on {} rows: {} clusters, label map {:?}",
            features.len(),
            kmeans.centroids.len(),
            label_map
        );

        Ok(TierModel {
            version: ARTIFACT_VERSION,
            trained_at: Utc::now(),
            training_rows: features.len(),
            preprocessor,
            kmeans,
            label_map,
            defaults: FeatureDefaults::from_features(features),
        })
    }

    /// Classify a batch. Cluster ids missing from the label map read as BRONZE.
    pub fn infer(&self, features: &[FeatureVector]) -> Vec<Tier> {
        features
            .iter()
            .map(|f| {
                let cluster = self.kmeans.predict_one(&self.preprocessor.transform_one(f));
                self.label_map.get(&cluster).copied().unwrap_or(Tier::Bronze)
            })
            .collect()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, serde_json::to_vec_pretty(self)?)?;
        log::info!("saved tier model to {}", path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(OrbitError::ModelArtifactMissing {
                path: path.to_path_buf(),
            });
        }
        let bytes = fs::read(path)?;
        let model: TierModel = serde_json::from_slice(&bytes)
            .map_err(|e| OrbitError::parse(path, e.to_string()))?;
        if model.version != ARTIFACT_VERSION {
            return Err(OrbitError::parse(
                path,
                format!(
                    "artifact version {} does not match expected {}",
                    model.version, ARTIFACT_VERSION
                ),
            ));
        }
        Ok(model)
    }
}

/// Batch, stateless classification against the artifact at `path`.
pub fn infer_tier(model_path: &Path, features: &[FeatureVector]) -> Result<Vec<Tier>> {
    Ok(TierModel::load(model_path)?.infer(features))
}
