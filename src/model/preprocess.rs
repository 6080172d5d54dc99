use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::features::{FeatureVector, UNKNOWN, median};

// ---------------------------------------------------------------------------
// Numeric columns: median imputation, then standardisation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericScaler {
    pub median: f64,
    pub mean: f64,
    /// Population standard deviation; `1.0` for a constant column.
    pub scale: f64,
}

impl NumericScaler {
    pub fn fit(values: impl Iterator<Item = f64>) -> Self {
        let raw: Vec<f64> = values.collect();
        let median = median(raw.iter().copied().filter(|v| v.is_finite()).collect()).unwrap_or(0.0);
        let imputed: Vec<f64> = raw
            .into_iter()
            .map(|v| if v.is_finite() { v } else { median })
            .collect();

        let n = imputed.len().max(1) as f64;
        let mean = imputed.iter().sum::<f64>() / n;
        let var = imputed.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std = var.sqrt();

        NumericScaler {
            median,
            mean,
            scale: if std > 0.0 && std.is_finite() { std } else { 1.0 },
        }
    }

    pub fn transform(&self, value: f64) -> f64 {
        let v = if value.is_finite() { value } else { self.median };
        (v - self.mean) / self.scale
    }
}

// ---------------------------------------------------------------------------
// Categorical columns: most-frequent imputation, then one-hot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    pub most_frequent: String,
    /// Sorted, unique.
    pub categories: Vec<String>,
}

impl OneHotEncoder {
    pub fn fit<'a>(values: impl Iterator<Item = &'a str>) -> Self {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        let mut missing = 0usize;
        for v in values {
            if v.trim().is_empty() {
                missing += 1;
            } else {
                *counts.entry(v).or_default() += 1;
            }
        }

        // ties resolve to the lexicographically smallest value
        let mut most_frequent = UNKNOWN;
        let mut best = 0usize;
        for (&value, &count) in &counts {
            if count > best {
                best = count;
                most_frequent = value;
            }
        }

        let mut categories: Vec<String> = counts.keys().map(|k| k.to_string()).collect();
        if missing > 0 && !counts.contains_key(most_frequent) {
            categories.push(most_frequent.to_string());
            categories.sort();
        }

        OneHotEncoder {
            most_frequent: most_frequent.to_string(),
            categories,
        }
    }

    /// Unknown categories encode to all zeros.
    pub fn encode_into(&self, value: &str, out: &mut Vec<f64>) {
        let value = if value.trim().is_empty() {
            self.most_frequent.as_str()
        } else {
            value
        };
        let start = out.len();
        out.resize(start + self.categories.len(), 0.0);
        if let Ok(pos) = self.categories.binary_search_by(|c| c.as_str().cmp(value)) {
            out[start + pos] = 1.0;
        }
    }
}

// ---------------------------------------------------------------------------
// Full preprocessing transform
// ---------------------------------------------------------------------------

/// Feature-space transform fitted on the training table.
///
/// Output layout: one-hot `purpose`, one-hot `ops_status_code`, then scaled
/// `lifetime_years`, `capabilities_count`, `env_impact_score`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    pub purpose: OneHotEncoder,
    pub ops_status: OneHotEncoder,
    pub lifetime: NumericScaler,
    pub capabilities: NumericScaler,
    pub env_impact: NumericScaler,
}

impl Preprocessor {
    pub fn fit(features: &[FeatureVector]) -> Self {
        Preprocessor {
            purpose: OneHotEncoder::fit(features.iter().map(|f| f.purpose.as_str())),
            ops_status: OneHotEncoder::fit(features.iter().map(|f| f.ops_status_code.as_str())),
            lifetime: NumericScaler::fit(features.iter().map(|f| f.lifetime_years)),
            capabilities: NumericScaler::fit(features.iter().map(|f| f.capabilities_count as f64)),
            env_impact: NumericScaler::fit(features.iter().map(|f| f.env_impact_score)),
        }
    }

    pub fn width(&self) -> usize {
        self.purpose.categories.len() + self.ops_status.categories.len() + 3
    }

    pub fn transform_one(&self, f: &FeatureVector) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.width());
        self.purpose.encode_into(&f.purpose, &mut out);
        self.ops_status.encode_into(&f.ops_status_code, &mut out);
        out.push(self.lifetime.transform(f.lifetime_years));
        out.push(self.capabilities.transform(f.capabilities_count as f64));
        out.push(self.env_impact.transform(f.env_impact_score));
        out
    }

    pub fn transform(&self, features: &[FeatureVector]) -> Vec<Vec<f64>> {
        features.iter().map(|f| self.transform_one(f)).collect()
    }
}
