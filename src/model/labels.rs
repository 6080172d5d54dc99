use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::features::FeatureVector;

/// Sustainability tier of a classified satellite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    Gold,
    Silver,
    Bronze,
}

impl Tier {
    /// Best first; rank `i` of the cluster ordering receives `RANKED[i]`.
    pub const RANKED: [Tier; 3] = [Tier::Gold, Tier::Silver, Tier::Bronze];

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Gold => "GOLD",
            Tier::Silver => "SILVER",
            Tier::Bronze => "BRONZE",
        }
    }

    /// Case-insensitive; accepts the Portuguese names used by the portal.
    pub fn parse(text: &str) -> Option<Tier> {
        match text.trim().to_uppercase().as_str() {
            "GOLD" | "OURO" => Some(Tier::Gold),
            "SILVER" | "PRATA" => Some(Tier::Silver),
            "BRONZE" => Some(Tier::Bronze),
            _ => None,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label reported for rows of the unclassified feed.
pub const PENDING_LABEL: &str = "PENDING";

const PENDING_ALIASES: &[&str] = &[
    "pending",
    "pendente",
    "pendente de classificação",
    "pendente de classificacao",
];

/// Whether a requested classification names the pending sentinel.
pub fn is_pending(text: &str) -> bool {
    let lowered = text.trim().to_lowercase();
    PENDING_ALIASES.contains(&lowered.as_str())
}

// ---------------------------------------------------------------------------
// Composite sustainability score
// ---------------------------------------------------------------------------

pub const ENVIRONMENT_KEYWORDS: &[&str] = &[
    "ENV",
    "EARTH",
    "CLIMATE",
    "WEATHER",
    "ATMOS",
    "OCEAN",
    "ENVIRONMENT",
    "ECO",
    "SUSTAIN",
    "REMOTE SENSING",
    "IMAGING",
];

const W_PURPOSE: f64 = 0.4;
const W_LIFETIME: f64 = 0.3;
const W_CAPABILITIES: f64 = 0.2;
const W_LOW_IMPACT: f64 = 0.1;

/// Fraction of [`ENVIRONMENT_KEYWORDS`] found in the purpose text.
pub fn purpose_affinity(purpose: &str) -> f64 {
    let text = purpose.to_uppercase();
    let hits = ENVIRONMENT_KEYWORDS
        .iter()
        .filter(|k| text.contains(*k))
        .count();
    hits as f64 / ENVIRONMENT_KEYWORDS.len() as f64
}

/// Min-max scaling to `[0, 1]`; a constant column maps to all zeros.
pub fn min_max(values: &[f64]) -> Vec<f64> {
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = hi - lo;
    if !range.is_finite() || range.abs() < f64::EPSILON {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| (v - lo) / range).collect()
}

/// Per-row composite score over the whole training table.
///
/// Lifetime, capabilities and impact are min-max scaled over the table;
/// purpose affinity enters as the raw keyword fraction.
pub fn composite_scores(features: &[FeatureVector]) -> Vec<f64> {
    let life = min_max(&features.iter().map(|f| f.lifetime_years).collect::<Vec<_>>());
    let caps = min_max(
        &features
            .iter()
            .map(|f| f.capabilities_count as f64)
            .collect::<Vec<_>>(),
    );
    let impact = min_max(&features.iter().map(|f| f.env_impact_score).collect::<Vec<_>>());

    features
        .iter()
        .enumerate()
        .map(|(i, f)| {
            W_PURPOSE * purpose_affinity(&f.purpose)
                + W_LIFETIME * life[i]
                + W_CAPABILITIES * caps[i]
                + W_LOW_IMPACT * (1.0 - impact[i])
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Cluster → tier mapping
// ---------------------------------------------------------------------------

pub type LabelMap = BTreeMap<usize, Tier>;

/// Mean score per cluster id.
pub fn cluster_means(clusters: &[usize], scores: &[f64]) -> BTreeMap<usize, f64> {
    let mut sums: BTreeMap<usize, (f64, usize)> = BTreeMap::new();
    for (&c, &s) in clusters.iter().zip(scores) {
        let entry = sums.entry(c).or_default();
        entry.0 += s;
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(c, (sum, n))| (c, sum / n as f64))
        .collect()
}

/// Rank clusters by mean score, descending; GOLD, SILVER, BRONZE in that
/// order and BRONZE for any further cluster. Equal means rank the lower id first.
pub fn rank_clusters(means: &BTreeMap<usize, f64>) -> LabelMap {
    let mut ordered: Vec<(usize, f64)> = means.iter().map(|(&c, &m)| (c, m)).collect();
    ordered.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

    ordered
        .into_iter()
        .enumerate()
        .map(|(rank, (cluster, _))| {
            (cluster, Tier::RANKED.get(rank).copied().unwrap_or(Tier::Bronze))
        })
        .collect()
}

pub fn assign_labels(clusters: &[usize], scores: &[f64]) -> LabelMap {
    let means = cluster_means(clusters, scores);
    for (cluster, mean) in &means {
        log::debug!("cluster {cluster}: mean composite score {mean:.4}");
    }
    rank_clusters(&means)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn highest_mean_cluster_is_gold() {
        let means = BTreeMap::from([(0, 0.5), (1, 0.1), (2, 0.9)]);
        let map = rank_clusters(&means);
        assert_eq!(
            map,
            BTreeMap::from([(2, Tier::Gold), (0, Tier::Silver), (1, Tier::Bronze)])
        );
    }

    #[test]
    fn assign_labels_averages_per_cluster() {
        let clusters = [2, 0, 1, 2, 0, 1];
        let scores = [1.0, 0.6, 0.2, 0.8, 0.4, 0.0];
        let map = assign_labels(&clusters, &scores);
        assert_eq!(map[&2], Tier::Gold);
        assert_eq!(map[&0], Tier::Silver);
        assert_eq!(map[&1], Tier::Bronze);
    }

    #[test]
    fn overflow_clusters_fall_back_to_bronze() {
        let means = BTreeMap::from([(0, 0.4), (1, 0.3), (2, 0.2), (3, 0.9)]);
        let map = rank_clusters(&means);
        assert_eq!(map[&3], Tier::Gold);
        assert_eq!(map[&0], Tier::Silver);
        assert_eq!(map[&1], Tier::Bronze);
        assert_eq!(map[&2], Tier::Bronze);
    }

    #[test]
    fn affinity_counts_keyword_hits() {
        assert_eq!(purpose_affinity("COMMUNICATIONS"), 0.0);
        // WEATHER only
        assert_eq!(purpose_affinity("weather"), 1.0 / 11.0);
        // ENV, EARTH, ENVIRONMENT, ... : overlapping keywords all count
        let earth_env = purpose_affinity("EARTH OBSERVATION / ENVIRONMENT");
        assert!(earth_env >= 3.0 / 11.0);
    }

    #[test]
    fn min_max_constant_column_is_zero() {
        assert_eq!(min_max(&[3.0, 3.0, 3.0]), vec![0.0, 0.0, 0.0]);
        assert_eq!(min_max(&[1.0, 2.0, 3.0]), vec![0.0, 0.5, 1.0]);
        assert!(min_max(&[]).is_empty());
    }

    #[test]
    fn composite_prefers_long_lived_environmental_low_orbit() {
        let fv = |purpose: &str, life: f64, caps: u32, env: f64| FeatureVector {
            purpose: purpose.into(),
            lifetime_years: life,
            capabilities_count: caps,
            env_impact_score: env,
            ops_status_code: "+".into(),
        };
        let scores = composite_scores(&[
            fv("EARTH OBSERVATION", 20.0, 5, 1000.0),
            fv("COMMUNICATIONS", 2.0, 1, 70000.0),
        ]);
        assert!(scores[0] > scores[1]);
        // second row: all normalised terms at their minimum, full impact penalty
        assert_eq!(scores[1], 0.0);
    }

    #[test]
    fn tier_and_pending_parsing() {
        assert_eq!(Tier::parse("gold"), Some(Tier::Gold));
        assert_eq!(Tier::parse(" Ouro "), Some(Tier::Gold));
        assert_eq!(Tier::parse("prata"), Some(Tier::Silver));
        assert_eq!(Tier::parse("platinum"), None);
        assert!(is_pending("PENDING"));
        assert!(is_pending("Pendente de Classificação"));
        assert!(is_pending("PENDENTE DE CLASSIFICAÇÃO"));
        assert!(!is_pending("GOLD"));
        assert_eq!(serde_json::to_string(&Tier::Silver).unwrap(), "\"SILVER\"");
    }

    fn permutation() -> impl Strategy<Value = [usize; 3]> {
        prop_oneof![
            Just([0, 1, 2]),
            Just([0, 2, 1]),
            Just([1, 0, 2]),
            Just([1, 2, 0]),
            Just([2, 0, 1]),
            Just([2, 1, 0]),
        ]
    }

    proptest! {
        #[test]
        fn top_cluster_is_gold_under_any_relabelling(
            rows in prop::collection::vec((0usize..3, 0.0f64..1.0), 3..60),
            perm in permutation(),
        ) {
            let clusters: Vec<usize> = rows.iter().map(|r| r.0).collect();
            let scores: Vec<f64> = rows.iter().map(|r| r.1).collect();
            let means = cluster_means(&clusters, &scores);
            let top = means
                .iter()
                .max_by(|a, b| a.1.total_cmp(b.1))
                .map(|(&c, &m)| (c, m))
                .unwrap();
            prop_assume!(means.values().filter(|m| **m == top.1).count() == 1);

            let permuted: Vec<usize> = clusters.iter().map(|&c| perm[c]).collect();
            let original = assign_labels(&clusters, &scores);
            let relabelled = assign_labels(&permuted, &scores);

            prop_assert_eq!(original[&top.0], Tier::Gold);
            prop_assert_eq!(relabelled[&perm[top.0]], Tier::Gold);
            for (c, tier) in &original {
                prop_assert!(*tier != Tier::Bronze || *c != top.0);
            }
        }
    }
}
