use serde::{Deserialize, Serialize};

use super::rng::SimpleRng;
use crate::config::TrainingConfig;
use crate::error::{OrbitError, Result};

/// Fitted k-means partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KMeans {
    pub centroids: Vec<Vec<f64>>,
    /// Sum of squared distances to the nearest centroid on the training set.
    pub inertia: f64,
}

impl KMeans {
    /// Lloyd's algorithm with k-means++ seeding, restarted `n_init` times;
    /// the run with the lowest inertia wins. Fewer points than clusters
    /// shrinks `k` to the number of points.
    pub fn fit(points: &[Vec<f64>], cfg: &TrainingConfig) -> Result<Self> {
        if points.is_empty() {
            return Err(OrbitError::Training("cannot cluster an empty table".into()));
        }
        if cfg.clusters == 0 {
            return Err(OrbitError::Training("cluster count must be positive".into()));
        }
        let k = cfg.clusters.min(points.len());
        let tol = cfg.tolerance * mean_variance(points);

        let mut rng = SimpleRng::new(cfg.seed);
        let mut best: Option<KMeans> = None;
        for run in 0..cfg.n_init.max(1) {
            let seeds = plus_plus_init(points, k, &mut rng);
            let fitted = lloyd(points, seeds, cfg.max_iter, tol);
            log::debug!("k-means run {run}: inertia {:.4}", fitted.inertia);
            if best.as_ref().map_or(true, |b| fitted.inertia < b.inertia) {
                best = Some(fitted);
            }
        }
        best.ok_or_else(|| OrbitError::Training("no k-means run completed".into()))
    }

    /// Index of the nearest centroid; ties go to the lower index.
    pub fn predict_one(&self, point: &[f64]) -> usize {
        nearest(&self.centroids, point).0
    }

    pub fn predict(&self, points: &[Vec<f64>]) -> Vec<usize> {
        points.iter().map(|p| self.predict_one(p)).collect()
    }
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

fn nearest(centroids: &[Vec<f64>], point: &[f64]) -> (usize, f64) {
    centroids
        .iter()
        .enumerate()
        .map(|(idx, c)| (idx, squared_distance(c, point)))
        .fold((0, f64::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best })
}

fn mean_variance(points: &[Vec<f64>]) -> f64 {
    let dims = points[0].len();
    if dims == 0 {
        return 0.0;
    }
    let n = points.len() as f64;
    let total: f64 = (0..dims)
        .map(|d| {
            let mean = points.iter().map(|p| p[d]).sum::<f64>() / n;
            points.iter().map(|p| (p[d] - mean).powi(2)).sum::<f64>() / n
        })
        .sum();
    total / dims as f64
}

/// k-means++: first seed uniform, later seeds drawn proportionally to the
/// squared distance from the closest seed chosen so far.
fn plus_plus_init(points: &[Vec<f64>], k: usize, rng: &mut SimpleRng) -> Vec<Vec<f64>> {
    let mut seeds = vec![points[rng.below(points.len())].clone()];
    let mut d2: Vec<f64> = points.iter().map(|p| squared_distance(p, &seeds[0])).collect();

    while seeds.len() < k {
        let total: f64 = d2.iter().sum();
        let pick = if total > 0.0 {
            let target = rng.next_f64() * total;
            let mut acc = 0.0;
            d2.iter()
                .position(|&d| {
                    acc += d;
                    acc > target
                })
                .unwrap_or(points.len() - 1)
        } else {
            rng.below(points.len())
        };
        let seed = points[pick].clone();
        for (d, p) in d2.iter_mut().zip(points) {
            *d = d.min(squared_distance(p, &seed));
        }
        seeds.push(seed);
    }
    seeds
}

fn lloyd(points: &[Vec<f64>], mut centroids: Vec<Vec<f64>>, max_iter: usize, tol: f64) -> KMeans {
    let dims = points[0].len();
    for _ in 0..max_iter.max(1) {
        let mut sums = vec![vec![0.0; dims]; centroids.len()];
        let mut counts = vec![0usize; centroids.len()];
        for p in points {
            let (c, _) = nearest(&centroids, p);
            counts[c] += 1;
            for (s, v) in sums[c].iter_mut().zip(p) {
                *s += v;
            }
        }

        let mut shift = 0.0;
        for (c, centroid) in centroids.iter_mut().enumerate() {
            // an emptied cluster keeps its previous centroid
            if counts[c] == 0 {
                continue;
            }
            let updated: Vec<f64> = sums[c].iter().map(|s| s / counts[c] as f64).collect();
            shift += squared_distance(centroid, &updated);
            *centroid = updated;
        }
        if shift <= tol {
            break;
        }
    }

    let inertia = points.iter().map(|p| nearest(&centroids, p).1).sum();
    KMeans { centroids, inertia }
}
