//! K-means partition over normalized recipe features.
//!
//! Fitting uses seeded k-means++ initialization (D² sampling) followed by
//! Lloyd iterations. Labels returned from [`ClusterIndex::fit`] are
//! recomputed against the final centroids, so for every fitted point
//! `index.locate(point) == label`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::ModelConfig;
use crate::error::Result;
use crate::recipe::{FeatureVector, FEATURE_DIM};
use crate::validation::validate_clustering_inputs;

/// Squared Euclidean distance.
#[inline]
#[must_use]
pub fn squared_distance(a: &FeatureVector, b: &FeatureVector) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Euclidean distance.
#[inline]
#[must_use]
pub fn euclidean_distance(a: &FeatureVector, b: &FeatureVector) -> f64 {
    squared_distance(a, b).sqrt()
}

/// Index of the nearest centroid; ties go to the lowest index.
fn nearest(point: &FeatureVector, centroids: &[FeatureVector]) -> (usize, f64) {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (c, centroid) in centroids.iter().enumerate() {
        let dist = squared_distance(point, centroid);
        if dist < best_dist {
            best_dist = dist;
            best = c;
        }
    }
    (best, best_dist)
}

/// A fitted partition: centroids in normalized space plus fit diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterIndex {
    centroids: Vec<FeatureVector>,
    inertia: f64,
    n_iter: usize,
}

/// Result of fitting: the index and one label per input point.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterFit {
    /// The fitted index.
    pub index: ClusterIndex,
    /// Cluster label per input point, in input order.
    pub labels: Vec<usize>,
}

impl ClusterIndex {
    /// Fits `config.n_clusters` clusters over normalized `points`.
    ///
    /// Runs `config.n_init` seeded initializations from a single RNG seeded
    /// with `config.seed` and keeps the run with the lowest inertia (the
    /// earliest run on ties).
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidClusterCount`] if `n_clusters < 2` or
    /// exceeds the number of points.
    pub fn fit(points: &[FeatureVector], config: &ModelConfig) -> Result<ClusterFit> {
        validate_clustering_inputs(config.n_clusters, points.len())?;

        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut run = |run: usize| {
            let initial = kmeans_plus_plus(points, config.n_clusters, &mut rng);
            let fit = lloyd(points, initial, config.max_iter, config.tolerance);
            tracing::debug!(
                run,
                inertia = fit.index.inertia,
                iterations = fit.index.n_iter,
                "k-means run finished"
            );
            fit
        };

        let mut best = run(0);
        for i in 1..config.n_init {
            let fit = run(i);
            if fit.index.inertia < best.index.inertia {
                best = fit;
            }
        }
        Ok(best)
    }

    /// Assigns a normalized point to its nearest centroid.
    #[must_use]
    pub fn locate(&self, point: &FeatureVector) -> usize {
        nearest(point, &self.centroids).0
    }

    /// Number of clusters.
    #[must_use]
    pub fn n_clusters(&self) -> usize {
        self.centroids.len()
    }

    /// Centroids in normalized space.
    #[must_use]
    pub fn centroids(&self) -> &[FeatureVector] {
        &self.centroids
    }

    /// Sum of squared distances from each point to its centroid.
    #[must_use]
    pub fn inertia(&self) -> f64 {
        self.inertia
    }

    /// Lloyd iterations run by the winning initialization.
    #[must_use]
    pub fn n_iter(&self) -> usize {
        self.n_iter
    }
}

fn kmeans_plus_plus(points: &[FeatureVector], k: usize, rng: &mut StdRng) -> Vec<FeatureVector> {
    let n = points.len();
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.gen_range(0..n)]);

    let mut min_dist: Vec<f64> = points
        .iter()
        .map(|p| squared_distance(p, &centroids[0]))
        .collect();

    while centroids.len() < k {
        let total: f64 = min_dist.iter().sum();
        let idx = if total > 0.0 {
            let target = rng.gen::<f64>() * total;
            let mut cumulative = 0.0;
            let mut chosen = None;
            for (i, d) in min_dist.iter().enumerate() {
                cumulative += d;
                if cumulative > target {
                    chosen = Some(i);
                    break;
                }
            }
            // Rounding can leave the target past the last increment.
            chosen.unwrap_or_else(|| {
                min_dist
                    .iter()
                    .rposition(|d| *d > 0.0)
                    .unwrap_or(n - 1)
            })
        } else {
            rng.gen_range(0..n)
        };

        let centroid = points[idx];
        for (d, p) in min_dist.iter_mut().zip(points) {
            *d = d.min(squared_distance(p, &centroid));
        }
        centroids.push(centroid);
    }
    centroids
}

fn assign(points: &[FeatureVector], centroids: &[FeatureVector]) -> Vec<usize> {
    points.iter().map(|p| nearest(p, centroids).0).collect()
}

fn update(
    points: &[FeatureVector],
    labels: &[usize],
    previous: &[FeatureVector],
) -> Vec<FeatureVector> {
    let k = previous.len();
    let mut sums = vec![[0.0; FEATURE_DIM]; k];
    let mut counts = vec![0usize; k];
    for (point, &label) in points.iter().zip(labels) {
        counts[label] += 1;
        for (s, v) in sums[label].iter_mut().zip(point) {
            *s += v;
        }
    }

    sums.into_iter()
        .zip(counts)
        .enumerate()
        .map(|(c, (sum, count))| {
            if count == 0 {
                tracing::warn!(cluster = c, "Empty cluster keeps its previous centroid");
                previous[c]
            } else {
                #[allow(clippy::cast_precision_loss)]
                let count = count as f64;
                sum.map(|s| s / count)
            }
        })
        .collect()
}

fn lloyd(
    points: &[FeatureVector],
    mut centroids: Vec<FeatureVector>,
    max_iter: usize,
    tolerance: f64,
) -> ClusterFit {
    let mut n_iter = 0;
    for iter in 0..max_iter {
        let labels = assign(points, &centroids);
        let updated = update(points, &labels, &centroids);
        let shift = centroids
            .iter()
            .zip(&updated)
            .map(|(a, b)| euclidean_distance(a, b))
            .fold(0.0, f64::max);
        centroids = updated;
        n_iter = iter + 1;
        if shift <= tolerance {
            break;
        }
    }

    let labels = assign(points, &centroids);
    let inertia: f64 = points
        .iter()
        .zip(&labels)
        .map(|(p, &c)| squared_distance(p, &centroids[c]))
        .sum();

    ClusterFit {
        index: ClusterIndex {
            centroids,
            inertia,
            n_iter,
        },
        labels,
    }
}
