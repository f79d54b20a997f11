//! Zero-mean, unit-variance feature scaling.

use serde::{Deserialize, Serialize};

use crate::recipe::{FeatureVector, FEATURE_DIM, FEATURE_NAMES};

/// Features whose standard deviation falls below this are treated as
/// constant and given a scale of 1.
const MIN_SCALE: f64 = 1e-10;

/// Per-feature mean and scale fitted on the training corpus.
///
/// Uses the population standard deviation. A feature with no variance gets
/// scale 1, so it is centered but not divided.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Normalizer {
    mean: FeatureVector,
    scale: FeatureVector,
}

impl Normalizer {
    /// Fits mean and scale over `points`.
    ///
    /// An empty slice yields the identity transform.
    #[must_use]
    pub fn fit(points: &[FeatureVector]) -> Self {
        if points.is_empty() {
            return Self {
                mean: [0.0; FEATURE_DIM],
                scale: [1.0; FEATURE_DIM],
            };
        }

        #[allow(clippy::cast_precision_loss)]
        let n = points.len() as f64;
        let mut mean = [0.0; FEATURE_DIM];
        for point in points {
            for (m, v) in mean.iter_mut().zip(point) {
                *m += v;
            }
        }
        for m in &mut mean {
            *m /= n;
        }

        let mut scale = [0.0; FEATURE_DIM];
        for point in points {
            for j in 0..FEATURE_DIM {
                let d = point[j] - mean[j];
                scale[j] += d * d;
            }
        }
        for (j, s) in scale.iter_mut().enumerate() {
            *s = (*s / n).sqrt();
            if *s < MIN_SCALE {
                tracing::warn!(feature = FEATURE_NAMES[j], "Feature has zero variance");
                *s = 1.0;
            }
        }

        Self { mean, scale }
    }

    /// Per-feature means.
    #[must_use]
    pub fn mean(&self) -> &FeatureVector {
        &self.mean
    }

    /// Per-feature scales.
    #[must_use]
    pub fn scale(&self) -> &FeatureVector {
        &self.scale
    }

    /// Maps a raw point into normalized space.
    #[must_use]
    pub fn transform(&self, point: &FeatureVector) -> FeatureVector {
        std::array::from_fn(|j| (point[j] - self.mean[j]) / self.scale[j])
    }

    /// Maps a normalized point back to raw units.
    #[must_use]
    pub fn inverse_transform(&self, point: &FeatureVector) -> FeatureVector {
        std::array::from_fn(|j| point[j] * self.scale[j] + self.mean[j])
    }
}
