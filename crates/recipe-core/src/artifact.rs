//! The fitted model artifact.
//!
//! A [`ModelArtifact`] bundles the labelled corpus, the fitted normalizer,
//! the cluster index and the feature schema. It is built once by
//! [`ModelArtifact::fit`], never mutated afterwards, and replaced wholesale
//! on retrain.
//!
//! # Binary format
//!
//! ```text
//! [magic "RCPM": 4 bytes][version: u16 LE][postcard payload]
//! ```
//!
//! The search index is derived data and is rebuilt on decode.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cluster::ClusterIndex;
use crate::config::ModelConfig;
use crate::error::{Error, Result};
use crate::normalizer::Normalizer;
use crate::ranker::{rank, Recommendation};
use crate::recipe::{FeatureVector, Recipe, RecipeRecord, FEATURE_NAMES};
use crate::search::{SearchHit, TextSearchIndex};
use crate::validation::Preferences;

/// Artifact file magic bytes.
pub const ARTIFACT_MAGIC: &[u8; 4] = b"RCPM";

/// Current artifact format version.
pub const ARTIFACT_VERSION: u16 = 1;

const HEADER_LEN: usize = 6;

#[derive(Serialize, Deserialize)]
struct ArtifactData {
    feature_names: Vec<String>,
    model: ModelConfig,
    normalizer: Normalizer,
    index: ClusterIndex,
    records: Vec<RecipeRecord>,
}

/// A fitted, immutable recommender model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelArtifact {
    feature_names: Vec<String>,
    model: ModelConfig,
    normalizer: Normalizer,
    index: ClusterIndex,
    records: Vec<RecipeRecord>,
    search: TextSearchIndex,
}

impl ModelArtifact {
    /// Fits a model over `corpus`.
    ///
    /// Corpus order is preserved. Nothing is returned unless every step
    /// succeeds.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyCorpus`] if `corpus` is empty
    /// - [`Error::DuplicateId`] if two recipes share an id
    /// - [`Error::MissingFeature`] if a recipe has a non-finite or negative
    ///   feature
    /// - [`Error::InvalidClusterCount`] if `config.n_clusters` is below 2
    ///   or exceeds the corpus size
    pub fn fit(corpus: Vec<Recipe>, config: &ModelConfig) -> Result<Self> {
        let _span = tracing::info_span!(
            "fit",
            recipes = corpus.len(),
            n_clusters = config.n_clusters
        )
        .entered();

        if corpus.is_empty() {
            return Err(Error::EmptyCorpus);
        }
        let mut seen = HashSet::with_capacity(corpus.len());
        if let Some(row) = corpus.iter().position(|recipe| !seen.insert(&recipe.id)) {
            return Err(Error::DuplicateId {
                row,
                id: corpus[row].id.to_string(),
            });
        }
        let points = corpus
            .iter()
            .enumerate()
            .map(|(row, recipe)| {
                let features = recipe.features();
                match features.iter().position(|v| !v.is_finite() || *v < 0.0) {
                    Some(j) => Err(Error::MissingFeature {
                        row,
                        feature: FEATURE_NAMES[j],
                    }),
                    None => Ok(features),
                }
            })
            .collect::<Result<Vec<FeatureVector>>>()?;

        tracing::info!("Fitting recommender");
        let normalizer = Normalizer::fit(&points);
        let normalized: Vec<FeatureVector> =
            points.iter().map(|p| normalizer.transform(p)).collect();
        let fit = ClusterIndex::fit(&normalized, config)?;

        let records: Vec<RecipeRecord> = corpus
            .into_iter()
            .zip(fit.labels)
            .map(|(recipe, cluster)| RecipeRecord { recipe, cluster })
            .collect();

        tracing::info!(
            iterations = fit.index.n_iter(),
            inertia = fit.index.inertia(),
            "Recommender fitted"
        );
        Ok(Self::assemble(ArtifactData {
            feature_names: FEATURE_NAMES.iter().map(ToString::to_string).collect(),
            model: config.clone(),
            normalizer,
            index: fit.index,
            records,
        }))
    }

    fn assemble(data: ArtifactData) -> Self {
        let search = TextSearchIndex::build(&data.records);
        Self {
            feature_names: data.feature_names,
            model: data.model,
            normalizer: data.normalizer,
            index: data.index,
            records: data.records,
            search,
        }
    }

    /// The labelled corpus, in input order.
    #[must_use]
    pub fn records(&self) -> &[RecipeRecord] {
        &self.records
    }

    /// Number of recipes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the corpus is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Feature names in normalization order.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Clustering parameters used at fit time.
    #[must_use]
    pub fn model_config(&self) -> &ModelConfig {
        &self.model
    }

    /// The fitted normalizer.
    #[must_use]
    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// The fitted cluster index.
    #[must_use]
    pub fn cluster_index(&self) -> &ClusterIndex {
        &self.index
    }

    /// Maps a raw query point to its cluster.
    #[must_use]
    pub fn locate(&self, query: &FeatureVector) -> usize {
        self.index.locate(&self.normalizer.transform(query))
    }

    /// Ranks the members of the query's cluster.
    #[must_use]
    pub fn recommend(&self, prefs: &Preferences) -> Vec<Recommendation> {
        let query = prefs.features();
        let cluster = self.locate(&query);
        let out = rank(&self.records, cluster, &query, prefs.n_recommendations);
        tracing::debug!(cluster, results = out.len(), "Recommended");
        out
    }

    /// Text search over names and ingredients.
    ///
    /// # Errors
    ///
    /// See [`TextSearchIndex::matches`].
    pub fn search(&self, query: &str, n_results: usize) -> Result<Vec<SearchHit>> {
        let hits = self.search.search(&self.records, query, n_results)?;
        tracing::debug!(results = hits.len(), "Searched");
        Ok(hits)
    }

    /// Search returning only `(row, score)` pairs.
    pub(crate) fn search_rows(&self, query: &str, n_results: usize) -> Result<Vec<(usize, u8)>> {
        self.search.matches(query, n_results)
    }

    /// Resolves a textual id to a corpus row.
    ///
    /// Tries, in order: `food_recipe_id`, the recipe `id`, then the row
    /// position.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<(usize, &RecipeRecord)> {
        let id = id.trim();
        let numeric = id.parse::<i64>().ok();

        let by_food_id = numeric.and_then(|n| {
            self.records
                .iter()
                .position(|r| r.recipe.food_recipe_id == Some(n))
        });
        let by_id = || {
            self.records
                .iter()
                .position(|r| r.recipe.id.to_string() == id)
        };
        let by_row = || {
            id.parse::<usize>()
                .ok()
                .filter(|row| *row < self.records.len())
        };

        by_food_id
            .or_else(by_id)
            .or_else(by_row)
            .map(|row| (row, &self.records[row]))
    }

    /// Fit diagnostics with centroids in raw units.
    #[must_use]
    pub fn summary(&self) -> ArtifactSummary {
        let mut cluster_sizes = vec![0usize; self.index.n_clusters()];
        for record in &self.records {
            if let Some(size) = cluster_sizes.get_mut(record.cluster) {
                *size += 1;
            }
        }
        ArtifactSummary {
            n_records: self.records.len(),
            n_clusters: self.index.n_clusters(),
            feature_names: self.feature_names.clone(),
            cluster_sizes,
            centroids: self
                .index
                .centroids()
                .iter()
                .map(|c| self.normalizer.inverse_transform(c))
                .collect(),
            inertia: self.index.inertia(),
            iterations: self.index.n_iter(),
            seed: self.model.seed,
        }
    }

    /// Encodes the artifact.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let data = ArtifactData {
            feature_names: self.feature_names.clone(),
            model: self.model.clone(),
            normalizer: self.normalizer.clone(),
            index: self.index.clone(),
            records: self.records.clone(),
        };
        let payload = postcard::to_allocvec(&data)?;

        let mut buf = Vec::with_capacity(HEADER_LEN + payload.len());
        buf.extend_from_slice(ARTIFACT_MAGIC);
        buf.extend_from_slice(&ARTIFACT_VERSION.to_le_bytes());
        buf.extend_from_slice(&payload);
        Ok(buf)
    }

    /// Decodes an artifact produced by [`Self::to_bytes`].
    ///
    /// # Errors
    ///
    /// - [`Error::Serialization`] on bad magic, truncation or a corrupt
    ///   payload
    /// - [`Error::IncompatibleArtifact`] on a version mismatch
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(Error::Serialization("Artifact too small".to_string()));
        }
        if &bytes[0..4] != ARTIFACT_MAGIC {
            return Err(Error::Serialization("Invalid artifact magic".to_string()));
        }
        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != ARTIFACT_VERSION {
            return Err(Error::IncompatibleArtifact {
                found: version,
                expected: ARTIFACT_VERSION,
            });
        }

        let data: ArtifactData = postcard::from_bytes(&bytes[HEADER_LEN..])?;
        let artifact = Self::assemble(data);
        artifact.check_consistency()?;
        Ok(artifact)
    }

    fn check_consistency(&self) -> Result<()> {
        let k = self.index.n_clusters();
        if let Some(row) = self.records.iter().position(|r| r.cluster >= k) {
            return Err(Error::Serialization(format!(
                "Record {row} references cluster {} but the model has {k}",
                self.records[row].cluster
            )));
        }
        Ok(())
    }

    /// Writes the artifact to `path` via a temporary file and rename.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] or [`Error::Serialization`].
    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        let mut temp = path.as_os_str().to_owned();
        temp.push(".tmp");
        std::fs::write(&temp, &bytes)?;
        std::fs::rename(&temp, path)?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "Saved model artifact");
        Ok(())
    }

    /// Reads an artifact written by [`Self::save`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read, otherwise see
    /// [`Self::from_bytes`].
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let artifact = Self::from_bytes(&bytes)?;
        tracing::info!(
            path = %path.display(),
            recipes = artifact.len(),
            clusters = artifact.index.n_clusters(),
            "Loaded model artifact"
        );
        Ok(artifact)
    }
}

/// Fit diagnostics for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactSummary {
    /// Corpus size.
    pub n_records: usize,
    /// Number of clusters.
    pub n_clusters: usize,
    /// Feature names in normalization order.
    pub feature_names: Vec<String>,
    /// Members per cluster.
    pub cluster_sizes: Vec<usize>,
    /// Centroids mapped back to raw feature units.
    pub centroids: Vec<FeatureVector>,
    /// Final inertia in normalized space.
    pub inertia: f64,
    /// Lloyd iterations.
    pub iterations: usize,
    /// Initialization seed.
    pub seed: u64,
}
