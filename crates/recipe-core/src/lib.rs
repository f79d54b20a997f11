//! # recipe-core
//!
//! Clustering-based recipe recommendation and relevance-scored text search.
//!
//! A recipe corpus is partitioned with k-means over normalized
//! `(minutes, complexity_score, ingredient_count)`. A query is mapped to its
//! nearest cluster and that cluster's members are ranked by raw-unit
//! Euclidean distance to the query. Text search scores name and ingredient
//! substring matches.
//!
//! ## Quick Start
//!
//! ```rust
//! use recipe_core::{fit, recommend, search, Recipe};
//!
//! fn main() -> recipe_core::Result<()> {
//!     let corpus: Vec<Recipe> = (0..20)
//!         .map(|i| {
//!             let steps: Vec<String> = (0..=i % 5).map(|s| format!("step {s}")).collect();
//!             let name = format!("Recipe {i}");
//!             Recipe::new(i, name, f64::from(10 + i * 5), "['pasta', 'salt']", steps)
//!         })
//!         .collect();
//!
//!     let artifact = fit(corpus, 3)?;
//!     let recs = recommend(&artifact, 30.0, 6.0, 2.0, 5)?;
//!     assert!(recs.len() <= 5);
//!
//!     let hits = search(&artifact, "pasta", 3)?;
//!     assert_eq!(hits.len(), 3);
//!     # Ok(())
//! }
//! ```
#![warn(missing_docs)]
// Clippy lints configured in workspace Cargo.toml [workspace.lints.clippy]
#![cfg_attr(
    test,
    allow(
        clippy::float_cmp,
        clippy::doc_markdown,
        clippy::uninlined_format_args,
        clippy::cast_lossless,
        clippy::cast_precision_loss,
        clippy::manual_assert
    )
)]

pub mod artifact;
#[cfg(test)]
mod artifact_tests;
pub mod browse;
pub mod cluster;
pub mod config;
pub mod error;
pub mod features;
pub mod ingredient;
pub mod list_field;
pub mod normalizer;
pub mod ranker;
pub mod recipe;
pub mod search;
pub mod service;
pub mod table;
pub mod validation;

pub use artifact::{ArtifactSummary, ModelArtifact};
pub use browse::{browse, BrowseItem, BrowseMode, BrowseRequest, Page};
pub use cluster::ClusterIndex;
pub use config::{ConfigError, RecommenderConfig};
pub use error::{Error, ErrorKind, Result};
pub use features::FeatureBuilder;
pub use ingredient::{parse_ingredient_line, ParsedIngredient};
pub use list_field::{parse_list_field, ListField};
pub use normalizer::Normalizer;
pub use ranker::Recommendation;
pub use recipe::{Recipe, RecipeId, RecipeRecord};
pub use search::{SearchHit, TextSearchIndex};
pub use service::{ModelState, RecommenderService};
pub use table::RawTable;
pub use validation::Preferences;

use crate::config::{LimitsConfig, ModelConfig};

/// Default number of clusters.
pub const DEFAULT_N_CLUSTERS: usize = 6;

/// Fits a model with `n_clusters` and the default seed and iteration limits.
///
/// # Errors
///
/// See [`ModelArtifact::fit`].
pub fn fit(corpus: Vec<Recipe>, n_clusters: usize) -> Result<ModelArtifact> {
    ModelArtifact::fit(
        corpus,
        &ModelConfig {
            n_clusters,
            ..ModelConfig::default()
        },
    )
}

/// Recommends up to `n_recommendations` recipes, validating inputs against
/// the default limits.
///
/// # Errors
///
/// Returns an input error if a preference is out of range or
/// `n_recommendations` is zero.
pub fn recommend(
    artifact: &ModelArtifact,
    desired_time: f64,
    desired_complexity: f64,
    desired_ingredients: f64,
    n_recommendations: usize,
) -> Result<Vec<Recommendation>> {
    let prefs = Preferences::validate(
        desired_time,
        desired_complexity,
        desired_ingredients,
        n_recommendations,
        &LimitsConfig::default(),
    )?;
    Ok(artifact.recommend(&prefs))
}

/// Text search over names and ingredients.
///
/// # Errors
///
/// Returns [`Error::EmptyQuery`] for a blank query and an input error if
/// `n_results` is zero.
pub fn search(artifact: &ModelArtifact, query: &str, n_results: usize) -> Result<Vec<SearchHit>> {
    artifact.search(query, n_results)
}

/// Encodes an artifact. See [`ModelArtifact::to_bytes`].
///
/// # Errors
///
/// Returns [`Error::Serialization`] if encoding fails.
pub fn serialize(artifact: &ModelArtifact) -> Result<Vec<u8>> {
    artifact.to_bytes()
}

/// Decodes an artifact. See [`ModelArtifact::from_bytes`].
///
/// # Errors
///
/// Returns [`Error::Serialization`] or [`Error::IncompatibleArtifact`].
pub fn deserialize(bytes: &[u8]) -> Result<ModelArtifact> {
    ModelArtifact::from_bytes(bytes)
}
