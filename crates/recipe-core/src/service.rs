//! Serving handle around the current model artifact.
//!
//! Reads load the current `Arc<ModelArtifact>` without locking. A retrain
//! builds a complete new artifact off to the side and publishes it with a
//! single atomic swap; requests already holding the old artifact finish
//! against it. At most one retrain runs at a time.

use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;

use crate::artifact::ModelArtifact;
use crate::browse::{browse, BrowseRequest, Page};
use crate::config::RecommenderConfig;
use crate::error::{Error, Result};
use crate::ranker::Recommendation;
use crate::recipe::{Recipe, RecipeRecord};
use crate::search::SearchHit;
use crate::validation::{validate_positive_count, Preferences};

/// Lifecycle of the served model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    /// Nothing loaded and nothing training.
    Unfit,
    /// A first model is being trained.
    Fitting,
    /// A model is being served (a retrain may be running behind it).
    Fit,
}

/// Thread-safe recommender service.
pub struct RecommenderService {
    config: RecommenderConfig,
    current: ArcSwapOption<ModelArtifact>,
    retrain: Mutex<()>,
}

impl RecommenderService {
    /// Creates a service with no model.
    #[must_use]
    pub fn new(config: RecommenderConfig) -> Self {
        Self {
            config,
            current: ArcSwapOption::empty(),
            retrain: Mutex::new(()),
        }
    }

    /// Creates a service serving `artifact`.
    #[must_use]
    pub fn with_artifact(config: RecommenderConfig, artifact: ModelArtifact) -> Self {
        Self {
            config,
            current: ArcSwapOption::from_pointee(artifact),
            retrain: Mutex::new(()),
        }
    }

    /// Creates a service serving the artifact stored at `path`.
    ///
    /// # Errors
    ///
    /// See [`ModelArtifact::load`].
    pub fn load(config: RecommenderConfig, path: &Path) -> Result<Self> {
        let artifact = ModelArtifact::load(path)?;
        Ok(Self::with_artifact(config, artifact))
    }

    /// Service configuration.
    #[must_use]
    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ModelState {
        match (self.current.load().is_some(), self.retrain.is_locked()) {
            (true, _) => ModelState::Fit,
            (false, true) => ModelState::Fitting,
            (false, false) => ModelState::Unfit,
        }
    }

    /// Returns the artifact currently served.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelUnavailable`] before the first publish.
    pub fn current(&self) -> Result<Arc<ModelArtifact>> {
        self.current.load_full().ok_or_else(|| {
            Error::ModelUnavailable("model not trained".to_string())
        })
    }

    /// Replaces the served artifact.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RetrainInProgress`] if a retrain is running; its
    /// result would otherwise overwrite this artifact when it finishes.
    pub fn publish(&self, artifact: ModelArtifact) -> Result<()> {
        let Some(_guard) = self.retrain.try_lock() else {
            return Err(Error::RetrainInProgress);
        };
        let recipes = artifact.len();
        self.current.store(Some(Arc::new(artifact)));
        tracing::info!(recipes, "Published model artifact");
        Ok(())
    }

    /// Fits a new artifact over `corpus` and publishes it.
    ///
    /// The served artifact is untouched if fitting fails.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RetrainInProgress`] if another retrain holds the
    /// lock, otherwise any error from [`ModelArtifact::fit`].
    pub fn retrain(&self, corpus: Vec<Recipe>) -> Result<Arc<ModelArtifact>> {
        let Some(_guard) = self.retrain.try_lock() else {
            return Err(Error::RetrainInProgress);
        };
        let artifact = Arc::new(ModelArtifact::fit(corpus, &self.config.model)?);
        self.current.store(Some(Arc::clone(&artifact)));
        tracing::info!(recipes = artifact.len(), "Published retrained artifact");
        Ok(artifact)
    }

    /// Validates preferences against the configured limits and recommends.
    ///
    /// `n_recommendations` defaults to `limits.default_recommendations`.
    ///
    /// # Errors
    ///
    /// Input errors for out-of-range values, [`Error::ModelUnavailable`] if
    /// no model is loaded.
    pub fn recommend(
        &self,
        desired_time: f64,
        desired_complexity: f64,
        desired_ingredients: f64,
        n_recommendations: Option<usize>,
    ) -> Result<Vec<Recommendation>> {
        let limits = &self.config.limits;
        let prefs = Preferences::validate(
            desired_time,
            desired_complexity,
            desired_ingredients,
            n_recommendations.unwrap_or(limits.default_recommendations),
            limits,
        )?;
        Ok(self.current()?.recommend(&prefs))
    }

    /// Text search; `n_results` defaults to `limits.default_results`.
    ///
    /// # Errors
    ///
    /// See [`ModelArtifact::search`]; [`Error::ModelUnavailable`] if no
    /// model is loaded.
    pub fn search(&self, query: &str, n_results: Option<usize>) -> Result<Vec<SearchHit>> {
        let n = validate_positive_count(
            n_results.unwrap_or(self.config.limits.default_results),
            "number of results",
        )?;
        self.current()?.search(query, n)
    }

    /// See [`crate::browse::browse`].
    ///
    /// # Errors
    ///
    /// Input errors from preference validation; [`Error::ModelUnavailable`]
    /// if no model is loaded.
    pub fn browse(&self, request: &BrowseRequest) -> Result<Page> {
        let current = self.current()?;
        browse(&current, request, &self.config.limits)
    }

    /// See [`ModelArtifact::find`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelUnavailable`] if no model is loaded.
    pub fn find(&self, id: &str) -> Result<Option<RecipeRecord>> {
        Ok(self.current()?.find(id).map(|(_, record)| record.clone()))
    }
}

impl std::fmt::Debug for RecommenderService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecommenderService")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
