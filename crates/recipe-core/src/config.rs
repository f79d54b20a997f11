//! Configuration for the recommender.
//!
//! Values are layered with `figment`, later sources winning:
//!
//! 1. Built-in defaults ([`RecommenderConfig::default`])
//! 2. An optional TOML file (conventionally `recipes.toml`)
//! 3. Environment variables prefixed with `RECIPES_`, using `__` between the
//!    section and the key (e.g. `RECIPES_MODEL__N_CLUSTERS=8`)
//!
//! # Example
//!
//! ```toml
//! [model]
//! n_clusters = 6
//! seed = 42
//!
//! [limits]
//! time_max = 300.0
//!
//! [quality]
//! min_avg_rating = 4.0
//! ```

use std::path::Path;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "RECIPES_";

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or did not match the schema.
    #[error("Failed to load configuration: {0}")]
    Load(String),

    /// A value is present but not acceptable.
    #[error("Invalid value for '{key}': {message}")]
    InvalidValue {
        /// Dotted configuration key.
        key: String,
        /// What is wrong with it.
        message: String,
    },
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Load(err.to_string())
    }
}

/// Clustering parameters used at training time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Number of clusters (k).
    pub n_clusters: usize,
    /// Seed for centroid initialization.
    pub seed: u64,
    /// Maximum Lloyd iterations per run.
    pub max_iter: usize,
    /// Convergence threshold on centroid movement (normalized units).
    pub tolerance: f64,
    /// Number of independent initializations; the lowest inertia wins.
    pub n_init: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            n_clusters: 6,
            seed: 42,
            max_iter: 300,
            tolerance: 1e-4,
            n_init: 1,
        }
    }
}

/// Accepted input ranges and result-size defaults at serving time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Lowest accepted desired cook time (minutes).
    pub time_min: f64,
    /// Highest accepted desired cook time (minutes).
    pub time_max: f64,
    /// Lowest accepted desired complexity.
    pub complexity_min: f64,
    /// Highest accepted desired complexity.
    pub complexity_max: f64,
    /// Lowest accepted desired ingredient count.
    pub ingredients_min: f64,
    /// Highest accepted desired ingredient count.
    pub ingredients_max: f64,
    /// Recommendations returned when the caller does not ask for a number.
    pub default_recommendations: usize,
    /// Search results returned when the caller does not ask for a number.
    pub default_results: usize,
    /// Upper bound on a browse page.
    pub max_page_size: usize,
    /// Candidate pool size used by browse before pagination.
    pub browse_candidates: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            time_min: 0.0,
            time_max: 300.0,
            complexity_min: 0.0,
            complexity_max: 100.0,
            ingredients_min: 1.0,
            ingredients_max: 50.0,
            default_recommendations: 20,
            default_results: 20,
            max_page_size: 100,
            browse_candidates: 1000,
        }
    }
}

/// Training-time quality gate applied by the feature builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Recipes with a higher complexity score are dropped.
    pub max_complexity: f64,
    /// Recipes with a lower average rating are dropped.
    pub min_avg_rating: f64,
    /// Recipes with fewer interactions are dropped.
    pub min_interactions: u32,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            max_complexity: 100.0,
            min_avg_rating: 4.0,
            min_interactions: 3,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Logging configuration consumed by binaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Top-level recommender configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommenderConfig {
    /// Clustering parameters.
    pub model: ModelConfig,
    /// Serving limits.
    pub limits: LimitsConfig,
    /// Training quality gate.
    pub quality: QualityConfig,
    /// Logging.
    pub logging: LoggingConfig,
}

impl RecommenderConfig {
    /// Loads configuration from defaults, an optional TOML file, and the
    /// environment, then validates it.
    ///
    /// A missing file is not an error; figment treats it as an empty source.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        let config: Self = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Parses configuration from a TOML string layered over the defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::string(content))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Renders the configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Load(e.to_string()))
    }

    /// Checks cross-field consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let model = &self.model;
        if model.n_clusters < 2 {
            return Err(invalid("model.n_clusters", "must be at least 2"));
        }
        if model.max_iter == 0 {
            return Err(invalid("model.max_iter", "must be greater than 0"));
        }
        if model.n_init == 0 {
            return Err(invalid("model.n_init", "must be greater than 0"));
        }
        if !(model.tolerance.is_finite() && model.tolerance > 0.0) {
            return Err(invalid("model.tolerance", "must be a positive number"));
        }

        let limits = &self.limits;
        check_bounds("limits.time", limits.time_min, limits.time_max)?;
        check_bounds(
            "limits.complexity",
            limits.complexity_min,
            limits.complexity_max,
        )?;
        check_bounds(
            "limits.ingredients",
            limits.ingredients_min,
            limits.ingredients_max,
        )?;
        if limits.default_recommendations == 0 {
            return Err(invalid("limits.default_recommendations", "must be positive"));
        }
        if limits.default_results == 0 {
            return Err(invalid("limits.default_results", "must be positive"));
        }
        if limits.max_page_size == 0 {
            return Err(invalid("limits.max_page_size", "must be positive"));
        }
        if limits.browse_candidates == 0 {
            return Err(invalid("limits.browse_candidates", "must be positive"));
        }

        if !self.quality.max_complexity.is_finite() {
            return Err(invalid("quality.max_complexity", "must be finite"));
        }
        if !self.quality.min_avg_rating.is_finite() {
            return Err(invalid("quality.min_avg_rating", "must be finite"));
        }
        Ok(())
    }
}

fn check_bounds(key: &str, min: f64, max: f64) -> Result<(), ConfigError> {
    if !(min.is_finite() && max.is_finite()) {
        return Err(invalid(key, "bounds must be finite"));
    }
    if min > max {
        return Err(invalid(
            key,
            format!("minimum {min} is greater than maximum {max}"),
        ));
    }
    Ok(())
}

fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.into(),
    }
}
