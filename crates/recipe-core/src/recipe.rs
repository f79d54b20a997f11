//! Recipe data model.
//!
//! A [`Recipe`] is a corpus row with its derived features resolved; it is
//! what the feature builder produces and what [`crate::fit`] consumes. A
//! [`RecipeRecord`] is a recipe after fitting, carrying the cluster label
//! assigned to it. Optional upstream columns are resolved once at
//! construction into `Option` members.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::list_field::ListField;

/// Stable recipe identifier, numeric or textual depending on the source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecipeId {
    /// Numeric identifier.
    Int(i64),
    /// Textual identifier.
    Text(String),
}

impl RecipeId {
    /// Parses an identifier, preferring the numeric form.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        raw.parse::<i64>()
            .map_or_else(|_| Self::Text(raw.to_string()), Self::Int)
    }
}

impl fmt::Display for RecipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for RecipeId {
    fn from(id: i64) -> Self {
        Self::Int(id)
    }
}

impl From<i32> for RecipeId {
    fn from(id: i32) -> Self {
        Self::Int(i64::from(id))
    }
}

impl From<usize> for RecipeId {
    fn from(id: usize) -> Self {
        i64::try_from(id).map_or_else(|_| Self::Text(id.to_string()), Self::Int)
    }
}

impl From<&str> for RecipeId {
    fn from(id: &str) -> Self {
        Self::parse(id)
    }
}

/// The three numeric features used for clustering and ranking, in the order
/// they are normalized.
pub const FEATURE_NAMES: [&str; 3] = ["minutes", "complexity_score", "ingredient_count"];

/// Number of clustering features.
pub const FEATURE_DIM: usize = FEATURE_NAMES.len();

/// A point in feature space: `[minutes, complexity_score, ingredient_count]`.
pub type FeatureVector = [f64; FEATURE_DIM];

/// A corpus row with derived features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    /// Stable identifier, unique within the corpus.
    pub id: RecipeId,
    /// Display name.
    pub name: String,
    /// Cook time in minutes.
    pub minutes: f64,
    /// Decoded ingredient list.
    pub ingredients: Vec<String>,
    /// Ingredient column as it was stored upstream, used for text search.
    pub ingredients_text: String,
    /// Decoded instruction steps.
    pub steps: Vec<String>,
    /// Number of ingredients.
    pub ingredient_count: u32,
    /// Steps times ingredients.
    pub complexity_score: f64,
    /// Mean interaction rating (0 when the recipe has no interactions).
    pub avg_rating: f64,
    /// Number of interactions.
    pub num_interactions: u32,
    /// Identifier in the external food catalogue, when known.
    pub food_recipe_id: Option<i64>,
    /// Enriched ingredient lines with quantities, when available.
    pub detailed_ingredients: Option<Vec<String>>,
    /// Free-text description, when available.
    pub description: Option<String>,
}

impl Recipe {
    /// Builds a recipe, decoding list fields and deriving `ingredient_count`
    /// and `complexity_score` from them.
    #[must_use]
    pub fn new(
        id: impl Into<RecipeId>,
        name: impl Into<String>,
        minutes: f64,
        ingredients: impl Into<ListField>,
        steps: impl Into<ListField>,
    ) -> Self {
        let ingredients = ingredients.into();
        let steps = steps.into();
        let decoded_ingredients = ingredients.decode();
        let decoded_steps = steps.decode();
        let ingredient_count = count_u32(decoded_ingredients.len());
        let complexity_score =
            f64::from(count_u32(decoded_steps.len())) * f64::from(ingredient_count);

        Self {
            id: id.into(),
            name: name.into(),
            minutes,
            ingredients_text: ingredients.raw_text(),
            ingredients: decoded_ingredients,
            steps: decoded_steps,
            ingredient_count,
            complexity_score,
            avg_rating: 0.0,
            num_interactions: 0,
            food_recipe_id: None,
            detailed_ingredients: None,
            description: None,
        }
    }

    /// Overrides the complexity score (e.g. from precomputed step/ingredient
    /// counts).
    #[must_use]
    pub fn with_complexity(mut self, complexity_score: f64) -> Self {
        self.complexity_score = complexity_score;
        self
    }

    /// Sets the external catalogue identifier.
    #[must_use]
    pub fn with_food_recipe_id(mut self, food_recipe_id: i64) -> Self {
        self.food_recipe_id = Some(food_recipe_id);
        self
    }

    /// Sets enriched ingredient lines.
    #[must_use]
    pub fn with_detailed_ingredients(mut self, detailed: impl Into<ListField>) -> Self {
        let decoded = detailed.into().decode();
        self.detailed_ingredients = (!decoded.is_empty()).then_some(decoded);
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns the clustering features in [`FEATURE_NAMES`] order.
    #[must_use]
    pub fn features(&self) -> FeatureVector {
        [
            self.minutes,
            self.complexity_score,
            f64::from(self.ingredient_count),
        ]
    }

    /// Returns the ingredient lines to show a user: the enriched lines when
    /// present, otherwise the basic ingredient list.
    #[must_use]
    pub fn display_ingredients(&self) -> &[String] {
        self.detailed_ingredients
            .as_deref()
            .unwrap_or(&self.ingredients)
    }
}

/// A recipe inside a fitted artifact, labelled with its cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeRecord {
    /// The recipe.
    pub recipe: Recipe,
    /// Cluster label assigned at fit time.
    pub cluster: usize,
}

impl RecipeRecord {
    /// Returns the clustering features of the underlying recipe.
    #[must_use]
    pub fn features(&self) -> FeatureVector {
        self.recipe.features()
    }

    /// See [`Recipe::display_ingredients`].
    #[must_use]
    pub fn display_ingredients(&self) -> &[String] {
        self.recipe.display_ingredients()
    }
}

pub(crate) fn count_u32(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}
