//! Feature building.
//!
//! Turns raw recipe rows and interaction rows into [`Recipe`] values with
//! `avg_rating`, `num_interactions`, `ingredient_count` and
//! `complexity_score` resolved, then applies the training-time quality gate.

use std::collections::HashMap;

use crate::config::QualityConfig;
use crate::error::{Error, Result};
use crate::recipe::{count_u32, Recipe, RecipeId};
use crate::table::{Interaction, RawRecipe, RawTable};

/// Per-recipe interaction aggregate.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InteractionStats {
    /// Sum of non-missing ratings.
    pub rating_sum: f64,
    /// Number of non-missing ratings.
    pub rated: u32,
    /// Number of interactions, rated or not.
    pub count: u32,
}

impl InteractionStats {
    /// Mean rating, or `None` if no interaction carried a rating.
    #[must_use]
    pub fn avg_rating(&self) -> Option<f64> {
        (self.rated > 0).then(|| self.rating_sum / f64::from(self.rated))
    }
}

/// Aggregates interactions per recipe id.
#[must_use]
pub fn aggregate_interactions(
    interactions: &[Interaction],
) -> HashMap<RecipeId, InteractionStats> {
    let mut stats: HashMap<RecipeId, InteractionStats> = HashMap::new();
    for interaction in interactions {
        let entry = stats.entry(interaction.recipe_id.clone()).or_default();
        entry.count = entry.count.saturating_add(1);
        if let Some(rating) = interaction.rating {
            entry.rating_sum += rating;
            entry.rated = entry.rated.saturating_add(1);
        }
    }
    stats
}

/// Builds the training corpus from raw tables.
#[derive(Debug, Clone)]
pub struct FeatureBuilder {
    quality: QualityConfig,
    gate: bool,
}

impl FeatureBuilder {
    /// Creates a builder that filters with `quality`.
    #[must_use]
    pub fn new(quality: QualityConfig) -> Self {
        Self {
            quality,
            gate: true,
        }
    }

    /// Disables the quality gate; every recipe with usable features is kept.
    #[must_use]
    pub fn without_quality_gate(mut self) -> Self {
        self.gate = false;
        self
    }

    /// Builds the corpus from string tables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] if a required column is missing and
    /// [`Error::MissingFeature`] if a row has no cook time.
    pub fn build_from_tables(
        &self,
        recipes: &RawTable,
        interactions: Option<&RawTable>,
    ) -> Result<Vec<Recipe>> {
        let recipes = recipes.recipes()?;
        let interactions = match interactions {
            Some(table) => table.interactions()?,
            None => Vec::new(),
        };
        self.build(recipes, &interactions)
    }

    /// Builds the corpus from typed rows.
    ///
    /// `avg_rating` and `num_interactions` are left-joined on the recipe id
    /// and default to 0. `complexity_score` is `n_steps * n_ingredients`,
    /// taken from the precomputed columns when both are present and from the
    /// decoded lists otherwise. Output preserves input order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingFeature`] if a row has no finite, non-negative
    /// cook time.
    pub fn build(
        &self,
        recipes: Vec<RawRecipe>,
        interactions: &[Interaction],
    ) -> Result<Vec<Recipe>> {
        let _span = tracing::info_span!("build_features", recipes = recipes.len()).entered();
        let stats = aggregate_interactions(interactions);
        let total = recipes.len();

        let mut corpus = Vec::with_capacity(total);
        for (row, raw) in recipes.into_iter().enumerate() {
            let recipe = Self::resolve(row, raw, &stats)?;
            if !self.gate || self.passes(&recipe) {
                corpus.push(recipe);
            }
        }

        tracing::info!(
            input = total,
            kept = corpus.len(),
            gated = self.gate,
            "Built recipe features"
        );
        Ok(corpus)
    }

    /// Returns true if `recipe` passes the quality gate.
    #[must_use]
    pub fn passes(&self, recipe: &Recipe) -> bool {
        recipe.complexity_score <= self.quality.max_complexity
            && recipe.avg_rating >= self.quality.min_avg_rating
            && recipe.num_interactions >= self.quality.min_interactions
    }

    fn resolve(
        row: usize,
        raw: RawRecipe,
        stats: &HashMap<RecipeId, InteractionStats>,
    ) -> Result<Recipe> {
        let minutes = raw
            .minutes
            .filter(|m| m.is_finite() && *m >= 0.0)
            .ok_or(Error::MissingFeature {
                row,
                feature: "minutes",
            })?;

        let mut recipe = Recipe::new(raw.id, raw.name, minutes, raw.ingredients, raw.steps);
        if let (Some(steps), Some(ingredients)) = (raw.n_steps, raw.n_ingredients) {
            recipe = recipe.with_complexity(f64::from(steps) * f64::from(ingredients));
        } else if let Some(steps) = raw.n_steps {
            let complexity = f64::from(steps) * f64::from(recipe.ingredient_count);
            recipe = recipe.with_complexity(complexity);
        } else if let Some(ingredients) = raw.n_ingredients {
            let complexity = f64::from(count_u32(recipe.steps.len())) * f64::from(ingredients);
            recipe = recipe.with_complexity(complexity);
        }
        if let Some(id) = raw.food_recipe_id {
            recipe = recipe.with_food_recipe_id(id);
        }
        if let Some(detailed) = raw.detailed_ingredients {
            recipe = recipe.with_detailed_ingredients(detailed);
        }
        if let Some(description) = raw.description {
            recipe = recipe.with_description(description);
        }

        if let Some(s) = stats.get(&recipe.id) {
            recipe.avg_rating = s.avg_rating().unwrap_or(0.0);
            recipe.num_interactions = s.count;
        }
        Ok(recipe)
    }
}

impl Default for FeatureBuilder {
    fn default() -> Self {
        Self::new(QualityConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list_field::ListField;

    fn raw(id: i64, minutes: Option<f64>, n_steps: u32, n_ingredients: u32) -> RawRecipe {
        RawRecipe {
            id: RecipeId::Int(id),
            name: format!("recipe {id}"),
            minutes,
            ingredients: ListField::from("['a', 'b']"),
            steps: ListField::from("['mix']"),
            n_steps: Some(n_steps),
            n_ingredients: Some(n_ingredients),
            food_recipe_id: None,
            detailed_ingredients: None,
            description: None,
        }
    }

    fn ratings(id: i64, values: &[f64]) -> Vec<Interaction> {
        values.iter().map(|r| Interaction::new(id, *r)).collect()
    }

    #[test]
    fn test_left_join_defaults_to_zero() {
        let corpus = FeatureBuilder::default()
            .without_quality_gate()
            .build(vec![raw(1, Some(10.0), 2, 3)], &[])
            .unwrap();
        assert_eq!(corpus[0].avg_rating, 0.0);
        assert_eq!(corpus[0].num_interactions, 0);
        assert_eq!(corpus[0].complexity_score, 6.0);
    }

    #[test]
    fn test_quality_gate() {
        let mut interactions = ratings(1, &[5.0, 4.0, 4.0]);
        interactions.extend(ratings(2, &[5.0, 5.0]));
        interactions.extend(ratings(3, &[2.0, 3.0, 4.0]));
        interactions.extend(ratings(4, &[5.0, 5.0, 5.0]));

        let recipes = vec![
            raw(1, Some(10.0), 5, 5),
            raw(2, Some(10.0), 5, 5),
            raw(3, Some(10.0), 5, 5),
            raw(4, Some(10.0), 11, 10),
        ];
        let corpus = FeatureBuilder::default().build(recipes, &interactions).unwrap();

        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus[0].id, RecipeId::Int(1));
        assert!((corpus[0].avg_rating - 13.0 / 3.0).abs() < 1e-12);
        assert_eq!(corpus[0].num_interactions, 3);
    }

    #[test]
    fn test_unrated_interactions_count_but_do_not_rate() {
        let interactions = vec![
            Interaction::new(1, 4.0),
            Interaction {
                recipe_id: RecipeId::Int(1),
                rating: None,
            },
        ];
        let stats = aggregate_interactions(&interactions);
        let s = stats[&RecipeId::Int(1)];
        assert_eq!(s.count, 2);
        assert_eq!(s.avg_rating(), Some(4.0));
    }

    #[test]
    fn test_complexity_falls_back_to_decoded_lists() {
        let mut r = raw(1, Some(10.0), 0, 0);
        r.n_steps = None;
        r.n_ingredients = None;
        let corpus = FeatureBuilder::default()
            .without_quality_gate()
            .build(vec![r], &[])
            .unwrap();
        assert_eq!(corpus[0].complexity_score, 2.0);
        assert_eq!(corpus[0].ingredient_count, 2);
    }

    #[test]
    fn test_complexity_with_only_step_count_uses_decoded_ingredients() {
        let mut r = raw(1, Some(10.0), 4, 0);
        r.n_ingredients = None;
        let corpus = FeatureBuilder::default()
            .without_quality_gate()
            .build(vec![r], &[])
            .unwrap();
        // 4 steps x 2 decoded ingredients
        assert_eq!(corpus[0].complexity_score, 8.0);
    }

    #[test]
    fn test_complexity_with_only_ingredient_count_uses_decoded_steps() {
        let mut r = raw(1, Some(10.0), 0, 6);
        r.n_steps = None;
        let corpus = FeatureBuilder::default()
            .without_quality_gate()
            .build(vec![r], &[])
            .unwrap();
        // 1 decoded step x 6 ingredients
        assert_eq!(corpus[0].complexity_score, 6.0);
    }

    #[test]
    fn test_missing_minutes_aborts() {
        let err = FeatureBuilder::default()
            .build(vec![raw(1, Some(5.0), 1, 1), raw(2, None, 1, 1)], &[])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::MissingFeature {
                row: 1,
                feature: "minutes"
            }
        ));
    }
}
