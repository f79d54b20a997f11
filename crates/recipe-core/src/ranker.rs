//! Within-cluster ranking.
//!
//! Candidates are the records sharing the query's cluster. Distance is
//! Euclidean over the raw `(minutes, complexity_score, ingredient_count)`
//! values, not the normalized ones used to pick the cluster.

use serde::{Deserialize, Serialize};

use crate::cluster::euclidean_distance;
use crate::recipe::{FeatureVector, RecipeRecord};

/// One ranked recommendation.
///
/// Serializes with `food_recipe_id` first when present and
/// `detailed_ingredients` last when present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Position of the recipe in the artifact corpus.
    #[serde(skip)]
    pub row: usize,
    /// External catalogue identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub food_recipe_id: Option<i64>,
    /// Recipe name.
    pub name: String,
    /// Cook time in minutes.
    pub minutes: f64,
    /// Complexity score.
    pub complexity_score: f64,
    /// Raw-unit Euclidean distance to the query.
    pub similarity_distance: f64,
    /// Enriched ingredient lines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed_ingredients: Option<Vec<String>>,
}

/// Returns up to `n` members of `cluster`, nearest first.
///
/// The sort is stable, so equal distances keep corpus order. A cluster with
/// fewer than `n` members yields all of them.
#[must_use]
pub fn rank(
    records: &[RecipeRecord],
    cluster: usize,
    query: &FeatureVector,
    n: usize,
) -> Vec<Recommendation> {
    let mut candidates: Vec<(usize, f64)> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.cluster == cluster)
        .map(|(row, r)| (row, euclidean_distance(&r.features(), query)))
        .collect();
    candidates.sort_by(|a, b| a.1.total_cmp(&b.1));
    candidates.truncate(n);

    candidates
        .into_iter()
        .map(|(row, distance)| {
            let recipe = &records[row].recipe;
            Recommendation {
                row,
                food_recipe_id: recipe.food_recipe_id,
                name: recipe.name.clone(),
                minutes: recipe.minutes,
                complexity_score: recipe.complexity_score,
                similarity_distance: distance,
                detailed_ingredients: recipe.detailed_ingredients.clone(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::Recipe;

    fn record(id: i64, minutes: f64, cluster: usize) -> RecipeRecord {
        RecipeRecord {
            recipe: Recipe::new(id, format!("r{id}"), minutes, "a,b", "x"),
            cluster,
        }
    }

    #[test]
    fn test_rank_filters_and_orders() {
        let records = vec![
            record(0, 50.0, 0),
            record(1, 10.0, 1),
            record(2, 20.0, 0),
            record(3, 31.0, 0),
        ];
        let out = rank(&records, 0, &[30.0, 2.0, 2.0], 10);
        let rows: Vec<usize> = out.iter().map(|r| r.row).collect();
        assert_eq!(rows, vec![3, 2, 0]);
        assert!((out[0].similarity_distance - 1.0).abs() < 1e-12);
        assert!(out
            .windows(2)
            .all(|w| w[0].similarity_distance <= w[1].similarity_distance));
    }

    #[test]
    fn test_rank_truncates_and_keeps_ties_in_corpus_order() {
        let records = vec![
            record(0, 20.0, 0),
            record(1, 40.0, 0),
            record(2, 20.0, 0),
        ];
        let out = rank(&records, 0, &[30.0, 2.0, 2.0], 2);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].row, 0);
        assert_eq!(out[1].row, 1);
    }

    #[test]
    fn test_serialized_columns() {
        let records = vec![RecipeRecord {
            recipe: Recipe::new(7, "Stew", 90.0, "beef", "simmer")
                .with_food_recipe_id(123)
                .with_detailed_ingredients("['1 lb beef']"),
            cluster: 0,
        }];
        let out = rank(&records, 0, &[90.0, 1.0, 1.0], 1);
        let json = serde_json::to_string(&out[0]).unwrap();
        assert!(json.starts_with(r#"{"food_recipe_id":123,"name":"Stew""#));
        assert!(json.ends_with(r#""detailed_ingredients":["1 lb beef"]}"#));

        let plain = rank(&[record(1, 10.0, 0)], 0, &[10.0, 2.0, 2.0], 1);
        let json = serde_json::to_value(&plain[0]).unwrap();
        assert!(json.get("food_recipe_id").is_none());
        assert!(json.get("detailed_ingredients").is_none());
        assert!(json.get("row").is_none());
    }
}
