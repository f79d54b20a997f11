//! Relevance-scored text search over recipe names and ingredients.
//!
//! Matching is a case-insensitive literal substring test. A name match is
//! worth 2 points and an ingredient match 1, so a hit scores 1, 2 or 3.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::recipe::RecipeRecord;
use crate::validation::validate_positive_count;

/// Score for a match in the recipe name.
pub const NAME_MATCH_SCORE: u8 = 2;
/// Score for a match in the ingredient text.
pub const INGREDIENT_MATCH_SCORE: u8 = 1;

/// One search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Position of the recipe in the artifact corpus.
    #[serde(skip)]
    pub row: usize,
    /// Sum of name and ingredient match scores.
    pub relevance_score: u8,
    /// The matched recipe.
    pub record: RecipeRecord,
}

/// Lowercased search text, one entry per corpus row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextSearchIndex {
    names: Vec<String>,
    ingredients: Vec<String>,
}

impl TextSearchIndex {
    /// Builds the index over `records`, preserving corpus order.
    #[must_use]
    pub fn build(records: &[RecipeRecord]) -> Self {
        let (names, ingredients) = records
            .iter()
            .map(|r| {
                (
                    r.recipe.name.to_lowercase(),
                    r.recipe.ingredients_text.to_lowercase(),
                )
            })
            .unzip();
        Self { names, ingredients }
    }

    /// Number of indexed rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Returns `(row, score)` for every match, best first, ties in corpus
    /// order, truncated to `n`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyQuery`] for a blank query and
    /// [`Error::InvalidInput`] if `n` is zero.
    pub fn matches(&self, query: &str, n: usize) -> Result<Vec<(usize, u8)>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::EmptyQuery);
        }
        validate_positive_count(n, "number of results")?;
        let query = query.to_lowercase();

        let mut scored: Vec<(usize, u8)> = self
            .names
            .iter()
            .zip(&self.ingredients)
            .enumerate()
            .filter_map(|(row, (name, ingredients))| {
                let mut score = 0;
                if name.contains(&query) {
                    score += NAME_MATCH_SCORE;
                }
                if ingredients.contains(&query) {
                    score += INGREDIENT_MATCH_SCORE;
                }
                (score > 0).then_some((row, score))
            })
            .collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1));
        scored.truncate(n);
        Ok(scored)
    }

    /// Runs [`Self::matches`] and resolves rows against `records`.
    ///
    /// # Errors
    ///
    /// See [`Self::matches`].
    pub fn search(
        &self,
        records: &[RecipeRecord],
        query: &str,
        n: usize,
    ) -> Result<Vec<SearchHit>> {
        Ok(self
            .matches(query, n)?
            .into_iter()
            .filter_map(|(row, relevance_score)| {
                records.get(row).map(|record| SearchHit {
                    row,
                    relevance_score,
                    record: record.clone(),
                })
            })
            .collect())
    }
}
