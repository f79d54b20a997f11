//! Paginated browsing that picks recommend, search, or the raw corpus
//! depending on which inputs are present.

use serde::{Deserialize, Serialize};

use crate::artifact::ModelArtifact;
use crate::config::LimitsConfig;
use crate::error::Result;
use crate::recipe::RecipeRecord;
use crate::validation::Preferences;

/// Cook time used when only other preferences are given.
pub const DEFAULT_BROWSE_TIME: f64 = 30.0;
/// Complexity used when only other preferences are given.
pub const DEFAULT_BROWSE_COMPLEXITY: f64 = 25.0;
/// Ingredient count used when only other preferences are given.
pub const DEFAULT_BROWSE_INGREDIENTS: f64 = 10.0;

/// A browse request. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowseRequest {
    /// Desired cook time.
    pub cook_time: Option<f64>,
    /// Desired complexity.
    pub complexity: Option<f64>,
    /// Desired ingredient count.
    pub ingredients: Option<f64>,
    /// Free-text query, used only when no preference is set.
    pub query: Option<String>,
    /// 1-based page number; 0 is treated as 1.
    pub page: usize,
    /// Page size; clamped to `[1, max_page_size]`, 0 means the default.
    pub limit: usize,
}

impl BrowseRequest {
    fn has_preferences(&self) -> bool {
        self.cook_time.is_some() || self.complexity.is_some() || self.ingredients.is_some()
    }

    fn query(&self) -> Option<&str> {
        self.query.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}

/// How a browse result was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowseMode {
    /// Cluster recommendation.
    Recommend,
    /// Text search.
    Search,
    /// Whole corpus in order.
    All,
}

/// One recipe on a browse page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowseItem {
    /// Display identifier: `food_recipe_id` when known, else the recipe id.
    pub id: String,
    /// Position in the artifact corpus.
    pub row: usize,
    /// Recipe name.
    pub name: String,
    /// Description, empty when unknown.
    pub description: String,
    /// Cook time in minutes.
    pub minutes: f64,
    /// Complexity score.
    pub complexity_score: f64,
    /// Enriched ingredient lines when present, else the basic list.
    pub ingredients: Vec<String>,
    /// Instruction steps.
    pub instructions: Vec<String>,
    /// Distance to the query (recommend mode only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_distance: Option<f64>,
    /// Relevance score (search mode only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<u8>,
}

impl BrowseItem {
    fn new(row: usize, record: &RecipeRecord) -> Self {
        let recipe = &record.recipe;
        Self {
            id: recipe
                .food_recipe_id
                .map_or_else(|| recipe.id.to_string(), |id| id.to_string()),
            row,
            name: recipe.name.clone(),
            description: recipe.description.clone().unwrap_or_default(),
            minutes: recipe.minutes,
            complexity_score: recipe.complexity_score,
            ingredients: record.display_ingredients().to_vec(),
            instructions: recipe.steps.clone(),
            similarity_distance: None,
            relevance_score: None,
        }
    }
}

/// One page of browse results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Items on this page.
    pub items: Vec<BrowseItem>,
    /// Size of the full result list.
    pub total: usize,
    /// Effective page number.
    pub page: usize,
    /// Effective page size.
    pub limit: usize,
    /// Whether a later page has items.
    pub has_more: bool,
    /// Which path produced the results.
    pub mode: BrowseMode,
}

/// Runs a browse request.
///
/// If any preference is set, missing ones default to
/// [`DEFAULT_BROWSE_TIME`], [`DEFAULT_BROWSE_COMPLEXITY`] and
/// [`DEFAULT_BROWSE_INGREDIENTS`] and the candidate list is the top
/// `limits.browse_candidates` recommendations. Otherwise a non-blank query
/// searches with the same candidate bound, and with neither the corpus is
/// listed in order.
///
/// # Errors
///
/// Returns an input error if a given preference is out of range.
pub fn browse(
    artifact: &ModelArtifact,
    request: &BrowseRequest,
    limits: &LimitsConfig,
) -> Result<Page> {
    let page = request.page.max(1);
    let limit = if request.limit == 0 {
        limits.default_results
    } else {
        request.limit
    }
    .clamp(1, limits.max_page_size.max(1));
    let start = (page - 1).saturating_mul(limit);

    let records = artifact.records();
    let (mode, total, items) = if request.has_preferences() {
        let prefs = Preferences::validate(
            request.cook_time.unwrap_or(DEFAULT_BROWSE_TIME),
            request.complexity.unwrap_or(DEFAULT_BROWSE_COMPLEXITY),
            request.ingredients.unwrap_or(DEFAULT_BROWSE_INGREDIENTS),
            limits.browse_candidates,
            limits,
        )?;
        let all = artifact.recommend(&prefs);
        let items = all
            .iter()
            .skip(start)
            .take(limit)
            .map(|rec| BrowseItem {
                similarity_distance: Some(rec.similarity_distance),
                ..BrowseItem::new(rec.row, &records[rec.row])
            })
            .collect();
        (BrowseMode::Recommend, all.len(), items)
    } else if let Some(query) = request.query() {
        let all = artifact.search_rows(query, limits.browse_candidates)?;
        let items = all
            .iter()
            .skip(start)
            .take(limit)
            .map(|&(row, score)| BrowseItem {
                relevance_score: Some(score),
                ..BrowseItem::new(row, &records[row])
            })
            .collect();
        (BrowseMode::Search, all.len(), items)
    } else {
        let items = records
            .iter()
            .enumerate()
            .skip(start)
            .take(limit)
            .map(|(row, record)| BrowseItem::new(row, record))
            .collect();
        (BrowseMode::All, records.len(), items)
    };

    tracing::debug!(?mode, total, page, limit, "Browsed");
    Ok(Page {
        items,
        total,
        page,
        limit,
        has_more: start.saturating_add(limit) < total,
        mode,
    })
}
