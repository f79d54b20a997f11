//! Table and JSON rendering.

use clap::ValueEnum;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table};
use recipe_core::{ArtifactSummary, BrowseItem, ParsedIngredient, Recommendation, SearchHit};
use serde::Serialize;

/// How command results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.iter().map(|h| Cell::new(*h)));
    table
}

fn id_cell(food_recipe_id: Option<i64>) -> String {
    food_recipe_id.map_or_else(|| "-".to_string(), |id| id.to_string())
}

pub fn recommendations_table(recs: &[Recommendation]) -> Table {
    let mut table = new_table(&["#", "Id", "Name", "Minutes", "Complexity", "Distance"]);
    for (rank, rec) in recs.iter().enumerate() {
        table.add_row(vec![
            (rank + 1).to_string(),
            id_cell(rec.food_recipe_id),
            rec.name.clone(),
            format!("{:.0}", rec.minutes),
            format!("{:.0}", rec.complexity_score),
            format!("{:.3}", rec.similarity_distance),
        ]);
    }
    table
}

pub fn search_table(hits: &[SearchHit]) -> Table {
    let mut table = new_table(&["#", "Id", "Name", "Minutes", "Relevance"]);
    for (rank, hit) in hits.iter().enumerate() {
        let recipe = &hit.record.recipe;
        table.add_row(vec![
            (rank + 1).to_string(),
            recipe.id.to_string(),
            recipe.name.clone(),
            format!("{:.0}", recipe.minutes),
            hit.relevance_score.to_string(),
        ]);
    }
    table
}

pub fn browse_table(items: &[BrowseItem]) -> Table {
    let mut table = new_table(&["Id", "Name", "Minutes", "Complexity", "Score"]);
    for item in items {
        let score = match (item.similarity_distance, item.relevance_score) {
            (Some(distance), _) => format!("{distance:.3}"),
            (None, Some(relevance)) => relevance.to_string(),
            (None, None) => String::new(),
        };
        table.add_row(vec![
            item.id.clone(),
            item.name.clone(),
            format!("{:.0}", item.minutes),
            format!("{:.0}", item.complexity_score),
            score,
        ]);
    }
    table
}

pub fn ingredients_table(parsed: &[ParsedIngredient]) -> Table {
    let mut table = new_table(&["Quantity", "Unit", "Ingredient", "Preparation"]);
    for line in parsed {
        table.add_row(vec![
            format_quantity(line.quantity),
            line.unit.clone(),
            line.name.clone(),
            line.preparation.clone().unwrap_or_default(),
        ]);
    }
    table
}

pub fn clusters_table(summary: &ArtifactSummary) -> Table {
    let mut header = vec!["Cluster", "Size"];
    header.extend(summary.feature_names.iter().map(String::as_str));
    let mut table = new_table(&header);
    for (cluster, (size, centroid)) in summary
        .cluster_sizes
        .iter()
        .zip(&summary.centroids)
        .enumerate()
    {
        let mut row = vec![cluster.to_string(), size.to_string()];
        row.extend(centroid.iter().map(|v| format!("{v:.2}")));
        table.add_row(row);
    }
    table
}

fn format_quantity(quantity: f64) -> String {
    if quantity.fract().abs() < f64::EPSILON {
        format!("{quantity:.0}")
    } else {
        format!("{quantity:.2}")
    }
}
