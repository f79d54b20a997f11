//! Subcommand handlers.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use recipe_core::ingredient::parse_ingredient_lines;
use recipe_core::validation::validate_numeric_str;
use recipe_core::{
    BrowseRequest, FeatureBuilder, ModelArtifact, ParsedIngredient, RawTable, RecipeRecord,
    RecommenderConfig, RecommenderService,
};
use serde::Serialize;

use crate::output::{self, OutputFormat};

pub struct TrainArgs {
    pub recipes: PathBuf,
    pub interactions: Option<PathBuf>,
    pub no_quality_gate: bool,
    pub clusters: Option<usize>,
    pub output: PathBuf,
}

fn open_service(config: RecommenderConfig, model: &Path) -> Result<RecommenderService> {
    RecommenderService::load(config, model)
        .with_context(|| format!("Failed to load model artifact {}", model.display()))
}

pub fn train(mut config: RecommenderConfig, args: &TrainArgs, format: OutputFormat) -> Result<()> {
    if let Some(k) = args.clusters {
        config.model.n_clusters = k;
    }

    let recipes = RawTable::from_csv_path(&args.recipes)
        .with_context(|| format!("Failed to read recipes from {}", args.recipes.display()))?;
    let interactions = args
        .interactions
        .as_ref()
        .map(|path| {
            RawTable::from_csv_path(path)
                .with_context(|| format!("Failed to read interactions from {}", path.display()))
        })
        .transpose()?;

    let mut builder = FeatureBuilder::new(config.quality);
    if args.no_quality_gate {
        builder = builder.without_quality_gate();
    }
    let corpus = builder
        .build_from_tables(&recipes, interactions.as_ref())
        .context("Failed to build recipe features")?;
    tracing::info!(
        rows = recipes.len(),
        kept = corpus.len(),
        "Built training corpus"
    );

    let start = Instant::now();
    let artifact = ModelArtifact::fit(corpus, &config.model).context("Failed to fit model")?;
    let elapsed = start.elapsed();
    artifact
        .save(&args.output)
        .with_context(|| format!("Failed to save artifact to {}", args.output.display()))?;

    let summary = artifact.summary();
    match format {
        OutputFormat::Json => output::print_json(&summary)?,
        OutputFormat::Table => {
            println!("{}", "Model trained".green().bold());
            println!("  Recipes:    {}", summary.n_records);
            println!("  Clusters:   {}", summary.n_clusters);
            println!("  Iterations: {}", summary.iterations);
            println!("  Inertia:    {:.4}", summary.inertia);
            println!("  Time:       {:.2?}", elapsed);
            println!("  Saved to:   {}", args.output.display().to_string().cyan());
        }
    }
    Ok(())
}

pub fn recommend(
    config: RecommenderConfig,
    model: &Path,
    [time, complexity, ingredients]: [&str; 3],
    n: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    let limits = &config.limits;
    let time = validate_numeric_str(
        time,
        limits.time_min,
        limits.time_max,
        "desired cooking time",
    )?;
    let complexity = validate_numeric_str(
        complexity,
        limits.complexity_min,
        limits.complexity_max,
        "desired complexity",
    )?;
    let ingredients = validate_numeric_str(
        ingredients,
        limits.ingredients_min,
        limits.ingredients_max,
        "desired ingredients",
    )?;

    let service = open_service(config, model)?;
    let recs = service.recommend(time, complexity, ingredients, n)?;
    match format {
        OutputFormat::Json => output::print_json(&recs)?,
        OutputFormat::Table if recs.is_empty() => println!("No recommendations.\n"),
        OutputFormat::Table => println!("{}", output::recommendations_table(&recs)),
    }
    Ok(())
}

pub fn search(
    config: RecommenderConfig,
    model: &Path,
    query: &str,
    n: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    let service = open_service(config, model)?;
    let hits = service.search(query, n)?;
    match format {
        OutputFormat::Json => output::print_json(&hits)?,
        OutputFormat::Table if hits.is_empty() => println!("No recipes match '{query}'.\n"),
        OutputFormat::Table => println!("{}", output::search_table(&hits)),
    }
    Ok(())
}

pub fn browse(
    config: RecommenderConfig,
    model: &Path,
    request: &BrowseRequest,
    format: OutputFormat,
) -> Result<()> {
    let service = open_service(config, model)?;
    let page = service.browse(request)?;
    match format {
        OutputFormat::Json => output::print_json(&page)?,
        OutputFormat::Table => {
            println!("{}", output::browse_table(&page.items));
            println!(
                "Page {} ({} per page, {} total, mode: {:?}){}",
                page.page,
                page.limit,
                page.total,
                page.mode,
                if page.has_more { ", more available" } else { "" }
            );
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct RecipeDetail<'a> {
    #[serde(flatten)]
    record: &'a RecipeRecord,
    parsed_ingredients: Vec<ParsedIngredient>,
}

pub fn show(config: RecommenderConfig, model: &Path, id: &str, format: OutputFormat) -> Result<()> {
    let service = open_service(config, model)?;
    let Some(record) = service.find(id)? else {
        bail!("No recipe with id '{id}'");
    };
    let parsed = parse_ingredient_lines(record.display_ingredients());

    if format == OutputFormat::Json {
        return output::print_json(&RecipeDetail {
            record: &record,
            parsed_ingredients: parsed,
        });
    }

    let recipe = &record.recipe;
    println!("{} {}", "Recipe:".bold(), recipe.name.green());
    println!("  Id:           {}", recipe.id);
    if let Some(food_id) = recipe.food_recipe_id {
        println!("  Catalogue id: {food_id}");
    }
    println!("  Minutes:      {:.0}", recipe.minutes);
    println!("  Complexity:   {:.0}", recipe.complexity_score);
    println!("  Ingredients:  {}", recipe.ingredient_count);
    println!(
        "  Rating:       {:.2} ({} interactions)",
        recipe.avg_rating, recipe.num_interactions
    );
    println!("  Cluster:      {}", record.cluster);
    if let Some(description) = recipe.description.as_deref().filter(|d| !d.is_empty()) {
        println!("\n{description}");
    }
    println!("\n{}", "Ingredients:".bold());
    println!("{}", output::ingredients_table(&parsed));
    println!("{}", "Steps:".bold());
    for (i, step) in recipe.steps.iter().enumerate() {
        println!("  {}. {step}", i + 1);
    }
    println!();
    Ok(())
}

pub fn info(config: RecommenderConfig, model: &Path, format: OutputFormat) -> Result<()> {
    let service = open_service(config, model)?;
    let summary = service.current()?.summary();
    match format {
        OutputFormat::Json => output::print_json(&summary)?,
        OutputFormat::Table => {
            println!("{} {}", "Model:".bold(), model.display().to_string().green());
            println!("  Recipes:    {}", summary.n_records);
            println!("  Clusters:   {}", summary.n_clusters);
            println!("  Seed:       {}", summary.seed);
            println!("  Iterations: {}", summary.iterations);
            println!("  Inertia:    {:.4}", summary.inertia);
            println!("{}", output::clusters_table(&summary));
        }
    }
    Ok(())
}
