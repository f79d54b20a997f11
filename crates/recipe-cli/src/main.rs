//! Recipe recommender CLI
//!
//! Trains model artifacts from CSV tables and queries them offline.

mod commands;
mod output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use recipe_core::config::{LogFormat, LoggingConfig};
use recipe_core::RecommenderConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "recipes")]
#[command(about = "Clustering-based recipe recommender")]
#[command(version)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true, env = "RECIPES_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build features from CSV tables, fit a model and save the artifact
    Train {
        /// Recipe table (CSV)
        #[arg(short, long)]
        recipes: PathBuf,

        /// Interaction table (CSV) with recipe_id and rating columns
        #[arg(short, long)]
        interactions: Option<PathBuf>,

        /// Keep every recipe regardless of rating, popularity and complexity
        #[arg(long)]
        no_quality_gate: bool,

        /// Number of clusters (overrides model.n_clusters)
        #[arg(short = 'k', long)]
        clusters: Option<usize>,

        /// Output artifact file
        #[arg(short, long, default_value = "model.rcpm")]
        output: PathBuf,
    },

    /// Recommend recipes near the desired time, complexity and ingredient count
    Recommend {
        /// Trained artifact
        #[arg(short, long, default_value = "model.rcpm")]
        model: PathBuf,

        /// Desired cooking time in minutes
        #[arg(short, long, allow_hyphen_values = true)]
        time: String,

        /// Desired complexity score
        #[arg(short, long, allow_hyphen_values = true)]
        complexity: String,

        /// Desired number of ingredients
        #[arg(short, long, allow_hyphen_values = true)]
        ingredients: String,

        /// Number of recommendations
        #[arg(short)]
        n: Option<usize>,
    },

    /// Search recipe names and ingredients
    Search {
        /// Trained artifact
        #[arg(short, long, default_value = "model.rcpm")]
        model: PathBuf,

        /// Search text
        query: String,

        /// Number of results
        #[arg(short)]
        n: Option<usize>,
    },

    /// Page through recommendations, search results or the whole corpus
    Browse {
        /// Trained artifact
        #[arg(short, long, default_value = "model.rcpm")]
        model: PathBuf,

        /// Desired cooking time in minutes
        #[arg(long)]
        time: Option<f64>,

        /// Desired complexity score
        #[arg(long)]
        complexity: Option<f64>,

        /// Desired number of ingredients
        #[arg(long)]
        ingredients: Option<f64>,

        /// Search text, used when no preference is given
        #[arg(short, long)]
        query: Option<String>,

        /// Page number (1-based)
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Page size
        #[arg(long, default_value_t = 0)]
        limit: usize,
    },

    /// Show one recipe with its parsed ingredient lines
    Show {
        /// Trained artifact
        #[arg(short, long, default_value = "model.rcpm")]
        model: PathBuf,

        /// Catalogue id, recipe id or row number
        id: String,
    },

    /// Display artifact information
    Info {
        /// Trained artifact
        #[arg(short, long, default_value = "model.rcpm")]
        model: PathBuf,
    },
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let registry = tracing_subscriber::registry().with(filter);
    // stdout carries command output; logs go to stderr.
    match logging.format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = RecommenderConfig::load(cli.config.as_deref())
        .context("Failed to load configuration")?;
    init_tracing(&config.logging);

    let format = cli.format;
    match cli.command {
        Commands::Train {
            recipes,
            interactions,
            no_quality_gate,
            clusters,
            output,
        } => commands::train(
            config,
            &commands::TrainArgs {
                recipes,
                interactions,
                no_quality_gate,
                clusters,
                output,
            },
            format,
        ),
        Commands::Recommend {
            model,
            time,
            complexity,
            ingredients,
            n,
        } => commands::recommend(
            config,
            &model,
            [time.as_str(), complexity.as_str(), ingredients.as_str()],
            n,
            format,
        ),
        Commands::Search { model, query, n } => {
            commands::search(config, &model, &query, n, format)
        }
        Commands::Browse {
            model,
            time,
            complexity,
            ingredients,
            query,
            page,
            limit,
        } => commands::browse(
            config,
            &model,
            &recipe_core::BrowseRequest {
                cook_time: time,
                complexity,
                ingredients,
                query,
                page,
                limit,
            },
            format,
        ),
        Commands::Show { model, id } => commands::show(config, &model, &id, format),
        Commands::Info { model } => commands::info(config, &model, format),
    }
}
