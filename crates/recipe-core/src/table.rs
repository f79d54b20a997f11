//! Raw tabular input.
//!
//! Recipe and interaction tables arrive as CSV exports with loosely typed
//! columns. [`RawTable`] holds them as strings; [`RawTable::recipes`] and
//! [`RawTable::interactions`] resolve the columns into typed rows exactly
//! once, so nothing downstream re-checks which optional columns exist.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};
use crate::list_field::ListField;
use crate::recipe::RecipeId;
use crate::validation::validate_recipe_schema;

/// A string-typed table with named columns.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    headers: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Builds a table from headers and rows.
    #[must_use]
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let index = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_string(), i))
            .collect();
        Self {
            headers,
            index,
            rows,
        }
    }

    /// Reads a headered CSV stream.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers = csv.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in csv.records() {
            rows.push(record?.iter().map(str::to_string).collect());
        }
        Ok(Self::new(headers, rows))
    }

    /// Reads a headered CSV file.
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        let table = Self::from_csv_reader(std::io::BufReader::new(file))?;
        tracing::debug!(
            path = %path.as_ref().display(),
            rows = table.len(),
            columns = table.headers.len(),
            "Loaded table"
        );
        Ok(table)
    }

    /// Column names in file order.
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Raw rows.
    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column, if present.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Resolves the table into typed recipe rows.
    ///
    /// Requires `name`, `minutes`, `ingredients` and `steps`. Picks up `id`,
    /// `n_steps`, `n_ingredients`, `food_recipe_id`, `detailed_ingredients`
    /// (or `enriched_ingredients`) and `description` when present. A row
    /// without an `id` is identified by its position.
    pub fn recipes(&self) -> Result<Vec<RawRecipe>> {
        validate_recipe_schema(self)?;
        let col = RecipeColumns::resolve(self)?;

        self.rows
            .iter()
            .enumerate()
            .map(|(row, cells)| col.read(row, cells))
            .collect()
    }

    /// Resolves the table into typed interaction rows.
    ///
    /// Requires `recipe_id` and `rating`. Rows with a blank or non-numeric
    /// rating are kept with `rating: None`: they count as interactions but
    /// do not contribute to the mean. Rows with a blank `recipe_id` are
    /// skipped.
    pub fn interactions(&self) -> Result<Vec<Interaction>> {
        let recipe_id = self.require("recipe_id")?;
        let rating = self.require("rating")?;

        let mut out = Vec::with_capacity(self.rows.len());
        let mut skipped = 0usize;
        for cells in &self.rows {
            let id = cell(cells, recipe_id);
            if id.is_empty() {
                skipped += 1;
                continue;
            }
            match cell(cells, rating).parse::<f64>() {
                Ok(value) if value.is_finite() => out.push(Interaction {
                    recipe_id: RecipeId::parse(id),
                    rating: Some(value),
                }),
                _ => out.push(Interaction {
                    recipe_id: RecipeId::parse(id),
                    rating: None,
                }),
            }
        }
        if skipped > 0 {
            tracing::warn!(skipped, "Interactions without a recipe id were dropped");
        }
        Ok(out)
    }

    fn require(&self, column: &str) -> Result<usize> {
        self.column_index(column)
            .ok_or_else(|| Error::Schema(format!("Missing required column: {column}")))
    }
}

fn cell(cells: &[String], index: usize) -> &str {
    cells.get(index).map_or("", |c| c.trim())
}

fn optional_cell(cells: &[String], index: Option<usize>) -> Option<&str> {
    index.map(|i| cell(cells, i)).filter(|c| !c.is_empty())
}

struct RecipeColumns {
    name: usize,
    minutes: usize,
    ingredients: usize,
    steps: usize,
    id: Option<usize>,
    n_steps: Option<usize>,
    n_ingredients: Option<usize>,
    food_recipe_id: Option<usize>,
    detailed_ingredients: Option<usize>,
    description: Option<usize>,
}

impl RecipeColumns {
    fn resolve(table: &RawTable) -> Result<Self> {
        Ok(Self {
            name: table.require("name")?,
            minutes: table.require("minutes")?,
            ingredients: table.require("ingredients")?,
            steps: table.require("steps")?,
            id: table.column_index("id"),
            n_steps: table.column_index("n_steps"),
            n_ingredients: table.column_index("n_ingredients"),
            food_recipe_id: table.column_index("food_recipe_id"),
            detailed_ingredients: table
                .column_index("detailed_ingredients")
                .or_else(|| table.column_index("enriched_ingredients")),
            description: table.column_index("description"),
        })
    }

    fn read(&self, row: usize, cells: &[String]) -> Result<RawRecipe> {
        let minutes = cell(cells, self.minutes);
        let minutes = if minutes.is_empty() {
            None
        } else {
            Some(minutes.parse::<f64>().map_err(|_| {
                Error::Schema(format!(
                    "Column minutes must be numeric (row {row}: '{minutes}')"
                ))
            })?)
        };

        Ok(RawRecipe {
            id: optional_cell(cells, self.id).map_or_else(|| RecipeId::from(row), RecipeId::parse),
            name: cell(cells, self.name).to_string(),
            minutes,
            ingredients: ListField::Encoded(cell(cells, self.ingredients).to_string()),
            steps: ListField::Encoded(cell(cells, self.steps).to_string()),
            n_steps: optional_cell(cells, self.n_steps).and_then(|c| c.parse().ok()),
            n_ingredients: optional_cell(cells, self.n_ingredients).and_then(|c| c.parse().ok()),
            food_recipe_id: optional_cell(cells, self.food_recipe_id)
                .and_then(|c| c.parse().ok()),
            detailed_ingredients: optional_cell(cells, self.detailed_ingredients)
                .map(ListField::from),
            description: optional_cell(cells, self.description).map(str::to_string),
        })
    }
}

/// A recipe row before feature building.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecipe {
    /// Source identifier (row position when the source has none).
    pub id: RecipeId,
    /// Display name.
    pub name: String,
    /// Cook time; `None` when the cell was blank.
    pub minutes: Option<f64>,
    /// Ingredient column.
    pub ingredients: ListField,
    /// Steps column.
    pub steps: ListField,
    /// Precomputed step count, when the source has one.
    pub n_steps: Option<u32>,
    /// Precomputed ingredient count, when the source has one.
    pub n_ingredients: Option<u32>,
    /// External catalogue identifier.
    pub food_recipe_id: Option<i64>,
    /// Enriched ingredient lines.
    pub detailed_ingredients: Option<ListField>,
    /// Free-text description.
    pub description: Option<String>,
}

/// One user interaction with a recipe.
#[derive(Debug, Clone, PartialEq)]
pub struct Interaction {
    /// Recipe the interaction refers to.
    pub recipe_id: RecipeId,
    /// Rating given, if any.
    pub rating: Option<f64>,
}

impl Interaction {
    /// Creates a rated interaction.
    #[must_use]
    pub fn new(recipe_id: impl Into<RecipeId>, rating: f64) -> Self {
        Self {
            recipe_id: recipe_id.into(),
            rating: Some(rating),
        }
    }
}
