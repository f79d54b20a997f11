//! Input validation.
//!
//! Guards every externally supplied value before it reaches the model.
//! Validation never clamps: a value is either returned unchanged or rejected
//! with an error naming the field and the accepted range.

use crate::config::LimitsConfig;
use crate::error::{Error, Result};
use crate::table::RawTable;

/// Columns every recipe table must carry.
pub const REQUIRED_RECIPE_COLUMNS: [&str; 4] = ["name", "minutes", "ingredients", "steps"];

/// Returns `value` if it is finite and within `[min, max]`.
pub fn validate_numeric_range(value: f64, min: f64, max: f64, name: &str) -> Result<f64> {
    if !value.is_finite() || value < min || value > max {
        return Err(Error::OutOfRange {
            field: name.to_string(),
            min,
            max,
            value,
        });
    }
    Ok(value)
}

/// Parses a textual number and range-checks it.
pub fn validate_numeric_str(raw: &str, min: f64, max: f64, name: &str) -> Result<f64> {
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| Error::invalid_input(name, format!("must be a number, got '{raw}'")))?;
    validate_numeric_range(value, min, max, name)
}

/// Checks that `k` clusters can be fitted over `n` data points.
pub fn validate_clustering_inputs(k: usize, n: usize) -> Result<()> {
    if k < 2 || k > n {
        return Err(Error::InvalidClusterCount {
            requested: k,
            available: n,
        });
    }
    Ok(())
}

/// Checks that a result-size argument is a positive integer.
pub fn validate_positive_count(value: usize, name: &str) -> Result<usize> {
    if value == 0 {
        return Err(Error::invalid_input(name, "must be a positive integer"));
    }
    Ok(value)
}

/// Checks that a raw recipe table carries the required columns and that
/// `minutes` is numeric in every row.
pub fn validate_recipe_schema(table: &RawTable) -> Result<()> {
    for column in REQUIRED_RECIPE_COLUMNS {
        if table.column_index(column).is_none() {
            return Err(Error::Schema(format!("Missing required column: {column}")));
        }
    }

    let minutes = table
        .column_index("minutes")
        .ok_or_else(|| Error::Schema("Missing required column: minutes".to_string()))?;
    for (row, record) in table.rows().iter().enumerate() {
        let cell = record.get(minutes).map_or("", String::as_str).trim();
        if !cell.is_empty() && cell.parse::<f64>().is_err() {
            return Err(Error::Schema(format!(
                "Column minutes must be numeric (row {row}: '{cell}')"
            )));
        }
    }
    Ok(())
}

/// A recommendation request after validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preferences {
    /// Desired cook time in minutes.
    pub desired_time: f64,
    /// Desired complexity score.
    pub desired_complexity: f64,
    /// Desired number of ingredients.
    pub desired_ingredients: f64,
    /// Maximum number of recommendations.
    pub n_recommendations: usize,
}

impl Preferences {
    /// Validates a raw request against the configured limits.
    pub fn validate(
        desired_time: f64,
        desired_complexity: f64,
        desired_ingredients: f64,
        n_recommendations: usize,
        limits: &LimitsConfig,
    ) -> Result<Self> {
        Ok(Self {
            desired_time: validate_numeric_range(
                desired_time,
                limits.time_min,
                limits.time_max,
                "desired cooking time",
            )?,
            desired_complexity: validate_numeric_range(
                desired_complexity,
                limits.complexity_min,
                limits.complexity_max,
                "desired complexity",
            )?,
            desired_ingredients: validate_numeric_range(
                desired_ingredients,
                limits.ingredients_min,
                limits.ingredients_max,
                "desired ingredients",
            )?,
            n_recommendations: validate_positive_count(
                n_recommendations,
                "number of recommendations",
            )?,
        })
    }

    /// Returns the query point in feature order.
    #[must_use]
    pub fn features(&self) -> crate::recipe::FeatureVector {
        [
            self.desired_time,
            self.desired_complexity,
            self.desired_ingredients,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_range_accepts_bounds() {
        assert_eq!(validate_numeric_range(0.0, 0.0, 300.0, "t").unwrap(), 0.0);
        assert_eq!(
            validate_numeric_range(300.0, 0.0, 300.0, "t").unwrap(),
            300.0
        );
    }

    #[test]
    fn test_numeric_range_rejects_out_of_range_without_clamping() {
        let err = validate_numeric_range(301.0, 0.0, 300.0, "desired cooking time").unwrap_err();
        match err {
            Error::OutOfRange {
                field,
                min,
                max,
                value,
            } => {
                assert_eq!(field, "desired cooking time");
                assert_eq!((min, max, value), (0.0, 300.0, 301.0));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(validate_numeric_range(-1.0, 0.0, 300.0, "t").is_err());
    }

    #[test]
    fn test_numeric_range_rejects_non_finite() {
        assert!(validate_numeric_range(f64::NAN, 0.0, 300.0, "t").is_err());
        assert!(validate_numeric_range(f64::INFINITY, 0.0, 300.0, "t").is_err());
    }

    #[test]
    fn test_numeric_str() {
        assert_eq!(validate_numeric_str(" 45 ", 0.0, 300.0, "t").unwrap(), 45.0);
        let err = validate_numeric_str("soon", 0.0, 300.0, "t").unwrap_err();
        assert!(err.is_client_error());
        assert!(err.to_string().contains("must be a number"));
    }

    #[test]
    fn test_clustering_inputs() {
        assert!(validate_clustering_inputs(2, 2).is_ok());
        assert!(validate_clustering_inputs(6, 50).is_ok());
        assert!(validate_clustering_inputs(1, 50).is_err());
        assert!(matches!(
            validate_clustering_inputs(7, 6),
            Err(Error::InvalidClusterCount {
                requested: 7,
                available: 6
            })
        ));
    }

    #[test]
    fn test_preferences_use_configured_limits() {
        let limits = LimitsConfig::default();
        assert!(Preferences::validate(150.0, 50.0, 10.0, 5, &limits).is_ok());
        assert!(Preferences::validate(-1.0, 50.0, 10.0, 5, &limits).is_err());
        assert!(Preferences::validate(301.0, 50.0, 10.0, 5, &limits).is_err());
        assert!(Preferences::validate(30.0, 101.0, 10.0, 5, &limits).is_err());
        assert!(Preferences::validate(30.0, 50.0, 0.0, 5, &limits).is_err());
        assert!(Preferences::validate(30.0, 50.0, 51.0, 5, &limits).is_err());
        assert!(Preferences::validate(30.0, 50.0, 10.0, 0, &limits).is_err());
    }

    #[test]
    fn test_recipe_schema() {
        let table = RawTable::from_csv_reader(
            "name,minutes,ingredients,steps\nSoup,20,\"['leek']\",\"['boil']\"\n".as_bytes(),
        )
        .unwrap();
        assert!(validate_recipe_schema(&table).is_ok());

        let missing = RawTable::from_csv_reader("name,minutes,steps\nSoup,20,boil\n".as_bytes())
            .unwrap();
        let err = validate_recipe_schema(&missing).unwrap_err();
        assert!(err.to_string().contains("ingredients"));

        let mistyped = RawTable::from_csv_reader(
            "name,minutes,ingredients,steps\nSoup,quick,leek,boil\n".as_bytes(),
        )
        .unwrap();
        let err = validate_recipe_schema(&mistyped).unwrap_err();
        assert!(err.to_string().contains("must be numeric"));
    }
}
