//! Structured parsing of enriched ingredient lines.
//!
//! Splits a line such as `"1 1/2 cups flour (sifted)"` into quantity, unit,
//! name and preparation. Lines that match none of the recognized shapes are
//! returned with quantity 1, no unit, and the whole line as the name.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// An ingredient line broken into parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedIngredient {
    /// The trimmed input line.
    pub original: String,
    /// Numeric quantity (mixed fractions resolved).
    pub quantity: f64,
    /// Unit word, empty if none was recognized.
    pub unit: String,
    /// Ingredient name with any parenthesized text removed.
    pub name: String,
    /// Text from the first parenthesized group.
    pub preparation: Option<String>,
}

struct LinePatterns {
    with_unit: [Regex; 3],
    count_only: Regex,
    preparation: Regex,
    parenthesized: Regex,
}

fn patterns() -> &'static LinePatterns {
    static PATTERNS: OnceLock<LinePatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| LinePatterns {
        with_unit: [
            Regex::new(r"^(\d+(?:\s+\d+/\d+)?)\s+(\w+)\s+(.+)$")
                .expect("mixed number regex is valid"),
            Regex::new(r"^(\d+/\d+)\s+(\w+)\s+(.+)$").expect("fraction regex is valid"),
            Regex::new(r"^(\d+(?:\.\d+)?)\s+(\w+)\s+(.+)$").expect("decimal regex is valid"),
        ],
        count_only: Regex::new(r"^(\d+)\s+(.+)$").expect("count regex is valid"),
        preparation: Regex::new(r"\(([^)]+)\)").expect("preparation regex is valid"),
        parenthesized: Regex::new(r"\s*\([^)]+\)").expect("parenthesized regex is valid"),
    })
}

/// Parses a quantity token: `"2"`, `"1.5"`, `"3/4"` or `"1 1/2"`.
#[must_use]
pub fn parse_quantity(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if let Some((whole, fraction)) = raw.split_once(char::is_whitespace) {
        return Some(whole.parse::<f64>().ok()? + parse_fraction(fraction.trim())?);
    }
    if raw.contains('/') {
        return parse_fraction(raw);
    }
    raw.parse().ok()
}

fn parse_fraction(raw: &str) -> Option<f64> {
    let (num, den) = raw.split_once('/')?;
    let den: f64 = den.parse().ok()?;
    if den == 0.0 {
        return None;
    }
    Some(num.parse::<f64>().ok()? / den)
}

/// Parses one ingredient line.
#[must_use]
pub fn parse_ingredient_line(line: &str) -> ParsedIngredient {
    let line = line.trim();
    let p = patterns();

    let with_unit = p.with_unit.iter().find_map(|re| {
        let caps = re.captures(line)?;
        let quantity = parse_quantity(&caps[1])?;
        Some((quantity, caps[2].to_string(), caps[3].to_string()))
    });
    let matched = with_unit.or_else(|| {
        let caps = p.count_only.captures(line)?;
        let quantity = parse_quantity(&caps[1])?;
        Some((quantity, String::new(), caps[2].to_string()))
    });

    match matched {
        Some((quantity, unit, name)) => ParsedIngredient {
            original: line.to_string(),
            quantity,
            unit,
            preparation: p.preparation.captures(&name).map(|c| c[1].to_string()),
            name: p.parenthesized.replace_all(&name, "").trim().to_string(),
        },
        None => ParsedIngredient {
            original: line.to_string(),
            quantity: 1.0,
            unit: String::new(),
            name: line.to_string(),
            preparation: None,
        },
    }
}

/// Parses every line of a list.
#[must_use]
pub fn parse_ingredient_lines(lines: &[String]) -> Vec<ParsedIngredient> {
    lines.iter().map(|l| parse_ingredient_line(l)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_fraction_with_preparation() {
        let p = parse_ingredient_line("1 1/2 cups flour (sifted)");
        assert_eq!(p.quantity, 1.5);
        assert_eq!(p.unit, "cups");
        assert_eq!(p.name, "flour");
        assert_eq!(p.preparation.as_deref(), Some("sifted"));
        assert_eq!(p.original, "1 1/2 cups flour (sifted)");
    }

    #[test]
    fn test_fraction_and_decimal() {
        let p = parse_ingredient_line("3/4 cup sugar");
        assert_eq!((p.quantity, p.unit.as_str(), p.name.as_str()), (0.75, "cup", "sugar"));

        let p = parse_ingredient_line("2.5 tbsp olive oil");
        assert_eq!((p.quantity, p.unit.as_str(), p.name.as_str()), (2.5, "tbsp", "olive oil"));
    }

    #[test]
    fn test_count_without_unit() {
        let p = parse_ingredient_line("3 eggs");
        assert_eq!(p.quantity, 3.0);
        assert_eq!(p.unit, "");
        assert_eq!(p.name, "eggs");
    }

    #[test]
    fn test_unrecognized_line_defaults() {
        let p = parse_ingredient_line("  salt and pepper to taste ");
        assert_eq!(p.quantity, 1.0);
        assert_eq!(p.unit, "");
        assert_eq!(p.name, "salt and pepper to taste");
        assert!(p.preparation.is_none());
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("2"), Some(2.0));
        assert_eq!(parse_quantity("1 1/4"), Some(1.25));
        assert_eq!(parse_quantity("1/0"), None);
        assert_eq!(parse_quantity("a"), None);
    }
}
