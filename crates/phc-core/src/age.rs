//! Age band categorization and free-text age parsing.

use std::sync::LazyLock;

use phc_model::{AgeBand, default_age_bands};
use regex::Regex;

/// Label for ages outside every band.
pub const UNKNOWN_AGE_GROUP: &str = "Unknown";

const DAYS_PER_YEAR: i64 = 365;

static DEFAULT_BANDS: LazyLock<AgeBands> = LazyLock::new(AgeBands::default);

// Number followed by a unit word ("4 years", "10days"). The unit must start
// with a letter so a bare number is not split into value and unit.
static AGE_WITH_UNIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*([A-Za-z]\w*)").expect("Invalid age regex"));

/// Ordered age bands; the first band containing an age wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgeBands {
    bands: Vec<AgeBand>,
}

impl Default for AgeBands {
    fn default() -> Self {
        Self::new(default_age_bands())
    }
}

impl AgeBands {
    pub fn new(bands: Vec<AgeBand>) -> Self {
        Self { bands }
    }

    pub fn from_config(bands: &[AgeBand]) -> Self {
        Self::new(bands.to_vec())
    }

    pub fn bands(&self) -> &[AgeBand] {
        &self.bands
    }

    pub fn categorize(&self, age: i64) -> &str {
        self.bands
            .iter()
            .find(|band| band.contains(age))
            .map(|band| band.label.as_str())
            .unwrap_or(UNKNOWN_AGE_GROUP)
    }

    /// Categorizes an integer age given as text; anything else is unknown.
    pub fn categorize_text(&self, raw: &str) -> &str {
        match raw.trim().parse::<i64>() {
            Ok(age) => self.categorize(age),
            Err(_) => UNKNOWN_AGE_GROUP,
        }
    }
}

/// Categorizes with the default band table.
pub fn categorize_age(age: i64) -> &'static str {
    DEFAULT_BANDS.categorize(age)
}

/// Parses "<number> <unit>" ages. Units starting with "year" are years; any
/// other unit counts days. The result is truncated to whole years.
pub fn parse_age_with_unit(raw: &str) -> Option<i64> {
    let captures = AGE_WITH_UNIT.captures(raw)?;
    let value: i64 = captures.get(1)?.as_str().parse().ok()?;
    let unit = captures.get(2)?.as_str().to_lowercase();
    if unit.starts_with("year") {
        Some(value)
    } else {
        Some(value / DAYS_PER_YEAR)
    }
}

/// Parses ages whose first token is the number. The value is years when the
/// text mentions "year" anywhere, days otherwise.
pub fn parse_age_year_substring(raw: &str) -> Option<i64> {
    let value: i64 = raw.split_whitespace().next()?.parse().ok()?;
    if raw.to_lowercase().contains("year") {
        Some(value)
    } else {
        Some(value / DAYS_PER_YEAR)
    }
}
