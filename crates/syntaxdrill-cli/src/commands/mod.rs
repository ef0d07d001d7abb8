pub mod generators;
pub mod grade;
pub mod init;
pub mod render;
pub mod validate;

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};

use syntaxdrill_core::parser::load_exercises;
use syntaxdrill_core::Exercise;

/// Load every set under `path` and pick out one exercise.
pub fn find_exercise(path: &Path, slug: &str) -> Result<Exercise> {
    let sets = load_exercises(path)?;
    sets.iter()
        .find_map(|set| set.find(slug))
        .cloned()
        .with_context(|| format!("no exercise with slug '{slug}' in {}", path.display()))
}

/// `YYYY-MM-DD`, or today in UTC.
pub fn parse_date(date: Option<&str>) -> Result<NaiveDate> {
    match date {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("invalid date '{s}', expected YYYY-MM-DD")),
        None => Ok(Utc::now().date_naive()),
    }
}
