//! The `syntaxdrill validate` command.

use std::path::PathBuf;

use anyhow::Result;

use syntaxdrill_core::parser::{load_exercises, validate_exercise_set};
use syntaxdrill_core::GeneratorRegistry;

pub fn execute(exercises_path: PathBuf, samples: Option<usize>) -> Result<()> {
    let sets = load_exercises(&exercises_path)?;
    let registry = GeneratorRegistry::with_builtins();

    let mut total_warnings = 0;

    for set in &sets {
        println!("Exercise set: {} ({} exercises)", set.name, set.exercises.len());

        let warnings = validate_exercise_set(set, &registry);
        for w in &warnings {
            let prefix = w
                .slug
                .as_ref()
                .map(|slug| format!("  [{slug}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if let Some(samples) = samples {
        for report in registry.self_check(samples) {
            if !report.is_consistent() {
                println!(
                    "  [{}] WARNING: {} of {} seeds failed validation (first: {})",
                    report.generator,
                    report.failing_seeds.len(),
                    report.samples,
                    report.failing_seeds[0]
                );
                total_warnings += 1;
            }
            if !report.is_diverse() {
                println!(
                    "  [{}] WARNING: produced one parameter set over {} seeds",
                    report.generator, report.samples
                );
                total_warnings += 1;
            }
        }
    }

    if total_warnings == 0 {
        println!("All exercise sets valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
