//! The `syntaxdrill render` command.

use std::path::PathBuf;

use anyhow::Result;

use syntaxdrill_core::{render_exercise, GeneratorRegistry, RenderedExercise};

use super::{find_exercise, parse_date};

pub fn execute(
    exercises: PathBuf,
    slug: String,
    user: String,
    date: Option<String>,
    format: String,
) -> Result<()> {
    let exercise = find_exercise(&exercises, &slug)?;
    let date = parse_date(date.as_deref())?;
    let registry = GeneratorRegistry::with_builtins();

    let rendered = render_exercise(&exercise, &registry, &user, date)?;

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&rendered)?),
        _ => print_text(&rendered),
    }

    Ok(())
}

fn print_text(rendered: &RenderedExercise) {
    if rendered.title.is_empty() {
        println!("{} ({}, {})", rendered.slug, rendered.kind, rendered.language);
    } else {
        println!(
            "{} [{}] ({}, {})",
            rendered.title, rendered.slug, rendered.kind, rendered.language
        );
    }
    println!();
    println!("{}", rendered.prompt.trim_end());

    if let Some(code) = &rendered.code {
        println!();
        for line in code.trim_end().lines() {
            println!("    {line}");
        }
    }
}
