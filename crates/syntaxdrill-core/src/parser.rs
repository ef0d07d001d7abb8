//! TOML exercise set parser.
//!
//! Loads exercise sets from TOML files and directories, and validates them
//! against a generator registry.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::generators::GeneratorRegistry;
use crate::model::{Exercise, ExerciseKind, ExerciseSet, GeneratorParams, Language, TargetConstruct};
use crate::render::{interpolate, placeholders, ANSWER_SLOT};

/// Intermediate TOML structure for parsing exercise set files.
#[derive(Debug, Deserialize)]
struct TomlExerciseFile {
    exercise_set: TomlExerciseSetHeader,
    #[serde(default)]
    exercises: Vec<TomlExercise>,
}

#[derive(Debug, Deserialize)]
struct TomlExerciseSetHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default = "default_language_str")]
    default_language: String,
    #[serde(default)]
    default_timeout_ms: Option<u64>,
}

fn default_language_str() -> String {
    "python".to_string()
}

#[derive(Debug, Deserialize)]
struct TomlExercise {
    slug: String,
    #[serde(default)]
    title: String,
    kind: String,
    #[serde(default)]
    language: Option<String>,
    prompt: String,
    expected_answer: String,
    #[serde(default)]
    accepted_solutions: Vec<String>,
    #[serde(default)]
    generator: Option<String>,
    #[serde(default)]
    verification_template: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    target_construct: Option<TomlTargetConstruct>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TomlTargetConstruct {
    name: String,
    markers: Vec<String>,
    tip: String,
}

/// Parse a single TOML file into an `ExerciseSet`.
pub fn parse_exercise_set(path: &Path) -> Result<ExerciseSet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read exercise set file: {}", path.display()))?;

    parse_exercise_set_str(&content, path)
}

/// Parse a TOML string into an `ExerciseSet`.
pub fn parse_exercise_set_str(content: &str, source_path: &Path) -> Result<ExerciseSet> {
    let parsed: TomlExerciseFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let default_language: Language = parsed
        .exercise_set
        .default_language
        .parse()
        .map_err(|e: String| anyhow::anyhow!("{}", e))?;
    let default_timeout_ms = parsed.exercise_set.default_timeout_ms;

    let exercises = parsed
        .exercises
        .into_iter()
        .map(|e| {
            let kind: ExerciseKind = e
                .kind
                .parse()
                .map_err(|err: String| anyhow::anyhow!("exercise {}: {}", e.slug, err))?;
            let language = e
                .language
                .map(|l| l.parse().map_err(|err: String| anyhow::anyhow!("{}", err)))
                .transpose()?
                .unwrap_or(default_language);

            let target_construct = e.target_construct.map(|c| TargetConstruct {
                name: c.name,
                markers: c.markers,
                tip: c.tip,
            });

            Ok(Exercise {
                slug: e.slug,
                title: e.title,
                kind,
                language,
                prompt: e.prompt,
                expected_answer: e.expected_answer,
                accepted_solutions: e.accepted_solutions,
                generator: e.generator,
                verification_template: e.verification_template,
                code: e.code,
                target_construct,
                tags: e.tags,
                timeout_ms: e.timeout_ms.or(default_timeout_ms),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ExerciseSet {
        id: parsed.exercise_set.id,
        name: parsed.exercise_set.name,
        description: parsed.exercise_set.description,
        exercises,
    })
}

/// Recursively load all `.toml` exercise set files from a directory.
pub fn load_exercise_directory(dir: &Path) -> Result<Vec<ExerciseSet>> {
    let mut sets = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            sets.extend(load_exercise_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_exercise_set(&path) {
                Ok(set) => sets.push(set),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(sets)
}

/// Load a single file or every set under a directory.
pub fn load_exercises(path: &Path) -> Result<Vec<ExerciseSet>> {
    if path.is_dir() {
        load_exercise_directory(path)
    } else {
        Ok(vec![parse_exercise_set(path)?])
    }
}

/// A warning from exercise set validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The exercise slug (if applicable).
    pub slug: Option<String>,
    /// Warning message.
    pub message: String,
}

impl ValidationWarning {
    fn new(slug: &str, message: impl Into<String>) -> Self {
        Self {
            slug: Some(slug.to_string()),
            message: message.into(),
        }
    }
}

/// Every template field of an exercise, with its name.
fn templates(exercise: &Exercise) -> Vec<(&'static str, &str)> {
    let mut fields = vec![
        ("title", exercise.title.as_str()),
        ("prompt", exercise.prompt.as_str()),
        ("expected_answer", exercise.expected_answer.as_str()),
    ];
    fields.extend(
        exercise
            .accepted_solutions
            .iter()
            .map(|s| ("accepted_solutions", s.as_str())),
    );
    if let Some(code) = &exercise.code {
        fields.push(("code", code));
    }
    if let Some(template) = &exercise.verification_template {
        fields.push(("verification_template", template));
    }
    fields
}

/// Placeholder keys a template needs filled, excluding the answer slot.
fn params_needed(field: &str, template: &str) -> Vec<String> {
    placeholders(template)
        .into_iter()
        .filter(|k| !(field == "verification_template" && k == ANSWER_SLOT))
        .collect()
}

/// Validate an exercise set for common issues.
pub fn validate_exercise_set(
    set: &ExerciseSet,
    registry: &GeneratorRegistry,
) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    // Duplicate slugs
    let mut seen = HashSet::new();
    for exercise in &set.exercises {
        if !seen.insert(&exercise.slug) {
            warnings.push(ValidationWarning::new(
                &exercise.slug,
                format!("duplicate exercise slug: {}", exercise.slug),
            ));
        }
    }

    for exercise in &set.exercises {
        let slug = exercise.slug.as_str();

        if exercise.prompt.trim().is_empty() {
            warnings.push(ValidationWarning::new(slug, "prompt is empty"));
        }

        for (field, template) in templates(exercise) {
            let keys = placeholders(template);
            let reserved: Vec<&str> = keys.iter().map(String::as_str).collect();
            if interpolate(template, &GeneratorParams::new(), &reserved).is_err() {
                warnings.push(ValidationWarning::new(
                    slug,
                    format!("{field} has an unterminated placeholder"),
                ));
            }
        }

        if let Some(template) = &exercise.verification_template {
            if !placeholders(template).iter().any(|k| k == ANSWER_SLOT) {
                warnings.push(ValidationWarning::new(
                    slug,
                    "verification_template has no {{answer}} slot",
                ));
            }
        }

        if exercise.kind == ExerciseKind::Predict && exercise.verification_template.is_some() {
            warnings.push(ValidationWarning::new(
                slug,
                "verification_template is ignored for predict exercises; use code",
            ));
        }

        match &exercise.generator {
            None => {
                let used: BTreeSet<String> = templates(exercise)
                    .into_iter()
                    .flat_map(|(field, t)| params_needed(field, t))
                    .collect();
                if !used.is_empty() {
                    warnings.push(ValidationWarning::new(
                        slug,
                        format!(
                            "static exercise references placeholders: {}",
                            used.into_iter().collect::<Vec<_>>().join(", ")
                        ),
                    ));
                }
            }
            Some(name) if !registry.has(name) => {
                warnings.push(ValidationWarning::new(
                    slug,
                    format!("unknown generator: {name}"),
                ));
            }
            Some(name) => {
                let sample = match registry.generate_checked(name, &format!("validate:{slug}")) {
                    Ok(params) => params,
                    Err(e) => {
                        warnings.push(ValidationWarning::new(slug, e.to_string()));
                        continue;
                    }
                };
                let missing: BTreeSet<String> = templates(exercise)
                    .into_iter()
                    .flat_map(|(field, t)| params_needed(field, t))
                    .filter(|k| !sample.contains_key(k))
                    .collect();
                if !missing.is_empty() {
                    warnings.push(ValidationWarning::new(
                        slug,
                        format!(
                            "generator {name} does not produce: {}",
                            missing.into_iter().collect::<Vec<_>>().join(", ")
                        ),
                    ));
                }
            }
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[exercise_set]
id = "python-basics"
name = "Python Basics"
description = "Slicing and indexing drills"
default_timeout_ms = 3000

[[exercises]]
slug = "string-slice-dynamic"
title = "Slice a string"
kind = "write"
generator = "string-slice-dynamic"
prompt = "Given {{var}} = '{{word}}', get the characters from {{start}} up to {{end}}."
expected_answer = "{{var}}[{{start}}:{{end}}]"
verification_template = """
{{var}} = '{{word}}'
print({{answer}})
"""
tags = ["strings", "slicing"]

[exercises.target_construct]
name = "slice"
markers = [":"]
tip = "Slices like s[1:4] read better than indexing each character."

[[exercises]]
slug = "first-three"
kind = "write"
language = "py"
prompt = "Get the first three items of items."
expected_answer = "items[:3]"
accepted_solutions = ["items[0:3]"]
timeout_ms = 500
"#;

    fn registry() -> GeneratorRegistry {
        GeneratorRegistry::with_builtins()
    }

    #[test]
    fn parse_valid_toml() {
        let set = parse_exercise_set_str(VALID_TOML, &PathBuf::from("test.toml")).unwrap();
        assert_eq!(set.id, "python-basics");
        assert_eq!(set.exercises.len(), 2);

        let dynamic = &set.exercises[0];
        assert!(dynamic.is_dynamic());
        assert_eq!(dynamic.kind, ExerciseKind::Write);
        assert_eq!(dynamic.language, Language::Python);
        assert_eq!(dynamic.timeout_ms, Some(3000));
        assert_eq!(dynamic.target_construct.as_ref().unwrap().name, "slice");

        let fixed = &set.exercises[1];
        assert!(!fixed.is_dynamic());
        assert_eq!(fixed.accepted_solutions, vec!["items[0:3]"]);
        assert_eq!(fixed.timeout_ms, Some(500));
    }

    #[test]
    fn valid_set_has_no_warnings() {
        let set = parse_exercise_set_str(VALID_TOML, &PathBuf::from("test.toml")).unwrap();
        let warnings = validate_exercise_set(&set, &registry());
        assert!(warnings.is_empty(), "{warnings:?}");
    }

    #[test]
    fn parse_unknown_kind_fails() {
        let toml = r#"
[exercise_set]
id = "bad"
name = "Bad"

[[exercises]]
slug = "x"
kind = "essay"
prompt = "p"
expected_answer = "a"
"#;
        let err = parse_exercise_set_str(toml, &PathBuf::from("bad.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("unknown exercise kind"));
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        assert!(parse_exercise_set_str(bad, &PathBuf::from("bad.toml")).is_err());
    }

    #[test]
    fn validate_reports_configuration_problems() {
        let toml = r#"
[exercise_set]
id = "problems"
name = "Problems"

[[exercises]]
slug = "same"
kind = "write"
prompt = "Use {{word}}"
expected_answer = "x"

[[exercises]]
slug = "same"
kind = "write"
generator = "no-such-generator"
prompt = "p"
expected_answer = "x"

[[exercises]]
slug = "missing-param"
kind = "write"
generator = "list-index"
prompt = "Index {{nonexistent}}"
expected_answer = "items[{{index}}]"
verification_template = "print(items)"

[[exercises]]
slug = "blank"
kind = "fill-in"
prompt = "   "
expected_answer = "append"

[[exercises]]
slug = "broken"
kind = "predict"
prompt = "What does {{this print?"
expected_answer = "1"
"#;
        let set = parse_exercise_set_str(toml, &PathBuf::from("test.toml")).unwrap();
        let warnings = validate_exercise_set(&set, &registry());
        let has = |needle: &str| warnings.iter().any(|w| w.message.contains(needle));

        assert!(has("duplicate exercise slug"));
        assert!(has("static exercise references placeholders: word"));
        assert!(has("unknown generator: no-such-generator"));
        assert!(has("does not produce: nonexistent"));
        assert!(has("no {{answer}} slot"));
        assert!(has("prompt is empty"));
        assert!(has("unterminated placeholder"));
    }

    #[test]
    fn load_directory_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("good.toml"), VALID_TOML).unwrap();
        std::fs::write(dir.path().join("bad.toml"), "not toml {").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        let nested = dir.path().join("nested");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(nested.join("more.toml"), VALID_TOML).unwrap();

        let sets = load_exercise_directory(dir.path()).unwrap();
        assert_eq!(sets.len(), 2);
        assert!(sets.iter().all(|s| s.id == "python-basics"));
    }

    #[test]
    fn load_exercises_accepts_file_or_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("set.toml");
        std::fs::write(&file, VALID_TOML).unwrap();

        assert_eq!(load_exercises(&file).unwrap().len(), 1);
        assert_eq!(load_exercises(dir.path()).unwrap().len(), 1);
        assert!(load_exercises(&dir.path().join("missing.toml")).is_err());
    }
}
