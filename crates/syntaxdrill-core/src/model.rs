//! Core data model types for syntaxdrill.
//!
//! Exercises are authored externally and are read-only to the engine. A
//! rendered exercise is an exercise with every placeholder resolved from the
//! parameters a generator produced for one learner on one day.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Supported target languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
    Rust,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::Python => write!(f, "python"),
            Language::JavaScript => write!(f, "javascript"),
            Language::Rust => write!(f, "rust"),
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "python" | "py" => Ok(Language::Python),
            "javascript" | "js" => Ok(Language::JavaScript),
            "rust" | "rs" => Ok(Language::Rust),
            other => Err(format!("unknown language: {other}")),
        }
    }
}

/// How the learner answers an exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExerciseKind {
    /// Write a full expression or statement.
    Write,
    /// Fill in a blank inside given code.
    FillIn,
    /// Predict the output of a snippet.
    Predict,
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExerciseKind::Write => write!(f, "write"),
            ExerciseKind::FillIn => write!(f, "fill-in"),
            ExerciseKind::Predict => write!(f, "predict"),
        }
    }
}

impl FromStr for ExerciseKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "write" => Ok(ExerciseKind::Write),
            "fill-in" | "fill_in" | "fillin" => Ok(ExerciseKind::FillIn),
            "predict" => Ok(ExerciseKind::Predict),
            other => Err(format!("unknown exercise kind: {other}")),
        }
    }
}

/// A language construct an exercise wants the learner to practice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetConstruct {
    /// Human-readable construct name (e.g. "slice").
    pub name: String,
    /// Code fragments whose presence shows the construct was used.
    pub markers: Vec<String>,
    /// Coaching tip shown when a correct answer avoids the construct.
    pub tip: String,
}

/// An exercise template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exercise {
    /// Unique identifier.
    pub slug: String,
    /// Human-readable title.
    #[serde(default)]
    pub title: String,
    /// How the learner answers.
    pub kind: ExerciseKind,
    /// Target language.
    #[serde(default = "default_language")]
    pub language: Language,
    /// Prompt template.
    pub prompt: String,
    /// Expected answer template.
    pub expected_answer: String,
    /// Other accepted answer templates.
    #[serde(default)]
    pub accepted_solutions: Vec<String>,
    /// Name of the generator that parameterizes this exercise.
    #[serde(default)]
    pub generator: Option<String>,
    /// Code wrapping the learner's answer at `{{answer}}` for execution checks.
    #[serde(default)]
    pub verification_template: Option<String>,
    /// Snippet whose output a predict exercise asks about.
    #[serde(default)]
    pub code: Option<String>,
    /// Construct the exercise is meant to drill.
    #[serde(default)]
    pub target_construct: Option<TargetConstruct>,
    /// Tags for filtering.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Per-exercise execution timeout override in milliseconds.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl Exercise {
    /// Returns `true` if the exercise is procedurally generated.
    pub fn is_dynamic(&self) -> bool {
        self.generator.is_some()
    }
}

fn default_language() -> Language {
    Language::Python
}

/// A collection of exercises loaded from one source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseSet {
    /// Unique identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Description of this set.
    #[serde(default)]
    pub description: String,
    /// The exercises.
    #[serde(default)]
    pub exercises: Vec<Exercise>,
}

impl ExerciseSet {
    /// Find an exercise by slug.
    pub fn find(&self, slug: &str) -> Option<&Exercise> {
        self.exercises.iter().find(|e| e.slug == slug)
    }
}

/// A single generated parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    List(Vec<ParamValue>),
}

impl ParamValue {
    /// Render as a Python literal (strings quoted).
    pub fn to_literal(&self) -> String {
        match self {
            ParamValue::Str(s) => format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
            other => other.to_string(),
        }
    }
}

/// Template rendering: strings appear raw, everything else as a Python literal.
impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(i) => write!(f, "{i}"),
            ParamValue::Float(x) if x.fract() == 0.0 && x.is_finite() => write!(f, "{x:.1}"),
            ParamValue::Float(x) => write!(f, "{x}"),
            ParamValue::Bool(true) => write!(f, "True"),
            ParamValue::Bool(false) => write!(f, "False"),
            ParamValue::Str(s) => write!(f, "{s}"),
            ParamValue::List(items) => {
                let inner: Vec<String> = items.iter().map(ParamValue::to_literal).collect();
                write!(f, "[{}]", inner.join(", "))
            }
        }
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<usize> for ParamValue {
    fn from(v: usize) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Str(v)
    }
}

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(v: Vec<T>) -> Self {
        ParamValue::List(v.into_iter().map(Into::into).collect())
    }
}

/// Parameters produced by one generator invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeneratorParams(BTreeMap<String, ParamValue>);

impl GeneratorParams {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder-style insert.
    pub fn with(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn int(&self, key: &str) -> Option<i64> {
        match self.0.get(key)? {
            ParamValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn str(&self, key: &str) -> Option<&str> {
        match self.0.get(key)? {
            ParamValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn bool(&self, key: &str) -> Option<bool> {
        match self.0.get(key)? {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn list(&self, key: &str) -> Option<&[ParamValue]> {
        match self.0.get(key)? {
            ParamValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// A list whose every element is an integer.
    pub fn int_list(&self, key: &str) -> Option<Vec<i64>> {
        self.list(key)?
            .iter()
            .map(|v| match v {
                ParamValue::Int(i) => Some(*i),
                _ => None,
            })
            .collect()
    }

    /// A list whose every element is a string.
    pub fn str_list(&self, key: &str) -> Option<Vec<&str>> {
        self.list(key)?
            .iter()
            .map(|v| match v {
                ParamValue::Str(s) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// An exercise with all placeholders resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedExercise {
    pub slug: String,
    pub title: String,
    pub kind: ExerciseKind,
    pub language: Language,
    pub prompt: String,
    pub expected_answer: String,
    pub accepted_solutions: Vec<String>,
    /// Still contains the `{{answer}}` slot.
    pub verification_template: Option<String>,
    pub code: Option<String>,
    pub target_construct: Option<TargetConstruct>,
    pub timeout_ms: Option<u64>,
    /// Parameters the generator produced, if any.
    #[serde(rename = "_generatedParams", default, skip_serializing_if = "Option::is_none")]
    pub generated_params: Option<GeneratorParams>,
    /// Seed the parameters were generated from, if any.
    #[serde(rename = "_seed", default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<String>,
}
