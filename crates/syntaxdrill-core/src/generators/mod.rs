//! Generator contract and registry.
//!
//! A generator is a pure, stateless unit that turns a seed into a constrained
//! parameter set and can independently re-check those constraints. The
//! registry maps names to generators; registration is explicit.

mod collections;
mod control;
mod numbers;
mod strings;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;

use crate::error::EngineError;
use crate::model::GeneratorParams;
use crate::rng::SeededRng;

/// A named parameter generator.
pub trait Generator: Send + Sync {
    /// Registry key.
    fn name(&self) -> &str;

    /// One-line description for listings.
    fn description(&self) -> &str {
        ""
    }

    /// Produce parameters for a seed. Must be deterministic.
    fn generate(&self, seed: &str) -> GeneratorParams;

    /// Check that parameters satisfy this generator's constraints.
    fn validate(&self, params: &GeneratorParams) -> bool;
}

/// A generator built from a pair of plain functions.
#[derive(Clone, Copy)]
pub struct FnGenerator {
    pub name: &'static str,
    pub description: &'static str,
    pub generate: fn(&mut SeededRng) -> GeneratorParams,
    pub validate: fn(&GeneratorParams) -> bool,
}

impl Generator for FnGenerator {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn generate(&self, seed: &str) -> GeneratorParams {
        let mut rng = SeededRng::new(seed);
        (self.generate)(&mut rng)
    }

    fn validate(&self, params: &GeneratorParams) -> bool {
        (self.validate)(params)
    }
}

/// Every generator that ships with the engine.
pub fn builtin_generators() -> Vec<FnGenerator> {
    let mut all = Vec::new();
    all.extend(strings::generators());
    all.extend(collections::generators());
    all.extend(numbers::generators());
    all.extend(control::generators());
    all
}

/// Outcome of sampling one generator over many seeds.
#[derive(Debug, Clone, Serialize)]
pub struct SelfCheckReport {
    pub generator: String,
    pub samples: usize,
    /// Seeds whose output failed the generator's own validation.
    pub failing_seeds: Vec<String>,
    /// Number of distinct parameter sets seen.
    pub distinct: usize,
}

impl SelfCheckReport {
    pub fn is_consistent(&self) -> bool {
        self.failing_seeds.is_empty()
    }

    /// A generator that only ever yields one parameter set is almost always a bug.
    pub fn is_diverse(&self) -> bool {
        self.samples < 2 || self.distinct > 1
    }
}

/// Name-keyed collection of generators.
#[derive(Default, Clone)]
pub struct GeneratorRegistry {
    generators: HashMap<String, Arc<dyn Generator>>,
}

impl GeneratorRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in generator.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for generator in builtin_generators() {
            let previous = registry
                .generators
                .insert(generator.name.to_string(), Arc::new(generator));
            debug_assert!(previous.is_none(), "duplicate builtin generator");
        }
        registry
    }

    /// Register a generator under its own name.
    pub fn register(&mut self, generator: impl Generator + 'static) -> Result<(), EngineError> {
        self.register_arc(Arc::new(generator))
    }

    /// Register an already-shared generator.
    pub fn register_arc(&mut self, generator: Arc<dyn Generator>) -> Result<(), EngineError> {
        let name = generator.name().to_string();
        if self.generators.contains_key(&name) {
            return Err(EngineError::DuplicateGenerator(name));
        }
        tracing::debug!(generator = %name, "registered generator");
        self.generators.insert(name, generator);
        Ok(())
    }

    pub fn has(&self, name: &str) -> bool {
        self.generators.contains_key(name)
    }

    /// Look up a generator by name.
    pub fn get(&self, name: &str) -> Result<&dyn Generator, EngineError> {
        self.generators
            .get(name)
            .map(|g| g.as_ref())
            .ok_or_else(|| EngineError::UnknownGenerator(name.to_string()))
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.generators.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }

    pub fn clear(&mut self) {
        self.generators.clear();
    }

    /// Run the named generator.
    pub fn generate(&self, name: &str, seed: &str) -> Result<GeneratorParams, EngineError> {
        Ok(self.get(name)?.generate(seed))
    }

    /// Run the named generator and reject output its own validation refuses.
    pub fn generate_checked(&self, name: &str, seed: &str) -> Result<GeneratorParams, EngineError> {
        let generator = self.get(name)?;
        let params = generator.generate(seed);
        if !generator.validate(&params) {
            return Err(EngineError::GenerationInconsistency {
                generator: name.to_string(),
                seed: seed.to_string(),
            });
        }
        Ok(params)
    }

    /// Sample every generator over `samples` synthetic seeds.
    pub fn self_check(&self, samples: usize) -> Vec<SelfCheckReport> {
        self.names()
            .into_iter()
            .filter_map(|name| self.generators.get(name))
            .map(|generator| self_check_one(generator.as_ref(), samples))
            .collect()
    }
}

fn self_check_one(generator: &dyn Generator, samples: usize) -> SelfCheckReport {
    let mut failing_seeds = Vec::new();
    let mut distinct = HashSet::new();

    for i in 0..samples {
        let seed = format!("self-check:{}:{i}", generator.name());
        let params = generator.generate(&seed);
        if !generator.validate(&params) {
            failing_seeds.push(seed);
        }
        distinct.insert(serde_json::to_string(&params).unwrap_or_default());
    }

    if !failing_seeds.is_empty() {
        tracing::warn!(
            generator = generator.name(),
            failures = failing_seeds.len(),
            "generator failed its own validation"
        );
    }

    SelfCheckReport {
        generator: generator.name().to_string(),
        samples,
        failing_seeds,
        distinct: distinct.len(),
    }
}

/// Pick from a non-empty constant table.
fn choose<T: Copy>(rng: &mut SeededRng, items: &[T]) -> T {
    items[rng.int(0, items.len() as i64 - 1) as usize]
}

/// `count` integers in `[min, max]`.
fn int_list(rng: &mut SeededRng, count: i64, min: i64, max: i64) -> Vec<i64> {
    (0..count).map(|_| rng.int(min, max)).collect()
}

/// `Some(())` when the condition holds, for `?`-chained validation.
fn holds(condition: bool) -> Option<()> {
    condition.then_some(())
}
